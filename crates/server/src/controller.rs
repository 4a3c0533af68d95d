use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use lantern_findings::{ScanStatus, WorkspaceSummary};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::pipeline::{ScanOutcome, ScanPipeline};
use crate::publish::Publisher;

/// What asked for a scan. Decides coalescing and whether the summary is
/// flagged as user-initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanTrigger {
    /// Workspace just opened.
    Startup,
    /// A source file was saved.
    Save,
    /// Explicit rescan command.
    Manual,
    /// Reload-detectors command; discovery re-walks the plugin root and
    /// fingerprints decide what actually recompiles.
    Reload,
}

impl ScanTrigger {
    fn is_user_initiated(&self) -> bool {
        matches!(self, ScanTrigger::Manual | ScanTrigger::Reload)
    }
}

struct CycleReport {
    trigger: ScanTrigger,
    result: lantern_lint_host::Result<ScanOutcome>,
}

/// Handle to the single-owner scan lifecycle task.
///
/// Clones all feed the same task. Dropping every clone shuts the task
/// down and aborts any in-flight cycle.
#[derive(Clone)]
pub struct ScanController {
    commands: mpsc::Sender<ScanTrigger>,
}

impl ScanController {
    pub fn spawn(pipeline: Arc<dyn ScanPipeline>, publisher: Arc<dyn Publisher>) -> Self {
        let (commands, command_rx) = mpsc::channel(16);
        let (cycle_tx, cycle_rx) = mpsc::channel(1);
        let task = LifecycleTask {
            pipeline,
            publisher,
            commands: command_rx,
            cycle_tx,
            cycle_rx,
            active: None,
            state: ScanStatus::Idle,
            pending_save: false,
            published: BTreeSet::new(),
        };
        tokio::spawn(task.run());
        Self { commands }
    }

    /// Requests a scan. The lifecycle task decides whether it starts now,
    /// coalesces into the in-flight cycle, or is rejected.
    pub async fn trigger(&self, trigger: ScanTrigger) {
        if self.commands.send(trigger).await.is_err() {
            warn!("lifecycle task is gone; dropping {trigger:?} trigger");
        }
    }
}

/// Owns all scan state. At most one cycle is in flight at a time; every
/// mutation happens on this task, so there is no lock around the state
/// machine.
struct LifecycleTask {
    pipeline: Arc<dyn ScanPipeline>,
    publisher: Arc<dyn Publisher>,
    commands: mpsc::Receiver<ScanTrigger>,
    cycle_tx: mpsc::Sender<CycleReport>,
    cycle_rx: mpsc::Receiver<CycleReport>,
    active: Option<JoinHandle<()>>,
    state: ScanStatus,
    /// Saves that arrived mid-cycle, collapsed to one pending rescan.
    pending_save: bool,
    /// Files whose diagnostics the editor currently shows; entries absent
    /// from the next successful cycle get cleared with an empty publish.
    published: BTreeSet<PathBuf>,
}

impl LifecycleTask {
    async fn run(mut self) {
        loop {
            // Triggers drain before completion reports, so a save racing a
            // finishing cycle coalesces instead of starting a second one.
            tokio::select! {
                biased;
                maybe_trigger = self.commands.recv() => {
                    match maybe_trigger {
                        Some(trigger) => self.on_trigger(trigger).await,
                        None => break,
                    }
                }
                Some(report) = self.cycle_rx.recv() => {
                    self.on_cycle_done(report).await;
                }
            }
        }
        if let Some(active) = self.active.take() {
            active.abort();
        }
    }

    async fn on_trigger(&mut self, trigger: ScanTrigger) {
        if self.state.is_busy() {
            match trigger {
                ScanTrigger::Save => {
                    debug!("scan in flight; save coalesced into one pending rescan");
                    self.pending_save = true;
                }
                ScanTrigger::Startup => debug!("scan already in flight at startup"),
                ScanTrigger::Manual | ScanTrigger::Reload => {
                    info!("rejecting {trigger:?}: a scan is already in flight");
                    self.publisher
                        .publish_status(ScanStatus::Running, "A scan is already in progress")
                        .await;
                }
            }
            return;
        }

        // Saves never retry out of a failed state; only an explicit
        // command does.
        if self.state == ScanStatus::Error && trigger == ScanTrigger::Save {
            debug!("dropping save while in error state");
            return;
        }

        self.start_cycle(trigger).await;
    }

    async fn start_cycle(&mut self, trigger: ScanTrigger) {
        self.pending_save = false;
        self.state = ScanStatus::Initializing;
        self.publisher
            .publish_status(ScanStatus::Initializing, "Preparing workspace scan")
            .await;

        let pipeline = Arc::clone(&self.pipeline);
        let publisher = Arc::clone(&self.publisher);
        let report_tx = self.cycle_tx.clone();
        self.active = Some(tokio::spawn(async move {
            let result = pipeline.run(publisher.as_ref()).await;
            // A closed channel means the lifecycle task is shutting down
            // and the report has nowhere to go.
            let _ = report_tx.send(CycleReport { trigger, result }).await;
        }));
    }

    async fn on_cycle_done(&mut self, report: CycleReport) {
        self.active = None;
        match report.result {
            Ok(outcome) => self.publish_outcome(report.trigger, outcome).await,
            Err(err) => {
                error!("scan cycle failed: {err}");
                // The previous diagnostic set stays visible until a cycle
                // succeeds again.
                self.state = ScanStatus::Error;
                self.pending_save = false;
                self.publisher
                    .publish_status(ScanStatus::Error, &err.to_string())
                    .await;
            }
        }

        if self.pending_save {
            debug!("running the coalesced rescan");
            self.start_cycle(ScanTrigger::Save).await;
        }
    }

    async fn publish_outcome(&mut self, trigger: ScanTrigger, outcome: ScanOutcome) {
        let current: BTreeSet<PathBuf> = outcome.findings.keys().cloned().collect();
        for (file, findings) in &outcome.findings {
            self.publisher.publish_diagnostics(file, findings).await;
        }
        for stale in self.published.difference(&current) {
            self.publisher.publish_diagnostics(stale, &[]).await;
        }
        self.published = current;

        let summary = WorkspaceSummary::compute(
            &outcome.findings,
            outcome.total_files,
            &outcome.anchor_files,
            trigger.is_user_initiated(),
        );
        self.publisher.publish_summary(&summary).await;

        let message = format!(
            "Scan complete: {} issue(s) in {} file(s)",
            summary.total_issues, summary.files_with_issues
        );
        self.publisher
            .publish_status(ScanStatus::Complete, &message)
            .await;
        self.state = ScanStatus::Idle;
        self.publisher.publish_status(ScanStatus::Idle, "Ready").await;
    }
}
