use std::path::{Path, PathBuf};

/// The nightly release every shipped plugin is built against. Plugins may
/// pin another channel in their own toolchain file; mismatches are logged,
/// the host still compiles with the active toolchain.
pub const DEFAULT_TOOLCHAIN: &str = "nightly-2025-09-18";

/// A dated rustc release plus the host target triple. Owns every naming
/// convention that derives from the pair: cache filenames, the driver
/// location, the `+toolchain` cargo argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    name: String,
    target: String,
}

impl Toolchain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: host_target(),
        }
    }

    /// Fixed target triple instead of the host's. Test hook: cache filename
    /// assertions stay platform-independent.
    pub fn with_target(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// The `+<toolchain>` selector passed as cargo's first argument.
    pub fn cargo_selector(&self) -> String {
        format!("+{}", self.name)
    }

    /// Where rustup-managed dylint installs place the driver for this
    /// toolchain: `~/.dylint_drivers/<toolchain>-<target>/dylint-driver`.
    pub fn driver_path(&self, home: &Path) -> PathBuf {
        home.join(".dylint_drivers")
            .join(format!("{}-{}", self.name, self.target))
            .join("dylint-driver")
    }

    /// Cache filename for a compiled plugin:
    /// `lib<name>@<toolchain>-<target>.<ext>` with dashes in the crate name
    /// normalized to underscores, matching what cargo itself emits.
    pub fn artifact_file_name(&self, plugin_name: &str) -> String {
        format!(
            "lib{}@{}-{}.{}",
            plugin_name.replace('-', "_"),
            self.name,
            self.target,
            library_extension()
        )
    }

    /// Library filenames cargo produces under `target/<profile>/`.
    pub fn build_output_names(&self, plugin_name: &str) -> Vec<String> {
        let stem = plugin_name.replace('-', "_");
        let ext = library_extension();
        // Unix produces lib<name>.<ext>; Windows drops the prefix.
        vec![format!("lib{stem}.{ext}"), format!("{stem}.{ext}")]
    }
}

impl std::fmt::Display for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.name, self.target)
    }
}

pub(crate) fn library_extension() -> &'static str {
    if cfg!(target_os = "macos") {
        "dylib"
    } else if cfg!(target_os = "windows") {
        "dll"
    } else {
        "so"
    }
}

fn host_target() -> String {
    let os = match std::env::consts::OS {
        "macos" => "apple-darwin",
        "linux" => "unknown-linux-gnu",
        "windows" => "pc-windows-msvc",
        other => other,
    };
    format!("{}-{}", std::env::consts::ARCH, os)
}
