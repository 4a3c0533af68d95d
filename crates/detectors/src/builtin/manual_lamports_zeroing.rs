use lantern_findings::{Finding, Severity};
use syn::spanned::Spanned;
use syn::visit::{self, Visit};
use syn::{Expr, ExprAssign, ExprField, ExprLit, ExprMethodCall, Lit, UnOp};

use crate::detector::Detector;
use crate::source_unit::SourceUnit;

/// Flags manual zeroing of an account's lamports. Zeroing the balance by
/// hand leaves the account data reachable within the same transaction;
/// Anchor's `close` constraint is the safe way to drain an account.
pub struct ManualLamportsZeroing;

impl Detector for ManualLamportsZeroing {
    fn id(&self) -> &'static str {
        "MANUAL_LAMPORTS_ZEROING"
    }

    fn name(&self) -> &'static str {
        "Manual Lamports Zeroing"
    }

    fn description(&self) -> &'static str {
        "Detects manual lamports zeroing, which leaves account closure incomplete"
    }

    fn message(&self) -> &'static str {
        "Manual lamports zeroing. Use the close constraint or transfer the \
         lamports out instead of assigning zero."
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn detect(&self, unit: &SourceUnit) -> Vec<Finding> {
        let mut visitor = LamportsVisitor {
            detector: self,
            unit,
            findings: Vec::new(),
        };
        visitor.visit_file(unit.ast());
        visitor.findings
    }
}

/// Peels parentheses, references, derefs and `?` so the patterns below see
/// the underlying expression: `**acct.lamports.borrow_mut()` and
/// `acct.try_borrow_mut_lamports()?` both reduce to a lamports access.
fn strip_wrappers(mut expr: &Expr) -> &Expr {
    loop {
        expr = match expr {
            Expr::Paren(p) => &p.expr,
            Expr::Reference(r) => &r.expr,
            Expr::Unary(u) if matches!(u.op, UnOp::Deref(_)) => &u.expr,
            Expr::Try(t) => &t.expr,
            _ => break expr,
        };
    }
}

fn is_lamports_access(expr: &Expr) -> bool {
    match strip_wrappers(expr) {
        Expr::Field(ExprField {
            member: syn::Member::Named(ident),
            ..
        }) => ident == "lamports",
        Expr::MethodCall(ExprMethodCall { method, .. }) if method == "lamports" => true,
        Expr::MethodCall(ExprMethodCall { method, .. }) if method == "try_borrow_mut_lamports" => {
            true
        }
        Expr::MethodCall(ExprMethodCall {
            method, receiver, ..
        }) if method == "borrow_mut" => is_lamports_access(receiver),
        _ => false,
    }
}

fn is_zero_literal(expr: &Expr) -> bool {
    match strip_wrappers(expr) {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => lit.base10_digits() == "0",
        _ => false,
    }
}

fn zeroes_lamports(expr: &Expr) -> bool {
    match expr {
        Expr::Assign(ExprAssign { left, right, .. }) => {
            is_lamports_access(left) && is_zero_literal(right)
        }
        Expr::MethodCall(call) if call.method == "set_lamports" => {
            call.args.first().is_some_and(is_zero_literal)
        }
        _ => false,
    }
}

struct LamportsVisitor<'a> {
    detector: &'a ManualLamportsZeroing,
    unit: &'a SourceUnit,
    findings: Vec<Finding>,
}

impl<'ast> Visit<'ast> for LamportsVisitor<'_> {
    fn visit_expr(&mut self, node: &'ast Expr) {
        if zeroes_lamports(node) {
            self.findings
                .push(self.detector.finding_at(self.unit, node.span()));
        }
        visit::visit_expr(self, node);
    }
}
