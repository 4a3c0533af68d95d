use lantern_findings::{Finding, Severity};
use syn::spanned::Spanned;
use syn::visit::{self, Visit};
use syn::{BinOp, ExprBinary};

use crate::detector::{references_anchor, Detector};
use crate::source_unit::SourceUnit;

/// Flags raw arithmetic in Anchor code. On-chain balances overflow silently
/// in release builds, so every `+`/`-`/`*`/`/` (and the compound-assignment
/// forms) should go through the checked variants.
pub struct UncheckedArithmetic;

impl Detector for UncheckedArithmetic {
    fn id(&self) -> &'static str {
        "UNCHECKED_ARITHMETIC"
    }

    fn name(&self) -> &'static str {
        "Unchecked Arithmetic"
    }

    fn description(&self) -> &'static str {
        "Detects unchecked arithmetic that can overflow or underflow at runtime"
    }

    fn message(&self) -> &'static str {
        "Unchecked arithmetic operation. Use checked_add(), checked_sub(), \
         checked_mul() or checked_div() to guard against overflow."
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn applies_to(&self, text: &str) -> bool {
        references_anchor(text)
            && (text.contains('+')
                || text.contains('-')
                || text.contains('*')
                || text.contains('/'))
    }

    fn detect(&self, unit: &SourceUnit) -> Vec<Finding> {
        let mut visitor = ArithmeticVisitor {
            detector: self,
            unit,
            findings: Vec::new(),
        };
        visitor.visit_file(unit.ast());
        visitor.findings
    }
}

fn is_arithmetic(op: &BinOp) -> bool {
    matches!(
        op,
        BinOp::Add(_)
            | BinOp::Sub(_)
            | BinOp::Mul(_)
            | BinOp::Div(_)
            | BinOp::AddAssign(_)
            | BinOp::SubAssign(_)
            | BinOp::MulAssign(_)
            | BinOp::DivAssign(_)
    )
}

struct ArithmeticVisitor<'a> {
    detector: &'a UncheckedArithmetic,
    unit: &'a SourceUnit,
    findings: Vec<Finding>,
}

impl<'ast> Visit<'ast> for ArithmeticVisitor<'_> {
    fn visit_expr_binary(&mut self, node: &'ast ExprBinary) {
        if is_arithmetic(&node.op) {
            self.findings
                .push(self.detector.finding_at(self.unit, node.span()));
        }
        visit::visit_expr_binary(self, node);
    }
}
