use lantern_findings::{Finding, Severity};
use syn::visit::{self, Visit};
use syn::{Attribute, Fields, ItemStruct};

use crate::detector::{references_anchor, Detector};
use crate::source_unit::SourceUnit;

/// Flags `#[derive(Accounts)]` structs with no `Signer` field. An
/// instruction whose account set carries no signer can be invoked by
/// anyone.
pub struct MissingSigner;

impl Detector for MissingSigner {
    fn id(&self) -> &'static str {
        "MISSING_SIGNER"
    }

    fn name(&self) -> &'static str {
        "Missing Signer Check"
    }

    fn description(&self) -> &'static str {
        "Detects Accounts structs without a signer, which allows unauthorized invocation"
    }

    fn message(&self) -> &'static str {
        "Accounts struct has no signer. Add a Signer<'info> field to ensure \
         the instruction is authorized."
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, text: &str) -> bool {
        references_anchor(text) && text.contains("Accounts")
    }

    fn detect(&self, unit: &SourceUnit) -> Vec<Finding> {
        let mut visitor = SignerVisitor {
            detector: self,
            unit,
            findings: Vec::new(),
        };
        visitor.visit_file(unit.ast());
        visitor.findings
    }
}

fn derives_accounts(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        if !attr.path().is_ident("derive") {
            return false;
        }
        let mut found = false;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("Accounts") {
                found = true;
            }
            Ok(())
        });
        found
    })
}

fn is_signer_field(field: &syn::Field) -> bool {
    if let syn::Type::Path(type_path) = &field.ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Signer";
        }
    }
    false
}

struct SignerVisitor<'a> {
    detector: &'a MissingSigner,
    unit: &'a SourceUnit,
    findings: Vec<Finding>,
}

impl<'ast> Visit<'ast> for SignerVisitor<'_> {
    fn visit_item_struct(&mut self, node: &'ast ItemStruct) {
        if derives_accounts(&node.attrs) {
            let has_signer = match &node.fields {
                Fields::Named(fields) => fields.named.iter().any(is_signer_field),
                _ => false,
            };
            if !has_signer {
                self.findings
                    .push(self.detector.finding_at(self.unit, node.ident.span()));
            }
        }
        visit::visit_item_struct(self, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Vec<Finding> {
        let unit = SourceUnit::parse("/w/lib.rs", text).unwrap();
        MissingSigner.detect(&unit)
    }

    #[test]
    fn flags_accounts_struct_without_signer() {
        let findings = detect(
            "\
use anchor_lang::prelude::*;

#[derive(Accounts)]
pub struct Withdraw<'info> {
    #[account(mut)]
    pub vault: Account<'info, Vault>,
}
",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].origin.code(), "MISSING_SIGNER");
        // Anchored on the struct name, not the attribute above it.
        assert_eq!(findings[0].span.line_start, 4);
    }

    #[test]
    fn signer_field_satisfies_the_check() {
        let findings = detect(
            "\
use anchor_lang::prelude::*;

#[derive(Accounts)]
pub struct Withdraw<'info> {
    pub authority: Signer<'info>,
    #[account(mut)]
    pub vault: Account<'info, Vault>,
}
",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn accounts_among_other_derives_is_still_checked() {
        let findings = detect(
            "\
use anchor_lang::prelude::*;

#[derive(Accounts, Clone)]
pub struct Init<'info> {
    pub payer: AccountInfo<'info>,
}
",
        );
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn plain_structs_are_ignored() {
        let findings = detect(
            "\
use anchor_lang::prelude::*;

#[derive(Debug)]
pub struct Config {
    pub fee: u64,
}
",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn each_unsigned_struct_is_reported() {
        let findings = detect(
            "\
use anchor_lang::prelude::*;

#[derive(Accounts)]
pub struct A<'info> {
    pub vault: AccountInfo<'info>,
}

#[derive(Accounts)]
pub struct B<'info> {
    pub vault: AccountInfo<'info>,
}
",
        );
        assert_eq!(findings.len(), 2);
    }
}
