use std::path::{Path, PathBuf};

use lantern_findings::Span;

use crate::error::{DetectorError, Result};

/// A parsed Rust source file, shared by every detector that runs on it.
///
/// Parsing happens once per file per scan; detectors receive the unit by
/// reference and read the AST without re-parsing.
#[derive(Debug)]
pub struct SourceUnit {
    path: PathBuf,
    ast: syn::File,
}

impl SourceUnit {
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Self> {
        let path = path.into();
        let ast = syn::parse_file(text).map_err(|err| DetectorError::Parse {
            file: path.clone(),
            detail: err.to_string(),
        })?;
        Ok(Self { path, ast })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ast(&self) -> &syn::File {
        &self.ast
    }

    /// Converts a proc-macro2 span into a 1-based line/column span.
    ///
    /// proc-macro2 reports 1-based lines but 0-based columns; findings use
    /// 1-based for both.
    pub fn span(&self, span: proc_macro2::Span) -> Span {
        let start = span.start();
        let end = span.end();
        Span::new(
            start.line as u32,
            start.column as u32 + 1,
            end.line as u32,
            end.column as u32 + 1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_source() {
        let unit = SourceUnit::parse("/w/lib.rs", "fn main() {}").unwrap();
        assert_eq!(unit.path(), Path::new("/w/lib.rs"));
        assert_eq!(unit.ast().items.len(), 1);
    }

    #[test]
    fn reports_the_file_on_parse_failure() {
        let err = SourceUnit::parse("/w/broken.rs", "fn main( {").unwrap_err();
        assert!(err.to_string().contains("/w/broken.rs"));
    }

    #[test]
    fn spans_are_one_based() {
        let unit = SourceUnit::parse("/w/lib.rs", "fn main() {}").unwrap();
        let item_span = match &unit.ast().items[0] {
            syn::Item::Fn(f) => syn::spanned::Spanned::span(&f.sig.ident),
            _ => unreachable!(),
        };
        let span = unit.span(item_span);
        assert_eq!(span.line_start, 1);
        // "fn " occupies columns 1-3, the ident starts at column 4.
        assert_eq!(span.column_start, 4);
    }
}
