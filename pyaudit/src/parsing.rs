//! Syntax Parser Adapter.
//!
//! Thin wrapper over `ruff_python_parser` so the rest of the engine deals
//! with one module type and one typed failure. A parse failure in one
//! file never aborts the scan; the orchestrator converts it into a
//! single `ParseError` issue and moves on.

use crate::utils::LineIndex;
use ruff_python_ast::ModModule;
use ruff_python_parser::parse_module;
use thiserror::Error;

/// A failed attempt to parse one source file.
#[derive(Debug, Error)]
#[error("{message} (line {line})")]
pub struct ParseFailure {
    /// Human-readable parser message.
    pub message: String,
    /// 1-indexed line of the failure.
    pub line: usize,
}

/// Parses Python source text into a module AST.
pub fn parse_python(source: &str) -> Result<ModModule, ParseFailure> {
    match parse_module(source) {
        Ok(parsed) => Ok(parsed.into_syntax()),
        Err(e) => {
            let line_index = LineIndex::new(source);
            Err(ParseFailure {
                message: e.error.to_string(),
                line: line_index.line_index(e.location.start()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_module() {
        let module = parse_python("x = 1\n").unwrap();
        assert_eq!(module.body.len(), 1);
    }

    #[test]
    fn reports_failure_line() {
        let err = parse_python("x = 1\ndef broken(:\n").unwrap_err();
        assert_eq!(err.line, 2);
    }
}
