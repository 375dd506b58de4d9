use ruff_python_ast::{Decorator, Expr};
use ruff_text_size::TextSize;

/// A utility struct to convert byte offsets to line numbers.
///
/// The AST parser works with byte offsets, but issues are reported with
/// 1-indexed line numbers which are more human-readable.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Stores the byte index of the start of each line.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Creates a new `LineIndex` by scanning the source code for newlines.
    /// Uses byte iteration since '\n' is always a single byte in UTF-8.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in source.as_bytes().iter().enumerate() {
            if *byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Converts a `TextSize` (byte offset) to a 1-indexed line number.
    #[must_use]
    pub fn line_index(&self, offset: TextSize) -> usize {
        let offset = offset.to_usize();
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(line) => line,
        }
    }
}

/// Returns the trimmed source line for a 1-indexed line number, if present.
#[must_use]
pub fn line_excerpt(source_lines: &[&str], line: usize) -> Option<String> {
    source_lines
        .get(line.checked_sub(1)?)
        .map(|l| l.trim().to_owned())
}

/// Normalizes a path for display in reports.
///
/// - Converts backslashes to forward slashes (for cross-platform consistency)
/// - Strips leading "./" or ".\" prefix (for cleaner output)
#[must_use]
pub fn normalize_display_path(path: &std::path::Path) -> String {
    let s = path.to_string_lossy();
    let normalized = s.replace('\\', "/");
    normalized
        .strip_prefix("./")
        .unwrap_or(&normalized)
        .to_owned()
}

/// Returns the full dotted path of a name or attribute chain
/// (`cursor.execute` → `"cursor.execute"`, `Crypto.Cipher.AES.new` →
/// `"Crypto.Cipher.AES.new"`). `None` for anything else (subscripts,
/// calls, literals).
#[must_use]
pub fn dotted_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Name(node) => Some(node.id.to_string()),
        Expr::Attribute(node) => {
            let prefix = dotted_name(&node.value)?;
            Some(format!("{}.{}", prefix, node.attr))
        }
        _ => None,
    }
}

/// Returns the last segment of a call target's name
/// (`cursor.execute` → `"execute"`, `validate` → `"validate"`).
#[must_use]
pub fn call_member_name(func: &Expr) -> Option<&str> {
    match func {
        Expr::Name(node) => Some(node.id.as_str()),
        Expr::Attribute(node) => Some(node.attr.as_str()),
        _ => None,
    }
}

/// Extracts a decorator's simple name: the bare name, the final
/// attribute segment (`app.route` → `"route"`), or the called name for
/// decorator factories (`@require_http_methods(["POST"])`).
#[must_use]
pub fn decorator_name(decorator: &Decorator) -> Option<&str> {
    fn expr_name(expr: &Expr) -> Option<&str> {
        match expr {
            Expr::Name(node) => Some(node.id.as_str()),
            Expr::Attribute(node) => Some(node.attr.as_str()),
            Expr::Call(node) => expr_name(&node.func),
            _ => None,
        }
    }
    expr_name(&decorator.expression)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_name_walks_attribute_chains() {
        let module = ruff_python_parser::parse_module("Crypto.Cipher.AES.new(key)\n").unwrap();
        let module = module.into_syntax();
        let ruff_python_ast::Stmt::Expr(stmt) = &module.body[0] else {
            panic!("expected expression statement");
        };
        let ruff_python_ast::Expr::Call(call) = &*stmt.value else {
            panic!("expected call");
        };
        assert_eq!(dotted_name(&call.func).as_deref(), Some("Crypto.Cipher.AES.new"));
        assert_eq!(call_member_name(&call.func), Some("new"));
    }

    #[test]
    fn line_index_maps_offsets() {
        let idx = LineIndex::new("a\nbb\nccc\n");
        assert_eq!(idx.line_index(TextSize::new(0)), 1);
        assert_eq!(idx.line_index(TextSize::new(2)), 2);
        assert_eq!(idx.line_index(TextSize::new(5)), 3);
    }

    #[test]
    fn excerpt_is_trimmed() {
        let lines: Vec<&str> = "    x = 1\ny = 2".lines().collect();
        assert_eq!(line_excerpt(&lines, 1).as_deref(), Some("x = 1"));
        assert_eq!(line_excerpt(&lines, 3), None);
    }
}
