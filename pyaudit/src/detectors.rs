//! Pattern detectors.
//!
//! Each detector is a fixed variant implementing one capability: inspect
//! a single AST node (plus the file's source lines) and return zero or
//! more issues. Detectors are independent, never panic on malformed
//! input, and a node they cannot classify simply yields no issues. The
//! `DetectorWalker` visits every node exactly once and runs the
//! detectors in a fixed sequence per node, which fixes the issue order
//! within a file.

use crate::constants::{
    csrf_decorators, http_decorator_re, API_KEY_KEYWORDS, AUTHORIZATION_CALLS, RENDER_MEMBERS,
    REQUEST_ATTRIBUTES, REQUEST_PARAMETERS, RESPONSE_CONSTRUCTORS, SENSITIVE_KEYWORDS,
    SQL_SINK_MEMBERS, STATE_CHANGING_MEMBERS, STRONG_CRYPTO_CALLS, VALIDATION_CALLS,
    WEAK_CRYPTO_CALLS,
};
use crate::report::{Issue, IssueKind, IssueLine, Severity};
use crate::utils::{call_member_name, decorator_name, dotted_name, line_excerpt, LineIndex};
use ruff_python_ast::visitor::{walk_expr, walk_stmt, Visitor};
use ruff_python_ast::{Expr, Stmt};
use ruff_text_size::{Ranged, TextSize};

/// Per-file context handed to every detector.
pub struct FileContext<'a> {
    /// Byte offset → line mapping for the file.
    pub line_index: &'a LineIndex,
    /// The file's source, split into lines, for excerpts.
    pub source_lines: &'a [&'a str],
}

impl FileContext<'_> {
    fn issue(
        &self,
        kind: IssueKind,
        severity: Severity,
        offset: TextSize,
        message: String,
        recommendation: &str,
        subtype: Option<&str>,
    ) -> Issue {
        let line = self.line_index.line_index(offset);
        Issue {
            line: IssueLine::Line(line),
            kind,
            message,
            severity,
            recommendation: recommendation.to_owned(),
            code_excerpt: line_excerpt(self.source_lines, line),
            subtype: subtype.map(str::to_owned),
        }
    }
}

/// One heuristic check over a single AST node.
pub trait Detector: Send + Sync {
    /// Descriptive name of the detector.
    fn name(&self) -> &'static str;
    /// Inspects a statement node.
    fn check_stmt(&self, _stmt: &Stmt, _ctx: &FileContext) -> Vec<Issue> {
        Vec::new()
    }
    /// Inspects an expression node.
    fn check_expr(&self, _expr: &Expr, _ctx: &FileContext) -> Vec<Issue> {
        Vec::new()
    }
}

/// Returns the full detector set in its fixed invocation order.
/// Adding a detector here is the only change needed to extend the scan.
#[must_use]
pub fn get_detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(SensitiveVariableDetector),
        Box::new(SqlInjectionDetector),
        Box::new(XssDetector),
        Box::new(EncryptionUsageDetector),
        Box::new(MissingCsrfDetector),
        Box::new(MissingAuthorizationDetector),
        Box::new(MissingInputValidationDetector),
    ]
}

/// Runs every detector against every node of a module, exactly once per
/// node, and returns the issues in invocation order.
#[must_use]
pub fn run_detectors(body: &[Stmt], ctx: &FileContext) -> Vec<Issue> {
    let mut walker = DetectorWalker {
        detectors: get_detectors(),
        ctx,
        issues: Vec::new(),
    };
    for stmt in body {
        walker.visit_stmt(stmt);
    }
    walker.issues
}

struct DetectorWalker<'a> {
    detectors: Vec<Box<dyn Detector>>,
    ctx: &'a FileContext<'a>,
    issues: Vec<Issue>,
}

impl<'a> Visitor<'a> for DetectorWalker<'_> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        for detector in &self.detectors {
            self.issues.extend(detector.check_stmt(stmt, self.ctx));
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        for detector in &self.detectors {
            self.issues.extend(detector.check_expr(expr, self.ctx));
        }
        walk_expr(self, expr);
    }
}

// --- Individual detectors ---

/// Flags assignment targets whose lowercased name contains a credential
/// keyword.
struct SensitiveVariableDetector;

impl SensitiveVariableDetector {
    fn check_target(&self, name: &str, offset: TextSize, ctx: &FileContext) -> Option<Issue> {
        let lowered = name.to_lowercase();
        if !SENSITIVE_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
            return None;
        }
        let subtype = API_KEY_KEYWORDS
            .iter()
            .any(|kw| lowered.contains(kw))
            .then_some("API key exposure");
        Some(ctx.issue(
            IssueKind::SensitiveVariable,
            Severity::High,
            offset,
            format!("Sensitive variable '{name}' may expose credentials"),
            "Load secrets from environment variables or a secrets manager instead of source code",
            subtype,
        ))
    }
}

impl Detector for SensitiveVariableDetector {
    fn name(&self) -> &'static str {
        "SensitiveVariableDetector"
    }

    fn check_stmt(&self, stmt: &Stmt, ctx: &FileContext) -> Vec<Issue> {
        let mut issues = Vec::new();
        match stmt {
            Stmt::Assign(node) => {
                for target in &node.targets {
                    if let Expr::Name(name) = target {
                        issues.extend(self.check_target(name.id.as_str(), name.start(), ctx));
                    }
                }
            }
            Stmt::AnnAssign(node) => {
                if let Expr::Name(name) = &*node.target {
                    issues.extend(self.check_target(name.id.as_str(), name.start(), ctx));
                }
            }
            _ => {}
        }
        issues
    }
}

/// Flags SQL execution calls whose argument is string-built or a bare
/// variable (proxy for "not a literal constant").
struct SqlInjectionDetector;

impl Detector for SqlInjectionDetector {
    fn name(&self) -> &'static str {
        "SqlInjectionDetector"
    }

    fn check_expr(&self, expr: &Expr, ctx: &FileContext) -> Vec<Issue> {
        let Expr::Call(call) = expr else {
            return Vec::new();
        };
        let Some(member) = call_member_name(&call.func) else {
            return Vec::new();
        };
        if !SQL_SINK_MEMBERS.contains(&member) {
            return Vec::new();
        }
        let dynamic = call
            .arguments
            .args
            .iter()
            .any(|arg| matches!(arg, Expr::BinOp(_) | Expr::FString(_) | Expr::Name(_)));
        if !dynamic {
            return Vec::new();
        }
        vec![ctx.issue(
            IssueKind::SqlInjection,
            Severity::Critical,
            call.start(),
            format!("Possible SQL injection in call to '{member}' with a dynamically built query"),
            "Use parameterized queries with bound placeholders instead of string concatenation",
            None,
        )]
    }
}

/// Flags render/response-construction calls receiving a bare variable
/// (proxy for unescaped user data).
struct XssDetector;

impl Detector for XssDetector {
    fn name(&self) -> &'static str {
        "XssDetector"
    }

    fn check_expr(&self, expr: &Expr, ctx: &FileContext) -> Vec<Issue> {
        let Expr::Call(call) = expr else {
            return Vec::new();
        };
        let is_sink = match &*call.func {
            Expr::Name(name) => {
                let id = name.id.as_str();
                RENDER_MEMBERS.contains(&id) || RESPONSE_CONSTRUCTORS.contains(&id)
            }
            Expr::Attribute(attr) => RENDER_MEMBERS.contains(&attr.attr.as_str()),
            _ => false,
        };
        if !is_sink {
            return Vec::new();
        }
        let has_bare_variable = call
            .arguments
            .args
            .iter()
            .any(|arg| matches!(arg, Expr::Name(_)));
        if !has_bare_variable {
            return Vec::new();
        }
        let member = call_member_name(&call.func).unwrap_or("render");
        vec![ctx.issue(
            IssueKind::Xss,
            Severity::High,
            call.start(),
            format!("Possible XSS: '{member}' called with unescaped variable data"),
            "Escape user-supplied data before rendering, or rely on autoescaping templates",
            None,
        )]
    }
}

/// Flags usage of hashing/encryption primitives from a fixed allow-list,
/// for manual review of algorithm strength. Informational only.
struct EncryptionUsageDetector;

impl Detector for EncryptionUsageDetector {
    fn name(&self) -> &'static str {
        "EncryptionUsageDetector"
    }

    fn check_expr(&self, expr: &Expr, ctx: &FileContext) -> Vec<Issue> {
        let Expr::Call(call) = expr else {
            return Vec::new();
        };
        let Some(path) = dotted_name(&call.func) else {
            return Vec::new();
        };
        let subtype = if WEAK_CRYPTO_CALLS.contains(&path.as_str()) {
            "weak algorithm"
        } else if STRONG_CRYPTO_CALLS.contains(&path.as_str()) {
            "strong algorithm"
        } else {
            return Vec::new();
        };
        vec![ctx.issue(
            IssueKind::EncryptionUsage,
            Severity::Info,
            call.start(),
            format!("Encryption/hashing primitive in use: {path}"),
            "Review the algorithm choice against current cryptographic guidance",
            Some(subtype),
        )]
    }
}

/// Flags functions that issue state-changing HTTP calls without a
/// recognized CSRF decorator.
struct MissingCsrfDetector;

impl Detector for MissingCsrfDetector {
    fn name(&self) -> &'static str {
        "MissingCsrfDetector"
    }

    fn check_stmt(&self, stmt: &Stmt, ctx: &FileContext) -> Vec<Issue> {
        let Stmt::FunctionDef(node) = stmt else {
            return Vec::new();
        };
        let has_csrf_decorator = node
            .decorator_list
            .iter()
            .filter_map(decorator_name)
            .any(|name| csrf_decorators().contains(name));
        if has_csrf_decorator {
            return Vec::new();
        }
        if !body_has_member_call(&node.body, STATE_CHANGING_MEMBERS, true) {
            return Vec::new();
        }
        vec![ctx.issue(
            IssueKind::MissingCsrf,
            Severity::High,
            node.start(),
            format!(
                "Function '{}' performs state-changing HTTP calls without CSRF protection",
                node.name
            ),
            "Add a CSRF protection decorator (e.g. csrf_protect) or route through middleware",
            None,
        )]
    }
}

/// Flags conditional blocks that dereference user/request attributes
/// without an authorization check anywhere in the block. First violation
/// per block only.
struct MissingAuthorizationDetector;

impl Detector for MissingAuthorizationDetector {
    fn name(&self) -> &'static str {
        "MissingAuthorizationDetector"
    }

    fn check_stmt(&self, stmt: &Stmt, ctx: &FileContext) -> Vec<Issue> {
        let Stmt::If(node) = stmt else {
            return Vec::new();
        };
        let mut finder = AttributeFinder {
            names: REQUEST_ATTRIBUTES,
            found: false,
        };
        finder.visit_expr(&node.test);
        for s in &node.body {
            if finder.found {
                break;
            }
            finder.visit_stmt(s);
        }
        if !finder.found {
            return Vec::new();
        }
        if body_has_member_call(&node.body, AUTHORIZATION_CALLS, false)
            || expr_has_member_call(&node.test, AUTHORIZATION_CALLS)
        {
            return Vec::new();
        }
        vec![ctx.issue(
            IssueKind::MissingAuthorization,
            Severity::High,
            node.start(),
            "Conditional block accesses user/request data without an authorization check"
                .to_owned(),
            "Guard the block with has_permission, has_role, or is_authenticated",
            None,
        )]
    }
}

/// Flags HTTP endpoint functions taking request input with no call to a
/// validation routine in the body.
struct MissingInputValidationDetector;

impl Detector for MissingInputValidationDetector {
    fn name(&self) -> &'static str {
        "MissingInputValidationDetector"
    }

    fn check_stmt(&self, stmt: &Stmt, ctx: &FileContext) -> Vec<Issue> {
        let Stmt::FunctionDef(node) = stmt else {
            return Vec::new();
        };
        let is_endpoint = node
            .decorator_list
            .iter()
            .filter_map(decorator_name)
            .any(|name| http_decorator_re().is_match(name));
        if !is_endpoint {
            return Vec::new();
        }
        let takes_request = node
            .parameters
            .posonlyargs
            .iter()
            .chain(&node.parameters.args)
            .chain(&node.parameters.kwonlyargs)
            .any(|p| REQUEST_PARAMETERS.contains(&p.parameter.name.as_str()));
        if !takes_request {
            return Vec::new();
        }
        if body_has_member_call(&node.body, VALIDATION_CALLS, false) {
            return Vec::new();
        }
        vec![ctx.issue(
            IssueKind::MissingInputValidation,
            Severity::Medium,
            node.start(),
            format!(
                "HTTP endpoint '{}' accepts request data without input validation",
                node.name
            ),
            "Validate or sanitize request data before use (validate/clean/sanitize)",
            None,
        )]
    }
}

// --- Subtree search helpers ---

/// Searches a statement subtree for a call whose target's final name is
/// in `names`. With `attribute_only`, only member calls (`obj.post(...)`)
/// match, not bare function calls (`post(...)`).
fn body_has_member_call(body: &[Stmt], names: &[&str], attribute_only: bool) -> bool {
    let mut finder = CallFinder {
        names,
        attribute_only,
        found: false,
    };
    for stmt in body {
        if finder.found {
            break;
        }
        finder.visit_stmt(stmt);
    }
    finder.found
}

fn expr_has_member_call(expr: &Expr, names: &[&str]) -> bool {
    let mut finder = CallFinder {
        names,
        attribute_only: false,
        found: false,
    };
    finder.visit_expr(expr);
    finder.found
}

struct CallFinder<'n> {
    names: &'n [&'n str],
    attribute_only: bool,
    found: bool,
}

impl<'a> Visitor<'a> for CallFinder<'_> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if self.found {
            return;
        }
        if let Expr::Call(call) = expr {
            let matches = match &*call.func {
                Expr::Attribute(attr) => self.names.contains(&attr.attr.as_str()),
                Expr::Name(name) if !self.attribute_only => {
                    self.names.contains(&name.id.as_str())
                }
                _ => false,
            };
            if matches {
                self.found = true;
                return;
            }
        }
        walk_expr(self, expr);
    }
}

struct AttributeFinder<'n> {
    names: &'n [&'n str],
    found: bool,
}

impl<'a> Visitor<'a> for AttributeFinder<'_> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        if self.found {
            return;
        }
        if let Expr::Attribute(attr) = expr {
            if self.names.contains(&attr.attr.as_str()) {
                self.found = true;
                return;
            }
        }
        walk_expr(self, expr);
    }
}
