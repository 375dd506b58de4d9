//! Structural counter: a single tree walk collecting class/function
//! counts, parameter counts, type annotations, decorator counts, and
//! function line spans. Emits no issues.

use crate::constants::http_decorator_re;
use crate::utils::{decorator_name, LineIndex};
use ruff_python_ast::{self as ast, Stmt};
use ruff_text_size::Ranged;

/// Per-file structural totals, merged into project `Metrics` by the
/// orchestrator.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StructuralSummary {
    /// Class definitions seen.
    pub class_count: usize,
    /// Function and method definitions seen.
    pub function_count: usize,
    /// Sum of function line spans (`end - start + 1`, default 1).
    pub function_lines_total: usize,
    /// Sum of parameter counts across functions.
    pub function_params_total: usize,
    /// Annotated parameters, return annotations, and annotated assignments.
    pub type_annotations: usize,
    /// Decorators attached to functions and classes.
    pub decorator_count: usize,
    /// Functions carrying an HTTP-method-like decorator.
    pub http_endpoint_count: usize,
}

/// Walks a parsed module once and returns its structural totals.
#[must_use]
pub fn analyze_structure(body: &[Stmt], line_index: &LineIndex) -> StructuralSummary {
    let mut counter = StructuralCounter {
        summary: StructuralSummary::default(),
        line_index,
    };
    counter.visit_body(body);
    counter.summary
}

struct StructuralCounter<'a> {
    summary: StructuralSummary,
    line_index: &'a LineIndex,
}

impl StructuralCounter<'_> {
    fn visit_body(&mut self, body: &[Stmt]) {
        for stmt in body {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::FunctionDef(node) => {
                self.record_function(node);
                self.visit_body(&node.body);
            }
            Stmt::ClassDef(node) => {
                self.summary.class_count += 1;
                self.summary.decorator_count += node.decorator_list.len();
                self.visit_body(&node.body);
            }
            Stmt::AnnAssign(_) => {
                self.summary.type_annotations += 1;
            }
            Stmt::If(node) => {
                self.visit_body(&node.body);
                for clause in &node.elif_else_clauses {
                    self.visit_body(&clause.body);
                }
            }
            Stmt::For(node) => {
                self.visit_body(&node.body);
                self.visit_body(&node.orelse);
            }
            Stmt::While(node) => {
                self.visit_body(&node.body);
                self.visit_body(&node.orelse);
            }
            Stmt::With(node) => {
                self.visit_body(&node.body);
            }
            Stmt::Try(node) => {
                self.visit_body(&node.body);
                for handler in &node.handlers {
                    let ast::ExceptHandler::ExceptHandler(h) = handler;
                    self.visit_body(&h.body);
                }
                self.visit_body(&node.orelse);
                self.visit_body(&node.finalbody);
            }
            Stmt::Match(node) => {
                for case in &node.cases {
                    self.visit_body(&case.body);
                }
            }
            _ => {}
        }
    }

    fn record_function(&mut self, node: &ast::StmtFunctionDef) {
        self.summary.function_count += 1;
        self.summary.decorator_count += node.decorator_list.len();

        let start = self.line_index.line_index(node.start());
        let end = self.line_index.line_index(node.end());
        self.summary.function_lines_total += if end >= start { end - start + 1 } else { 1 };

        let params = &node.parameters;
        let mut param_count = params.posonlyargs.len() + params.args.len() + params.kwonlyargs.len();
        if params.vararg.is_some() {
            param_count += 1;
        }
        if params.kwarg.is_some() {
            param_count += 1;
        }
        self.summary.function_params_total += param_count;

        for param in params
            .posonlyargs
            .iter()
            .chain(&params.args)
            .chain(&params.kwonlyargs)
        {
            if param.parameter.annotation.is_some() {
                self.summary.type_annotations += 1;
            }
        }
        if node.returns.is_some() {
            self.summary.type_annotations += 1;
        }

        if node
            .decorator_list
            .iter()
            .filter_map(decorator_name)
            .any(|name| http_decorator_re().is_match(name))
        {
            self.summary.http_endpoint_count += 1;
        }
    }
}
