//! Cyclomatic complexity and branch counting for one module.

use ruff_python_ast::{self as ast, Expr, Stmt};

/// Decision-point totals for one file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ComplexitySummary {
    /// 1 + decision points (if/elif, loops, handlers, cases, boolean
    /// operators, conditional expressions, assertions).
    pub cyclomatic: usize,
    /// Branching statements only (if/elif, loops, except handlers,
    /// match cases), without expression-level decisions.
    pub branches: usize,
}

/// Computes module-level complexity over an already-parsed body.
///
/// Unlike per-function complexity, this recurses into function and class
/// bodies: the report aggregates a single number per file.
#[must_use]
pub fn analyze_complexity(body: &[Stmt]) -> ComplexitySummary {
    let mut visitor = ComplexityVisitor {
        summary: ComplexitySummary {
            cyclomatic: 1,
            branches: 0,
        },
    };
    visitor.visit_body(body);
    visitor.summary
}

struct ComplexityVisitor {
    summary: ComplexitySummary,
}

impl ComplexityVisitor {
    fn visit_body(&mut self, body: &[Stmt]) {
        for stmt in body {
            self.visit_stmt(stmt);
        }
    }

    fn branch(&mut self) {
        self.summary.cyclomatic += 1;
        self.summary.branches += 1;
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::If(node) => {
                self.branch();
                self.visit_expr(&node.test);
                self.visit_body(&node.body);
                for clause in &node.elif_else_clauses {
                    // Only elif adds a decision point, else doesn't
                    if let Some(test) = &clause.test {
                        self.branch();
                        self.visit_expr(test);
                    }
                    self.visit_body(&clause.body);
                }
            }
            Stmt::For(node) => {
                self.branch();
                self.visit_expr(&node.iter);
                self.visit_body(&node.body);
                self.visit_body(&node.orelse);
            }
            Stmt::While(node) => {
                self.branch();
                self.visit_expr(&node.test);
                self.visit_body(&node.body);
                self.visit_body(&node.orelse);
            }
            Stmt::Try(node) => {
                self.visit_body(&node.body);
                for handler in &node.handlers {
                    self.branch();
                    let ast::ExceptHandler::ExceptHandler(h) = handler;
                    self.visit_body(&h.body);
                }
                self.visit_body(&node.orelse);
                self.visit_body(&node.finalbody);
            }
            Stmt::Match(node) => {
                self.visit_expr(&node.subject);
                for case in &node.cases {
                    self.branch();
                    if let Some(guard) = &case.guard {
                        self.visit_expr(guard);
                    }
                    self.visit_body(&case.body);
                }
            }
            Stmt::Assert(node) => {
                self.summary.cyclomatic += 1;
                self.visit_expr(&node.test);
            }
            Stmt::With(node) => {
                self.visit_body(&node.body);
            }
            Stmt::FunctionDef(node) => {
                self.visit_body(&node.body);
            }
            Stmt::ClassDef(node) => {
                self.visit_body(&node.body);
            }
            Stmt::Expr(node) => self.visit_expr(&node.value),
            Stmt::Return(node) => {
                if let Some(value) = &node.value {
                    self.visit_expr(value);
                }
            }
            Stmt::Assign(node) => self.visit_expr(&node.value),
            Stmt::AugAssign(node) => self.visit_expr(&node.value),
            Stmt::AnnAssign(node) => {
                if let Some(value) = &node.value {
                    self.visit_expr(value);
                }
            }
            _ => {}
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::BoolOp(node) => {
                // n values joined by and/or add n-1 decision points
                self.summary.cyclomatic += node.values.len().saturating_sub(1);
                for value in &node.values {
                    self.visit_expr(value);
                }
            }
            Expr::If(node) => {
                self.summary.cyclomatic += 1;
                self.visit_expr(&node.test);
                self.visit_expr(&node.body);
                self.visit_expr(&node.orelse);
            }
            Expr::Call(node) => {
                self.visit_expr(&node.func);
                for arg in &node.arguments.args {
                    self.visit_expr(arg);
                }
                for keyword in &node.arguments.keywords {
                    self.visit_expr(&keyword.value);
                }
            }
            Expr::BinOp(node) => {
                self.visit_expr(&node.left);
                self.visit_expr(&node.right);
            }
            Expr::Compare(node) => {
                self.visit_expr(&node.left);
                for comparator in &node.comparators {
                    self.visit_expr(comparator);
                }
            }
            Expr::Attribute(node) => self.visit_expr(&node.value),
            Expr::UnaryOp(node) => self.visit_expr(&node.operand),
            _ => {}
        }
    }
}
