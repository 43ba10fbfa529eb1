//! Statement execution
//!
//! Statements execute against the current scope chain and frame. Each
//! statement yields a [`Flow`]: either normal completion (carrying the
//! statement's value, if it has one, so statement expressions can pick up
//! the value of their last statement) or an early `return` unwinding to the
//! enclosing call.
//!
//! Blocks are strictly stack-disciplined: a scope is entered on every `{`
//! and left on every exit path, including `return`.

use crate::interpreter::engine::{Interpreter, Symbol};
use crate::interpreter::errors::EvalError;
use crate::memory::value::Value;
use crate::parser::ast::{DeclItem, Stmt};

/// Result of executing one statement.
pub(crate) enum Flow {
    /// Fall through to the next statement. Expression statements carry
    /// their value.
    Normal(Option<Value>),
    /// A `return` unwinding out of the current function.
    Return(Value),
}

impl Interpreter {
    pub(crate) fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, EvalError> {
        match stmt {
            Stmt::Expr(expr) => Ok(Flow::Normal(Some(self.eval_expr(expr)?))),

            Stmt::Decl(items) => {
                for item in items {
                    self.exec_decl(item)?;
                }
                Ok(Flow::Normal(None))
            }

            Stmt::Block(stmts) => self.exec_block(stmts),

            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval_expr(cond)?.is_truthy() {
                    if let Flow::Return(v) = self.exec_stmt(then_branch)? {
                        return Ok(Flow::Return(v));
                    }
                } else if let Some(else_branch) = else_branch {
                    if let Flow::Return(v) = self.exec_stmt(else_branch)? {
                        return Ok(Flow::Return(v));
                    }
                }
                Ok(Flow::Normal(None))
            }

            Stmt::While { cond, body } => {
                while self.eval_expr(cond)?.is_truthy() {
                    if let Flow::Return(v) = self.exec_stmt(body)? {
                        return Ok(Flow::Return(v));
                    }
                }
                Ok(Flow::Normal(None))
            }

            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.eval_expr(init)?;
                }
                loop {
                    if let Some(cond) = cond {
                        if !self.eval_expr(cond)?.is_truthy() {
                            break;
                        }
                    }
                    if let Flow::Return(v) = self.exec_stmt(body)? {
                        return Ok(Flow::Return(v));
                    }
                    if let Some(step) = step {
                        self.eval_expr(step)?;
                    }
                }
                Ok(Flow::Normal(None))
            }

            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::int(0),
                };
                Ok(Flow::Return(value))
            }

            Stmt::Empty => Ok(Flow::Normal(None)),
        }
    }

    /// Execute a block's statements in a fresh scope, yielding the value of
    /// the last statement for statement-expression use.
    pub(crate) fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Flow, EvalError> {
        self.scopes.enter();
        let mut last = None;
        for stmt in stmts {
            match self.exec_stmt(stmt)? {
                Flow::Return(v) => {
                    self.scopes.leave();
                    return Ok(Flow::Return(v));
                }
                Flow::Normal(v) => last = v,
            }
        }
        self.scopes.leave();
        Ok(Flow::Normal(last))
    }

    /// Bind a declaration to its precomputed frame slot and run the
    /// initializer as a store.
    fn exec_decl(&mut self, item: &DeclItem) -> Result<(), EvalError> {
        let func = self.cur_fn.clone().ok_or_else(|| EvalError::Unsupported {
            message: "declaration outside of a function".to_string(),
        })?;
        let addr = func.layout.slot_addr(self.frame_base, item.slot);
        self.scopes.declare_ordinary(
            &item.name,
            Symbol {
                ty: item.ty.clone(),
                addr,
            },
        );
        if let Some(init) = &item.init {
            let value = self.eval_expr(init)?;
            self.memory
                .store_scalar(addr, &item.ty, value.bits)
                .map_err(EvalError::bad_access)?;
        }
        Ok(())
    }
}
