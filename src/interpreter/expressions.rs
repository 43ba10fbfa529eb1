//! Expression evaluation
//!
//! Every expression evaluates to a [`Value`], or to an [`Lvalue`] where the
//! grammar requires a storage location (assignment targets, `&` operands,
//! member bases). Reading an lvalue of array type does not load anything:
//! the array decays to a pointer to its first element. Reading a scalar
//! lvalue loads and sign-extends from the arena.
//!
//! Subscripts arrive from the parser already desugared to `*(base + index)`
//! and `->` to `(*p).f`, so the address computations here reduce to three
//! operations: dereference, member offset, and scaled pointer arithmetic.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::EvalError;
use crate::interpreter::statements::Flow;
use crate::memory::value::{Lvalue, Value};
use crate::parser::ast::{Expr, UnOp};
use crate::types::{Ty, TyKind};

impl Interpreter {
    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Num(value) => Ok(Value::int(*value)),

            // A string literal is a pointer to its interned bytes.
            Expr::Str { id, .. } => Ok(Value::new(
                Ty::ptr_to(Ty::char()),
                self.string_addrs[*id] as i64,
            )),

            Expr::Ident(_) | Expr::Member { .. } => {
                let lvalue = self.eval_lvalue(expr)?;
                self.read_lvalue(lvalue)
            }

            Expr::Unary { op, operand } => match op {
                UnOp::Deref => {
                    let lvalue = self.eval_lvalue(expr)?;
                    self.read_lvalue(lvalue)
                }
                UnOp::Addr => {
                    let lvalue = self.eval_lvalue(operand)?;
                    Ok(Value::new(Ty::ptr_to(lvalue.ty), lvalue.addr as i64))
                }
                UnOp::Neg => {
                    let value = self.eval_expr(operand)?;
                    if !value.ty.is_integer() {
                        return Err(EvalError::TypeMismatch {
                            expected: "integer".to_string(),
                            found: value.ty.to_string(),
                        });
                    }
                    Ok(Value::long(value.bits.wrapping_neg()))
                }
            },

            Expr::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs),

            Expr::Assign { target, value } => {
                let lvalue = self.eval_lvalue(target)?;
                if lvalue.ty.is_struct() {
                    return Err(EvalError::TypeMismatch {
                        expected: "scalar assignment target".to_string(),
                        found: "struct".to_string(),
                    });
                }
                let value = self.eval_expr(value)?;
                let stored = self
                    .memory
                    .store_scalar(lvalue.addr, &lvalue.ty, value.bits)
                    .map_err(EvalError::bad_access)?;
                Ok(Value::new(lvalue.ty, stored))
            }

            Expr::Call { name, args } => self.eval_call(name, args),

            Expr::StmtExpr(stmts) => match self.exec_block(stmts)? {
                Flow::Normal(Some(value)) => Ok(value),
                Flow::Normal(None) => Err(EvalError::Unsupported {
                    message: "statement expression has no value".to_string(),
                }),
                Flow::Return(_) => Err(EvalError::Unsupported {
                    message: "return inside a statement expression".to_string(),
                }),
            },

            // sizeof types its operand without evaluating it, so operand
            // side effects never run.
            Expr::SizeofExpr(operand) => {
                let ty = self.infer_type(operand)?;
                Ok(Value::long(ty.size() as i64))
            }
            Expr::SizeofType(ty) => Ok(Value::long(ty.size() as i64)),
        }
    }

    /// Evaluate an expression in lvalue position.
    pub(crate) fn eval_lvalue(&mut self, expr: &Expr) -> Result<Lvalue, EvalError> {
        match expr {
            Expr::Ident(name) => {
                let symbol =
                    self.scopes
                        .resolve_ordinary(name)
                        .ok_or_else(|| EvalError::UnknownIdentifier {
                            name: name.clone(),
                        })?;
                Ok(Lvalue::new(symbol.ty.clone(), symbol.addr))
            }

            // The dereferenced location has the pointer's static pointee
            // type, whatever the provenance of the address.
            Expr::Unary {
                op: UnOp::Deref,
                operand,
            } => {
                let value = self.eval_expr(operand)?;
                match &value.ty.kind {
                    TyKind::Ptr { base } => Ok(Lvalue::new(base.as_ref().clone(), value.addr())),
                    _ => Err(EvalError::TypeMismatch {
                        expected: "pointer".to_string(),
                        found: value.ty.to_string(),
                    }),
                }
            }

            Expr::Member { base, field } => {
                let base = self.eval_lvalue(base)?;
                let TyKind::Struct(def) = &base.ty.kind else {
                    return Err(EvalError::TypeMismatch {
                        expected: "struct".to_string(),
                        found: base.ty.to_string(),
                    });
                };
                let member = def.field(field).ok_or_else(|| EvalError::UnknownField {
                    name: field.clone(),
                })?;
                Ok(Lvalue::new(
                    member.ty.clone(),
                    base.addr + member.offset as u64,
                ))
            }

            other => Err(EvalError::NotAnLvalue {
                what: describe(other).to_string(),
            }),
        }
    }

    /// Convert an lvalue to a value: arrays decay to a pointer to their
    /// first element, scalars load from the arena.
    pub(crate) fn read_lvalue(&mut self, lvalue: Lvalue) -> Result<Value, EvalError> {
        match &lvalue.ty.kind {
            TyKind::Array { .. } => Ok(Value::new(lvalue.ty.decay(), lvalue.addr as i64)),
            TyKind::Struct(_) | TyKind::Func(_) => Err(EvalError::TypeMismatch {
                expected: "scalar".to_string(),
                found: lvalue.ty.to_string(),
            }),
            _ => {
                let bits = self
                    .memory
                    .load_scalar(lvalue.addr, &lvalue.ty)
                    .map_err(EvalError::bad_access)?;
                Ok(Value::new(lvalue.ty, bits))
            }
        }
    }
}

fn describe(expr: &Expr) -> &'static str {
    match expr {
        Expr::Num(_) => "a numeric literal",
        Expr::Str { .. } => "a string literal",
        Expr::Call { .. } => "a function call result",
        Expr::Assign { .. } => "an assignment",
        Expr::Binary { .. } | Expr::Unary { .. } => "an arithmetic result",
        _ => "this expression",
    }
}
