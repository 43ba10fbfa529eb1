//! Side-effect-free type inference
//!
//! `sizeof(expr)` needs the type of its operand without running it: any
//! assignment or call inside the operand must not execute. This module
//! computes that type from the expression shape and the current scopes
//! alone.
//!
//! The rules mirror evaluation: identifiers keep their declared type (no
//! decay, so `sizeof x` of an `int[4]` is 16), dereferencing decays the
//! operand first, and arithmetic follows the evaluator's result widths
//! (8-byte signed for `+ - * /`, 4-byte signed for comparisons, pointer
//! results for scaled pointer arithmetic).

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::EvalError;
use crate::parser::ast::{BinOp, Expr, Stmt, UnOp};
use crate::types::{Ty, TyKind};

impl Interpreter {
    pub(crate) fn infer_type(&self, expr: &Expr) -> Result<Ty, EvalError> {
        match expr {
            Expr::Num(_) => Ok(Ty::int()),

            Expr::Str { len, .. } => Ok(Ty::array_of(Ty::char(), *len)),

            Expr::Ident(name) => self
                .scopes
                .resolve_ordinary(name)
                .map(|sym| sym.ty.clone())
                .ok_or_else(|| EvalError::UnknownIdentifier { name: name.clone() }),

            Expr::Unary { op, operand } => match op {
                UnOp::Neg => Ok(Ty::long()),
                UnOp::Addr => Ok(Ty::ptr_to(self.infer_type(operand)?)),
                UnOp::Deref => {
                    let ty = self.infer_type(operand)?.decay();
                    match &ty.kind {
                        TyKind::Ptr { base } => Ok(base.as_ref().clone()),
                        _ => Err(EvalError::TypeMismatch {
                            expected: "pointer".to_string(),
                            found: ty.to_string(),
                        }),
                    }
                }
            },

            Expr::Binary { op, lhs, rhs } => match op {
                BinOp::Add | BinOp::Sub => {
                    let lhs = self.infer_type(lhs)?.decay();
                    let rhs = self.infer_type(rhs)?.decay();
                    if lhs.is_pointer() && rhs.is_pointer() {
                        return Ok(Ty::long()); // pointer difference
                    }
                    if lhs.is_pointer() {
                        return Ok(lhs);
                    }
                    if rhs.is_pointer() && *op == BinOp::Add {
                        return Ok(rhs);
                    }
                    Ok(Ty::long())
                }
                BinOp::Mul | BinOp::Div => Ok(Ty::long()),
                _ => Ok(Ty::int()), // comparisons
            },

            Expr::Assign { target, .. } => self.infer_type(target),

            Expr::Member { base, field } => {
                let base_ty = self.infer_type(base)?;
                let TyKind::Struct(def) = &base_ty.kind else {
                    return Err(EvalError::TypeMismatch {
                        expected: "struct".to_string(),
                        found: base_ty.to_string(),
                    });
                };
                def.field(field)
                    .map(|f| f.ty.clone())
                    .ok_or_else(|| EvalError::UnknownField {
                        name: field.clone(),
                    })
            }

            Expr::Call { name, .. } => {
                if let Some(func) = self.funcs.get(name) {
                    return Ok(func.ret_ty.clone());
                }
                if self.externs.contains(name) {
                    return Ok(Ty::int());
                }
                Err(EvalError::UnknownFunction {
                    name: name.clone(),
                })
            }

            Expr::StmtExpr(stmts) => match stmts.last() {
                Some(Stmt::Expr(last)) => self.infer_type(last),
                _ => Err(EvalError::Unsupported {
                    message: "sizeof of a statement expression without a value".to_string(),
                }),
            },

            Expr::SizeofExpr(_) | Expr::SizeofType(_) => Ok(Ty::long()),
        }
    }
}
