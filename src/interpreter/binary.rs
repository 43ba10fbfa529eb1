//! Binary operators
//!
//! Integer operands participate as sign-extended 64-bit values (narrow
//! scalars were widened when loaded); arithmetic results are 8-byte signed.
//! Comparisons always produce a 4-byte signed 0 or 1.
//!
//! Pointer arithmetic is where the scaling lives: `p + n` advances by
//! `n * sizeof(*p)` bytes and works with the integer on either side, which
//! also covers subscripts since `a[i]` and `i[a]` both arrive here as
//! `a + i`. `p - q` is an element count, not a byte count.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::EvalError;
use crate::memory::value::Value;
use crate::memory::{pointer_add, pointer_diff};
use crate::parser::ast::{BinOp, Expr};

impl Interpreter {
    pub(crate) fn eval_binary(
        &mut self,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<Value, EvalError> {
        let lhs = self.eval_expr(lhs)?;
        let rhs = self.eval_expr(rhs)?;

        match op {
            BinOp::Add => self.add_values(lhs, rhs),
            BinOp::Sub => self.sub_values(lhs, rhs),
            BinOp::Mul => {
                let (a, b) = expect_integers(&lhs, &rhs, "*")?;
                Ok(Value::long(a.wrapping_mul(b)))
            }
            BinOp::Div => {
                let (a, b) = expect_integers(&lhs, &rhs, "/")?;
                if b == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                Ok(Value::long(a.wrapping_div(b)))
            }
            BinOp::Eq => Ok(compare(&lhs, &rhs, |a, b| a == b)),
            BinOp::Ne => Ok(compare(&lhs, &rhs, |a, b| a != b)),
            BinOp::Lt => Ok(compare(&lhs, &rhs, |a, b| a < b)),
            BinOp::Le => Ok(compare(&lhs, &rhs, |a, b| a <= b)),
            BinOp::Gt => Ok(compare(&lhs, &rhs, |a, b| a > b)),
            BinOp::Ge => Ok(compare(&lhs, &rhs, |a, b| a >= b)),
        }
    }

    fn add_values(&self, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
        // Pointer + integer, with the integer on either side.
        let (ptr, offset) = if lhs.ty.is_pointer() && rhs.ty.is_integer() {
            (lhs, rhs)
        } else if rhs.ty.is_pointer() && lhs.ty.is_integer() {
            (rhs, lhs)
        } else if lhs.ty.is_integer() && rhs.ty.is_integer() {
            return Ok(Value::long(lhs.bits.wrapping_add(rhs.bits)));
        } else {
            return Err(EvalError::TypeMismatch {
                expected: "integer or pointer operands for +".to_string(),
                found: format!("{} + {}", lhs.ty, rhs.ty),
            });
        };

        let elem = ptr.ty.pointee().expect("checked pointer").size();
        let bits = pointer_add(ptr.bits, offset.bits, elem);
        Ok(Value::new(ptr.ty, bits))
    }

    fn sub_values(&self, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
        if lhs.ty.is_pointer() {
            let elem = lhs.ty.pointee().expect("checked pointer").size();
            if rhs.ty.is_integer() {
                let bits = pointer_add(lhs.bits, rhs.bits.wrapping_neg(), elem);
                return Ok(Value::new(lhs.ty, bits));
            }
            if rhs.ty.is_pointer() {
                return Ok(Value::long(pointer_diff(lhs.bits, rhs.bits, elem)));
            }
        }
        if lhs.ty.is_integer() && rhs.ty.is_integer() {
            return Ok(Value::long(lhs.bits.wrapping_sub(rhs.bits)));
        }
        Err(EvalError::TypeMismatch {
            expected: "integer or pointer operands for -".to_string(),
            found: format!("{} - {}", lhs.ty, rhs.ty),
        })
    }
}

fn expect_integers(lhs: &Value, rhs: &Value, op: &str) -> Result<(i64, i64), EvalError> {
    if lhs.ty.is_integer() && rhs.ty.is_integer() {
        return Ok((lhs.bits, rhs.bits));
    }
    Err(EvalError::TypeMismatch {
        expected: format!("integer operands for {}", op),
        found: format!("{} {} {}", lhs.ty, op, rhs.ty),
    })
}

fn compare(lhs: &Value, rhs: &Value, cmp: fn(i64, i64) -> bool) -> Value {
    Value::int(cmp(lhs.bits, rhs.bits) as i64)
}
