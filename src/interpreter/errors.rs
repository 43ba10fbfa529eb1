//! Evaluation error types
//!
//! [`EvalError`] covers every way evaluation can abort. All of these are
//! fatal: the interpreter is not usable after one is returned, matching raw
//! C semantics where none of these conditions is recoverable mid-expression.
//! Messages are position-free; the two resolution failures that can only
//! happen while parsing (unknown type names, conflicting tag redefinitions)
//! are reported by the parser instead.

use std::fmt;

#[derive(Debug, Clone)]
pub enum EvalError {
    /// An ordinary identifier with no binding in any enclosing scope.
    UnknownIdentifier { name: String },

    /// A call to a name that is neither defined nor declared.
    UnknownFunction { name: String },

    /// Member access named a field the struct does not have.
    UnknownField { name: String },

    /// Assignment or address-of applied to a non-addressable value.
    NotAnLvalue { what: String },

    /// An operation applied to a value of the wrong shape.
    TypeMismatch { expected: String, found: String },

    /// A defined function called with the wrong number of arguments.
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    /// Integer division or remainder by zero.
    DivisionByZero,

    /// A load or store the arena rejected (null page, out of range).
    BadAccess { message: String },

    /// A call frame would collide with the static data region.
    StackOverflow,

    NoMainFunction,

    /// Malformed printf format string or argument list.
    InvalidFormat { message: String },

    /// A construct the evaluator does not support.
    Unsupported { message: String },

    /// The program called `exit`. Not a failure: `run` converts this into
    /// its normal status result.
    Exit { status: i32 },
}

impl EvalError {
    /// Wrap a memory-layer string error.
    pub(crate) fn bad_access(message: String) -> EvalError {
        EvalError::BadAccess { message }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UnknownIdentifier { name } => {
                write!(f, "unknown identifier '{}'", name)
            }
            EvalError::UnknownFunction { name } => {
                write!(f, "call to unknown function '{}'", name)
            }
            EvalError::UnknownField { name } => {
                write!(f, "struct has no member named '{}'", name)
            }
            EvalError::NotAnLvalue { what } => {
                write!(f, "{} is not an lvalue", what)
            }
            EvalError::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {}, found {}", expected, found)
            }
            EvalError::ArityMismatch {
                function,
                expected,
                found,
            } => {
                write!(
                    f,
                    "function '{}' expects {} argument{}, got {}",
                    function,
                    expected,
                    if *expected == 1 { "" } else { "s" },
                    found
                )
            }
            EvalError::DivisionByZero => write!(f, "division by zero"),
            EvalError::BadAccess { message } => write!(f, "invalid memory access: {}", message),
            EvalError::StackOverflow => write!(f, "stack overflow"),
            EvalError::NoMainFunction => write!(f, "no main() function found"),
            EvalError::InvalidFormat { message } => {
                write!(f, "invalid printf call: {}", message)
            }
            EvalError::Unsupported { message } => {
                write!(f, "unsupported operation: {}", message)
            }
            EvalError::Exit { status } => write!(f, "program exited with status {}", status),
        }
    }
}

impl std::error::Error for EvalError {}
