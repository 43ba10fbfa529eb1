//! Built-in host collaborators
//!
//! Declared, body-less functions are provided by the interpreter itself:
//!
//! - `printf(fmt, ...)` with the `%s %d %ld %c %%` conversions. The format
//!   string is read back out of program memory, so any `char *` value works
//!   as the format argument, not just a literal.
//! - `exit(status)` terminates evaluation; `run` converts it into the
//!   normal status result.
//!
//! Output goes to a [`Console`] buffer so harnesses and tests can inspect
//! it after the run.

use crate::interpreter::engine::Interpreter;
use crate::interpreter::errors::EvalError;
use crate::memory::value::Value;

/// Captured program output.
#[derive(Debug, Default)]
pub struct Console {
    buffer: String,
}

impl Console {
    pub fn new() -> Console {
        Console::default()
    }

    pub fn print(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub fn output(&self) -> &str {
        &self.buffer
    }
}

impl Interpreter {
    pub(crate) fn builtin_printf(&mut self, args: &[Value]) -> Result<Value, EvalError> {
        let format = args.first().ok_or_else(|| EvalError::InvalidFormat {
            message: "printf requires a format string".to_string(),
        })?;
        let format = self
            .memory
            .load_cstr(format.addr())
            .map_err(EvalError::bad_access)?;

        let mut out = String::new();
        let mut args = args[1..].iter();
        let mut bytes = format.iter().copied();

        while let Some(byte) = bytes.next() {
            if byte != b'%' {
                out.push(byte as char);
                continue;
            }
            let mut spec = bytes.next().ok_or_else(|| EvalError::InvalidFormat {
                message: "format string ends with '%'".to_string(),
            })?;
            // %ld prints the same 64-bit payload %d would.
            if spec == b'l' {
                spec = bytes.next().ok_or_else(|| EvalError::InvalidFormat {
                    message: "incomplete '%l' conversion".to_string(),
                })?;
            }
            match spec {
                b'%' => out.push('%'),
                b'd' => {
                    let arg = next_arg(&mut args, "%d")?;
                    out.push_str(&arg.bits.to_string());
                }
                b'c' => {
                    let arg = next_arg(&mut args, "%c")?;
                    out.push((arg.bits as u8) as char);
                }
                b's' => {
                    let arg = next_arg(&mut args, "%s")?;
                    let text = self
                        .memory
                        .load_cstr(arg.addr())
                        .map_err(EvalError::bad_access)?;
                    out.extend(text.iter().map(|&b| b as char));
                }
                other => {
                    return Err(EvalError::InvalidFormat {
                        message: format!("unsupported conversion '%{}'", other as char),
                    });
                }
            }
        }

        self.console.print(&out);
        Ok(Value::int(out.len() as i64))
    }

    pub(crate) fn builtin_exit(&mut self, args: &[Value]) -> Result<Value, EvalError> {
        let status = args.first().map(|v| v.bits as i32).unwrap_or(0);
        Err(EvalError::Exit { status })
    }
}

fn next_arg<'a>(
    args: &mut impl Iterator<Item = &'a Value>,
    spec: &str,
) -> Result<&'a Value, EvalError> {
    args.next().ok_or_else(|| EvalError::InvalidFormat {
        message: format!("not enough arguments for {}", spec),
    })
}
