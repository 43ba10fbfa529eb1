//! Execution engine
//!
//! [`Interpreter`] owns all evaluation state: the byte arena, the scope
//! chain for ordinary identifiers, the function table, and the current
//! stack frame. Construction allocates the static data region (globals and
//! interned string literals); [`Interpreter::run`] then evaluates `main`
//! and yields the process status.
//!
//! Calls are strictly stack-disciplined. Entering a function detaches the
//! caller's local scopes (the callee sees only globals plus its own frame),
//! carves a frame below the current stack pointer, stores the evaluated
//! arguments into the parameter slots, and restores everything on the way
//! out. Storage addresses never move once assigned.

use crate::interpreter::errors::EvalError;
use crate::interpreter::statements::Flow;
use crate::memory::value::{truncate_bits, Value};
use crate::memory::{Memory, DATA_BASE, STACK_TOP};
use crate::parser::ast::{Expr, Function, Program};
use crate::scope::ScopeChain;
use crate::types::{align_to, Ty};
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

use super::builtins::Console;

/// A declared variable bound to its storage.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub ty: Ty,
    pub addr: u64,
}

/// The tree-walking interpreter.
pub struct Interpreter {
    pub(crate) memory: Memory,
    pub(crate) scopes: ScopeChain<Symbol>,
    pub(crate) funcs: FxHashMap<String, Rc<Function>>,
    pub(crate) externs: FxHashSet<String>,
    pub(crate) string_addrs: Vec<u64>,
    pub(crate) console: Console,

    /// Function whose frame is active, if any.
    pub(crate) cur_fn: Option<Rc<Function>>,
    pub(crate) frame_base: u64,
    sp: u64,
    /// First address past the static data region; frames must stay above it.
    data_end: u64,
}

impl Interpreter {
    /// Build an interpreter for a parsed program. Globals are allocated in
    /// the static region (zero-initialized) and string literals are copied
    /// in, each at a fixed address for the life of the process.
    pub fn new(program: Program) -> Result<Interpreter, EvalError> {
        let mut memory = Memory::new();
        let mut scopes = ScopeChain::new();
        let mut cursor = DATA_BASE;

        for global in &program.globals {
            cursor = align_to(cursor as usize, global.ty.align()) as u64;
            scopes.declare_ordinary(
                &global.name,
                Symbol {
                    ty: global.ty.clone(),
                    addr: cursor,
                },
            );
            cursor += global.ty.size() as u64;
        }

        let mut string_addrs = Vec::with_capacity(program.strings.len());
        for bytes in &program.strings {
            memory
                .write_bytes(cursor, bytes)
                .map_err(EvalError::bad_access)?;
            string_addrs.push(cursor);
            cursor += bytes.len() as u64;
        }

        if cursor > STACK_TOP / 2 {
            return Err(EvalError::BadAccess {
                message: "static data region overflow".to_string(),
            });
        }

        let mut funcs = FxHashMap::default();
        for func in program.funcs {
            funcs.insert(func.name.clone(), Rc::new(func));
        }

        Ok(Interpreter {
            memory,
            scopes,
            funcs,
            externs: program.externs.into_iter().collect(),
            string_addrs,
            console: Console::new(),
            cur_fn: None,
            frame_base: STACK_TOP,
            sp: STACK_TOP,
            data_end: cursor,
        })
    }

    /// Evaluate `main` and return the process status: either `main`'s
    /// return value or the argument of an `exit` call.
    pub fn run(&mut self) -> Result<i64, EvalError> {
        let main_fn = self
            .funcs
            .get("main")
            .cloned()
            .ok_or(EvalError::NoMainFunction)?;
        match self.call_function(main_fn, Vec::new()) {
            Ok(value) => Ok(value.bits),
            Err(EvalError::Exit { status }) => Ok(status as i64),
            Err(err) => Err(err),
        }
    }

    /// Call a defined function by name with integer arguments. Arguments
    /// are truncated to the parameter types on binding, like any call.
    pub fn call(&mut self, name: &str, args: &[i64]) -> Result<Value, EvalError> {
        let func = self
            .funcs
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownFunction {
                name: name.to_string(),
            })?;
        let args = args.iter().map(|&bits| Value::long(bits)).collect();
        self.call_function(func, args)
    }

    /// Everything printed through `printf` so far.
    pub fn output(&self) -> &str {
        self.console.output()
    }

    pub(crate) fn call_function(
        &mut self,
        func: Rc<Function>,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        if args.len() != func.params.len() {
            return Err(EvalError::ArityMismatch {
                function: func.name.clone(),
                expected: func.params.len(),
                found: args.len(),
            });
        }

        let size = func.layout.size();
        if size > self.sp || self.sp - size < self.data_end {
            return Err(EvalError::StackOverflow);
        }

        let saved_scopes = self.scopes.save_locals();
        let saved_base = self.frame_base;
        let saved_sp = self.sp;
        let saved_fn = self.cur_fn.take();

        self.frame_base = self.sp;
        self.sp -= size;
        self.cur_fn = Some(Rc::clone(&func));
        self.scopes.enter();

        for (param, arg) in func.params.iter().zip(args) {
            let addr = func.layout.slot_addr(self.frame_base, param.slot);
            self.memory
                .store_scalar(addr, &param.ty, arg.bits)
                .map_err(EvalError::bad_access)?;
            self.scopes.declare_ordinary(
                &param.name,
                Symbol {
                    ty: param.ty.clone(),
                    addr,
                },
            );
        }

        let mut result = Value::new(func.ret_ty.clone(), 0);
        for stmt in &func.body {
            if let Flow::Return(value) = self.exec_stmt(stmt)? {
                result = value;
                break;
            }
        }
        let result = Value::new(
            func.ret_ty.clone(),
            truncate_bits(&func.ret_ty, result.bits),
        );

        self.scopes.leave();
        self.scopes.restore_locals(saved_scopes);
        self.frame_base = saved_base;
        self.sp = saved_sp;
        self.cur_fn = saved_fn;
        Ok(result)
    }

    /// Resolve and perform a call expression: defined functions first, then
    /// the declared host collaborators.
    pub(crate) fn eval_call(&mut self, name: &str, arg_exprs: &[Expr]) -> Result<Value, EvalError> {
        let mut args = Vec::with_capacity(arg_exprs.len());
        for expr in arg_exprs {
            args.push(self.eval_expr(expr)?);
        }

        if let Some(func) = self.funcs.get(name).cloned() {
            return self.call_function(func, args);
        }
        if self.externs.contains(name) {
            return match name {
                "printf" => self.builtin_printf(&args),
                "exit" => self.builtin_exit(&args),
                _ => Err(EvalError::Unsupported {
                    message: format!("no host implementation for '{}'", name),
                }),
            };
        }
        Err(EvalError::UnknownFunction {
            name: name.to_string(),
        })
    }
}
