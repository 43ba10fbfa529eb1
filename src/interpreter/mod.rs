//! Tree-walking evaluator
//!
//! This module provides the execution half of the crate:
//! - [`engine`]: interpreter state, globals, calls, and the `run` entry
//! - [`statements`]: statement execution and control flow
//! - [`expressions`]: expression evaluation, lvalues, loads and stores
//! - [`binary`]: arithmetic and comparisons, including pointer scaling
//! - [`type_system`]: side-effect-free inference backing `sizeof`
//! - [`builtins`]: the `printf`/`exit` host collaborators
//! - [`errors`]: the evaluation error taxonomy
//!
//! Evaluation is single-threaded and synchronous; side effects land in the
//! exact source order of the program, and scope entry/exit follows block
//! nesting last-in-first-out.

pub mod binary;
pub mod builtins;
pub mod engine;
pub mod errors;
pub mod expressions;
pub mod statements;
pub mod type_system;
