//! # Introduction
//!
//! `subc` parses and executes a small subset of C with bit-exact layout
//! semantics: struct padding, pointer scaling, and array-to-pointer decay
//! behave exactly as they do in a real compiler, because all program
//! storage lives in one flat byte arena.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Interpreter → status + output
//! ```
//!
//! 1. [`parser`] — tokenises the source and builds the statement tree,
//!    resolving typedef names and struct tags against a scope chain while
//!    parsing (the grammar is not context-free without them).
//! 2. [`types`] — type representation with structural size/alignment and
//!    sequential struct layout with padding.
//! 3. [`scope`] — the scope chain itself: three independent namespaces per
//!    scope (ordinary, typedef, tag) with innermost-first shadowing.
//! 4. [`memory`] — the flat arena, typed loads/stores, scaled pointer
//!    arithmetic, and per-function stack-frame slot layout.
//! 5. [`interpreter`] — walks the tree, resolving ordinary identifiers at
//!    run time, and provides the `printf`/`exit` host collaborators.
//!
//! ## Supported C subset
//!
//! Types: `char`, `short`, `int`, `long`, `_Bool`, `void *`, structs,
//! pointers, fixed-size arrays, typedefs.
//! Statements: declarations, expression statements, blocks, `if/else`,
//! `while`, `for`, `return`, GNU statement expressions `({ ... })`.
//! Expressions: `+ - * /`, comparisons, assignment, unary `& * + -`,
//! `sizeof`, subscripts (including `i[a]`), `.` and `->`, calls.
//! Built-ins: `printf`, `exit`.

pub mod interpreter;
pub mod memory;
pub mod parser;
pub mod scope;
pub mod types;
