//! wisp is a tiny embeddable scripting language: a single-pass lexer, a
//! recursive-descent parser, and a tree-walking interpreter over a
//! dynamically-typed value model with shared-handle tables and arrays.
//!
//! A host loads a script into a [`Runner`], registers native functions,
//! evaluates the program once, and then calls script functions and reads
//! globals back as [`Object`]s — the shape a 2-D game loop wants:
//!
//! ```
//! use wisp::{CollectStringPrint, Runner};
//!
//! let mut runner = Runner::new("print 1 + 2 * 3;", "demo.wisp").unwrap();
//! let mut print = CollectStringPrint::new();
//! runner.run(&mut print).unwrap();
//! assert_eq!(print.output(), "7.000000\n");
//! ```

mod builtins;
mod error;
mod expressions;
mod function;
mod heap;
mod interp;
mod io;
mod lex;
mod natives;
mod object;
mod parse;
mod run;
mod scopes;
mod value;

pub use crate::{
    error::{CodeLoc, ErrorKind, Exception},
    function::FnId,
    heap::{Heap, HeapData, HeapId},
    io::{CollectStringPrint, NoPrint, PrintWriter, StdPrint},
    natives::{NativeCallable, NativeFnId},
    object::Object,
    run::Runner,
    value::Value,
};
