//! The Lattice configuration language.
//!
//! A small declarative language in which every field is a constraint and
//! declarations of the same field unify. This crate provides the pieces an
//! interactive session drives:
//!
//! - [`parse_file`] and [`parse_expr`] turn text into syntax ([`File`],
//!   [`Expr`]).
//! - [`build`] evaluates a set of files into an [`Instance`], whose
//!   [`Value`] is a tree of fields, scalars and errors.
//! - [`format`] renders values and files back to source.
//! - [`load`] discovers project directories and reads `.lat` files.
//!
//! ```
//! use lattice_lang::{build, format, parse_file};
//!
//! let file = parse_file("example", "a: int\na: 1\nb: a + 1").unwrap();
//! let instance = build(&[file]).unwrap();
//! assert_eq!(format::value(instance.value()).unwrap(), "a: 1\nb: 2");
//! ```

pub mod ast;
pub mod builtins;
pub mod error;
pub mod eval;
pub mod format;
pub mod lexer;
pub mod load;
pub mod parser;
pub mod path;
pub mod token;
pub mod unify;
pub mod value;

pub use ast::{Decl, Expr, File, ImportSpec};
pub use error::{EvalError, FormatError, LoadError, ParseError};
pub use eval::{build, Instance};
pub use load::{discover, Project};
pub use parser::{looks_like_declaration, parse_expr, parse_file};
pub use path::Path;
pub use unify::unify;
pub use value::{Kind, Value};
