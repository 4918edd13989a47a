//! An interpreter for the Carve declarative solid-modeling language.
//!
//! A source program is parsed to an AST and evaluated to a [`Scene`] of
//! geometry nodes that downstream code renders or exports. The pipeline
//! is: lexer, recursive-descent parser, best-effort static analysis, and
//! a tree-walking evaluator over a scoped symbol environment, with
//! user-defined functions and blocks, a module import system with cycle
//! detection, and structured diagnostics with fuzzy suggestions.
//!
//! ```
//! use carve::{evaluate, parse, FileSystemDelegate};
//!
//! let program = parse("cube { size 2 }").unwrap();
//! let scene = evaluate(&program, &FileSystemDelegate, None, &|| false).unwrap();
//! assert_eq!(scene.children.len(), 1);
//! ```

mod analysis;
mod ast;
mod context;
mod errors;
mod eval;
mod imports;
mod lexer;
mod parser;
mod random;
mod stdlib;
mod symbols;
mod types;
mod value;

pub use carve_geom as geom;
pub use carve_geom::{Geometry, GeometryCache, GeometryKind, Scene};

pub use crate::{
    ast::{Block, Definition, Expression, ExpressionKind, Identifier, Program, Statement, StatementKind},
    errors::{
        LexerError, LexerErrorKind, ParserError, ProgramError, RuntimeError, RuntimeErrorKind,
    },
    eval::{evaluate, evaluate_at},
    imports::{CollectLog, FileSystemDelegate, ImportDelegate},
    lexer::{InfixOp, Keyword, PrefixOp, SourceRange, Token, TokenKind},
    parser::parse,
    types::ValueType,
    value::{format_number, RangeValue, Value},
};
