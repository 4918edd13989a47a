//! The abstract syntax tree produced by the parser.
//!
//! Every node carries the half-open byte range of the source it was parsed
//! from; ranges are what diagnostics point at, so they are never empty.

use serde::{Deserialize, Serialize};

use carve_geom::Color;

use crate::lexer::{InfixOp, PrefixOp, SourceRange};

/// A parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub source: String,
    pub statements: Vec<Statement>,
}

/// A name with its location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatementKind {
    /// A leading identifier with an optional expression-list argument.
    Command {
        name: Identifier,
        argument: Option<Expression>,
    },
    Define {
        name: Identifier,
        definition: Definition,
    },
    /// An overridable parameter declaration inside a user block body.
    Option {
        name: Identifier,
        default: Expression,
    },
    ForLoop {
        variable: Option<Identifier>,
        sequence: Expression,
        body: Block,
    },
    IfElse {
        condition: Expression,
        body: Block,
        else_body: Option<Block>,
    },
    Expression(Expression),
    Import(Expression),
}

/// The right-hand side of a `define`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Definition {
    Expression(Expression),
    Function { parameters: Vec<Identifier>, body: Block },
    Block(Block),
}

/// A brace-delimited statement sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionKind {
    Number(f64),
    String(String),
    Color(Color),
    Identifier(String),
    /// An expression list. A tight call `f(a b)` is lowered to a tuple
    /// headed by the identifier, so the evaluator resolves the head and
    /// calls it with the rest as arguments.
    Tuple(Vec<Expression>),
    Prefix {
        op: PrefixOp,
        operand: Box<Expression>,
    },
    Infix {
        lhs: Box<Expression>,
        op: InfixOp,
        rhs: Box<Expression>,
    },
    Member {
        receiver: Box<Expression>,
        member: Identifier,
    },
    /// A block argument: `name { ... }`.
    Block {
        name: Identifier,
        block: Block,
    },
    /// A parenthesised single expression.
    SubExpression(Box<Expression>),
}

impl Expression {
    /// The head identifier when this expression is a call-shaped tuple:
    /// the name, its range, and the argument expressions after it.
    #[must_use]
    pub(crate) fn call_head(&self) -> Option<(&str, &SourceRange, &[Expression])> {
        if let ExpressionKind::Tuple(elements) = &self.kind
            && let Some((first, rest)) = elements.split_first()
            && let ExpressionKind::Identifier(name) = &first.kind
        {
            return Some((name, &first.range, rest));
        }
        None
    }
}
