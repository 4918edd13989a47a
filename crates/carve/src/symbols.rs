//! Symbols: the one calling convention shared by built-ins and user
//! definitions.
//!
//! Every name the evaluator can resolve is a `Symbol`. Built-ins and user
//! definitions use the same variants; dispatch is through `Rc` closures so
//! a user function can capture its declaration-site scope the way a
//! built-in captures nothing.

use std::{fmt, rc::Rc};

use ahash::AHashMap;

use crate::{
    context::EvaluationContext,
    errors::EvalResult,
    lexer::SourceRange,
    types::ValueType,
    value::Value,
};

pub(crate) type SymbolTable = AHashMap<String, Symbol>;

pub(crate) type FunctionImpl = Rc<dyn Fn(Value, &SourceRange, &mut EvaluationContext<'_>) -> EvalResult<Value>>;
pub(crate) type SetterImpl = Rc<dyn Fn(Value, &SourceRange, &mut EvaluationContext<'_>) -> EvalResult<()>>;
pub(crate) type GetterImpl = Rc<dyn Fn(&SourceRange, &mut EvaluationContext<'_>) -> EvalResult<Value>>;
/// Runs against the child context after its body statements have been
/// evaluated, and produces the block's value.
pub(crate) type BlockImpl = Rc<dyn Fn(&SourceRange, &mut EvaluationContext<'_>) -> EvalResult<Value>>;

/// Which pre-built symbol table a block installs for its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum BlockKind {
    Root,
    Shape,
    Group,
    Builder,
    Path,
    PathShape,
    Text,
    /// User-defined blocks and function/definition bodies.
    User,
}

/// A caller-settable slot a block declares.
#[derive(Debug, Clone)]
pub(crate) struct OptionSlot {
    pub value_type: ValueType,
    pub default: Option<Value>,
}

/// The schema of a block: which symbols its body sees, which options it
/// accepts, what its children may be, and what it evaluates to.
#[derive(Debug, Clone)]
pub(crate) struct BlockType {
    pub kind: BlockKind,
    pub options: Rc<AHashMap<String, OptionSlot>>,
    pub child_types: ValueType,
    pub return_type: ValueType,
}

impl BlockType {
    pub fn new(kind: BlockKind, child_types: ValueType, return_type: ValueType) -> Self {
        Self {
            kind,
            options: Rc::new(AHashMap::new()),
            child_types,
            return_type,
        }
    }

    /// Extends a named kind with per-builtin options, e.g. `extrude`
    /// adding `along`.
    pub fn custom(
        kind: BlockKind,
        options: AHashMap<String, OptionSlot>,
        child_types: ValueType,
        return_type: ValueType,
    ) -> Self {
        Self {
            kind,
            options: Rc::new(options),
            child_types,
            return_type,
        }
    }
}

#[derive(Clone)]
pub(crate) enum Symbol {
    Function {
        parameter: ValueType,
        returns: ValueType,
        body: FunctionImpl,
    },
    Property {
        value_type: ValueType,
        setter: SetterImpl,
        getter: GetterImpl,
    },
    Block {
        block_type: Rc<BlockType>,
        body: BlockImpl,
    },
    Constant(Value),
    /// A caller-overridable binding; survives scope pops while the
    /// enclosing block declares an option of the same name.
    Option(Value),
    /// A forward declaration installed by the static pre-pass, or an
    /// inferred parameter. Evaluates to void.
    Placeholder(ValueType),
}

impl Symbol {
    pub fn function(
        parameter: ValueType,
        returns: ValueType,
        body: impl Fn(Value, &SourceRange, &mut EvaluationContext<'_>) -> EvalResult<Value> + 'static,
    ) -> Self {
        Self::Function {
            parameter,
            returns,
            body: Rc::new(body),
        }
    }

    pub fn property(
        value_type: ValueType,
        setter: impl Fn(Value, &SourceRange, &mut EvaluationContext<'_>) -> EvalResult<()> + 'static,
        getter: impl Fn(&SourceRange, &mut EvaluationContext<'_>) -> EvalResult<Value> + 'static,
    ) -> Self {
        Self::Property {
            value_type,
            setter: Rc::new(setter),
            getter: Rc::new(getter),
        }
    }

    pub fn block(
        block_type: BlockType,
        body: impl Fn(&SourceRange, &mut EvaluationContext<'_>) -> EvalResult<Value> + 'static,
    ) -> Self {
        Self::Block {
            block_type: Rc::new(block_type),
            body: Rc::new(body),
        }
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant(value.into())
    }

    /// The type the static analyzer sees for this symbol.
    pub fn static_type(&self) -> ValueType {
        match self {
            Self::Function { returns, .. } => returns.clone(),
            Self::Property { value_type, .. } => value_type.clone(),
            Self::Block { block_type, .. } => block_type.return_type.clone(),
            Self::Constant(value) | Self::Option(value) => value.value_type(),
            Self::Placeholder(value_type) => value_type.clone(),
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function { parameter, returns, .. } => f
                .debug_struct("Function")
                .field("parameter", parameter)
                .field("returns", returns)
                .finish_non_exhaustive(),
            Self::Property { value_type, .. } => f
                .debug_struct("Property")
                .field("value_type", value_type)
                .finish_non_exhaustive(),
            Self::Block { block_type, .. } => f
                .debug_struct("Block")
                .field("block_type", block_type)
                .finish_non_exhaustive(),
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::Option(value) => f.debug_tuple("Option").field(value).finish(),
            Self::Placeholder(ty) => f.debug_tuple("Placeholder").field(ty).finish(),
        }
    }
}
