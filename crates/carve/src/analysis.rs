//! The static analysis layer: definition gathering and best-effort types.
//!
//! A pre-pass over each scope installs a placeholder for every `define`,
//! so forward references and simple recursion resolve before evaluation
//! reaches them. Expression types are computed compositionally and
//! parameter types are inferred by propagating expectations into function
//! bodies. None of this is sound on its own; the evaluator re-checks
//! every conversion and wins every disagreement.

use ahash::AHashMap;

use crate::{
    ast::{Block, Definition, Expression, ExpressionKind, Identifier, Statement, StatementKind},
    context::EvaluationContext,
    lexer::{InfixOp, PrefixOp},
    symbols::Symbol,
    types::ValueType,
};

/// Installs a placeholder for every definition in `statements`, typed as
/// conservatively as the body allows.
pub(crate) fn gather_definitions(statements: &[Statement], ctx: &mut EvaluationContext<'_>) {
    for statement in statements {
        let StatementKind::Define { name, definition } = &statement.kind else {
            continue;
        };
        let placeholder_type = match definition {
            Definition::Expression(expr) => static_type(expr, ctx),
            Definition::Function { parameters, body } => {
                with_parameter_placeholders(parameters, ctx, |ctx| block_type(body, ctx))
            }
            Definition::Block(body) => block_type(body, ctx),
        };
        ctx.user_symbols
            .insert(name.name.clone(), Symbol::Placeholder(placeholder_type));
    }
}

/// The static type of an expression in the current context. `Any` is an
/// acceptable answer anywhere knowledge runs out.
pub(crate) fn static_type(expression: &Expression, ctx: &EvaluationContext<'_>) -> ValueType {
    match &expression.kind {
        ExpressionKind::Number(_) => ValueType::Number,
        ExpressionKind::String(_) => ValueType::String,
        ExpressionKind::Color(_) => ValueType::Color,
        ExpressionKind::Identifier(name) => ctx
            .lookup(name)
            .map_or(ValueType::Any, |symbol| symbol.static_type()),
        ExpressionKind::Tuple(elements) => {
            if let Some((head, _, _)) = expression.call_head()
                && let Some(symbol @ (Symbol::Function { .. } | Symbol::Block { .. })) = ctx.lookup(head)
            {
                return symbol.static_type();
            }
            ValueType::Tuple(elements.iter().map(|e| static_type(e, ctx)).collect())
        }
        ExpressionKind::Prefix { op: PrefixOp::Not, .. } => ValueType::Boolean,
        ExpressionKind::Prefix { .. } => ValueType::Number,
        ExpressionKind::Infix { lhs, op, rhs } => match op {
            InfixOp::Add | InfixOp::Subtract | InfixOp::Multiply | InfixOp::Divide | InfixOp::Modulo => {
                let (l, r) = (static_type(lhs, ctx), static_type(rhs, ctx));
                if l == ValueType::Number && r == ValueType::Number {
                    ValueType::Number
                } else {
                    // Arithmetic on vectors and lists lifts pointwise.
                    ValueType::list_of(ValueType::Number)
                }
            }
            InfixOp::Less
            | InfixOp::Greater
            | InfixOp::LessEqual
            | InfixOp::GreaterEqual
            | InfixOp::Equal
            | InfixOp::NotEqual
            | InfixOp::And
            | InfixOp::Or => ValueType::Boolean,
            InfixOp::To | InfixOp::Step => ValueType::Range,
            InfixOp::In => ValueType::Any,
        },
        ExpressionKind::Member { receiver, member } => static_type(receiver, ctx)
            .member_type(&member.name)
            .unwrap_or(ValueType::Any),
        ExpressionKind::Block { name, .. } => ctx
            .lookup(&name.name)
            .map_or(ValueType::Any, |symbol| symbol.static_type()),
        ExpressionKind::SubExpression(inner) => static_type(inner, ctx),
    }
}

/// The static type of the values a block produces.
pub(crate) fn block_type(block: &Block, ctx: &EvaluationContext<'_>) -> ValueType {
    let mut produced = Vec::new();
    for statement in &block.statements {
        match &statement.kind {
            StatementKind::Command { name, .. } => {
                if let Some(symbol) = ctx.lookup(&name.name) {
                    match symbol {
                        Symbol::Property { .. } => {}
                        other => produced.push(other.static_type()),
                    }
                }
            }
            StatementKind::Expression(expr) => produced.push(static_type(expr, ctx)),
            StatementKind::ForLoop { body, .. } => {
                produced.push(ValueType::list_of(block_type(body, ctx)));
            }
            StatementKind::IfElse { body, else_body, .. } => {
                produced.push(block_type(body, ctx));
                if let Some(else_body) = else_body {
                    produced.push(block_type(else_body, ctx));
                }
            }
            StatementKind::Import(expr) => produced.push(import_type(expr)),
            StatementKind::Define { .. } | StatementKind::Option { .. } => {}
        }
    }
    produced.retain(|ty| !ty.is_void());
    match produced.len() {
        0 => ValueType::void(),
        1 => produced.remove(0),
        _ => ValueType::union_of(produced),
    }
}

/// Static type of an `import` by extension, when the path is a literal.
fn import_type(path: &Expression) -> ValueType {
    let ExpressionKind::String(path) = &path.kind else {
        return ValueType::Any;
    };
    let extension = std::path::Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("txt") => ValueType::String,
        Some("stl" | "obj" | "ply" | "off") => ValueType::Mesh,
        _ => ValueType::Any,
    }
}

/// Infers parameter types for a user function by walking its body with
/// expectations. Unconstrained parameters come out as `Any`.
pub(crate) fn infer_parameter_types(
    parameters: &[Identifier],
    body: &Block,
    ctx: &mut EvaluationContext<'_>,
) -> Vec<ValueType> {
    let mut inferred: AHashMap<&str, Option<ValueType>> =
        parameters.iter().map(|p| (p.name.as_str(), None)).collect();
    with_parameter_placeholders(parameters, ctx, |ctx| {
        infer_block(body, ctx, &mut inferred);
    });
    parameters
        .iter()
        .map(|p| inferred[p.name.as_str()].clone().unwrap_or(ValueType::Any))
        .collect()
}

fn with_parameter_placeholders<T>(
    parameters: &[Identifier],
    ctx: &mut EvaluationContext<'_>,
    body: impl FnOnce(&mut EvaluationContext<'_>) -> T,
) -> T {
    let snapshot = ctx.user_symbols.clone();
    for parameter in parameters {
        ctx.user_symbols
            .insert(parameter.name.clone(), Symbol::Placeholder(ValueType::Any));
    }
    let result = body(ctx);
    ctx.user_symbols = snapshot;
    result
}

fn infer_block(
    block: &Block,
    ctx: &EvaluationContext<'_>,
    inferred: &mut AHashMap<&str, Option<ValueType>>,
) {
    for statement in &block.statements {
        match &statement.kind {
            StatementKind::Command { name, argument } => {
                if let Some(argument) = argument {
                    let expected = match ctx.lookup(&name.name) {
                        Some(Symbol::Function { parameter, .. }) => parameter,
                        Some(Symbol::Property { value_type, .. }) => value_type,
                        _ => ValueType::Any,
                    };
                    infer_expression(argument, &expected, ctx, inferred);
                }
            }
            StatementKind::Expression(expr) | StatementKind::Import(expr) => {
                infer_expression(expr, &ValueType::Any, ctx, inferred);
            }
            StatementKind::Define { definition, .. } => match definition {
                Definition::Expression(expr) => infer_expression(expr, &ValueType::Any, ctx, inferred),
                Definition::Function { body, .. } | Definition::Block(body) => infer_block(body, ctx, inferred),
            },
            StatementKind::Option { default, .. } => {
                infer_expression(default, &ValueType::Any, ctx, inferred);
            }
            StatementKind::ForLoop { sequence, body, .. } => {
                infer_expression(sequence, &ValueType::Range, ctx, inferred);
                infer_block(body, ctx, inferred);
            }
            StatementKind::IfElse {
                condition,
                body,
                else_body,
            } => {
                infer_expression(condition, &ValueType::Boolean, ctx, inferred);
                infer_block(body, ctx, inferred);
                if let Some(else_body) = else_body {
                    infer_block(else_body, ctx, inferred);
                }
            }
        }
    }
}

fn infer_expression(
    expression: &Expression,
    expected: &ValueType,
    ctx: &EvaluationContext<'_>,
    inferred: &mut AHashMap<&str, Option<ValueType>>,
) {
    match &expression.kind {
        ExpressionKind::Identifier(name) => {
            if let Some(slot) = inferred.get_mut(name.as_str()) {
                *slot = Some(narrow(slot.take(), expected));
            }
        }
        ExpressionKind::Tuple(elements) => {
            // A call propagates the target's parameter tuple into its
            // arguments.
            if let Some((head, _, args)) = expression.call_head()
                && let Some(Symbol::Function { parameter, .. }) = ctx.lookup(head)
            {
                if let ValueType::Tuple(targets) = &parameter {
                    for (arg, target) in args.iter().zip(targets) {
                        infer_expression(arg, target, ctx, inferred);
                    }
                } else {
                    for arg in args {
                        infer_expression(arg, &parameter, ctx, inferred);
                    }
                }
                return;
            }
            for element in elements {
                infer_expression(element, &ValueType::Any, ctx, inferred);
            }
        }
        ExpressionKind::Prefix { op, operand } => {
            let expected = match op {
                PrefixOp::Not => ValueType::Boolean,
                PrefixOp::Plus | PrefixOp::Minus => ValueType::Number,
            };
            infer_expression(operand, &expected, ctx, inferred);
        }
        ExpressionKind::Infix { lhs, op, rhs } => {
            let operand_expectation = match op {
                InfixOp::Add | InfixOp::Subtract | InfixOp::Multiply | InfixOp::Divide | InfixOp::Modulo => {
                    ValueType::union_of([ValueType::Number, ValueType::list_of(ValueType::Number)])
                }
                InfixOp::And | InfixOp::Or => ValueType::Boolean,
                InfixOp::Less | InfixOp::Greater | InfixOp::LessEqual | InfixOp::GreaterEqual => ValueType::Number,
                InfixOp::Equal | InfixOp::NotEqual | InfixOp::In => ValueType::Any,
                InfixOp::To => ValueType::Number,
                InfixOp::Step => ValueType::Number,
            };
            let lhs_expectation = if *op == InfixOp::Step {
                ValueType::Range
            } else {
                operand_expectation.clone()
            };
            infer_expression(lhs, &lhs_expectation, ctx, inferred);
            infer_expression(rhs, &operand_expectation, ctx, inferred);
        }
        ExpressionKind::Member { receiver, .. } => {
            infer_expression(receiver, &ValueType::Any, ctx, inferred);
        }
        ExpressionKind::Block { block, .. } => infer_block(block, ctx, inferred),
        ExpressionKind::SubExpression(inner) => infer_expression(inner, expected, ctx, inferred),
        _ => {}
    }
}

/// Combines an existing narrowing with a new expectation: keep the
/// tighter side where one subsumes the other, union otherwise.
fn narrow(current: Option<ValueType>, expected: &ValueType) -> ValueType {
    match current {
        None => expected.clone(),
        Some(current) => {
            if expected.is_subtype_of(&current) {
                expected.clone()
            } else if current.is_subtype_of(expected) {
                current
            } else {
                ValueType::union_of([current, expected.clone()])
            }
        }
    }
}
