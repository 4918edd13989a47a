//! The tree-walking evaluator.
//!
//! Statements run in textual order against one mutable context. A
//! definition-gathering pre-pass installs placeholders at each scope
//! entry so forward references resolve; binding itself is strictly left
//! to right. Cancellation is polled at top-level statements, loop
//! iterations, user block entry, and imported statements, and unwinds
//! through the private sentinel that only [`evaluate`] swallows.

use std::{cell::RefCell, path::PathBuf, rc::Rc};

use ahash::AHashMap;

use carve_geom::{GeometryCache, Scene};

use crate::{
    analysis,
    ast::{Block, Definition, Expression, ExpressionKind, Identifier, Program, Statement, StatementKind},
    context::EvaluationContext,
    errors::{EvalInterrupt, EvalResult, RuntimeError, RuntimeErrorKind},
    imports::{self, ImportDelegate},
    lexer::{InfixOp, PrefixOp, SourceRange},
    stdlib,
    symbols::{BlockKind, BlockType, OptionSlot, Symbol, SymbolTable},
    types::ValueType,
    value::{RangeValue, Value},
};

/// Evaluates a program to a scene.
///
/// Cancellation is cooperative: when `is_cancelled` reports true the
/// evaluation unwinds and returns the partial scene built so far, with no
/// error.
pub fn evaluate(
    program: &Program,
    delegate: &dyn ImportDelegate,
    cache: Option<GeometryCache>,
    is_cancelled: &dyn Fn() -> bool,
) -> Result<Scene, RuntimeError> {
    evaluate_at(program, None, delegate, cache, is_cancelled)
}

/// Like [`evaluate`], with a known URL for the program source so relative
/// imports resolve against it.
pub fn evaluate_at(
    program: &Program,
    base_url: Option<PathBuf>,
    delegate: &dyn ImportDelegate,
    cache: Option<GeometryCache>,
    is_cancelled: &dyn Fn() -> bool,
) -> Result<Scene, RuntimeError> {
    let source: Rc<str> = program.source.as_str().into();
    let mut ctx = EvaluationContext::new_root(
        delegate,
        is_cancelled,
        source,
        base_url,
        cache.unwrap_or_default(),
    );
    if let Some(url) = &ctx.base_url {
        ctx.import_stack.borrow_mut().push(url.clone());
    }
    match run_statements(&mut ctx, &program.statements, true) {
        Ok(()) | Err(EvalInterrupt::Cancelled) => {}
        Err(EvalInterrupt::Error(error)) => return Err(*error),
    }
    Ok(assemble_scene(ctx))
}

fn assemble_scene(mut ctx: EvaluationContext<'_>) -> Scene {
    let children = stdlib::mesh_children(&mut ctx);
    let mut cameras = Vec::new();
    for child in &children {
        child.walk(&mut |node| {
            if node.is_camera() {
                cameras.push(node.clone());
            }
        });
    }
    Scene {
        background: ctx.background.take(),
        children,
        cameras,
        named_objects: std::mem::take(&mut ctx.named_objects),
        cache: ctx.geometry_cache.clone(),
    }
}

/// Runs a statement list: gathers definitions first, then executes in
/// order. With `check_cancel`, polls cancellation before each statement
/// (top-level and imported files).
pub(crate) fn run_statements(
    ctx: &mut EvaluationContext<'_>,
    statements: &[Statement],
    check_cancel: bool,
) -> EvalResult<()> {
    analysis::gather_definitions(statements, ctx);
    for statement in statements {
        if check_cancel {
            ctx.check_cancelled()?;
        }
        evaluate_statement(ctx, statement)?;
    }
    Ok(())
}

pub(crate) fn evaluate_statement(ctx: &mut EvaluationContext<'_>, statement: &Statement) -> EvalResult<()> {
    match &statement.kind {
        StatementKind::Command { name, argument } => {
            evaluate_command(ctx, name, argument.as_ref(), &statement.range)
        }
        StatementKind::Define { name, definition } => evaluate_define(ctx, name, definition),
        StatementKind::Option { name, default } => {
            if !ctx.allows_options {
                return Err(unknown_symbol(ctx, "option", &statement.range));
            }
            if !ctx.user_symbols.contains_key(&name.name) {
                let value = evaluate_expression(ctx, default)?;
                ctx.user_symbols.insert(name.name.clone(), Symbol::Option(value));
            }
            Ok(())
        }
        StatementKind::ForLoop {
            variable,
            sequence,
            body,
        } => {
            let value = evaluate_expression(ctx, sequence)?;
            let Some(elements) = value.sequence() else {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::TypeMismatch {
                        for_name: "loop bounds".to_owned(),
                        index: 0,
                        expected: "range or tuple".to_owned(),
                        got: value.type_description(),
                    },
                    sequence.range.clone(),
                )
                .into());
            };
            for element in elements {
                ctx.check_cancelled()?;
                ctx.with_scope(|ctx| {
                    if let Some(variable) = variable {
                        ctx.user_symbols
                            .insert(variable.name.clone(), Symbol::Constant(element.clone()));
                    }
                    run_statements(ctx, &body.statements, false)
                })?;
            }
            Ok(())
        }
        StatementKind::IfElse {
            condition,
            body,
            else_body,
        } => {
            let value = evaluate_as(ctx, condition, &ValueType::Boolean, "condition")?;
            let Value::Boolean(condition) = value else {
                unreachable!("checked by conversion")
            };
            let branch = if condition { Some(body) } else { else_body.as_ref() };
            if let Some(branch) = branch {
                ctx.with_scope(|ctx| run_statements(ctx, &branch.statements, false))?;
            }
            Ok(())
        }
        StatementKind::Expression(expression) => {
            let value = evaluate_expression(ctx, expression)?;
            ctx.add_value(value, &statement.range)
        }
        StatementKind::Import(path) => {
            let value = evaluate_as(ctx, path, &ValueType::String, "import")?;
            let Value::String(path) = value else {
                unreachable!("checked by conversion")
            };
            let imported = imports::import(ctx, &path, &statement.range)?;
            if imported.is_void() {
                Ok(())
            } else {
                ctx.add_value(imported, &statement.range)
            }
        }
    }
}

fn evaluate_command(
    ctx: &mut EvaluationContext<'_>,
    name: &Identifier,
    argument: Option<&Expression>,
    range: &SourceRange,
) -> EvalResult<()> {
    // Setting an option the current block declares takes precedence over
    // any built-in of the same name.
    if let Some(slot) = ctx.option_slot(&name.name).cloned() {
        let Some(argument) = argument else {
            return Err(RuntimeError::new(
                RuntimeErrorKind::MissingArgument {
                    for_name: name.name.clone(),
                    index: 0,
                    expected: slot.value_type.to_string(),
                },
                range.clone(),
            )
            .into());
        };
        let value = evaluate_as(ctx, argument, &slot.value_type, &name.name)?;
        ctx.user_symbols.insert(name.name.clone(), Symbol::Option(value));
        return Ok(());
    }
    let Some(symbol) = ctx.lookup(&name.name) else {
        return Err(unknown_symbol(ctx, &name.name, &name.range));
    };
    match symbol {
        Symbol::Property { value_type, setter, .. } => {
            let Some(argument) = argument else {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::MissingArgument {
                        for_name: name.name.clone(),
                        index: 0,
                        expected: value_type.to_string(),
                    },
                    range.clone(),
                )
                .into());
            };
            let value = evaluate_as(ctx, argument, &value_type, &name.name)?;
            setter(value, range, ctx)
        }
        Symbol::Function { parameter, body, .. } => {
            let value = call_function(ctx, &name.name, &parameter, &body, argument, range)?;
            ctx.add_value(value, range)
        }
        Symbol::Block { block_type, body } => {
            let seed = match argument {
                None => None,
                Some(_) if block_type.child_types.is_void() => {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::UnexpectedArgument {
                            for_name: name.name.clone(),
                            max: 0,
                        },
                        range.clone(),
                    )
                    .into());
                }
                Some(argument) => Some(evaluate_as(
                    ctx,
                    argument,
                    &ValueType::list_of(block_type.child_types.clone()),
                    &name.name,
                )?),
            };
            let value = invoke_block(ctx, &block_type, &body, None, seed, range)?;
            ctx.add_value(value, range)
        }
        Symbol::Constant(value) | Symbol::Option(value) => {
            if argument.is_some() {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::UnexpectedArgument {
                        for_name: name.name.clone(),
                        max: 0,
                    },
                    range.clone(),
                )
                .into());
            }
            ctx.add_value(value, range)
        }
        // A forward stub: recursion hit before the real symbol exists.
        Symbol::Placeholder(_) => Ok(()),
    }
}

fn evaluate_define(
    ctx: &mut EvaluationContext<'_>,
    name: &Identifier,
    definition: &Definition,
) -> EvalResult<()> {
    // Forward stub, so the body of a recursive definition can resolve its
    // own name while it is being built.
    ctx.user_symbols
        .insert(name.name.clone(), Symbol::Placeholder(ValueType::Any));
    match definition {
        Definition::Expression(expression) => {
            let value = evaluate_expression(ctx, expression)?;
            ctx.define(&name.name, Symbol::Constant(value));
        }
        Definition::Function { parameters, body } => {
            let (symbol, captured) = make_user_function(ctx, parameters, body);
            ctx.define(&name.name, symbol);
            // Snapshot the declaration scope after installing the symbol,
            // so the function sees itself and recursion works.
            captured.borrow_mut().symbols = ctx.user_symbols.clone();
        }
        Definition::Block(body) => {
            let (symbol, captured) = make_user_block(ctx, body);
            ctx.define(&name.name, symbol);
            captured.borrow_mut().symbols = ctx.user_symbols.clone();
        }
    }
    Ok(())
}

/// The lexical frame a user definition captures: its scope, source, and
/// file URL.
struct CapturedScope {
    symbols: SymbolTable,
    source: Rc<str>,
    base_url: Option<PathBuf>,
}

type Captured = Rc<RefCell<CapturedScope>>;

fn capture_frame(ctx: &EvaluationContext<'_>) -> Captured {
    Rc::new(RefCell::new(CapturedScope {
        symbols: SymbolTable::default(),
        source: Rc::clone(&ctx.source),
        base_url: ctx.base_url.clone(),
    }))
}

fn make_user_function(
    ctx: &mut EvaluationContext<'_>,
    parameters: &[Identifier],
    body: &Block,
) -> (Symbol, Captured) {
    let inferred = analysis::infer_parameter_types(parameters, body, ctx);
    let parameter_type = ValueType::Tuple(inferred);
    let return_type = analysis::block_type(body, ctx);
    let captured = capture_frame(ctx);
    let parameter_names: Rc<Vec<String>> = Rc::new(parameters.iter().map(|p| p.name.clone()).collect());
    let body = Rc::new(body.clone());

    let implementation = {
        let captured = Rc::clone(&captured);
        move |argument: Value, range: &SourceRange, ctx: &mut EvaluationContext<'_>| -> EvalResult<Value> {
            let mut def_ctx = ctx.push_definition();
            {
                let frame = captured.borrow();
                def_ctx.source = Rc::clone(&frame.source);
                def_ctx.base_url = frame.base_url.clone();
                def_ctx.user_symbols = frame.symbols.clone();
            }
            def_ctx.check_recursion(range)?;
            let arguments = match argument {
                Value::Tuple(values) => values,
                other => vec![other],
            };
            for (parameter, value) in parameter_names.iter().zip(arguments) {
                def_ctx.user_symbols.insert(parameter.clone(), Symbol::Constant(value));
            }
            run_statements(&mut def_ctx, &body.statements, false)?;
            let mut children = std::mem::take(&mut def_ctx.children);
            let result = match children.len() {
                1 => children.remove(0),
                _ => Value::Tuple(children),
            };
            ctx.adopt(def_ctx);
            Ok(result)
        }
    };
    (
        Symbol::function(parameter_type, return_type, implementation),
        captured,
    )
}

fn make_user_block(ctx: &mut EvaluationContext<'_>, body: &Block) -> (Symbol, Captured) {
    let mut options = AHashMap::new();
    scan_options(body, &mut options);
    let return_type = analysis::block_type(body, ctx);
    let block_type = BlockType::custom(BlockKind::User, options, ValueType::Any, return_type);
    let options_rc = Rc::clone(&block_type.options);
    let captured = capture_frame(ctx);
    let body = Rc::new(body.clone());

    let implementation = {
        let captured = Rc::clone(&captured);
        move |range: &SourceRange, caller_ctx: &mut EvaluationContext<'_>| -> EvalResult<Value> {
            let mut def_ctx = caller_ctx.push_definition();
            {
                let frame = captured.borrow();
                def_ctx.source = Rc::clone(&frame.source);
                def_ctx.base_url = frame.base_url.clone();
                // Declaration scope first, the caller's bindings over it.
                let mut symbols = frame.symbols.clone();
                for (name, symbol) in &caller_ctx.user_symbols {
                    symbols.insert(name.clone(), symbol.clone());
                }
                def_ctx.user_symbols = symbols;
            }
            def_ctx.options = Rc::clone(&options_rc);
            def_ctx.allows_options = true;
            def_ctx.children = std::mem::take(&mut caller_ctx.children);
            def_ctx.check_recursion(range)?;
            run_statements(&mut def_ctx, &body.statements, false)?;

            let children = std::mem::take(&mut def_ctx.children);
            let geometry_like = !children.is_empty()
                && children
                    .iter()
                    .all(|child| matches!(child, Value::Mesh(_) | Value::Text(_)));
            let result = if children.len() == 1 && def_ctx.name.is_none() {
                let mut children = children;
                children.remove(0)
            } else if geometry_like {
                def_ctx.children = children;
                let nodes = stdlib::mesh_children(&mut def_ctx);
                stdlib::group_or_single(nodes, range, &mut def_ctx)?
            } else {
                Value::Tuple(children)
            };
            caller_ctx.adopt(def_ctx);
            Ok(result)
        }
    };
    (Symbol::block(block_type, implementation), captured)
}

fn scan_options(block: &Block, options: &mut AHashMap<String, OptionSlot>) {
    for statement in &block.statements {
        match &statement.kind {
            StatementKind::Option { name, .. } => {
                options.insert(
                    name.name.clone(),
                    OptionSlot {
                        value_type: ValueType::Any,
                        default: None,
                    },
                );
            }
            StatementKind::ForLoop { body, .. } => scan_options(body, options),
            StatementKind::IfElse { body, else_body, .. } => {
                scan_options(body, options);
                if let Some(else_body) = else_body {
                    scan_options(else_body, options);
                }
            }
            _ => {}
        }
    }
}

pub(crate) fn evaluate_expression(
    ctx: &mut EvaluationContext<'_>,
    expression: &Expression,
) -> EvalResult<Value> {
    match &expression.kind {
        ExpressionKind::Number(n) => Ok(Value::Number(*n)),
        ExpressionKind::String(s) => Ok(Value::String(s.clone())),
        ExpressionKind::Color(c) => Ok(Value::Color(*c)),
        ExpressionKind::Identifier(name) => evaluate_identifier(ctx, name, &expression.range),
        ExpressionKind::Tuple(elements) => {
            if let Some((head, head_range, arguments)) = expression.call_head() {
                match ctx.lookup(head) {
                    Some(Symbol::Function { parameter, body, .. }) => {
                        let argument = evaluate_elements(ctx, arguments)?;
                        let argument =
                            convert_argument(argument, &parameter, head, &expression.range)?;
                        return body(argument, &expression.range, ctx);
                    }
                    Some(Symbol::Block { block_type, body }) => {
                        let seed = if arguments.is_empty() {
                            None
                        } else {
                            let values = evaluate_elements(ctx, arguments)?;
                            Some(convert_argument(
                                values,
                                &ValueType::list_of(block_type.child_types.clone()),
                                head,
                                &expression.range,
                            )?)
                        };
                        return invoke_block(ctx, &block_type, &body, None, seed, &expression.range);
                    }
                    Some(_) => {}
                    None => return Err(unknown_symbol(ctx, head, head_range)),
                }
            }
            let mut values = Vec::with_capacity(elements.len());
            for element in elements {
                values.push(evaluate_expression(ctx, element)?);
            }
            Ok(Value::Tuple(values))
        }
        ExpressionKind::Prefix { op, operand } => {
            let value = evaluate_expression(ctx, operand)?;
            evaluate_prefix(*op, value, &expression.range)
        }
        ExpressionKind::Infix { lhs, op, rhs } => evaluate_infix(ctx, lhs, *op, rhs, &expression.range),
        ExpressionKind::Member { receiver, member } => {
            let value = evaluate_expression(ctx, receiver)?;
            value.member(&member.name).ok_or_else(|| {
                RuntimeError::new(
                    RuntimeErrorKind::UnknownMember {
                        name: member.name.clone(),
                        of_type: value.type_description(),
                        options: value.member_names(),
                    },
                    member.range.clone(),
                )
                .into()
            })
        }
        ExpressionKind::Block { name, block } => match ctx.lookup(&name.name) {
            Some(Symbol::Block { block_type, body }) => {
                invoke_block(ctx, &block_type, &body, Some(block), None, &expression.range)
            }
            Some(Symbol::Placeholder(_)) => Ok(Value::void()),
            Some(_) => Err(RuntimeError::new(
                RuntimeErrorKind::UnexpectedArgument {
                    for_name: name.name.clone(),
                    max: 0,
                },
                block.range.clone(),
            )
            .into()),
            None => Err(unknown_symbol(ctx, &name.name, &name.range)),
        },
        ExpressionKind::SubExpression(inner) => evaluate_expression(ctx, inner),
    }
}

fn evaluate_identifier(
    ctx: &mut EvaluationContext<'_>,
    name: &str,
    range: &SourceRange,
) -> EvalResult<Value> {
    let Some(symbol) = ctx.lookup(name) else {
        return Err(unknown_symbol(ctx, name, range));
    };
    match symbol {
        Symbol::Constant(value) | Symbol::Option(value) => Ok(value),
        Symbol::Property { getter, .. } => getter(range, ctx),
        Symbol::Function { parameter, body, .. } => {
            let argument = convert_argument(Value::void(), &parameter, name, range)?;
            body(argument, range, ctx)
        }
        Symbol::Block { block_type, body } => invoke_block(ctx, &block_type, &body, None, None, range),
        Symbol::Placeholder(_) => Ok(Value::void()),
    }
}

fn evaluate_elements(ctx: &mut EvaluationContext<'_>, elements: &[Expression]) -> EvalResult<Value> {
    if elements.len() == 1 {
        return evaluate_expression(ctx, &elements[0]);
    }
    let mut values = Vec::with_capacity(elements.len());
    for element in elements {
        values.push(evaluate_expression(ctx, element)?);
    }
    Ok(Value::Tuple(values))
}

fn call_function(
    ctx: &mut EvaluationContext<'_>,
    name: &str,
    parameter: &ValueType,
    body: &crate::symbols::FunctionImpl,
    argument: Option<&Expression>,
    range: &SourceRange,
) -> EvalResult<Value> {
    let raw = match argument {
        Some(expression) => evaluate_expression(ctx, expression)?,
        None => Value::void(),
    };
    let argument = convert_argument(raw, parameter, name, range)?;
    body(argument, range, ctx)
}

/// Converts a call argument to the declared parameter type, with
/// missing/unexpected-argument diagnostics for tuple-shaped parameters.
pub(crate) fn convert_argument(
    value: Value,
    expected: &ValueType,
    for_name: &str,
    range: &SourceRange,
) -> EvalResult<Value> {
    if let Some(converted) = value.convert(expected) {
        return Ok(converted);
    }
    if expected.is_void() {
        return Err(RuntimeError::new(
            RuntimeErrorKind::UnexpectedArgument {
                for_name: for_name.to_owned(),
                max: 0,
            },
            range.clone(),
        )
        .into());
    }
    if let ValueType::Tuple(targets) = expected {
        let supplied = match &value {
            Value::Tuple(values) => values.len(),
            _ => 1,
        };
        if supplied < targets.len() {
            return Err(RuntimeError::new(
                RuntimeErrorKind::MissingArgument {
                    for_name: for_name.to_owned(),
                    index: supplied,
                    expected: targets[supplied].to_string(),
                },
                range.clone(),
            )
            .into());
        }
        if supplied > targets.len() {
            return Err(RuntimeError::new(
                RuntimeErrorKind::UnexpectedArgument {
                    for_name: for_name.to_owned(),
                    max: targets.len(),
                },
                range.clone(),
            )
            .into());
        }
    }
    Err(RuntimeError::new(
        RuntimeErrorKind::TypeMismatch {
            for_name: for_name.to_owned(),
            index: 0,
            expected: expected.to_string(),
            got: value.type_description(),
        },
        range.clone(),
    )
    .into())
}

fn evaluate_as(
    ctx: &mut EvaluationContext<'_>,
    expression: &Expression,
    expected: &ValueType,
    for_name: &str,
) -> EvalResult<Value> {
    let value = evaluate_expression(ctx, expression)?;
    convert_argument(value, expected, for_name, &expression.range)
}

/// Invokes a block symbol: pushes the child context, runs any argument
/// body and seed values through it, then hands it to the implementation.
fn invoke_block(
    ctx: &mut EvaluationContext<'_>,
    block_type: &Rc<BlockType>,
    body: &crate::symbols::BlockImpl,
    block: Option<&Block>,
    seed: Option<Value>,
    range: &SourceRange,
) -> EvalResult<Value> {
    if block_type.kind == BlockKind::User {
        ctx.check_cancelled()?;
    }
    let mut child = ctx.push(block_type);
    if let Some(seed) = seed {
        child.add_value(seed, range)?;
    }
    if let Some(block) = block {
        run_statements(&mut child, &block.statements, false)?;
    }
    let result = body(range, &mut child)?;
    ctx.adopt(child);
    Ok(result)
}

fn evaluate_prefix(op: PrefixOp, value: Value, range: &SourceRange) -> EvalResult<Value> {
    match op {
        PrefixOp::Not => match value {
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            other => Err(operand_error("not", &other, "boolean", range)),
        },
        PrefixOp::Plus | PrefixOp::Minus => {
            let negate = op == PrefixOp::Minus;
            let Some(components) = value.numeric_components() else {
                return Err(operand_error(&op.to_string(), &value, "number", range));
            };
            let signed: Vec<f64> = components
                .into_iter()
                .map(|n| if negate { -n } else { n })
                .collect();
            Ok(rebuild_numeric(&value, signed))
        }
    }
}

fn evaluate_infix(
    ctx: &mut EvaluationContext<'_>,
    lhs: &Expression,
    op: InfixOp,
    rhs: &Expression,
    range: &SourceRange,
) -> EvalResult<Value> {
    match op {
        InfixOp::Add | InfixOp::Subtract | InfixOp::Multiply | InfixOp::Divide | InfixOp::Modulo => {
            let left = evaluate_expression(ctx, lhs)?;
            let right = evaluate_expression(ctx, rhs)?;
            numeric_binop(op, &left, &right, range)
        }
        InfixOp::Less | InfixOp::Greater | InfixOp::LessEqual | InfixOp::GreaterEqual => {
            let left = evaluate_as(ctx, lhs, &ValueType::Number, &op.to_string())?;
            let right = evaluate_as(ctx, rhs, &ValueType::Number, &op.to_string())?;
            let (Value::Number(l), Value::Number(r)) = (left, right) else {
                unreachable!("checked by conversion")
            };
            Ok(Value::Boolean(match op {
                InfixOp::Less => l < r,
                InfixOp::Greater => l > r,
                InfixOp::LessEqual => l <= r,
                _ => l >= r,
            }))
        }
        InfixOp::Equal | InfixOp::NotEqual => {
            let left = evaluate_expression(ctx, lhs)?;
            let right = evaluate_expression(ctx, rhs)?;
            // Structural, with floats by bit-identity: NaN equals itself,
            // 0 and -0 do not.
            let equal = left.structurally_equal(&right);
            Ok(Value::Boolean(if op == InfixOp::Equal { equal } else { !equal }))
        }
        InfixOp::And | InfixOp::Or => {
            let left = evaluate_as(ctx, lhs, &ValueType::Boolean, &op.to_string())?;
            let right = evaluate_as(ctx, rhs, &ValueType::Boolean, &op.to_string())?;
            let (Value::Boolean(l), Value::Boolean(r)) = (left, right) else {
                unreachable!("checked by conversion")
            };
            Ok(Value::Boolean(if op == InfixOp::And { l && r } else { l || r }))
        }
        InfixOp::To => {
            let left = evaluate_as(ctx, lhs, &ValueType::Number, "range bounds")?;
            let right = evaluate_as(ctx, rhs, &ValueType::Number, "range bounds")?;
            let (Value::Number(start), Value::Number(end)) = (left, right) else {
                unreachable!("checked by conversion")
            };
            Ok(Value::Range(RangeValue::new(start, end)))
        }
        InfixOp::Step => {
            let left = evaluate_expression(ctx, lhs)?;
            let Value::Range(base) = left else {
                return Err(operand_error("step", &left, "range", range));
            };
            let right = evaluate_as(ctx, rhs, &ValueType::Number, "step")?;
            let Value::Number(step) = right else {
                unreachable!("checked by conversion")
            };
            Ok(Value::Range(base.with_step(step)))
        }
        InfixOp::In => unreachable!("'in' only occurs in for-loop headers"),
    }
}

/// Numeric arithmetic with pointwise lifting: scalars broadcast over
/// lists, lists combine elementwise when their lengths match.
fn numeric_binop(op: InfixOp, left: &Value, right: &Value, range: &SourceRange) -> EvalResult<Value> {
    let apply = |l: f64, r: f64| match op {
        InfixOp::Add => l + r,
        InfixOp::Subtract => l - r,
        InfixOp::Multiply => l * r,
        InfixOp::Divide => l / r,
        InfixOp::Modulo => l % r,
        _ => unreachable!("not an arithmetic operator"),
    };
    if let (Value::Number(l), Value::Number(r)) = (left, right) {
        return Ok(Value::Number(apply(*l, *r)));
    }
    let Some(lc) = left.numeric_components() else {
        return Err(operand_error(&op.to_string(), left, "number or list of numbers", range));
    };
    let Some(rc) = right.numeric_components() else {
        return Err(operand_error(&op.to_string(), right, "number or list of numbers", range));
    };
    let combined: Vec<f64> = if lc.len() == 1 {
        rc.iter().map(|r| apply(lc[0], *r)).collect()
    } else if rc.len() == 1 {
        lc.iter().map(|l| apply(*l, rc[0])).collect()
    } else if lc.len() == rc.len() {
        lc.iter().zip(&rc).map(|(l, r)| apply(*l, *r)).collect()
    } else {
        return Err(operand_error(
            &op.to_string(),
            right,
            &format!("list of {} numbers", lc.len()),
            range,
        ));
    };
    let template = if lc.len() == 1 { right } else { left };
    Ok(rebuild_numeric(template, combined))
}

/// Rebuilds a numeric result in the shape of `template` where possible,
/// falling back to a number tuple.
fn rebuild_numeric(template: &Value, components: Vec<f64>) -> Value {
    match (template, components.len()) {
        (_, 1) => Value::Number(components[0]),
        (Value::Vector(_), 2 | 3) => Value::Vector(carve_geom::Vector::from_components(&components)),
        (Value::Size(_), 2 | 3) => {
            Value::Size(carve_geom::Vector::from_components(&components))
        }
        _ => Value::Tuple(components.into_iter().map(Value::Number).collect()),
    }
}

fn operand_error(for_name: &str, got: &Value, expected: &str, range: &SourceRange) -> EvalInterrupt {
    RuntimeError::new(
        RuntimeErrorKind::TypeMismatch {
            for_name: for_name.to_owned(),
            index: 0,
            expected: expected.to_owned(),
            got: got.type_description(),
        },
        range.clone(),
    )
    .into()
}

fn unknown_symbol(ctx: &EvaluationContext<'_>, name: &str, range: &SourceRange) -> EvalInterrupt {
    RuntimeError::new(
        RuntimeErrorKind::UnknownSymbol {
            name: name.to_owned(),
            options: ctx.symbol_names(),
        },
        range.clone(),
    )
    .into()
}
