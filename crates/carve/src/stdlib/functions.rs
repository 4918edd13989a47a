//! Math, string, logic, randomness, and output builtins, plus the color
//! and numeric constants.

use std::f64::consts::PI;

use carve_geom::{Color, Vector};

use crate::{
    errors::{EvalResult, RuntimeError, RuntimeErrorKind},
    lexer::SourceRange,
    symbols::{Symbol, SymbolTable},
    types::ValueType,
    value::Value,
};

pub(super) fn table() -> SymbolTable {
    let mut table = SymbolTable::default();

    // Constants.
    table.insert("pi".to_owned(), Symbol::constant(PI));
    table.insert("true".to_owned(), Symbol::constant(true));
    table.insert("false".to_owned(), Symbol::constant(false));

    // Color constants.
    for (name, color) in [
        ("white", Color::WHITE),
        ("black", Color::BLACK),
        ("gray", Color::GRAY),
        ("grey", Color::GRAY),
        ("red", Color::RED),
        ("green", Color::GREEN),
        ("blue", Color::BLUE),
        ("yellow", Color::YELLOW),
        ("cyan", Color::CYAN),
        ("magenta", Color::MAGENTA),
        ("orange", Color::ORANGE),
    ] {
        table.insert(name.to_owned(), Symbol::constant(color));
    }

    // Unary math.
    for (name, f) in [
        ("abs", f64::abs as fn(f64) -> f64),
        ("ceil", f64::ceil),
        ("floor", f64::floor),
        ("round", f64::round),
        ("sqrt", f64::sqrt),
        ("cos", f64::cos),
        ("acos", f64::acos),
        ("sin", f64::sin),
        ("asin", f64::asin),
        ("tan", f64::tan),
        ("atan", f64::atan),
    ] {
        table.insert(name.to_owned(), unary_math(f));
    }
    // `sign` of zero is zero, unlike signum.
    table.insert(
        "sign".to_owned(),
        unary_math(|n| if n == 0.0 { 0.0 } else { n.signum() }),
    );

    // Binary math.
    table.insert(
        "pow".to_owned(),
        binary_math(f64::powf),
    );
    table.insert(
        "atan2".to_owned(),
        binary_math(f64::atan2),
    );

    // Variadic math.
    table.insert(
        "min".to_owned(),
        fold_math(f64::INFINITY, f64::min),
    );
    table.insert(
        "max".to_owned(),
        fold_math(f64::NEG_INFINITY, f64::max),
    );

    // Linear algebra.
    table.insert(
        "dot".to_owned(),
        Symbol::function(
            ValueType::Tuple(vec![ValueType::Vector, ValueType::Vector]),
            ValueType::Number,
            |value, _, _| {
                let (a, b) = vector_pair(value);
                Ok(Value::Number(a.dot(b)))
            },
        ),
    );
    table.insert(
        "cross".to_owned(),
        Symbol::function(
            ValueType::Tuple(vec![ValueType::Vector, ValueType::Vector]),
            ValueType::Vector,
            |value, _, _| {
                let (a, b) = vector_pair(value);
                Ok(Value::Vector(a.cross(b)))
            },
        ),
    );
    table.insert(
        "length".to_owned(),
        Symbol::function(ValueType::Vector, ValueType::Number, |value, _, _| {
            let Value::Vector(v) = value else { unreachable!("checked by conversion") };
            Ok(Value::Number(v.length()))
        }),
    );
    table.insert(
        "normalize".to_owned(),
        Symbol::function(ValueType::Vector, ValueType::Vector, |value, _, _| {
            let Value::Vector(v) = value else { unreachable!("checked by conversion") };
            Ok(Value::Vector(v.normalized()))
        }),
    );

    // Strings.
    table.insert(
        "split".to_owned(),
        Symbol::function(
            ValueType::Tuple(vec![ValueType::String, ValueType::String]),
            ValueType::list_of(ValueType::String),
            |value, _, _| {
                let Value::Tuple(parts) = value else { unreachable!("checked by conversion") };
                let (Value::String(s), Value::String(sep)) = (&parts[0], &parts[1]) else {
                    unreachable!("checked by conversion")
                };
                Ok(Value::Tuple(
                    s.split(sep.as_str()).map(|part| Value::String(part.to_owned())).collect(),
                ))
            },
        ),
    );
    table.insert(
        "join".to_owned(),
        Symbol::function(
            ValueType::Tuple(vec![ValueType::list_of(ValueType::Any), ValueType::String]),
            ValueType::String,
            |value, _, _| {
                let Value::Tuple(parts) = value else { unreachable!("checked by conversion") };
                let (Value::Tuple(elements), Value::String(sep)) = (&parts[0], &parts[1]) else {
                    unreachable!("checked by conversion")
                };
                let joined: Vec<String> = elements.iter().map(ToString::to_string).collect();
                Ok(Value::String(joined.join(sep)))
            },
        ),
    );
    table.insert(
        "trim".to_owned(),
        Symbol::function(ValueType::String, ValueType::String, |value, _, _| {
            let Value::String(s) = value else { unreachable!("checked by conversion") };
            Ok(Value::String(s.trim().to_owned()))
        }),
    );

    // Logic.
    table.insert(
        "not".to_owned(),
        Symbol::function(ValueType::Boolean, ValueType::Boolean, |value, _, _| {
            let Value::Boolean(b) = value else { unreachable!("checked by conversion") };
            Ok(Value::Boolean(!b))
        }),
    );

    // Randomness. `rnd` draws the next value; `seed` restarts the stream.
    table.insert(
        "rnd".to_owned(),
        Symbol::function(ValueType::void(), ValueType::Number, |_, _, ctx| {
            Ok(Value::Number(ctx.random.borrow_mut().next_double()))
        }),
    );
    table.insert(
        "seed".to_owned(),
        Symbol::property(
            ValueType::Number,
            |value, _, ctx| {
                let Value::Number(seed) = value else { unreachable!("checked by conversion") };
                ctx.random.borrow_mut().reseed(seed);
                Ok(())
            },
            |_, ctx| Ok(Value::Number(ctx.random.borrow().seed())),
        ),
    );

    // Output. `print` never fails.
    table.insert(
        "print".to_owned(),
        Symbol::function(ValueType::Any, ValueType::void(), |value, _, ctx| {
            let values = match value {
                Value::Tuple(elements) => elements,
                other => vec![other],
            };
            ctx.delegate.debug_log(&values);
            Ok(Value::void())
        }),
    );

    table.insert(
        "assert".to_owned(),
        Symbol::function(ValueType::Any, ValueType::void(), assert_impl),
    );

    table
}

fn assert_impl(
    value: Value,
    range: &SourceRange,
    _ctx: &mut crate::context::EvaluationContext<'_>,
) -> EvalResult<Value> {
    let (condition, message) = match &value {
        Value::Boolean(b) => (Some(*b), None),
        Value::Tuple(elements) => match &elements[..] {
            [Value::Boolean(b)] => (Some(*b), None),
            [Value::Boolean(b), Value::String(message)] => (Some(*b), Some(message.clone())),
            _ => (None, None),
        },
        _ => (None, None),
    };
    let Some(condition) = condition else {
        return Err(RuntimeError::new(
            RuntimeErrorKind::TypeMismatch {
                for_name: "assert".to_owned(),
                index: 0,
                expected: ValueType::Boolean.to_string(),
                got: value.type_description(),
            },
            range.clone(),
        )
        .into());
    };
    if condition {
        Ok(Value::void())
    } else {
        Err(RuntimeError::new(
            RuntimeErrorKind::AssertionFailure {
                message: message.unwrap_or_else(|| "assertion failed".to_owned()),
            },
            range.clone(),
        )
        .into())
    }
}

fn unary_math(f: impl Fn(f64) -> f64 + 'static) -> Symbol {
    Symbol::function(ValueType::Number, ValueType::Number, move |value, _, _| {
        let Value::Number(n) = value else { unreachable!("checked by conversion") };
        Ok(Value::Number(f(n)))
    })
}

fn binary_math(f: impl Fn(f64, f64) -> f64 + 'static) -> Symbol {
    Symbol::function(
        ValueType::Tuple(vec![ValueType::Number, ValueType::Number]),
        ValueType::Number,
        move |value, _, _| {
            let Value::Tuple(parts) = value else { unreachable!("checked by conversion") };
            let (Value::Number(a), Value::Number(b)) = (&parts[0], &parts[1]) else {
                unreachable!("checked by conversion")
            };
            Ok(Value::Number(f(*a, *b)))
        },
    )
}

fn fold_math(identity: f64, f: impl Fn(f64, f64) -> f64 + 'static) -> Symbol {
    Symbol::function(
        ValueType::list_of(ValueType::Number),
        ValueType::Number,
        move |value, _, _| {
            let Value::Tuple(elements) = value else { unreachable!("checked by conversion") };
            let folded = elements
                .iter()
                .filter_map(Value::as_number)
                .fold(identity, |acc, n| f(acc, n));
            Ok(Value::Number(folded))
        },
    )
}

fn vector_pair(value: Value) -> (Vector, Vector) {
    let Value::Tuple(parts) = value else {
        unreachable!("checked by conversion")
    };
    let (Value::Vector(a), Value::Vector(b)) = (&parts[0], &parts[1]) else {
        unreachable!("checked by conversion")
    };
    (*a, *b)
}
