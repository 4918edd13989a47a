//! Transform setters and placement properties.

use crate::{
    errors::{RuntimeError, RuntimeErrorKind},
    symbols::{Symbol, SymbolTable},
    types::ValueType,
    value::Value,
};

/// Cumulative child-transform mutators: `translate`, `rotate`, `scale`.
pub(super) fn child_transforms() -> SymbolTable {
    let mut table = SymbolTable::default();
    table.insert(
        "translate".to_owned(),
        Symbol::function(ValueType::Vector, ValueType::void(), |value, _, ctx| {
            let Value::Vector(v) = value else { unreachable!("checked by conversion") };
            ctx.child_transform.translate(v);
            Ok(Value::void())
        }),
    );
    table.insert(
        "rotate".to_owned(),
        Symbol::function(ValueType::Rotation, ValueType::void(), |value, _, ctx| {
            let Value::Rotation(r) = value else { unreachable!("checked by conversion") };
            ctx.child_transform.rotate(r);
            Ok(Value::void())
        }),
    );
    table.insert(
        "scale".to_owned(),
        Symbol::function(ValueType::Size, ValueType::void(), |value, _, ctx| {
            let Value::Size(s) = value else { unreachable!("checked by conversion") };
            ctx.child_transform.rescale(s);
            Ok(Value::void())
        }),
    );
    table
}

/// Absolute placement properties: `position`, `orientation`, `size`, and
/// the node `name`.
pub(super) fn placement() -> SymbolTable {
    let mut table = SymbolTable::default();
    table.insert(
        "position".to_owned(),
        Symbol::property(
            ValueType::Vector,
            |value, _, ctx| {
                let Value::Vector(v) = value else { unreachable!("checked by conversion") };
                ctx.transform.offset = v;
                ctx.has_position = true;
                Ok(())
            },
            |_, ctx| Ok(Value::Vector(ctx.transform.offset)),
        ),
    );
    table.insert(
        "orientation".to_owned(),
        Symbol::property(
            ValueType::Rotation,
            |value, _, ctx| {
                let Value::Rotation(r) = value else { unreachable!("checked by conversion") };
                ctx.transform.rotation = r;
                ctx.has_orientation = true;
                Ok(())
            },
            |_, ctx| Ok(Value::Rotation(ctx.transform.rotation)),
        ),
    );
    table.insert(
        "size".to_owned(),
        Symbol::property(
            ValueType::Size,
            |value, _, ctx| {
                let Value::Size(s) = value else { unreachable!("checked by conversion") };
                ctx.transform.scale = s;
                Ok(())
            },
            |_, ctx| Ok(Value::Size(ctx.transform.scale)),
        ),
    );
    table.insert(
        "name".to_owned(),
        Symbol::property(
            ValueType::String,
            |value, _, ctx| {
                let Value::String(name) = value else { unreachable!("checked by conversion") };
                ctx.name = Some(name);
                Ok(())
            },
            |_, ctx| Ok(Value::String(ctx.name.clone().unwrap_or_default())),
        ),
    );
    table
}

/// Appearance state carried down to children: `font`, `detail`,
/// `smoothing`.
pub(super) fn appearance() -> SymbolTable {
    let mut table = SymbolTable::default();
    table.insert(
        "font".to_owned(),
        Symbol::property(
            ValueType::String,
            |value, range, ctx| {
                let Value::String(name) = value else { unreachable!("checked by conversion") };
                let known = ctx.delegate.font_names();
                let trimmed = name.trim();
                if trimmed.is_empty()
                    || (!known.is_empty() && !known.iter().any(|k| k.eq_ignore_ascii_case(trimmed)))
                {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::UnknownFont {
                            name: trimmed.to_owned(),
                            options: known,
                        },
                        range.clone(),
                    )
                    .into());
                }
                ctx.font = Some(trimmed.to_owned());
                Ok(())
            },
            |_, ctx| Ok(Value::String(ctx.font.clone().unwrap_or_default())),
        ),
    );
    table.insert(
        "detail".to_owned(),
        Symbol::property(
            ValueType::Number,
            |value, range, ctx| {
                let Value::Number(n) = value else { unreachable!("checked by conversion") };
                if n < 0.0 {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::TypeMismatch {
                            for_name: "detail".to_owned(),
                            index: 0,
                            expected: "positive number".to_owned(),
                            got: ValueType::Number.to_string(),
                        },
                        range.clone(),
                    )
                    .into());
                }
                ctx.detail = n as u32;
                Ok(())
            },
            |_, ctx| Ok(Value::Number(f64::from(ctx.detail))),
        ),
    );
    table.insert(
        "smoothing".to_owned(),
        Symbol::property(
            ValueType::Number,
            |value, _, ctx| {
                let Value::Number(n) = value else { unreachable!("checked by conversion") };
                ctx.smoothing = Some(n);
                Ok(())
            },
            |_, ctx| Ok(Value::Number(ctx.smoothing.unwrap_or(0.0))),
        ),
    );
    table
}

