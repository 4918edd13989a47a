//! Material properties: color, opacity, textures, and surface parameters.

use carve_geom::{Color, MaterialProperty, Texture};

use crate::{
    context::EvaluationContext,
    errors::{EvalResult, RuntimeError, RuntimeErrorKind},
    lexer::SourceRange,
    symbols::{Symbol, SymbolTable},
    types::ValueType,
    value::Value,
};

pub(super) fn table() -> SymbolTable {
    let mut table = SymbolTable::default();

    let color = Symbol::property(
        ValueType::Color,
        |value, _, ctx| {
            let Value::Color(c) = value else { unreachable!("checked by conversion") };
            ctx.material.diffuse = Some(MaterialProperty::Color(c));
            Ok(())
        },
        |_, ctx| {
            let current = ctx
                .material
                .diffuse
                .as_ref()
                .and_then(MaterialProperty::color)
                .unwrap_or(Color::WHITE);
            Ok(Value::Color(current))
        },
    );
    table.insert("color".to_owned(), color.clone());
    // British spelling maps to the same slot.
    table.insert("colour".to_owned(), color);

    table.insert(
        "opacity".to_owned(),
        Symbol::property(
            ValueType::Number,
            |value, _, ctx| {
                let Value::Number(n) = value else { unreachable!("checked by conversion") };
                // Cumulative: multiplies the seed inherited at push time.
                ctx.material.opacity = n * ctx.opacity;
                Ok(())
            },
            |_, ctx| Ok(Value::Number(ctx.material.opacity)),
        ),
    );

    table.insert(
        "texture".to_owned(),
        Symbol::property(
            texture_type(),
            |value, range, ctx| {
                let texture = texture_from(value, range, ctx)?;
                ctx.material.diffuse = texture.map(MaterialProperty::Texture);
                Ok(())
            },
            |_, ctx| {
                Ok(match &ctx.material.diffuse {
                    Some(MaterialProperty::Texture(texture)) => Value::Texture(texture.clone()),
                    _ => Value::String(String::new()),
                })
            },
        ),
    );

    table.insert(
        "normals".to_owned(),
        Symbol::property(
            texture_type(),
            |value, range, ctx| {
                ctx.material.normals = texture_from(value, range, ctx)?;
                Ok(())
            },
            |_, ctx| {
                Ok(match &ctx.material.normals {
                    Some(texture) => Value::Texture(texture.clone()),
                    None => Value::String(String::new()),
                })
            },
        ),
    );

    for (name, read, write) in surface_slots() {
        table.insert(
            name.to_owned(),
            Symbol::property(
                surface_type(),
                move |value, range, ctx| {
                    let property = surface_from(name, value, range, ctx)?;
                    write(ctx, property);
                    Ok(())
                },
                move |_, ctx| {
                    Ok(match read(ctx) {
                        Some(MaterialProperty::Color(c)) => Value::Color(c),
                        Some(MaterialProperty::Texture(t)) => Value::Texture(t),
                        None => Value::Number(0.0),
                    })
                },
            ),
        );
    }

    table.insert(
        "material".to_owned(),
        Symbol::property(
            ValueType::Object(indexmap::IndexMap::new()),
            set_material,
            |_, ctx| {
                let mut fields = indexmap::IndexMap::new();
                fields.insert("opacity".to_owned(), Value::Number(ctx.material.opacity));
                if let Some(MaterialProperty::Color(c)) = &ctx.material.diffuse {
                    fields.insert("color".to_owned(), Value::Color(*c));
                }
                if let Some(MaterialProperty::Texture(t)) = &ctx.material.diffuse {
                    fields.insert("texture".to_owned(), Value::Texture(t.clone()));
                }
                Ok(Value::Object(fields))
            },
        ),
    );

    table
}

type SurfaceRead = fn(&EvaluationContext<'_>) -> Option<MaterialProperty>;
type SurfaceWrite = fn(&mut EvaluationContext<'_>, Option<MaterialProperty>);

fn surface_slots() -> [(&'static str, SurfaceRead, SurfaceWrite); 3] {
    [
        (
            "metallicity",
            |ctx| ctx.material.metallicity.clone(),
            |ctx, p| ctx.material.metallicity = p,
        ),
        (
            "roughness",
            |ctx| ctx.material.roughness.clone(),
            |ctx, p| ctx.material.roughness = p,
        ),
        ("glow", |ctx| ctx.material.glow.clone(), |ctx, p| ctx.material.glow = p),
    ]
}

fn texture_type() -> ValueType {
    ValueType::union_of([ValueType::Texture, ValueType::String])
}

fn surface_type() -> ValueType {
    ValueType::union_of([
        ValueType::Number,
        ValueType::Color,
        ValueType::Texture,
        ValueType::String,
    ])
}

/// Resolves a texture slot value. An empty string clears the slot;
/// anything else resolves through the delegate relative to the current
/// file.
pub(super) fn texture_from(
    value: Value,
    range: &SourceRange,
    ctx: &mut EvaluationContext<'_>,
) -> EvalResult<Option<Texture>> {
    match value {
        Value::Texture(texture) => Ok(Some(texture)),
        Value::String(name) if name.is_empty() => Ok(None),
        Value::String(name) => {
            let url = ctx.delegate.resolve_url(&name, ctx.base_url.as_deref());
            Ok(Some(Texture::File { name, url }))
        }
        other => Err(RuntimeError::new(
            RuntimeErrorKind::TypeMismatch {
                for_name: "texture".to_owned(),
                index: 0,
                expected: texture_type().to_string(),
                got: other.type_description(),
            },
            range.clone(),
        )
        .into()),
    }
}

fn surface_from(
    for_name: &str,
    value: Value,
    range: &SourceRange,
    ctx: &mut EvaluationContext<'_>,
) -> EvalResult<Option<MaterialProperty>> {
    match value {
        Value::Number(n) => Ok(Some(MaterialProperty::Color(Color::rgb(n, n, n)))),
        Value::Color(c) => Ok(Some(MaterialProperty::Color(c))),
        Value::Texture(texture) => Ok(Some(MaterialProperty::Texture(texture))),
        Value::String(name) if name.is_empty() => Ok(None),
        Value::String(name) => {
            let url = ctx.delegate.resolve_url(&name, ctx.base_url.as_deref());
            Ok(Some(MaterialProperty::Texture(Texture::File { name, url })))
        }
        other => Err(RuntimeError::new(
            RuntimeErrorKind::TypeMismatch {
                for_name: for_name.to_owned(),
                index: 0,
                expected: surface_type().to_string(),
                got: other.type_description(),
            },
            range.clone(),
        )
        .into()),
    }
}

/// Applies a whole material object: recognised keys are `color`,
/// `opacity`, `texture`, `metallicity`, `roughness`, and `glow`.
fn set_material(value: Value, range: &SourceRange, ctx: &mut EvaluationContext<'_>) -> EvalResult<()> {
    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(RuntimeError::new(
                RuntimeErrorKind::TypeMismatch {
                    for_name: "material".to_owned(),
                    index: 0,
                    expected: "object".to_owned(),
                    got: other.type_description(),
                },
                range.clone(),
            )
            .into());
        }
    };
    for (key, field) in fields {
        match key.as_str() {
            "color" | "colour" => {
                if let Some(Value::Color(c)) = field.convert(&ValueType::Color) {
                    ctx.material.diffuse = Some(MaterialProperty::Color(c));
                }
            }
            "opacity" => {
                if let Some(n) = field.as_number() {
                    ctx.material.opacity = n * ctx.opacity;
                }
            }
            "texture" => {
                ctx.material.diffuse = texture_from(field, range, ctx)?.map(MaterialProperty::Texture);
            }
            "metallicity" => ctx.material.metallicity = surface_from("metallicity", field, range, ctx)?,
            "roughness" => ctx.material.roughness = surface_from("roughness", field, range, ctx)?,
            "glow" => ctx.material.glow = surface_from("glow", field, range, ctx)?,
            _ => {}
        }
    }
    Ok(())
}
