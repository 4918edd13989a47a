//! Path primitives and point constructors.

use std::f64::consts::PI;

use ahash::AHashMap;

use carve_geom::{Path, PathPoint, Polygon, Vector};

use crate::{
    context::EvaluationContext,
    errors::{RuntimeError, RuntimeErrorKind},
    stdlib::option_number,
    symbols::{BlockKind, BlockType, OptionSlot, Symbol, SymbolTable},
    types::ValueType,
    value::Value,
};

/// Path-producing blocks available in any geometry context.
pub(super) fn constructors() -> SymbolTable {
    let mut table = SymbolTable::default();

    table.insert(
        "path".to_owned(),
        Symbol::block(
            BlockType::new(
                BlockKind::Path,
                ValueType::union_of([ValueType::Point, ValueType::Path]),
                ValueType::Path,
            ),
            |_, ctx| {
                let mut points: Vec<PathPoint> = Vec::new();
                let mut subpaths: Vec<Path> = Vec::new();
                for child in std::mem::take(&mut ctx.children) {
                    match child {
                        Value::Point(point) => points.push(point),
                        Value::Path(path) => subpaths.push(path),
                        _ => {}
                    }
                }
                let path = if points.is_empty() {
                    Path::joined(subpaths)
                } else if subpaths.is_empty() {
                    Path::new(points)
                } else {
                    subpaths.insert(0, Path::new(points));
                    Path::joined(subpaths)
                };
                Ok(Value::Path(path.transformed(ctx.transform)))
            },
        ),
    );

    table.insert(
        "circle".to_owned(),
        path_shape(|ctx| Path::circle(ctx.detail)),
    );
    table.insert("square".to_owned(), path_shape(|_| Path::square()));

    table.insert(
        "polygon".to_owned(),
        Symbol::block(
            BlockType::custom(
                BlockKind::PathShape,
                AHashMap::from_iter([(
                    "sides".to_owned(),
                    OptionSlot {
                        value_type: ValueType::Number,
                        default: Some(Value::Number(5.0)),
                    },
                )]),
                ValueType::Point,
                ValueType::union_of([ValueType::Path, ValueType::Polygon]),
            ),
            |_, ctx| {
                let points: Vec<PathPoint> = std::mem::take(&mut ctx.children)
                    .into_iter()
                    .filter_map(|child| match child {
                        Value::Point(point) => Some(point),
                        _ => None,
                    })
                    .collect();
                if points.is_empty() {
                    let sides = option_number(ctx, "sides").unwrap_or(5.0).max(3.0) as u32;
                    return Ok(Value::Path(Path::polygon(sides).transformed(ctx.transform)));
                }
                let vertices = points
                    .iter()
                    .map(|point| ctx.transform.apply(point.position))
                    .collect();
                Ok(Value::Polygon(Polygon::new(vertices)))
            },
        ),
    );

    table.insert(
        "roundrect".to_owned(),
        Symbol::block(
            BlockType::custom(
                BlockKind::PathShape,
                AHashMap::from_iter([(
                    "radius".to_owned(),
                    OptionSlot {
                        value_type: ValueType::Number,
                        default: Some(Value::Number(0.25)),
                    },
                )]),
                ValueType::void(),
                ValueType::Path,
            ),
            |_, ctx| {
                let radius = option_number(ctx, "radius").unwrap_or(0.25);
                Ok(Value::Path(
                    Path::roundrect(1.0, 1.0, radius).transformed(ctx.transform),
                ))
            },
        ),
    );

    table.insert(
        "arc".to_owned(),
        Symbol::block(
            BlockType::custom(
                BlockKind::PathShape,
                AHashMap::from_iter([(
                    "angle".to_owned(),
                    OptionSlot {
                        value_type: ValueType::Number,
                        default: Some(Value::Number(0.5)),
                    },
                )]),
                ValueType::void(),
                ValueType::Path,
            ),
            |_, ctx| {
                let angle = option_number(ctx, "angle").unwrap_or(0.5);
                Ok(Value::Path(arc_path(angle, ctx.detail).transformed(ctx.transform)))
            },
        ),
    );

    table.insert(
        "text".to_owned(),
        Symbol::block(
            BlockType::custom(
                BlockKind::Text,
                AHashMap::from_iter([(
                    "linespacing".to_owned(),
                    OptionSlot {
                        value_type: ValueType::Number,
                        default: None,
                    },
                )]),
                ValueType::Text,
                ValueType::Text,
            ),
            |_, ctx| {
                let strings: Vec<String> = std::mem::take(&mut ctx.children)
                    .into_iter()
                    .filter_map(|child| match child {
                        Value::Text(text) => Some(text.string),
                        Value::String(string) => Some(string),
                        _ => None,
                    })
                    .collect();
                let mut text = ctx.wrap_text(strings.join("\n"));
                text.linespacing = option_number(ctx, "linespacing");
                Ok(Value::Text(text))
            },
        ),
    );

    table.insert(
        "svgpath".to_owned(),
        Symbol::function(ValueType::String, ValueType::Path, |value, range, _| {
            let Value::String(data) = value else { unreachable!("checked by conversion") };
            Path::from_svg(&data).map(Value::Path).map_err(|error| {
                RuntimeError::new(
                    RuntimeErrorKind::AssertionFailure {
                        message: format!("invalid SVG path: {error}"),
                    },
                    range.clone(),
                )
                .into()
            })
        }),
    );

    table
}

/// Point constructors, available inside path blocks.
pub(super) fn points() -> SymbolTable {
    let mut table = SymbolTable::default();
    table.insert(
        "point".to_owned(),
        Symbol::function(ValueType::Vector, ValueType::Point, |value, _, _| {
            let Value::Vector(v) = value else { unreachable!("checked by conversion") };
            Ok(Value::Point(PathPoint::corner(v)))
        }),
    );
    table.insert(
        "curve".to_owned(),
        Symbol::function(ValueType::Vector, ValueType::Point, |value, _, _| {
            let Value::Vector(v) = value else { unreachable!("checked by conversion") };
            Ok(Value::Point(PathPoint::curve(v)))
        }),
    );
    table
}

fn path_shape(build: impl Fn(&EvaluationContext<'_>) -> Path + 'static) -> Symbol {
    Symbol::block(
        BlockType::new(BlockKind::PathShape, ValueType::void(), ValueType::Path),
        move |_, ctx| Ok(Value::Path(build(ctx).transformed(ctx.transform))),
    )
}

/// An open arc of the unit circle spanning `angle` half-turns from the
/// top, clockwise.
fn arc_path(angle: f64, detail: u32) -> Path {
    let segments = ((f64::from(detail.max(4)) * angle.abs() / 2.0).ceil() as usize).max(1);
    let points = (0..=segments)
        .map(|i| {
            let theta = angle * PI * i as f64 / segments as f64;
            let position = Vector::new(theta.sin() * 0.5, theta.cos() * 0.5, 0.0);
            if i == 0 || i == segments {
                PathPoint::corner(position)
            } else {
                PathPoint::curve(position)
            }
        })
        .collect();
    Path::new(points)
}
