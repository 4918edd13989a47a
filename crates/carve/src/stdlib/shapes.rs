//! Geometry constructors: primitives, builders, CSG combinators, and the
//! root-only scene symbols.

use ahash::AHashMap;

use carve_geom::{
    Camera, Color, Geometry, GeometryKind, Light, LightKind, Mesh, MaterialProperty, Polygon,
};

use crate::{
    context::EvaluationContext,
    errors::EvalResult,
    lexer::SourceRange,
    stdlib::{self, materials, mesh_children, node_from_context, option_number, path_children},
    symbols::{BlockKind, BlockType, OptionSlot, Symbol, SymbolTable},
    types::ValueType,
    value::Value,
};

fn mesh_and_text() -> ValueType {
    ValueType::union_of([ValueType::Mesh, ValueType::Text])
}

/// Constructors available in any geometry context.
pub(super) fn constructors() -> SymbolTable {
    let mut table = SymbolTable::default();

    // Primitives. Curved ones bake the current detail into their kind.
    table.insert("cube".to_owned(), primitive(|_| GeometryKind::Cube));
    table.insert(
        "sphere".to_owned(),
        primitive(|ctx| GeometryKind::Sphere { segments: ctx.detail }),
    );
    table.insert(
        "cylinder".to_owned(),
        primitive(|ctx| GeometryKind::Cylinder { segments: ctx.detail }),
    );
    table.insert(
        "cone".to_owned(),
        primitive(|ctx| GeometryKind::Cone { segments: ctx.detail }),
    );

    // CSG combinators and grouping.
    table.insert("group".to_owned(), combinator(GeometryKind::Group, mesh_and_text()));
    table.insert("union".to_owned(), combinator(GeometryKind::Union, ValueType::Mesh));
    table.insert(
        "difference".to_owned(),
        combinator(GeometryKind::Difference, ValueType::Mesh),
    );
    table.insert(
        "intersection".to_owned(),
        combinator(GeometryKind::Intersection, ValueType::Mesh),
    );
    table.insert("xor".to_owned(), combinator(GeometryKind::Xor, ValueType::Mesh));
    table.insert(
        "stencil".to_owned(),
        combinator(GeometryKind::Stencil, ValueType::Mesh),
    );

    // Builders over path cross-sections.
    table.insert(
        "extrude".to_owned(),
        Symbol::block(
            BlockType::custom(
                BlockKind::Builder,
                AHashMap::from_iter([(
                    "along".to_owned(),
                    OptionSlot {
                        value_type: ValueType::list_of(ValueType::Path),
                        default: Some(Value::void()),
                    },
                )]),
                ValueType::Path,
                ValueType::Mesh,
            ),
            |range, ctx| {
                let shapes = path_children(ctx);
                let along = match stdlib::option_value(ctx, "along") {
                    Some(Value::Path(path)) => vec![path],
                    Some(Value::Tuple(elements)) => elements
                        .into_iter()
                        .filter_map(|v| match v {
                            Value::Path(path) => Some(path),
                            _ => None,
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                Ok(Value::Mesh(node_from_context(
                    GeometryKind::Extrude { shapes, along },
                    range,
                    ctx,
                )))
            },
        ),
    );
    table.insert(
        "lathe".to_owned(),
        builder(|shapes, ctx| GeometryKind::Lathe {
            shapes,
            segments: ctx.detail,
        }),
    );
    table.insert("loft".to_owned(), builder(|shapes, _| GeometryKind::Loft { shapes }));
    table.insert("fill".to_owned(), builder(|shapes, _| GeometryKind::Fill { shapes }));

    // Convex hull over mixed children.
    table.insert(
        "hull".to_owned(),
        Symbol::block(
            BlockType::new(
                BlockKind::Group,
                ValueType::union_of([
                    ValueType::Mesh,
                    ValueType::Path,
                    ValueType::Point,
                    ValueType::Vector,
                ]),
                ValueType::Mesh,
            ),
            |range, ctx| {
                let mut points = Vec::new();
                for child in std::mem::take(&mut ctx.children) {
                    match child {
                        Value::Vector(v) => points.push(v),
                        Value::Point(p) => points.push(p.position),
                        Value::Path(p) => {
                            points.extend(p.points.iter().map(|point| point.position));
                            for sub in &p.subpaths {
                                points.extend(sub.points.iter().map(|point| point.position));
                            }
                        }
                        Value::Mesh(g) => {
                            let bounds = g.bounds();
                            if !bounds.is_empty() {
                                points.push(bounds.min);
                                points.push(bounds.max);
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Value::Mesh(node_from_context(
                    GeometryKind::Hull { points },
                    range,
                    ctx,
                )))
            },
        ),
    );

    // Meshes assembled from polygons.
    table.insert(
        "mesh".to_owned(),
        Symbol::block(
            BlockType::new(
                BlockKind::Group,
                ValueType::union_of([ValueType::Polygon, ValueType::Mesh]),
                ValueType::Mesh,
            ),
            |range, ctx| {
                let mut polygons: Vec<Polygon> = Vec::new();
                let mut nodes: Vec<Geometry> = Vec::new();
                for child in std::mem::take(&mut ctx.children) {
                    match child {
                        Value::Polygon(polygon) => polygons.push(polygon),
                        Value::Mesh(geometry) => nodes.push(geometry),
                        _ => {}
                    }
                }
                let mut node = node_from_context(
                    GeometryKind::Mesh {
                        mesh: std::rc::Rc::new(Mesh::new(polygons)),
                    },
                    range,
                    ctx,
                );
                node.children = nodes;
                Ok(Value::Mesh(node))
            },
        ),
    );

    // Debug marks its children for host-side highlighting.
    table.insert(
        "debug".to_owned(),
        Symbol::block(
            BlockType::new(BlockKind::Group, mesh_and_text(), ValueType::Mesh),
            |range, ctx| {
                let mut children = mesh_children(ctx);
                for child in &mut children {
                    child.debug = true;
                }
                if children.len() == 1 && ctx.name.is_none() {
                    return Ok(Value::Mesh(children.remove(0)));
                }
                let mut node = node_from_context(GeometryKind::Group, range, ctx);
                node.children = children;
                Ok(Value::Mesh(node))
            },
        ),
    );

    // Objects collect the definitions made inside their body.
    table.insert(
        "object".to_owned(),
        Symbol::block(
            BlockType::new(BlockKind::User, ValueType::Any, ValueType::Any),
            |_, ctx| {
                let mut fields = indexmap::IndexMap::new();
                for name in std::mem::take(&mut ctx.definition_order) {
                    if let Some(Symbol::Constant(value)) = ctx.user_symbols.get(&name) {
                        fields.insert(name, value.clone());
                    }
                }
                Ok(Value::Object(fields))
            },
        ),
    );

    table
}

/// Symbols only the root context exposes.
pub(super) fn root_only() -> SymbolTable {
    let mut table = SymbolTable::default();

    table.insert(
        "background".to_owned(),
        Symbol::property(
            ValueType::union_of([ValueType::Color, ValueType::Texture, ValueType::String]),
            |value, range, ctx| {
                ctx.background = match value {
                    Value::Color(c) => Some(MaterialProperty::Color(c)),
                    other => materials::texture_from(other, range, ctx)?.map(MaterialProperty::Texture),
                };
                Ok(())
            },
            |_, ctx| {
                Ok(match &ctx.background {
                    Some(MaterialProperty::Color(c)) => Value::Color(*c),
                    Some(MaterialProperty::Texture(t)) => Value::Texture(t.clone()),
                    None => Value::Color(Color::CLEAR),
                })
            },
        ),
    );

    table.insert(
        "camera".to_owned(),
        Symbol::block(
            BlockType::custom(
                BlockKind::Shape,
                AHashMap::from_iter([
                    number_option("fov"),
                    number_option("width"),
                    number_option("height"),
                ]),
                ValueType::void(),
                ValueType::Mesh,
            ),
            |range, ctx| {
                let camera = Camera {
                    fov: option_number(ctx, "fov"),
                    width: option_number(ctx, "width"),
                    height: option_number(ctx, "height"),
                    background: ctx.background.clone(),
                };
                Ok(Value::Mesh(node_from_context(
                    GeometryKind::Camera { camera },
                    range,
                    ctx,
                )))
            },
        ),
    );

    table.insert(
        "light".to_owned(),
        Symbol::block(
            BlockType::custom(
                BlockKind::Shape,
                AHashMap::from_iter([
                    option_with_default("spread", Value::Number(0.25)),
                    option_with_default("penumbra", Value::Number(0.0)),
                ]),
                ValueType::void(),
                ValueType::Mesh,
            ),
            |range, ctx| {
                let kind = match (ctx.has_position, ctx.has_orientation) {
                    (false, false) => LightKind::Ambient,
                    (false, true) => LightKind::Directional,
                    (true, false) => LightKind::Point,
                    (true, true) => LightKind::Spot,
                };
                let color = ctx
                    .material
                    .diffuse
                    .as_ref()
                    .and_then(MaterialProperty::color)
                    .unwrap_or(Color::WHITE);
                let light = Light {
                    kind,
                    color,
                    spread: option_number(ctx, "spread").unwrap_or(0.25),
                    penumbra: option_number(ctx, "penumbra").unwrap_or(0.0),
                };
                Ok(Value::Mesh(node_from_context(
                    GeometryKind::Light { light },
                    range,
                    ctx,
                )))
            },
        ),
    );

    table
}

fn number_option(name: &str) -> (String, OptionSlot) {
    (
        name.to_owned(),
        OptionSlot {
            value_type: ValueType::Number,
            default: None,
        },
    )
}

fn option_with_default(name: &str, default: Value) -> (String, OptionSlot) {
    (
        name.to_owned(),
        OptionSlot {
            value_type: default.value_type(),
            default: Some(default),
        },
    )
}

/// A primitive: no children, placement via properties, result named by the
/// current context name.
fn primitive(kind: impl Fn(&EvaluationContext<'_>) -> GeometryKind + 'static) -> Symbol {
    Symbol::block(
        BlockType::new(BlockKind::Shape, ValueType::void(), ValueType::Mesh),
        move |range, ctx| {
            let kind = kind(ctx);
            Ok(Value::Mesh(node_from_context(kind, range, ctx)))
        },
    )
}

/// A combinator node built over accumulated mesh children.
fn combinator(kind: GeometryKind, child_types: ValueType) -> Symbol {
    Symbol::block(
        BlockType::new(BlockKind::Group, child_types, ValueType::Mesh),
        move |range, ctx| {
            let children = mesh_children(ctx);
            let mut node = node_from_context(kind.clone(), range, ctx);
            node.children = children;
            Ok(Value::Mesh(node))
        },
    )
}

/// A builder node over accumulated path children.
fn builder(kind: impl Fn(Vec<carve_geom::Path>, &EvaluationContext<'_>) -> GeometryKind + 'static) -> Symbol {
    Symbol::block(
        BlockType::new(BlockKind::Builder, ValueType::Path, ValueType::Mesh),
        move |range, ctx| {
            let shapes = path_children(ctx);
            let kind = kind(shapes, ctx);
            Ok(Value::Mesh(node_from_context(kind, range, ctx)))
        },
    )
}

/// The grouping rule user blocks share with built-in groups: a single
/// unnamed child passes through, anything else becomes a named group.
pub(crate) fn group_or_single(
    mut children: Vec<Geometry>,
    range: &SourceRange,
    ctx: &mut EvaluationContext<'_>,
) -> EvalResult<Value> {
    if children.len() == 1 && ctx.name.is_none() {
        return Ok(Value::Mesh(children.remove(0)));
    }
    let mut node = node_from_context(GeometryKind::Group, range, ctx);
    node.children = children;
    Ok(Value::Mesh(node))
}
