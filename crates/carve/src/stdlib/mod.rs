//! The standard library: statically composed symbol tables per block kind.
//!
//! Tables are built once per evaluation and composed the same way the
//! block kinds nest: `group` is `shape` plus child transforms and fonts,
//! `builder` is `group` over path children, and so on. Every built-in uses
//! the same `Symbol` calling convention as user definitions.

mod functions;
mod materials;
mod paths;
mod shapes;
mod transforms;

pub(crate) use shapes::group_or_single;

use std::rc::Rc;

use ahash::AHashMap;

use carve_geom::{Geometry, GeometryKind, Path};

use crate::{
    context::EvaluationContext,
    lexer::SourceRange,
    symbols::{BlockKind, Symbol, SymbolTable},
    value::Value,
};

pub(crate) struct Stdlib {
    tables: AHashMap<BlockKind, Rc<SymbolTable>>,
}

impl Stdlib {
    pub fn new() -> Self {
        // Callable everywhere: functions, constants, colors, and the
        // geometry and path constructors. A constructor used where its
        // result cannot land reports an unused value, which is the right
        // diagnostic anyway.
        let mut global = functions::table();
        merge_into(&mut global, shapes::constructors());
        merge_into(&mut global, paths::constructors());
        // `point`/`curve` land anywhere a point is accepted (paths, hull,
        // mesh polygons); elsewhere they report an unused value.
        merge_into(&mut global, paths::points());

        let mut shape = global.clone();
        merge_into(&mut shape, transforms::placement());
        merge_into(&mut shape, materials::table());

        let mut group = shape.clone();
        merge_into(&mut group, transforms::child_transforms());
        merge_into(&mut group, transforms::appearance());

        // Definition bodies see everything a group does.
        let user = group.clone();
        let builder = group.clone();

        let mut path = global.clone();
        merge_into(&mut path, transforms::placement());
        merge_into(&mut path, transforms::child_transforms());

        let mut path_shape = global.clone();
        merge_into(&mut path_shape, transforms::placement());

        let mut text = path_shape.clone();
        merge_into(&mut text, transforms::appearance());
        merge_into(&mut text, materials::table());

        let mut root = group.clone();
        merge_into(&mut root, shapes::root_only());

        let mut tables = AHashMap::new();
        tables.insert(BlockKind::Root, Rc::new(root));
        tables.insert(BlockKind::Shape, Rc::new(shape));
        tables.insert(BlockKind::Group, Rc::new(group));
        tables.insert(BlockKind::Builder, Rc::new(builder));
        tables.insert(BlockKind::Path, Rc::new(path));
        tables.insert(BlockKind::PathShape, Rc::new(path_shape));
        tables.insert(BlockKind::Text, Rc::new(text));
        tables.insert(BlockKind::User, Rc::new(user));
        Self { tables }
    }

    pub fn table(&self, kind: BlockKind) -> Rc<SymbolTable> {
        Rc::clone(&self.tables[&kind])
    }
}

fn merge_into(table: &mut SymbolTable, additions: SymbolTable) {
    table.extend(additions);
}

/// A geometry node built from the invoking context's accumulated state.
pub(crate) fn node_from_context(
    kind: GeometryKind,
    range: &SourceRange,
    ctx: &mut EvaluationContext<'_>,
) -> Geometry {
    let mut geometry = Geometry::new(kind);
    geometry.name = ctx.name.clone();
    geometry.transform = ctx.transform;
    geometry.material = ctx.material.clone();
    geometry.smoothing = ctx.smoothing;
    geometry.source_range = Some(range.clone());
    geometry
}

/// Drains the context's children as geometry nodes. Text children become
/// text nodes; everything else has already been wrapped by `add_value`.
pub(crate) fn mesh_children(ctx: &mut EvaluationContext<'_>) -> Vec<Geometry> {
    std::mem::take(&mut ctx.children)
        .into_iter()
        .filter_map(|child| match child {
            Value::Mesh(geometry) => Some(geometry),
            Value::Text(text) => Some(Geometry::new(GeometryKind::Text { text })),
            _ => None,
        })
        .collect()
}

/// Drains the context's children as paths.
pub(crate) fn path_children(ctx: &mut EvaluationContext<'_>) -> Vec<Path> {
    std::mem::take(&mut ctx.children)
        .into_iter()
        .filter_map(|child| match child {
            Value::Path(path) => Some(path),
            _ => None,
        })
        .collect()
}

/// Reads the current binding of an option by name.
pub(crate) fn option_value(ctx: &EvaluationContext<'_>, name: &str) -> Option<Value> {
    match ctx.lookup(name) {
        Some(Symbol::Option(value) | Symbol::Constant(value)) => Some(value),
        _ => None,
    }
}

pub(crate) fn option_number(ctx: &EvaluationContext<'_>, name: &str) -> Option<f64> {
    option_value(ctx, name).and_then(|value| value.as_number())
}
