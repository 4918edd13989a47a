//! The owned geometry tree, cameras, lights, and the evaluated scene.

use std::{cell::RefCell, ops::Range, rc::Rc};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::{
    color::Color,
    material::{Material, MaterialProperty},
    math::{Bounds, Transform, Vector},
    path::{Path, Polygon, Text},
};

/// A concrete mesh, either loaded by the host or produced by a builder.
///
/// Mesh construction math lives downstream; the interpreter only carries
/// meshes around and reports their bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub polygons: Vec<Polygon>,
}

impl Mesh {
    #[must_use]
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.polygons
            .iter()
            .fold(Bounds::EMPTY, |bounds, polygon| bounds.union(polygon.bounds()))
    }
}

/// A camera node's intrinsic settings; its placement is the node transform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub fov: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub background: Option<MaterialProperty>,
}

/// The illumination style of a light node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum LightKind {
    /// Uniform light with no position or direction.
    Ambient,
    /// Parallel rays along the node's orientation.
    Directional,
    /// Radiates from the node's position.
    Point,
    /// A cone from the node's position along its orientation.
    Spot,
}

/// A light node's intrinsic settings; placement is the node transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    /// Cone angle for spot lights, in half-turns.
    pub spread: f64,
    /// Soft-edge fraction of the spread, 0–1.
    pub penumbra: f64,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightKind::Ambient,
            color: Color::WHITE,
            spread: 0.25,
            penumbra: 0.0,
        }
    }
}

/// What a geometry node is: a primitive, a builder over path shapes, a CSG
/// combinator over its children, or a leaf payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum GeometryKind {
    /// No geometry of its own; used for named containers.
    Group,
    Cube,
    Sphere { segments: u32 },
    Cylinder { segments: u32 },
    Cone { segments: u32 },
    /// Path shapes swept along the z axis (or along explicit paths).
    Extrude { shapes: Vec<Path>, along: Vec<Path> },
    /// Path shapes revolved around the y axis.
    Lathe { shapes: Vec<Path>, segments: u32 },
    /// Surface skinned through consecutive cross-sections.
    Loft { shapes: Vec<Path> },
    /// Closed paths filled into flat surfaces.
    Fill { shapes: Vec<Path> },
    /// Convex hull of child meshes, paths, and points.
    Hull { points: Vec<Vector> },
    Union,
    Difference,
    Intersection,
    Xor,
    /// First child retained, overlapping surface replaced by the others.
    Stencil,
    Path { path: Path },
    Mesh { mesh: Rc<Mesh> },
    /// Attributed text; glyph outlines are produced downstream.
    Text { text: Text },
    Camera { camera: Camera },
    Light { light: Light },
}

impl GeometryKind {
    /// The node's own bounds before its transform is applied.
    #[must_use]
    pub fn local_bounds(&self) -> Bounds {
        match self {
            Self::Cube | Self::Sphere { .. } | Self::Cylinder { .. } | Self::Cone { .. } => Bounds::UNIT,
            Self::Extrude { shapes, along } => {
                let shape_bounds = shapes_bounds(shapes);
                if along.is_empty() {
                    // A unit-depth sweep along z, centered.
                    let mut bounds = shape_bounds;
                    bounds.min.z -= 0.5;
                    bounds.max.z += 0.5;
                    bounds
                } else {
                    along.iter().fold(Bounds::EMPTY, |bounds, path| {
                        bounds.union(path.bounds())
                    })
                }
            }
            Self::Lathe { shapes, .. } => {
                let bounds = shapes_bounds(shapes);
                let radius = bounds.max.x.abs().max(bounds.min.x.abs());
                Bounds::new(
                    Vector::new(-radius, bounds.min.y, -radius),
                    Vector::new(radius, bounds.max.y, radius),
                )
            }
            Self::Loft { shapes } | Self::Fill { shapes } => shapes_bounds(shapes),
            Self::Hull { points } => Bounds::from_points(points.iter().copied()),
            Self::Path { path } => path.bounds(),
            Self::Mesh { mesh } => mesh.bounds(),
            Self::Group
            | Self::Union
            | Self::Difference
            | Self::Intersection
            | Self::Xor
            | Self::Stencil
            | Self::Text { .. }
            | Self::Camera { .. }
            | Self::Light { .. } => Bounds::EMPTY,
        }
    }

    /// True when the node combines its children rather than contributing
    /// geometry of its own.
    #[must_use]
    pub fn is_combinator(&self) -> bool {
        matches!(
            self,
            Self::Group | Self::Union | Self::Difference | Self::Intersection | Self::Xor | Self::Stencil
        )
    }
}

fn shapes_bounds(shapes: &[Path]) -> Bounds {
    shapes
        .iter()
        .fold(Bounds::EMPTY, |bounds, path| bounds.union(path.bounds()))
}

/// One node of the evaluated scene tree.
///
/// Nodes own their children; sharing only occurs for mesh payloads, which
/// are held behind `Rc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub kind: GeometryKind,
    pub name: Option<String>,
    pub transform: Transform,
    pub material: Material,
    /// Maximum crease angle for smooth shading, in half-turns.
    pub smoothing: Option<f64>,
    /// Marked for debug highlighting by the host.
    pub debug: bool,
    pub children: Vec<Geometry>,
    /// Byte range of the statement that produced this node.
    pub source_range: Option<Range<usize>>,
}

impl Geometry {
    #[must_use]
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            name: None,
            transform: Transform::IDENTITY,
            material: Material::default(),
            smoothing: None,
            debug: false,
            children: Vec::new(),
            source_range: None,
        }
    }

    /// Bounds of this node and all descendants, in the parent's space.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let local = self
            .children
            .iter()
            .fold(self.kind.local_bounds(), |bounds, child| bounds.union(child.bounds()));
        local.transformed(self.transform)
    }

    #[must_use]
    pub fn is_camera(&self) -> bool {
        matches!(self.kind, GeometryKind::Camera { .. })
    }

    /// Depth-first traversal over this node and all descendants.
    pub fn walk(&self, f: &mut impl FnMut(&Geometry)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }
}

/// A cache for expensive mesh work, shared across evaluations by the host.
///
/// Cloning the cache clones the handle, not the contents. Single-threaded
/// use only; a host evaluating concurrently must use distinct caches.
#[derive(Debug, Clone, Default)]
pub struct GeometryCache {
    meshes: Rc<RefCell<AHashMap<String, Rc<Mesh>>>>,
}

impl GeometryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mesh(&self, key: &str) -> Option<Rc<Mesh>> {
        self.meshes.borrow().get(key).cloned()
    }

    pub fn insert_mesh(&self, key: impl Into<String>, mesh: Rc<Mesh>) {
        self.meshes.borrow_mut().insert(key.into(), mesh);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.borrow().is_empty()
    }
}

/// The result of evaluating a program: geometry roots, the background, and
/// every camera found in the tree.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub background: Option<MaterialProperty>,
    pub children: Vec<Geometry>,
    pub cameras: Vec<Geometry>,
    /// Nodes that were given a `name`, indexed for host-side lookup.
    pub named_objects: AHashMap<String, Geometry>,
    pub cache: GeometryCache,
}

impl Scene {
    /// Bounds of all root nodes.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        self.children
            .iter()
            .fold(Bounds::EMPTY, |bounds, child| bounds.union(child.bounds()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_cube_bounds() {
        let mut cube = Geometry::new(GeometryKind::Cube);
        cube.transform.scale = Vector::new(2.0, 2.0, 2.0);
        let bounds = cube.bounds();
        assert_eq!(bounds.min, Vector::new(-1.0, -1.0, -1.0));
        assert_eq!(bounds.max, Vector::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn group_bounds_come_from_children() {
        let mut group = Geometry::new(GeometryKind::Group);
        assert!(group.bounds().is_empty());
        group.children.push(Geometry::new(GeometryKind::Cube));
        assert_eq!(group.bounds(), Bounds::UNIT);
    }

    #[test]
    fn cache_shares_contents_across_clones() {
        let cache = GeometryCache::new();
        let clone = cache.clone();
        cache.insert_mesh("cube/16", Rc::new(Mesh::default()));
        assert!(clone.mesh("cube/16").is_some());
    }
}
