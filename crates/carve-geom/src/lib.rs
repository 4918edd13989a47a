//! Geometry value types and the owned scene tree for the Carve interpreter.
//!
//! This crate is the interpreter's external collaborator: it defines the
//! vector/transform math, materials, paths, and the [`Geometry`] node tree
//! that evaluation produces. Mesh construction (booleans, tessellation,
//! glyph outlines) is out of scope; the types here carry enough structure
//! for a downstream renderer or exporter to do that work, plus the small
//! amount of math the evaluator itself observes (transform composition and
//! bounds of transformed nodes).

mod color;
mod geometry;
mod material;
mod math;
mod path;
mod svg;

pub use crate::{
    color::{Color, Texture},
    geometry::{Camera, Geometry, GeometryCache, GeometryKind, Light, LightKind, Mesh, Scene},
    material::{Material, MaterialProperty},
    math::{Bounds, Rotation, Transform, Vector},
    path::{Path, PathPoint, Polygon, Text},
    svg::SvgPathError,
};
