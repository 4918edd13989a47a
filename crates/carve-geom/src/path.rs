//! Paths, polygons, and attributed text.

use serde::{Deserialize, Serialize};

use crate::{
    color::Color,
    math::{Bounds, Transform, Vector},
};

/// A control point on a path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub position: Vector,
    /// True for curve control points, false for sharp corners.
    pub is_curved: bool,
}

impl PathPoint {
    #[must_use]
    pub const fn corner(position: Vector) -> Self {
        Self {
            position,
            is_curved: false,
        }
    }

    #[must_use]
    pub const fn curve(position: Vector) -> Self {
        Self {
            position,
            is_curved: true,
        }
    }

    #[must_use]
    pub fn transformed(self, by: Transform) -> Self {
        Self {
            position: by.apply(self.position),
            ..self
        }
    }
}

/// An open or closed sequence of path points, possibly with subpaths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub points: Vec<PathPoint>,
    pub subpaths: Vec<Path>,
}

impl Path {
    #[must_use]
    pub fn new(points: Vec<PathPoint>) -> Self {
        Self {
            points,
            subpaths: Vec::new(),
        }
    }

    /// Joins multiple paths into one compound path. A single path is
    /// returned unchanged.
    #[must_use]
    pub fn joined(mut paths: Vec<Self>) -> Self {
        if paths.len() == 1 {
            return paths.remove(0);
        }
        Self {
            points: Vec::new(),
            subpaths: paths,
        }
    }

    /// A closed polygon with `sides` corner points on the unit circle.
    #[must_use]
    pub fn polygon(sides: u32) -> Self {
        Self::circle_points(sides.max(3), false)
    }

    /// A closed curve with `segments` curve points on the unit circle.
    #[must_use]
    pub fn circle(segments: u32) -> Self {
        Self::circle_points(segments.max(3), true)
    }

    fn circle_points(count: u32, curved: bool) -> Self {
        let mut points: Vec<PathPoint> = (0..count)
            .map(|i| {
                let angle = f64::from(i) / f64::from(count) * std::f64::consts::TAU;
                let position = Vector::new(angle.sin() * 0.5, angle.cos() * 0.5, 0.0);
                PathPoint {
                    position,
                    is_curved: curved,
                }
            })
            .collect();
        if let Some(first) = points.first().copied() {
            points.push(first);
        }
        Self::new(points)
    }

    /// A closed unit square.
    #[must_use]
    pub fn square() -> Self {
        Self::rectangle(1.0, 1.0)
    }

    #[must_use]
    pub fn rectangle(width: f64, height: f64) -> Self {
        let (w, h) = (width / 2.0, height / 2.0);
        Self::new(vec![
            PathPoint::corner(Vector::new(-w, h, 0.0)),
            PathPoint::corner(Vector::new(-w, -h, 0.0)),
            PathPoint::corner(Vector::new(w, -h, 0.0)),
            PathPoint::corner(Vector::new(w, h, 0.0)),
            PathPoint::corner(Vector::new(-w, h, 0.0)),
        ])
    }

    /// A rectangle with corners rounded to `radius`, approximated with
    /// curve points at the corners.
    #[must_use]
    pub fn roundrect(width: f64, height: f64, radius: f64) -> Self {
        let radius = radius.clamp(0.0, width.min(height) / 2.0);
        if radius <= 0.0 {
            return Self::rectangle(width, height);
        }
        let (w, h) = (width / 2.0, height / 2.0);
        let r = radius;
        // Each corner becomes entry point, curve control at the corner, exit
        // point, walking the same loop as `rectangle`.
        let corners = [
            ((-w + r, h), (-w, h), (-w, h - r)),
            ((-w, -h + r), (-w, -h), (-w + r, -h)),
            ((w - r, -h), (w, -h), (w, -h + r)),
            ((w, h - r), (w, h), (w - r, h)),
        ];
        let mut points = Vec::with_capacity(13);
        for ((ex, ey), (cx, cy), (xx, xy)) in corners {
            points.push(PathPoint::corner(Vector::new(ex, ey, 0.0)));
            points.push(PathPoint::curve(Vector::new(cx, cy, 0.0)));
            points.push(PathPoint::corner(Vector::new(xx, xy, 0.0)));
        }
        let first = points[0];
        points.push(first);
        Self::new(points)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => self.points.len() > 2 && first.position == last.position,
            _ => self.subpaths.iter().all(Self::is_closed),
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let own = Bounds::from_points(self.points.iter().map(|p| p.position));
        self.subpaths.iter().fold(own, |bounds, sub| bounds.union(sub.bounds()))
    }

    #[must_use]
    pub fn transformed(&self, by: Transform) -> Self {
        Self {
            points: self.points.iter().map(|p| p.transformed(by)).collect(),
            subpaths: self.subpaths.iter().map(|sub| sub.transformed(by)).collect(),
        }
    }
}

/// A flat polygon face, the unit out of which meshes are built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Vector>,
}

impl Polygon {
    #[must_use]
    pub fn new(vertices: Vec<Vector>) -> Self {
        Self { vertices }
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(self.vertices.iter().copied())
    }

    #[must_use]
    pub fn transformed(&self, by: Transform) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| by.apply(*v)).collect(),
        }
    }
}

/// A run of text with the attributes current when it was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub string: String,
    pub font: Option<String>,
    pub color: Option<Color>,
    pub linespacing: Option<f64>,
}

impl Text {
    #[must_use]
    pub fn new(string: impl Into<String>) -> Self {
        Self {
            string: string.into(),
            font: None,
            color: None,
            linespacing: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_is_closed_and_unit_sized() {
        let square = Path::square();
        assert!(square.is_closed());
        let bounds = square.bounds();
        assert_eq!(bounds.size(), Vector::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn circle_point_count() {
        let circle = Path::circle(16);
        assert_eq!(circle.points.len(), 17);
        assert!(circle.is_closed());
        assert!(circle.points.iter().all(|p| p.is_curved));
    }

    #[test]
    fn roundrect_with_zero_radius_is_rectangle() {
        assert_eq!(Path::roundrect(2.0, 1.0, 0.0), Path::rectangle(2.0, 1.0));
    }
}
