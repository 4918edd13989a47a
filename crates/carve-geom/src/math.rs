//! Vector, rotation, transform, and bounds math.
//!
//! Rotations are stored as unit quaternions but constructed from and
//! reported as roll/yaw/pitch Euler angles measured in half-turns, which is
//! the unit the language exposes. Transforms compose scale, then rotation,
//! then offset.

use std::{
    f64::consts::PI,
    ops::{Add, Div, Mul, Neg, Sub},
};

use serde::{Deserialize, Serialize};

/// A point or direction in 3D space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Builds a vector from up to three components, filling in zero for any
    /// missing component.
    #[must_use]
    pub fn from_components(components: &[f64]) -> Self {
        Self::new(
            components.first().copied().unwrap_or(0.0),
            components.get(1).copied().unwrap_or(0.0),
            components.get(2).copied().unwrap_or(0.0),
        )
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[must_use]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns the unit vector in this direction, or zero for a zero vector.
    #[must_use]
    pub fn normalized(self) -> Self {
        let length = self.length();
        if length == 0.0 { Self::ZERO } else { self / length }
    }

    /// Component-wise scale.
    #[must_use]
    pub fn scaled(self, by: Self) -> Self {
        Self::new(self.x * by.x, self.y * by.y, self.z * by.z)
    }

    #[must_use]
    pub fn rotated(self, by: Rotation) -> Self {
        by.rotate(self)
    }

    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Returns the components as a fixed-order array.
    #[must_use]
    pub fn components(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for Vector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vector {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Vector {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vector {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// An orientation in 3D space.
///
/// Stored as a unit quaternion so rotations compose exactly; constructed
/// from roll (z axis), yaw (y axis), and pitch (x axis) angles in
/// half-turns, applied in that order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    x: f64,
    y: f64,
    z: f64,
    w: f64,
}

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rotation {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Builds a rotation from roll/yaw/pitch angles in half-turns.
    #[must_use]
    pub fn from_euler(roll: f64, yaw: f64, pitch: f64) -> Self {
        let half = |turns: f64| turns * PI / 2.0;
        let (sr, cr) = half(roll).sin_cos();
        let (sy, cy) = half(yaw).sin_cos();
        let (sp, cp) = half(pitch).sin_cos();
        // q = qz(roll) * qy(yaw) * qx(pitch)
        Self {
            x: cr * cy * sp - sr * sy * cp,
            y: cr * sy * cp + sr * cy * sp,
            z: sr * cy * cp - cr * sy * sp,
            w: cr * cy * cp + sr * sy * sp,
        }
        .normalized()
    }

    /// Builds a rotation from up to three half-turn components in
    /// roll, yaw, pitch order.
    #[must_use]
    pub fn from_components(components: &[f64]) -> Self {
        Self::from_euler(
            components.first().copied().unwrap_or(0.0),
            components.get(1).copied().unwrap_or(0.0),
            components.get(2).copied().unwrap_or(0.0),
        )
    }

    /// Rotation about the z axis, in half-turns.
    #[must_use]
    pub fn roll(self) -> f64 {
        let siny_cosp = 2.0 * (self.w * self.z + self.x * self.y);
        let cosy_cosp = 1.0 - 2.0 * (self.y * self.y + self.z * self.z);
        siny_cosp.atan2(cosy_cosp) / PI
    }

    /// Rotation about the y axis, in half-turns.
    #[must_use]
    pub fn yaw(self) -> f64 {
        let sinp = 2.0 * (self.w * self.y - self.z * self.x);
        sinp.clamp(-1.0, 1.0).asin() / PI
    }

    /// Rotation about the x axis, in half-turns.
    #[must_use]
    pub fn pitch(self) -> f64 {
        let sinr_cosp = 2.0 * (self.w * self.x + self.y * self.z);
        let cosr_cosp = 1.0 - 2.0 * (self.x * self.x + self.y * self.y);
        sinr_cosp.atan2(cosr_cosp) / PI
    }

    #[must_use]
    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }

    fn normalized(self) -> Self {
        let norm = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if norm == 0.0 {
            return Self::IDENTITY;
        }
        Self {
            x: self.x / norm,
            y: self.y / norm,
            z: self.z / norm,
            w: self.w / norm,
        }
    }

    /// Applies this rotation to a vector.
    #[must_use]
    pub fn rotate(self, v: Vector) -> Vector {
        let u = Vector::new(self.x, self.y, self.z);
        let uv = u.cross(v);
        let uuv = u.cross(uv);
        v + (uv * self.w + uuv) * 2.0
    }
}

impl Mul for Rotation {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self {
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        }
        .normalized()
    }
}

/// Position, orientation, and scale applied to child geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub offset: Vector,
    pub rotation: Rotation,
    pub scale: Vector,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        offset: Vector::ZERO,
        rotation: Rotation::IDENTITY,
        scale: Vector::ONE,
    };

    #[must_use]
    pub fn offset(offset: Vector) -> Self {
        Self {
            offset,
            ..Self::IDENTITY
        }
    }

    #[must_use]
    pub fn rotation(rotation: Rotation) -> Self {
        Self {
            rotation,
            ..Self::IDENTITY
        }
    }

    #[must_use]
    pub fn scale(scale: Vector) -> Self {
        Self {
            scale,
            ..Self::IDENTITY
        }
    }

    #[must_use]
    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }

    /// Applies the transform to a point: scale, then rotate, then offset.
    #[must_use]
    pub fn apply(self, point: Vector) -> Vector {
        point.scaled(self.scale).rotated(self.rotation) + self.offset
    }

    /// Composes `self` (the child transform) with an enclosing `parent`
    /// transform, so that `self.then(parent).apply(p)` equals
    /// `parent.apply(self.apply(p))` for uniform scales.
    #[must_use]
    pub fn then(self, parent: Self) -> Self {
        Self {
            offset: parent.apply(self.offset),
            rotation: parent.rotation * self.rotation,
            scale: self.scale.scaled(parent.scale),
        }
    }

    pub fn translate(&mut self, offset: Vector) {
        self.offset = self.apply(offset);
    }

    pub fn rotate(&mut self, rotation: Rotation) {
        self.rotation = self.rotation * rotation;
    }

    pub fn rescale(&mut self, scale: Vector) {
        self.scale = self.scale.scaled(scale);
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vector,
    pub max: Vector,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds {
    pub const EMPTY: Self = Self {
        min: Vector::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
        max: Vector::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
    };

    /// The unit box centered on the origin, which primitives occupy before
    /// any transform is applied.
    pub const UNIT: Self = Self {
        min: Vector::new(-0.5, -0.5, -0.5),
        max: Vector::new(0.5, 0.5, 0.5),
    };

    #[must_use]
    pub const fn new(min: Vector, max: Vector) -> Self {
        Self { min, max }
    }

    /// Builds the smallest bounds containing all of `points`.
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Vector>) -> Self {
        points.into_iter().fold(Self::EMPTY, |bounds, p| Self {
            min: bounds.min.min(p),
            max: bounds.max.max(p),
        })
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    #[must_use]
    pub fn size(self) -> Vector {
        if self.is_empty() {
            return Vector::ZERO;
        }
        self.max - self.min
    }

    #[must_use]
    pub fn center(self) -> Vector {
        if self.is_empty() {
            return Vector::ZERO;
        }
        (self.min + self.max) / 2.0
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns the axis-aligned bounds of the eight transformed corners.
    #[must_use]
    pub fn transformed(self, by: Transform) -> Self {
        if self.is_empty() {
            return self;
        }
        Self::from_points(self.corners().map(|corner| by.apply(corner)))
    }

    fn corners(self) -> [Vector; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vector::new(lo.x, lo.y, lo.z),
            Vector::new(hi.x, lo.y, lo.z),
            Vector::new(lo.x, hi.y, lo.z),
            Vector::new(hi.x, hi.y, lo.z),
            Vector::new(lo.x, lo.y, hi.z),
            Vector::new(hi.x, lo.y, hi.z),
            Vector::new(lo.x, hi.y, hi.z),
            Vector::new(hi.x, hi.y, hi.z),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn euler_round_trip() {
        let rotation = Rotation::from_euler(0.25, 0.1, -0.3);
        assert_close(rotation.roll(), 0.25);
        assert_close(rotation.yaw(), 0.1);
        assert_close(rotation.pitch(), -0.3);
    }

    #[test]
    fn half_turn_roll_flips_x() {
        let rotation = Rotation::from_euler(1.0, 0.0, 0.0);
        let rotated = rotation.rotate(Vector::new(1.0, 0.0, 0.0));
        assert_close(rotated.x, -1.0);
        assert_close(rotated.y, 0.0);
        assert_close(rotated.z, 0.0);
    }

    #[test]
    fn transform_apply_matches_composition() {
        let child = Transform {
            offset: Vector::new(1.0, 0.0, 0.0),
            rotation: Rotation::from_euler(0.5, 0.0, 0.0),
            scale: Vector::new(2.0, 2.0, 2.0),
        };
        let parent = Transform::offset(Vector::new(0.0, 3.0, 0.0));
        let p = Vector::new(1.0, 1.0, 1.0);
        let lhs = child.then(parent).apply(p);
        let rhs = parent.apply(child.apply(p));
        assert_close(lhs.x, rhs.x);
        assert_close(lhs.y, rhs.y);
        assert_close(lhs.z, rhs.z);
    }

    #[test]
    fn unit_bounds_scaled_by_two() {
        let bounds = Bounds::UNIT.transformed(Transform::scale(Vector::new(2.0, 2.0, 2.0)));
        assert_eq!(bounds.min, Vector::new(-1.0, -1.0, -1.0));
        assert_eq!(bounds.max, Vector::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn empty_bounds_union_is_identity() {
        let bounds = Bounds::new(Vector::ZERO, Vector::ONE);
        assert_eq!(Bounds::EMPTY.union(bounds), bounds);
        assert_eq!(bounds.union(Bounds::EMPTY), bounds);
    }
}
