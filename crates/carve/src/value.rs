//! Runtime values and the single conversion function.
//!
//! Values are owned and cheap to clone structurally; only meshes share
//! their payload (behind `Rc` inside the geometry tree). The static
//! analyzer predicts types, but `convert` here is the authoritative check:
//! when they disagree, this file wins.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use carve_geom::{Bounds, Color, Geometry, Path, PathPoint, Polygon, Rotation, Text, Texture, Vector};

use crate::types::{component_member, ValueType, ORDINALS};

/// A numeric range with an optional step, inclusive of both endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeValue {
    pub start: f64,
    pub end: f64,
    pub step: Option<f64>,
}

impl RangeValue {
    #[must_use]
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            step: None,
        }
    }

    #[must_use]
    pub fn with_step(self, step: f64) -> Self {
        Self {
            step: Some(step),
            ..self
        }
    }

    /// Iterates the range inclusively. A small tolerance absorbs float
    /// accumulation so `1 to 3 step 0.5` ends on exactly 3.
    pub fn iter(self) -> impl Iterator<Item = f64> {
        let step = self.step.unwrap_or(1.0);
        let span = self.end - self.start;
        let count = if step == 0.0 || span / step < 0.0 {
            0
        } else {
            (span / step + 1e-9).floor() as usize + 1
        };
        (0..count).map(move |i| self.start + step * i as f64)
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    String(String),
    Color(Color),
    Texture(Texture),
    Vector(Vector),
    Size(Vector),
    Rotation(Rotation),
    Text(Text),
    Path(Path),
    Mesh(Geometry),
    Polygon(Polygon),
    Point(PathPoint),
    Range(RangeValue),
    Bounds(Bounds),
    Tuple(Vec<Value>),
    Object(IndexMap<String, Value>),
}

impl Value {
    /// The empty tuple.
    #[must_use]
    pub fn void() -> Self {
        Self::Tuple(Vec::new())
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Tuple(elements) if elements.is_empty())
    }

    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Number(_) => ValueType::Number,
            Self::Boolean(_) => ValueType::Boolean,
            Self::String(_) => ValueType::String,
            Self::Color(_) => ValueType::Color,
            Self::Texture(_) => ValueType::Texture,
            Self::Vector(_) => ValueType::Vector,
            Self::Size(_) => ValueType::Size,
            Self::Rotation(_) => ValueType::Rotation,
            Self::Text(_) => ValueType::Text,
            Self::Path(_) => ValueType::Path,
            Self::Mesh(_) => ValueType::Mesh,
            Self::Polygon(_) => ValueType::Polygon,
            Self::Point(_) => ValueType::Point,
            Self::Range(_) => ValueType::Range,
            Self::Bounds(_) => ValueType::Bounds,
            Self::Tuple(elements) => ValueType::Tuple(elements.iter().map(Self::value_type).collect()),
            Self::Object(fields) => ValueType::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.value_type()))
                    .collect(),
            ),
        }
    }

    /// Short type name for diagnostics.
    #[must_use]
    pub fn type_description(&self) -> String {
        self.value_type().to_string()
    }

    /// The numeric components of a number, vector, size, rotation, color,
    /// or all-numeric tuple. Arithmetic lifts through this view.
    #[must_use]
    pub fn numeric_components(&self) -> Option<Vec<f64>> {
        match self {
            Self::Number(n) => Some(vec![*n]),
            Self::Vector(v) | Self::Size(v) => Some(v.components().to_vec()),
            Self::Rotation(r) => Some(vec![r.roll(), r.yaw(), r.pitch()]),
            Self::Color(c) => Some(c.components().to_vec()),
            Self::Tuple(elements) => elements
                .iter()
                .map(|element| match element {
                    Self::Number(n) => Some(*n),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }

    /// Converts to `target`, or `None` when the value cannot represent it.
    ///
    /// Single-element tuples collapse before any other rule. String to
    /// texture is not handled here: it needs the delegate, and lives in
    /// the evaluator.
    #[must_use]
    pub fn convert(&self, target: &ValueType) -> Option<Self> {
        if target == &ValueType::Any || &self.value_type() == target {
            return Some(self.clone());
        }
        // Collapse a single-element tuple to its element.
        if let Self::Tuple(elements) = self
            && elements.len() == 1
            && !matches!(target, ValueType::Tuple(t) if t.len() == 1)
            && !matches!(target, ValueType::List(_))
        {
            if let Some(converted) = elements[0].convert(target) {
                return Some(converted);
            }
        }
        match target {
            ValueType::Union(members) => members.iter().find_map(|member| self.convert(member)),
            ValueType::List(element) => match self {
                Self::Tuple(elements) => {
                    let converted: Option<Vec<Self>> =
                        elements.iter().map(|e| e.convert(element)).collect();
                    converted.map(Self::Tuple)
                }
                _ => self.convert(element).map(|converted| Self::Tuple(vec![converted])),
            },
            ValueType::Tuple(targets) => {
                let Self::Tuple(elements) = self else {
                    // A scalar fills a one-slot tuple.
                    if targets.len() == 1 {
                        return self.convert(&targets[0]).map(|converted| Self::Tuple(vec![converted]));
                    }
                    return None;
                };
                if elements.len() != targets.len() {
                    return None;
                }
                let converted: Option<Vec<Self>> = elements
                    .iter()
                    .zip(targets)
                    .map(|(element, target)| element.convert(target))
                    .collect();
                converted.map(Self::Tuple)
            }
            ValueType::Vector => {
                let components = self.numeric_components()?;
                (components.len() <= 3).then(|| Self::Vector(Vector::from_components(&components)))
            }
            ValueType::Size => {
                let components = self.numeric_components()?;
                match components[..] {
                    // A single number scales uniformly.
                    [n] => Some(Self::Size(Vector::new(n, n, n))),
                    [x, y] => Some(Self::Size(Vector::new(x, y, 1.0))),
                    [x, y, z] => Some(Self::Size(Vector::new(x, y, z))),
                    _ => None,
                }
            }
            ValueType::Rotation => {
                let components = self.numeric_components()?;
                (components.len() <= 3).then(|| Self::Rotation(Rotation::from_components(&components)))
            }
            ValueType::Color => {
                let components = self.numeric_components()?;
                Color::from_components(&components).map(Self::Color)
            }
            ValueType::Text => match self {
                Self::String(s) => Some(Self::Text(Text::new(s.clone()))),
                Self::Number(n) => Some(Self::Text(Text::new(format_number(*n)))),
                _ => None,
            },
            ValueType::Object(expected) => {
                let Self::Object(fields) = self else {
                    return None;
                };
                // Every declared field must be present and convertible;
                // extra fields pass through untouched.
                if expected
                    .iter()
                    .all(|(name, ty)| fields.get(name).is_some_and(|field| field.convert(ty).is_some()))
                {
                    Some(self.clone())
                } else {
                    None
                }
            }
            ValueType::Path => match self {
                Self::Polygon(polygon) => {
                    let mut points: Vec<PathPoint> =
                        polygon.vertices.iter().copied().map(PathPoint::corner).collect();
                    if let Some(first) = points.first().copied() {
                        points.push(first);
                    }
                    Some(Self::Path(Path::new(points)))
                }
                _ => None,
            },
            ValueType::Number | ValueType::Boolean | ValueType::String => None,
            _ => None,
        }
    }

    /// The dynamic member lookup; mirrors [`ValueType::member_type`].
    #[must_use]
    pub fn member(&self, name: &str) -> Option<Self> {
        match self {
            Self::Vector(v) => match name {
                "x" => Some(Self::Number(v.x)),
                "y" => Some(Self::Number(v.y)),
                "z" => Some(Self::Number(v.z)),
                _ => None,
            },
            Self::Size(s) => match name {
                "width" => Some(Self::Number(s.x)),
                "height" => Some(Self::Number(s.y)),
                "depth" => Some(Self::Number(s.z)),
                _ => None,
            },
            Self::Rotation(r) => match name {
                "roll" => Some(Self::Number(r.roll())),
                "yaw" => Some(Self::Number(r.yaw())),
                "pitch" => Some(Self::Number(r.pitch())),
                _ => None,
            },
            Self::Color(c) => match name {
                "red" => Some(Self::Number(c.r)),
                "green" => Some(Self::Number(c.g)),
                "blue" => Some(Self::Number(c.b)),
                "alpha" => Some(Self::Number(c.a)),
                _ => None,
            },
            Self::Range(r) => match name {
                "start" => Some(Self::Number(r.start)),
                "end" => Some(Self::Number(r.end)),
                "step" => Some(Self::Number(r.step.unwrap_or(1.0))),
                _ => None,
            },
            Self::Bounds(b) => match name {
                "min" => Some(Self::Vector(b.min)),
                "max" => Some(Self::Vector(b.max)),
                "size" => Some(Self::Vector(b.size())),
                "center" => Some(Self::Vector(b.center())),
                "width" => Some(Self::Number(b.size().x)),
                "height" => Some(Self::Number(b.size().y)),
                "depth" => Some(Self::Number(b.size().z)),
                _ => None,
            },
            Self::String(s) => match name {
                "lines" => Some(Self::Tuple(s.lines().map(|l| Self::String(l.to_owned())).collect())),
                "words" => Some(Self::Tuple(
                    s.split_whitespace().map(|w| Self::String(w.to_owned())).collect(),
                )),
                "characters" => Some(Self::Tuple(
                    s.chars().map(|c| Self::String(c.to_string())).collect(),
                )),
                "count" => Some(Self::Number(s.chars().count() as f64)),
                _ => None,
            },
            Self::Mesh(geometry) => match name {
                "name" => Some(Self::String(geometry.name.clone().unwrap_or_default())),
                "bounds" => Some(Self::Bounds(geometry.bounds())),
                _ => None,
            },
            Self::Path(path) => match name {
                "bounds" => Some(Self::Bounds(path.bounds())),
                _ => None,
            },
            Self::Point(point) => match name {
                "x" => Some(Self::Number(point.position.x)),
                "y" => Some(Self::Number(point.position.y)),
                "z" => Some(Self::Number(point.position.z)),
                "isCurved" => Some(Self::Boolean(point.is_curved)),
                _ => None,
            },
            Self::Text(text) => match name {
                "string" => Some(Self::String(text.string.clone())),
                _ => None,
            },
            Self::Object(fields) => fields.get(name).cloned().or_else(|| match name {
                "count" => Some(Self::Number(fields.len() as f64)),
                _ => None,
            }),
            Self::Tuple(elements) => tuple_member(elements, name),
            _ => None,
        }
    }

    /// The member names a value answers to, for fuzzy suggestions.
    #[must_use]
    pub fn member_names(&self) -> Vec<String> {
        let names: &[&str] = match self {
            Self::Vector(_) => &["x", "y", "z"],
            Self::Size(_) => &["width", "height", "depth"],
            Self::Rotation(_) => &["roll", "yaw", "pitch"],
            Self::Color(_) => &["red", "green", "blue", "alpha"],
            Self::Range(_) => &["start", "end", "step"],
            Self::Bounds(_) => &["min", "max", "size", "center", "width", "height", "depth"],
            Self::String(_) => &["lines", "words", "characters", "count"],
            Self::Mesh(_) => &["name", "bounds"],
            Self::Path(_) => &["bounds"],
            Self::Point(_) => &["x", "y", "z", "isCurved"],
            Self::Text(_) => &["string"],
            Self::Object(fields) => {
                let mut names: Vec<String> = fields.keys().cloned().collect();
                names.push("count".to_owned());
                return names;
            }
            Self::Tuple(elements) => {
                let mut names: Vec<String> = ORDINALS[..elements.len().min(ORDINALS.len())]
                    .iter()
                    .map(|&s| s.to_owned())
                    .collect();
                names.extend(["last", "count", "allButFirst", "allButLast"].map(str::to_owned));
                return names;
            }
            _ => &[],
        };
        names.iter().map(|&s| s.to_owned()).collect()
    }

    /// The sequence view a `for` loop iterates: ranges yield numbers,
    /// tuples their elements, objects `[key, value]` pairs in
    /// lexicographic key order.
    #[must_use]
    pub fn sequence(&self) -> Option<Vec<Self>> {
        match self {
            Self::Range(range) => Some(range.iter().map(Self::Number).collect()),
            Self::Tuple(elements) => Some(elements.clone()),
            Self::Object(fields) => {
                let mut keys: Vec<&String> = fields.keys().collect();
                keys.sort();
                Some(
                    keys.into_iter()
                        .map(|key| {
                            Self::Tuple(vec![Self::String(key.clone()), fields[key].clone()])
                        })
                        .collect(),
                )
            }
            _ => None,
        }
    }

    /// The structural equality `=` and `<>` use.
    ///
    /// Floating numbers compare by bit-identity of their hashable form,
    /// not IEEE equality: `NaN` equals itself, and `0` and `-0` are
    /// distinct. The rule applies recursively through vectors, sizes,
    /// rotations, colors, points, ranges, bounds, paths, tuples, and
    /// objects (whose key order does not matter).
    #[must_use]
    pub fn structurally_equal(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => bits_eq(*a, *b),
            (Self::Vector(a), Self::Vector(b)) | (Self::Size(a), Self::Size(b)) => vector_bits_eq(*a, *b),
            (Self::Rotation(a), Self::Rotation(b)) => {
                bits_eq(a.roll(), b.roll()) && bits_eq(a.yaw(), b.yaw()) && bits_eq(a.pitch(), b.pitch())
            }
            (Self::Color(a), Self::Color(b)) => {
                let (a, b) = (a.components(), b.components());
                a.iter().zip(&b).all(|(a, b)| bits_eq(*a, *b))
            }
            (Self::Point(a), Self::Point(b)) => {
                a.is_curved == b.is_curved && vector_bits_eq(a.position, b.position)
            }
            (Self::Range(a), Self::Range(b)) => {
                bits_eq(a.start, b.start)
                    && bits_eq(a.end, b.end)
                    && match (a.step, b.step) {
                        (None, None) => true,
                        (Some(a), Some(b)) => bits_eq(a, b),
                        _ => false,
                    }
            }
            (Self::Bounds(a), Self::Bounds(b)) => {
                vector_bits_eq(a.min, b.min) && vector_bits_eq(a.max, b.max)
            }
            (Self::Path(a), Self::Path(b)) => path_bits_eq(a, b),
            (Self::Polygon(a), Self::Polygon(b)) => {
                a.vertices.len() == b.vertices.len()
                    && a.vertices.iter().zip(&b.vertices).all(|(a, b)| vector_bits_eq(*a, *b))
            }
            (Self::Tuple(a), Self::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.structurally_equal(b))
            }
            (Self::Object(a), Self::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(name, a)| b.get(name).is_some_and(|b| a.structurally_equal(b)))
            }
            // The remaining kinds carry no bare floats worth bit-comparing.
            (Self::Boolean(_), Self::Boolean(_))
            | (Self::String(_), Self::String(_))
            | (Self::Texture(_), Self::Texture(_))
            | (Self::Text(_), Self::Text(_))
            | (Self::Mesh(_), Self::Mesh(_)) => self == other,
            _ => false,
        }
    }

    /// Truthiness is strict: only booleans have one.
    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Self::Color(c)
    }
}

impl From<Vector> for Value {
    fn from(v: Vector) -> Self {
        Self::Vector(v)
    }
}

fn bits_eq(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits()
}

fn vector_bits_eq(a: Vector, b: Vector) -> bool {
    let (a, b) = (a.components(), b.components());
    a.iter().zip(&b).all(|(a, b)| bits_eq(*a, *b))
}

fn path_bits_eq(a: &Path, b: &Path) -> bool {
    a.points.len() == b.points.len()
        && a.subpaths.len() == b.subpaths.len()
        && a.points
            .iter()
            .zip(&b.points)
            .all(|(a, b)| a.is_curved == b.is_curved && vector_bits_eq(a.position, b.position))
        && a.subpaths.iter().zip(&b.subpaths).all(|(a, b)| path_bits_eq(a, b))
}

fn tuple_member(elements: &[Value], name: &str) -> Option<Value> {
    if let Some(index) = ORDINALS.iter().position(|ordinal| *ordinal == name) {
        return elements.get(index).cloned();
    }
    match name {
        "last" => elements.last().cloned(),
        "count" => Some(Value::Number(elements.len() as f64)),
        "allButFirst" => Some(Value::Tuple(elements.get(1..).unwrap_or_default().to_vec())),
        "allButLast" => Some(Value::Tuple(
            elements.get(..elements.len().saturating_sub(1)).unwrap_or_default().to_vec(),
        )),
        _ => {
            let all_numbers = elements.iter().all(|e| matches!(e, Value::Number(_)));
            if !all_numbers || !component_member(name, elements.len()) {
                return None;
            }
            let tuple = Value::Tuple(elements.to_vec());
            match name {
                "x" | "y" | "z" => tuple.convert(&ValueType::Vector)?.member(name),
                "width" | "height" | "depth" => tuple.convert(&ValueType::Size)?.member(name),
                "roll" | "yaw" | "pitch" => tuple.convert(&ValueType::Rotation)?.member(name),
                _ => tuple.convert(&ValueType::Color)?.member(name),
            }
        }
    }
}

/// Formats a number the way `print` shows it: integers without a decimal
/// point, everything else in shortest round-trip form.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        ryu::Buffer::new().format(n).to_owned()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) => f.write_str(s),
            Self::Color(c) => {
                let [r, g, b, a] = c.components();
                write!(
                    f,
                    "{} {} {} {}",
                    format_number(r),
                    format_number(g),
                    format_number(b),
                    format_number(a)
                )
            }
            Self::Texture(t) => f.write_str(t.name()),
            Self::Vector(v) | Self::Size(v) => write!(
                f,
                "{} {} {}",
                format_number(v.x),
                format_number(v.y),
                format_number(v.z)
            ),
            Self::Rotation(r) => write!(
                f,
                "{} {} {}",
                format_number(r.roll()),
                format_number(r.yaw()),
                format_number(r.pitch())
            ),
            Self::Text(t) => f.write_str(&t.string),
            Self::Path(_) => f.write_str("path"),
            Self::Mesh(g) => f.write_str(g.name.as_deref().unwrap_or("mesh")),
            Self::Polygon(_) => f.write_str("polygon"),
            Self::Point(p) => write!(
                f,
                "{} {} {}",
                format_number(p.position.x),
                format_number(p.position.y),
                format_number(p.position.z)
            ),
            Self::Range(r) => {
                write!(f, "{} to {}", format_number(r.start), format_number(r.end))?;
                if let Some(step) = r.step {
                    write!(f, " step {}", format_number(step))?;
                }
                Ok(())
            }
            Self::Bounds(b) => write!(
                f,
                "{} {} {} to {} {} {}",
                format_number(b.min.x),
                format_number(b.min.y),
                format_number(b.min.z),
                format_number(b.max.x),
                format_number(b.max.y),
                format_number(b.max.z)
            ),
            Self::Tuple(elements) => {
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    element.fmt(f)?;
                }
                Ok(())
            }
            Self::Object(fields) => {
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_iteration_is_inclusive() {
        let range = RangeValue::new(1.0, 3.0).with_step(0.5);
        let values: Vec<f64> = range.iter().collect();
        assert_eq!(values, vec![1.0, 1.5, 2.0, 2.5, 3.0]);
    }

    #[test]
    fn range_default_step_is_one() {
        let values: Vec<f64> = RangeValue::new(1.0, 3.0).iter().collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn descending_range_with_negative_step() {
        let values: Vec<f64> = RangeValue::new(3.0, 1.0).with_step(-1.0).iter().collect();
        assert_eq!(values, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn empty_range_when_step_points_away() {
        let values: Vec<f64> = RangeValue::new(3.0, 1.0).iter().collect();
        assert!(values.is_empty());
    }

    #[test]
    fn number_converts_to_uniform_size() {
        let size = Value::Number(2.0).convert(&ValueType::Size);
        assert_eq!(size, Some(Value::Size(Vector::new(2.0, 2.0, 2.0))));
    }

    #[test]
    fn tuple_converts_to_vector_with_missing_components_zero() {
        let tuple = Value::Tuple(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(
            tuple.convert(&ValueType::Vector),
            Some(Value::Vector(Vector::new(1.0, 2.0, 0.0)))
        );
    }

    #[test]
    fn gray_and_rgba_color_conversions() {
        assert_eq!(
            Value::Number(1.0).convert(&ValueType::Color),
            Some(Value::Color(Color::WHITE))
        );
        let rgba = Value::Tuple(vec![
            Value::Number(1.0),
            Value::Number(0.0),
            Value::Number(0.0),
            Value::Number(0.5),
        ]);
        assert_eq!(
            rgba.convert(&ValueType::Color),
            Some(Value::Color(Color::rgba(1.0, 0.0, 0.0, 0.5)))
        );
    }

    #[test]
    fn single_element_tuple_collapses() {
        let tuple = Value::Tuple(vec![Value::Number(7.0)]);
        assert_eq!(tuple.convert(&ValueType::Number), Some(Value::Number(7.0)));
    }

    #[test]
    fn five_numbers_do_not_make_a_color() {
        let tuple = Value::Tuple(vec![Value::Number(0.0); 5]);
        assert_eq!(tuple.convert(&ValueType::Color), None);
    }

    #[test]
    fn tuple_ordinal_members() {
        let tuple = Value::Tuple(vec![
            Value::Number(1.0),
            Value::Number(2.0),
            Value::Number(3.0),
        ]);
        assert_eq!(tuple.member("first"), Some(Value::Number(1.0)));
        assert_eq!(tuple.member("last"), Some(Value::Number(3.0)));
        assert_eq!(tuple.member("count"), Some(Value::Number(3.0)));
        assert_eq!(
            tuple.member("allButFirst"),
            Some(Value::Tuple(vec![Value::Number(2.0), Value::Number(3.0)]))
        );
        assert_eq!(tuple.member("y"), Some(Value::Number(2.0)));
    }

    #[test]
    fn object_sequence_is_in_lexicographic_key_order() {
        let mut fields = IndexMap::new();
        fields.insert("b".to_owned(), Value::Number(2.0));
        fields.insert("a".to_owned(), Value::Number(1.0));
        let pairs = Value::Object(fields).sequence().expect("sequence");
        assert_eq!(
            pairs[0],
            Value::Tuple(vec![Value::String("a".to_owned()), Value::Number(1.0)])
        );
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(7.0), "7");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(-3.0), "-3");
    }

    #[test]
    fn structural_equality_uses_float_bit_identity() {
        let nan = Value::Number(f64::NAN);
        assert!(nan.structurally_equal(&nan.clone()));
        assert!(!Value::Number(0.0).structurally_equal(&Value::Number(-0.0)));
        // IEEE equality disagrees on both.
        assert_ne!(nan, nan.clone());
        assert_eq!(Value::Number(0.0), Value::Number(-0.0));
    }

    #[test]
    fn structural_equality_recurses_through_tuples_and_objects() {
        let a = Value::Tuple(vec![Value::Number(1.0), Value::Number(f64::NAN)]);
        let b = Value::Tuple(vec![Value::Number(1.0), Value::Number(f64::NAN)]);
        assert!(a.structurally_equal(&b));

        let mut x = IndexMap::new();
        x.insert("a".to_owned(), Value::Number(1.0));
        x.insert("b".to_owned(), Value::Number(2.0));
        let mut y = IndexMap::new();
        y.insert("b".to_owned(), Value::Number(2.0));
        y.insert("a".to_owned(), Value::Number(1.0));
        // Object equality ignores key order.
        assert!(Value::Object(x).structurally_equal(&Value::Object(y)));
    }

    #[test]
    fn string_members() {
        let value = Value::String("one two\nthree".to_owned());
        assert_eq!(
            value.member("words"),
            Some(Value::Tuple(vec![
                Value::String("one".to_owned()),
                Value::String("two".to_owned()),
                Value::String("three".to_owned()),
            ]))
        );
        assert_eq!(value.member("count"), Some(Value::Number(13.0)));
    }
}
