//! Static value types, subtyping, and the member-type table.
//!
//! The static analyzer and the evaluator share one notion of type; the
//! analyzer works on these, the evaluator re-checks against them at every
//! conversion. `void` is the empty tuple.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueType {
    Any,
    Number,
    Boolean,
    String,
    Color,
    Texture,
    Vector,
    Size,
    Rotation,
    Text,
    Path,
    Mesh,
    Polygon,
    Point,
    Range,
    Bounds,
    List(Box<ValueType>),
    Tuple(Vec<ValueType>),
    Union(Vec<ValueType>),
    Object(IndexMap<String, ValueType>),
}

impl ValueType {
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
    pub fn list_of(element: Self) -> Self {
        Self::List(Box::new(element))
    }

    /// Builds the canonical union of `members`: nested unions are
    /// flattened, subsumed members removed, and a singleton collapses to
    /// its only member.
    #[must_use]
    pub fn union_of(members: impl IntoIterator<Item = Self>) -> Self {
        let mut flat: Vec<Self> = Vec::new();
        for member in members {
            match member {
                Self::Union(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        let mut kept: Vec<Self> = Vec::new();
        for member in flat {
            if kept.iter().any(|existing| member.is_subtype_of(existing)) {
                continue;
            }
            kept.retain(|existing| !existing.is_subtype_of(&member));
            kept.push(member);
        }
        match kept.len() {
            0 => Self::void(),
            1 => kept.remove(0),
            _ => Self::Union(kept),
        }
    }

    /// The subtype relation the whole interpreter agrees on.
    #[must_use]
    pub fn is_subtype_of(&self, other: &Self) -> bool {
        if other == &Self::Any || self == other {
            return true;
        }
        match (self, other) {
            (Self::Union(members), _) => members.iter().all(|member| member.is_subtype_of(other)),
            (_, Self::Union(members)) => members.iter().any(|member| self.is_subtype_of(member)),
            (Self::List(a), Self::List(b)) => a.is_subtype_of(b),
            (Self::Tuple(a), Self::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.is_subtype_of(b))
            }
            (Self::Tuple(a), Self::List(b)) => a.iter().all(|a| a.is_subtype_of(b)),
            (Self::Object(a), Self::Object(b)) => b
                .iter()
                .all(|(name, b)| a.get(name).is_some_and(|a| a.is_subtype_of(b))),
            _ => false,
        }
    }

    /// Static type of a named member, mirroring the dynamic lookup.
    #[must_use]
    pub fn member_type(&self, name: &str) -> Option<Self> {
        match self {
            Self::Any => Some(Self::Any),
            Self::Vector => matches!(name, "x" | "y" | "z").then_some(Self::Number),
            Self::Size => matches!(name, "width" | "height" | "depth").then_some(Self::Number),
            Self::Rotation => matches!(name, "roll" | "yaw" | "pitch").then_some(Self::Number),
            Self::Color => matches!(name, "red" | "green" | "blue" | "alpha").then_some(Self::Number),
            Self::Range => match name {
                "start" | "end" | "step" => Some(Self::Number),
                _ => None,
            },
            Self::Bounds => match name {
                "min" | "max" | "size" | "center" => Some(Self::Vector),
                "width" | "height" | "depth" => Some(Self::Number),
                _ => None,
            },
            Self::String => match name {
                "lines" | "words" | "characters" => Some(Self::list_of(Self::String)),
                "count" => Some(Self::Number),
                _ => None,
            },
            Self::Mesh => match name {
                "name" => Some(Self::String),
                "bounds" => Some(Self::Bounds),
                _ => None,
            },
            Self::Point => match name {
                "x" | "y" | "z" => Some(Self::Number),
                "isCurved" => Some(Self::Boolean),
                _ => None,
            },
            Self::Path => match name {
                "bounds" => Some(Self::Bounds),
                _ => None,
            },
            Self::Text => match name {
                "string" => Some(Self::String),
                _ => None,
            },
            Self::Object(fields) => fields.get(name).cloned().or_else(|| match name {
                "count" => Some(Self::Number),
                _ => None,
            }),
            Self::Tuple(elements) => tuple_member_type(elements, name),
            Self::List(element) => list_member_type(element, name),
            _ => None,
        }
    }
}

pub(crate) const ORDINALS: [&str; 10] = [
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
];

fn tuple_member_type(elements: &[ValueType], name: &str) -> Option<ValueType> {
    if let Some(index) = ORDINALS.iter().position(|ordinal| *ordinal == name) {
        return elements.get(index).cloned();
    }
    match name {
        "last" => elements.last().cloned(),
        "count" => Some(ValueType::Number),
        "allButFirst" | "allButLast" => Some(ValueType::union_of(elements.to_vec())).map(ValueType::list_of),
        _ => {
            // Numeric tuples answer to component names.
            let numeric = elements.iter().all(|e| *e == ValueType::Number);
            if numeric && component_member(name, elements.len()) {
                Some(ValueType::Number)
            } else {
                None
            }
        }
    }
}

fn list_member_type(element: &ValueType, name: &str) -> Option<ValueType> {
    if ORDINALS.contains(&name) || name == "last" {
        return Some(element.clone());
    }
    match name {
        "count" => Some(ValueType::Number),
        "allButFirst" | "allButLast" => Some(ValueType::list_of(element.clone())),
        _ => None,
    }
}

/// Whether `name` is a vector/size/rotation/color component readable from
/// a numeric tuple of `len` elements.
pub(crate) fn component_member(name: &str, len: usize) -> bool {
    match name {
        "x" | "y" | "z" | "width" | "height" | "depth" | "roll" | "yaw" | "pitch" => len <= 3,
        "red" | "green" | "blue" | "alpha" => len <= 4,
        _ => false,
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Number => f.write_str("number"),
            Self::Boolean => f.write_str("boolean"),
            Self::String => f.write_str("string"),
            Self::Color => f.write_str("color"),
            Self::Texture => f.write_str("texture"),
            Self::Vector => f.write_str("vector"),
            Self::Size => f.write_str("size"),
            Self::Rotation => f.write_str("rotation"),
            Self::Text => f.write_str("text"),
            Self::Path => f.write_str("path"),
            Self::Mesh => f.write_str("mesh"),
            Self::Polygon => f.write_str("polygon"),
            Self::Point => f.write_str("point"),
            Self::Range => f.write_str("range"),
            Self::Bounds => f.write_str("bounds"),
            Self::List(element) => write!(f, "list of {element}"),
            Self::Tuple(elements) if elements.is_empty() => f.write_str("void"),
            Self::Tuple(elements) => {
                f.write_str("tuple of ")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    element.fmt(f)?;
                }
                Ok(())
            }
            Self::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" or ")?;
                    }
                    member.fmt(f)?;
                }
                Ok(())
            }
            Self::Object(_) => f.write_str("object"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_is_a_subtype_of_any() {
        for ty in [ValueType::Number, ValueType::void(), ValueType::list_of(ValueType::Mesh)] {
            assert!(ty.is_subtype_of(&ValueType::Any));
        }
        assert!(!ValueType::Any.is_subtype_of(&ValueType::Number));
    }

    #[test]
    fn union_subtyping() {
        let number_or_string = ValueType::Union(vec![ValueType::Number, ValueType::String]);
        assert!(ValueType::Number.is_subtype_of(&number_or_string));
        assert!(!number_or_string.is_subtype_of(&ValueType::Number));
        assert!(number_or_string.is_subtype_of(&ValueType::Any));
    }

    #[test]
    fn tuple_is_subtype_of_list_when_elements_fit() {
        let pair = ValueType::Tuple(vec![ValueType::Number, ValueType::Number]);
        assert!(pair.is_subtype_of(&ValueType::list_of(ValueType::Number)));
        let mixed = ValueType::Tuple(vec![ValueType::Number, ValueType::String]);
        assert!(!mixed.is_subtype_of(&ValueType::list_of(ValueType::Number)));
    }

    #[test]
    fn union_canonicalisation_removes_subsumed_members() {
        let union = ValueType::union_of(vec![
            ValueType::Number,
            ValueType::Union(vec![ValueType::Number, ValueType::String]),
        ]);
        assert_eq!(
            union,
            ValueType::Union(vec![ValueType::Number, ValueType::String])
        );
        assert_eq!(ValueType::union_of(vec![ValueType::Number]), ValueType::Number);
    }

    #[test]
    fn void_display() {
        assert_eq!(ValueType::void().to_string(), "void");
        assert_eq!(ValueType::list_of(ValueType::Number).to_string(), "list of number");
    }

    #[test]
    fn member_types() {
        assert_eq!(ValueType::Vector.member_type("x"), Some(ValueType::Number));
        assert_eq!(ValueType::Size.member_type("width"), Some(ValueType::Number));
        assert_eq!(ValueType::Vector.member_type("width"), None);
        let pair = ValueType::Tuple(vec![ValueType::Number, ValueType::String]);
        assert_eq!(pair.member_type("second"), Some(ValueType::String));
        assert_eq!(pair.member_type("count"), Some(ValueType::Number));
    }
}
