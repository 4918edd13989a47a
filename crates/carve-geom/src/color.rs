//! Color and texture values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An RGBA color with components in the 0–1 range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const CLEAR: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const GRAY: Self = Self::rgb(0.5, 0.5, 0.5);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: Self = Self::rgb(1.0, 1.0, 0.0);
    pub const CYAN: Self = Self::rgb(0.0, 1.0, 1.0);
    pub const MAGENTA: Self = Self::rgb(1.0, 0.0, 1.0);
    pub const ORANGE: Self = Self::rgb(1.0, 0.5, 0.0);

    #[must_use]
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    #[must_use]
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Builds a color from 1–4 components: gray, gray + alpha, rgb, or rgba.
    ///
    /// Returns `None` for zero or more than four components.
    #[must_use]
    pub fn from_components(components: &[f64]) -> Option<Self> {
        match *components {
            [gray] => Some(Self::rgb(gray, gray, gray)),
            [gray, alpha] => Some(Self::rgba(gray, gray, gray, alpha)),
            [r, g, b] => Some(Self::rgb(r, g, b)),
            [r, g, b, a] => Some(Self::rgba(r, g, b, a)),
            _ => None,
        }
    }

    /// Parses the digits of a `#rgb`, `#rgba`, `#rrggbb`, or `#rrggbbaa`
    /// literal (without the leading `#`).
    #[must_use]
    pub fn from_hex_digits(digits: &str) -> Option<Self> {
        let nibble = |c: char| c.to_digit(16).map(f64::from);
        let chars: Vec<f64> = digits.chars().map(nibble).collect::<Option<_>>()?;
        let short = |n: f64| n / 15.0;
        let wide = |hi: f64, lo: f64| (hi * 16.0 + lo) / 255.0;
        match chars[..] {
            [r, g, b] => Some(Self::rgb(short(r), short(g), short(b))),
            [r, g, b, a] => Some(Self::rgba(short(r), short(g), short(b), short(a))),
            [r1, r0, g1, g0, b1, b0] => Some(Self::rgb(wide(r1, r0), wide(g1, g0), wide(b1, b0))),
            [r1, r0, g1, g0, b1, b0, a1, a0] => {
                Some(Self::rgba(wide(r1, r0), wide(g1, g0), wide(b1, b0), wide(a1, a0)))
            }
            _ => None,
        }
    }

    /// Returns the color with its alpha multiplied by `opacity`.
    #[must_use]
    pub fn with_opacity(self, opacity: f64) -> Self {
        Self {
            a: self.a * opacity,
            ..self
        }
    }

    #[must_use]
    pub fn components(self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        if self.a < 1.0 {
            write!(
                f,
                "#{:02X}{:02X}{:02X}{:02X}",
                byte(self.r),
                byte(self.g),
                byte(self.b),
                byte(self.a)
            )
        } else {
            write!(f, "#{:02X}{:02X}{:02X}", byte(self.r), byte(self.g), byte(self.b))
        }
    }
}

/// An image texture reference.
///
/// The interpreter resolves the file through its import delegate; the
/// texture itself is an opaque reference for downstream rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Texture {
    File { name: String, url: std::path::PathBuf },
}

impl Texture {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_digit_forms() {
        assert_eq!(Color::from_hex_digits("fff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex_digits("ff0000"), Some(Color::RED));
        assert_eq!(Color::from_hex_digits("00ff00ff"), Some(Color::GREEN));
        assert_eq!(Color::from_hex_digits("12345"), None);
        assert_eq!(Color::from_hex_digits("ggg"), None);
    }

    #[test]
    fn component_forms() {
        assert_eq!(Color::from_components(&[1.0]), Some(Color::WHITE));
        assert_eq!(Color::from_components(&[0.0, 0.5]), Some(Color::rgba(0.0, 0.0, 0.0, 0.5)));
        assert_eq!(Color::from_components(&[]), None);
        assert_eq!(Color::from_components(&[0.0; 5]), None);
    }
}
