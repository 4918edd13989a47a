//! A small SVG path-data parser.
//!
//! Supports the command set shape tools actually emit: M/m, L/l, H/h, V/v,
//! C/c, S/s, Q/q, T/t, and Z/z. Arcs are not supported. Curve control
//! points are folded into curve-flagged path points; downstream
//! tessellation decides the final geometry.

use std::fmt;

use crate::{
    math::Vector,
    path::{Path, PathPoint},
};

/// A malformed SVG path string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgPathError {
    pub message: String,
    pub offset: usize,
}

impl fmt::Display for SvgPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for SvgPathError {}

struct SvgScanner<'a> {
    input: &'a str,
    pos: usize,
}

impl SvgScanner<'_> {
    fn skip_separators(&mut self) {
        while self
            .input[self.pos..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_whitespace() || c == ',')
        {
            self.pos += 1;
        }
    }

    fn peek_command(&mut self) -> Option<char> {
        self.skip_separators();
        self.input[self.pos..]
            .chars()
            .next()
            .filter(char::is_ascii_alphabetic)
    }

    fn number(&mut self) -> Result<f64, SvgPathError> {
        self.skip_separators();
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let mut pos = self.pos;
        if pos < bytes.len() && (bytes[pos] == b'-' || bytes[pos] == b'+') {
            pos += 1;
        }
        let mut seen_dot = false;
        while pos < bytes.len() {
            match bytes[pos] {
                b'0'..=b'9' => pos += 1,
                b'.' if !seen_dot => {
                    seen_dot = true;
                    pos += 1;
                }
                _ => break,
            }
        }
        let text = &self.input[start..pos];
        self.pos = pos;
        text.parse().map_err(|_| SvgPathError {
            message: format!("expected a number, found '{text}'"),
            offset: start,
        })
    }

    fn has_number(&mut self) -> bool {
        self.skip_separators();
        matches!(
            self.input[self.pos..].chars().next(),
            Some('0'..='9' | '-' | '+' | '.')
        )
    }
}

impl Path {
    /// Parses SVG path data into a path. The y axis is flipped so shapes
    /// read upright in the right-handed space the language uses.
    pub fn from_svg(data: &str) -> Result<Self, SvgPathError> {
        let mut scanner = SvgScanner { input: data, pos: 0 };
        let mut subpaths: Vec<Path> = Vec::new();
        let mut points: Vec<PathPoint> = Vec::new();
        let mut position = Vector::ZERO;
        let mut start = Vector::ZERO;
        let mut last_control: Option<Vector> = None;
        let mut command = None;

        let point = |x: f64, y: f64| Vector::new(x, -y, 0.0);

        loop {
            if let Some(c) = scanner.peek_command() {
                scanner.pos += 1;
                command = Some(c);
            } else if !scanner.has_number() {
                break;
            }
            let Some(c) = command else {
                return Err(SvgPathError {
                    message: "path data must start with a command".to_owned(),
                    offset: scanner.pos,
                });
            };
            let relative = c.is_ascii_lowercase();
            let origin = if relative { position } else { Vector::ZERO };
            match c.to_ascii_lowercase() {
                'm' => {
                    if !points.is_empty() {
                        subpaths.push(Path::new(std::mem::take(&mut points)));
                    }
                    let (x, y) = (scanner.number()?, scanner.number()?);
                    position = origin + point(x, y);
                    start = position;
                    points.push(PathPoint::corner(position));
                    // Further coordinate pairs after a moveto are implicit
                    // linetos.
                    command = Some(if relative { 'l' } else { 'L' });
                    last_control = None;
                }
                'l' => {
                    let (x, y) = (scanner.number()?, scanner.number()?);
                    position = origin + point(x, y);
                    points.push(PathPoint::corner(position));
                    last_control = None;
                }
                'h' => {
                    let x = scanner.number()?;
                    position = Vector::new(if relative { position.x + x } else { x }, position.y, 0.0);
                    points.push(PathPoint::corner(position));
                    last_control = None;
                }
                'v' => {
                    let y = scanner.number()?;
                    position = Vector::new(position.x, if relative { position.y - y } else { -y }, 0.0);
                    points.push(PathPoint::corner(position));
                    last_control = None;
                }
                'c' => {
                    let c1 = origin + point(scanner.number()?, scanner.number()?);
                    let c2 = origin + point(scanner.number()?, scanner.number()?);
                    position = origin + point(scanner.number()?, scanner.number()?);
                    points.push(PathPoint::curve(c1));
                    points.push(PathPoint::curve(c2));
                    points.push(PathPoint::corner(position));
                    last_control = Some(c2);
                }
                's' => {
                    let c1 = last_control.map_or(position, |c| position + (position - c));
                    let c2 = origin + point(scanner.number()?, scanner.number()?);
                    position = origin + point(scanner.number()?, scanner.number()?);
                    points.push(PathPoint::curve(c1));
                    points.push(PathPoint::curve(c2));
                    points.push(PathPoint::corner(position));
                    last_control = Some(c2);
                }
                'q' => {
                    let c1 = origin + point(scanner.number()?, scanner.number()?);
                    position = origin + point(scanner.number()?, scanner.number()?);
                    points.push(PathPoint::curve(c1));
                    points.push(PathPoint::corner(position));
                    last_control = Some(c1);
                }
                't' => {
                    let c1 = last_control.map_or(position, |c| position + (position - c));
                    position = origin + point(scanner.number()?, scanner.number()?);
                    points.push(PathPoint::curve(c1));
                    points.push(PathPoint::corner(position));
                    last_control = Some(c1);
                }
                'z' => {
                    if points.last().map(|p| p.position) != Some(start) {
                        points.push(PathPoint::corner(start));
                    }
                    position = start;
                    last_control = None;
                }
                other => {
                    return Err(SvgPathError {
                        message: format!("unsupported path command '{other}'"),
                        offset: scanner.pos,
                    });
                }
            }
        }
        if !points.is_empty() {
            subpaths.push(Path::new(points));
        }
        Ok(Path::joined(subpaths))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_closes_back_to_start() {
        let path = Path::from_svg("M 0 0 L 10 0 L 10 10 Z").expect("parse failed");
        assert_eq!(path.points.len(), 4);
        assert!(path.is_closed());
        assert_eq!(path.points[0].position, path.points[3].position);
    }

    #[test]
    fn relative_and_absolute_mix() {
        let path = Path::from_svg("M10 10 l 5 0 L 20 10").expect("parse failed");
        assert_eq!(path.points[1].position, Vector::new(15.0, -10.0, 0.0));
        assert_eq!(path.points[2].position, Vector::new(20.0, -10.0, 0.0));
    }

    #[test]
    fn implicit_lineto_after_moveto() {
        let path = Path::from_svg("M 0 0 10 0 10 10").expect("parse failed");
        assert_eq!(path.points.len(), 3);
    }

    #[test]
    fn curves_produce_curve_points() {
        let path = Path::from_svg("M 0 0 C 1 1 2 1 3 0").expect("parse failed");
        assert!(path.points[1].is_curved);
        assert!(path.points[2].is_curved);
        assert!(!path.points[3].is_curved);
    }

    #[test]
    fn multiple_subpaths() {
        let path = Path::from_svg("M 0 0 L 1 0 M 5 5 L 6 5").expect("parse failed");
        assert_eq!(path.subpaths.len(), 2);
    }

    #[test]
    fn arcs_are_rejected() {
        assert!(Path::from_svg("M 0 0 A 5 5 0 0 1 10 10").is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(Path::from_svg("10 20").is_err());
        assert!(Path::from_svg("M x y").is_err());
    }
}
