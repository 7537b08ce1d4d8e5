//! Vector path geometry in device units.
//!
//! [`VectorPath`] wraps a `lyon` path and adds the SVG path-data subset
//! the pipeline works with (`M/L/H/V/Q/T/Z`, absolute and relative).
//! Writing a parsed path back out reproduces the canonical textual form
//! exactly, which is what the preview round-trip relies on.

use lyon::math::{point, Point as LyonPoint};
use lyon::path::{Event, Path};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PathError, PathResult};

/// A point in device units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<LyonPoint> for Point {
    fn from(p: LyonPoint) -> Self {
        Self {
            x: p.x as f64,
            y: p.y as f64,
        }
    }
}

/// One decomposed path segment with its resolved start point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line {
        start: Point,
        end: Point,
    },
    Quad {
        start: Point,
        ctrl: Point,
        end: Point,
    },
}

/// A vector path in device units.
#[derive(Debug, Clone)]
pub struct VectorPath {
    inner: Path,
}

impl VectorPath {
    /// Wrap an already-built lyon path.
    pub fn from_lyon(inner: Path) -> Self {
        Self { inner }
    }

    pub fn as_lyon(&self) -> &Path {
        &self.inner
    }

    /// Parse SVG path data.
    ///
    /// Supports `M/m, L/l, H/h, V/v, Q/q, T/t, Z/z` with implicit command
    /// repetition. Anything outside that subset is an error rather than a
    /// silent skip.
    pub fn from_svg(data: &str) -> PathResult<Self> {
        let tokens = tokenize(data);
        let mut builder = Path::builder();
        let mut current = point(0.0, 0.0);
        let mut subpath_start = current;
        let mut subpath_active = false;
        let mut prev_quad_ctrl: Option<LyonPoint> = None;
        let mut prev_cmd: Option<char> = None;
        let mut i = 0usize;

        while i < tokens.len() {
            let tok = &tokens[i];
            if !is_command(tok) {
                return Err(PathError::MalformedNumber(tok.clone()));
            }
            let cmd = tok.chars().next().unwrap_or('?');
            let relative = cmd.is_ascii_lowercase();
            let upper = cmd.to_ascii_uppercase();
            i += 1;

            match upper {
                'M' => {
                    let mut first = true;
                    loop {
                        let x = take_number(&tokens, &mut i, cmd)?;
                        let y = take_number(&tokens, &mut i, cmd)?;
                        let target = if relative {
                            point(current.x + x, current.y + y)
                        } else {
                            point(x, y)
                        };
                        if first {
                            if subpath_active {
                                builder.end(false);
                            }
                            builder.begin(target);
                            subpath_active = true;
                            subpath_start = target;
                            first = false;
                        } else {
                            // Subsequent pairs are implicit linetos.
                            builder.line_to(target);
                        }
                        current = target;
                        if !more_args(&tokens, i) {
                            break;
                        }
                    }
                    prev_quad_ctrl = None;
                }
                'L' | 'H' | 'V' => {
                    loop {
                        let target = match upper {
                            'L' => {
                                let x = take_number(&tokens, &mut i, cmd)?;
                                let y = take_number(&tokens, &mut i, cmd)?;
                                if relative {
                                    point(current.x + x, current.y + y)
                                } else {
                                    point(x, y)
                                }
                            }
                            'H' => {
                                let x = take_number(&tokens, &mut i, cmd)?;
                                let nx = if relative { current.x + x } else { x };
                                point(nx, current.y)
                            }
                            _ => {
                                let y = take_number(&tokens, &mut i, cmd)?;
                                let ny = if relative { current.y + y } else { y };
                                point(current.x, ny)
                            }
                        };
                        if !subpath_active {
                            builder.begin(current);
                            subpath_active = true;
                            subpath_start = current;
                        }
                        builder.line_to(target);
                        current = target;
                        if !more_args(&tokens, i) {
                            break;
                        }
                    }
                    prev_quad_ctrl = None;
                }
                'Q' => {
                    loop {
                        let cx = take_number(&tokens, &mut i, cmd)?;
                        let cy = take_number(&tokens, &mut i, cmd)?;
                        let x = take_number(&tokens, &mut i, cmd)?;
                        let y = take_number(&tokens, &mut i, cmd)?;
                        let (ctrl, target) = if relative {
                            (
                                point(current.x + cx, current.y + cy),
                                point(current.x + x, current.y + y),
                            )
                        } else {
                            (point(cx, cy), point(x, y))
                        };
                        if !subpath_active {
                            builder.begin(current);
                            subpath_active = true;
                            subpath_start = current;
                        }
                        builder.quadratic_bezier_to(ctrl, target);
                        current = target;
                        prev_quad_ctrl = Some(ctrl);
                        if !more_args(&tokens, i) {
                            break;
                        }
                    }
                }
                'T' => {
                    loop {
                        let x = take_number(&tokens, &mut i, cmd)?;
                        let y = take_number(&tokens, &mut i, cmd)?;
                        let ctrl = if matches!(prev_cmd, Some('Q' | 'q' | 'T' | 't')) {
                            match prev_quad_ctrl {
                                Some(prev) => reflect(prev, current),
                                None => current,
                            }
                        } else {
                            current
                        };
                        let target = if relative {
                            point(current.x + x, current.y + y)
                        } else {
                            point(x, y)
                        };
                        if !subpath_active {
                            builder.begin(current);
                            subpath_active = true;
                            subpath_start = current;
                        }
                        builder.quadratic_bezier_to(ctrl, target);
                        current = target;
                        prev_quad_ctrl = Some(ctrl);
                        if !more_args(&tokens, i) {
                            break;
                        }
                    }
                }
                'Z' => {
                    if subpath_active {
                        builder.close();
                        subpath_active = false;
                    }
                    current = subpath_start;
                    prev_quad_ctrl = None;
                }
                other => {
                    return Err(PathError::UnsupportedCommand(other));
                }
            }

            prev_cmd = Some(cmd);
        }

        if subpath_active {
            builder.end(false);
        }

        Ok(Self {
            inner: builder.build(),
        })
    }

    /// Write the path back as canonical SVG path data.
    ///
    /// Commands are space separated, coordinate pairs comma joined, and
    /// numbers take their shortest decimal form, so `from_svg(to_svg(p))`
    /// is the identity on canonical input.
    pub fn to_svg(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for event in self.inner.iter() {
            match event {
                Event::Begin { at } => {
                    parts.push(format!("M {},{}", fmt(at.x), fmt(at.y)));
                }
                Event::Line { to, .. } => {
                    parts.push(format!("L {},{}", fmt(to.x), fmt(to.y)));
                }
                Event::Quadratic { ctrl, to, .. } => {
                    parts.push(format!(
                        "Q {},{} {},{}",
                        fmt(ctrl.x),
                        fmt(ctrl.y),
                        fmt(to.x),
                        fmt(to.y)
                    ));
                }
                Event::Cubic {
                    ctrl1, ctrl2, to, ..
                } => {
                    parts.push(format!(
                        "C {},{} {},{} {},{}",
                        fmt(ctrl1.x),
                        fmt(ctrl1.y),
                        fmt(ctrl2.x),
                        fmt(ctrl2.y),
                        fmt(to.x),
                        fmt(to.y)
                    ));
                }
                Event::End { close, .. } => {
                    if close {
                        parts.push("Z".to_string());
                    }
                }
            }
        }
        parts.join(" ")
    }

    /// Iterate line and quadratic segments with resolved start points.
    ///
    /// A closed subpath whose last point differs from its first yields the
    /// implicit closing line.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.inner.iter().filter_map(|event| match event {
            Event::Line { from, to } => Some(Segment::Line {
                start: from.into(),
                end: to.into(),
            }),
            Event::Quadratic { from, ctrl, to } => Some(Segment::Quad {
                start: from.into(),
                ctrl: ctrl.into(),
                end: to.into(),
            }),
            Event::End {
                last,
                first,
                close: true,
            } if last != first => Some(Segment::Line {
                start: last.into(),
                end: first.into(),
            }),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.inner.iter().next().is_none()
    }

    /// Axis-aligned bounds as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        if self.is_empty() {
            return None;
        }
        let bb = lyon::algorithms::aabb::bounding_box(&self.inner);
        Some((
            bb.min.x as f64,
            bb.min.y as f64,
            bb.max.x as f64,
            bb.max.y as f64,
        ))
    }
}

impl std::fmt::Display for VectorPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_svg())
    }
}

impl PartialEq for VectorPath {
    fn eq(&self, other: &Self) -> bool {
        self.to_svg() == other.to_svg()
    }
}

impl Serialize for VectorPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_svg())
    }
}

impl<'de> Deserialize<'de> for VectorPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        VectorPath::from_svg(&s).map_err(serde::de::Error::custom)
    }
}

fn fmt(v: f32) -> String {
    format!("{}", v)
}

fn reflect(p: LyonPoint, around: LyonPoint) -> LyonPoint {
    point(2.0 * around.x - p.x, 2.0 * around.y - p.y)
}

fn is_command(token: &str) -> bool {
    token.len() == 1
        && token
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic())
            .unwrap_or(false)
}

fn more_args(tokens: &[String], i: usize) -> bool {
    tokens.get(i).map(|t| !is_command(t)).unwrap_or(false)
}

fn take_number(tokens: &[String], i: &mut usize, cmd: char) -> PathResult<f32> {
    let tok = tokens.get(*i).ok_or(PathError::Truncated(cmd))?;
    if is_command(tok) {
        return Err(PathError::Truncated(cmd));
    }
    let value = tok
        .parse::<f32>()
        .map_err(|_| PathError::MalformedNumber(tok.clone()))?;
    *i += 1;
    Ok(value)
}

/// Tokenize SVG path data into command and numeric tokens.
///
/// Handles commas/whitespace, splits on `+`/`-` when they begin a new
/// number (e.g. `10-5` -> `10`, `-5`), and preserves scientific notation.
fn tokenize(data: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in data.chars() {
        match ch {
            ' ' | ',' | '\n' | '\r' | '\t' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            '-' | '+' => {
                if current.is_empty() {
                    current.push(ch);
                } else if matches!(current.chars().last(), Some('e' | 'E')) {
                    current.push(ch);
                } else {
                    tokens.push(std::mem::take(&mut current));
                    current.push(ch);
                }
            }
            'e' | 'E' if !current.is_empty()
                && current
                    .chars()
                    .last()
                    .map(|c| c.is_ascii_digit() || c == '.')
                    .unwrap_or(false) =>
            {
                current.push(ch);
            }
            c if c.is_ascii_alphabetic() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
