//! Gradient fills
//!
//! Besides the resolved [`Gradient`] handed to drawing surfaces, this module
//! parses CSS `linear-gradient(<deg>deg, <color> <percent>%, ...)` strings.
//! A parsed [`LinearGradient`] is box-independent; [`LinearGradient::resolve`]
//! places its gradient line over a concrete box.

use crate::color::Color;
use crate::path::Point;
use crate::primitives::BoundingBox;

/// A gradient stop
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f32, // 0.0 to 1.0
    pub color: Color,
}

/// Gradient type
#[derive(Clone, Debug, PartialEq)]
pub enum Gradient {
    Linear {
        start: Point,
        end: Point,
        stops: Vec<GradientStop>,
    },
    Radial {
        center: Point,
        radius: f32,
        stops: Vec<GradientStop>,
    },
}

impl Gradient {
    /// Create a simple linear gradient between two colors
    pub fn linear_simple(start: Point, end: Point, from: Color, to: Color) -> Self {
        Gradient::Linear {
            start,
            end,
            stops: vec![
                GradientStop {
                    offset: 0.0,
                    color: from,
                },
                GradientStop {
                    offset: 1.0,
                    color: to,
                },
            ],
        }
    }

    pub fn stops(&self) -> &[GradientStop] {
        match self {
            Gradient::Linear { stops, .. } | Gradient::Radial { stops, .. } => stops,
        }
    }

    /// The color a surface without gradient support should fall back to.
    pub fn first_color(&self) -> Color {
        self.stops()
            .first()
            .map(|stop| stop.color)
            .unwrap_or(Color::TRANSPARENT)
    }
}

/// A parsed `linear-gradient(...)` descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    /// CSS angle in degrees; 0 points up, 90 points right.
    pub angle: f32,
    pub stops: Vec<GradientStop>,
}

impl LinearGradient {
    /// Parses a CSS linear gradient. Returns `None` for anything that is not
    /// a `linear-gradient(...)` with at least one parseable color stop.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let body = input
            .strip_prefix("linear-gradient(")
            .or_else(|| input.strip_prefix("repeating-linear-gradient("))?
            .strip_suffix(')')?;

        let mut parts = split_top_level(body).into_iter().peekable();
        let mut angle = 180.0;
        if let Some(first) = parts.peek() {
            if let Some(parsed) = parse_direction(first) {
                angle = parsed;
                parts.next();
            }
        }

        let mut raw_stops: Vec<(Color, Option<f32>)> = Vec::new();
        for part in parts {
            match parse_stop(part) {
                Some(stop) => raw_stops.push(stop),
                None => tracing::debug!("skipping unparseable gradient stop '{}'", part),
            }
        }
        if raw_stops.is_empty() {
            return None;
        }

        Some(Self {
            angle,
            stops: distribute_offsets(raw_stops),
        })
    }

    /// Places the gradient line over `rect`: it passes through the box
    /// center along the angle and is long enough for the corners to reach
    /// the first and last stop.
    pub fn resolve(&self, rect: &BoundingBox) -> Gradient {
        let radians = self.angle.to_radians();
        let (sin, cos) = radians.sin_cos();
        let length = (rect.width * sin).abs() + (rect.height * cos).abs();
        let center = rect.center();
        let (dx, dy) = (sin * length / 2.0, -cos * length / 2.0);
        Gradient::Linear {
            start: Point::new(center.x - dx, center.y - dy),
            end: Point::new(center.x + dx, center.y + dy),
            stops: self.stops.clone(),
        }
    }
}

/// Splits on commas that are not nested inside parentheses.
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(input[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

fn parse_direction(part: &str) -> Option<f32> {
    if let Some(deg) = part.strip_suffix("deg") {
        return deg.trim().parse().ok();
    }
    if let Some(turn) = part.strip_suffix("turn") {
        return turn.trim().parse::<f32>().ok().map(|t| t * 360.0);
    }
    let side = part.strip_prefix("to ")?;
    let mut words: Vec<&str> = side.split_whitespace().collect();
    words.sort_unstable();
    match words.as_slice() {
        ["top"] => Some(0.0),
        ["right"] => Some(90.0),
        ["bottom"] => Some(180.0),
        ["left"] => Some(270.0),
        ["right", "top"] => Some(45.0),
        ["bottom", "right"] => Some(135.0),
        ["bottom", "left"] => Some(225.0),
        ["left", "top"] => Some(315.0),
        _ => None,
    }
}

fn parse_stop(part: &str) -> Option<(Color, Option<f32>)> {
    if let Some((color, position)) = part.rsplit_once(char::is_whitespace) {
        if let Some(percent) = position.strip_suffix('%') {
            let offset = percent.trim().parse::<f32>().ok()? / 100.0;
            return Some((Color::parse(color)?, Some(offset.clamp(0.0, 1.0))));
        }
    }
    Some((Color::parse(part)?, None))
}

/// Fills in missing stop offsets: the ends default to 0 and 1 and unset
/// stops between two known offsets are spaced evenly.
fn distribute_offsets(raw: Vec<(Color, Option<f32>)>) -> Vec<GradientStop> {
    let count = raw.len();
    let mut offsets: Vec<Option<f32>> = raw.iter().map(|(_, o)| *o).collect();
    if offsets[0].is_none() {
        offsets[0] = Some(0.0);
    }
    if count > 1 && offsets[count - 1].is_none() {
        offsets[count - 1] = Some(1.0);
    }

    let mut i = 0;
    while i < count {
        if offsets[i].is_some() {
            i += 1;
            continue;
        }
        let prev = i - 1;
        let next = (i..count).find(|&j| offsets[j].is_some()).unwrap_or(count - 1);
        let from = offsets[prev].unwrap_or(0.0);
        let to = offsets[next].unwrap_or(1.0);
        let span = (next - prev) as f32;
        for (step, slot) in offsets.iter_mut().enumerate().take(next).skip(i) {
            *slot = Some(from + (to - from) * (step - prev) as f32 / span);
        }
        i = next;
    }

    raw.into_iter()
        .zip(offsets)
        .map(|((color, _), offset)| GradientStop {
            offset: offset.unwrap_or(0.0),
            color,
        })
        .collect()
}
