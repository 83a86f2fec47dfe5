//! Paint context - the drawing surface API
//!
//! [`DrawSurface`] is the contract layout output is drawn against: paint
//! state save/restore, affine transforms, clipping, shadows, path fills and
//! strokes, and plain text for the low-fidelity path. [`PaintContext`]
//! records those calls as [`PaintCommand`]s for a backend to replay.

use crate::color::Color;
use crate::gradient::{Gradient, LinearGradient};
use crate::path::{Path, Point};
use crate::primitives::*;
use crate::transform::Transform2D;

/// Fill style for shapes
#[derive(Clone, Debug, PartialEq)]
pub enum FillStyle {
    Color(Color),
    Gradient(Gradient),
}

impl FillStyle {
    /// Resolves a CSS paint value: a color, or a `linear-gradient(...)`
    /// laid over `bounds`.
    pub fn from_css(value: &str, bounds: &BoundingBox) -> Option<Self> {
        let value = value.trim();
        if value.contains("gradient(") {
            return LinearGradient::parse(value).map(|g| FillStyle::Gradient(g.resolve(bounds)));
        }
        Color::parse(value).map(FillStyle::Color)
    }

    pub fn is_visible(&self) -> bool {
        match self {
            FillStyle::Color(color) => !color.is_transparent(),
            FillStyle::Gradient(gradient) => !gradient.stops().is_empty(),
        }
    }
}

impl From<Color> for FillStyle {
    fn from(color: Color) -> Self {
        FillStyle::Color(color)
    }
}

impl From<Gradient> for FillStyle {
    fn from(gradient: Gradient) -> Self {
        FillStyle::Gradient(gradient)
    }
}

/// Stroke style
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    pub paint: FillStyle,
    pub width: f32,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            paint: FillStyle::Color(Color::BLACK),
            width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
        }
    }
}

impl StrokeStyle {
    pub fn new(paint: impl Into<FillStyle>, width: f32) -> Self {
        Self {
            paint: paint.into(),
            width,
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// The drawing surface contract.
pub trait DrawSurface {
    /// Pushes the current paint state (transform, clip, shadow).
    fn save(&mut self);
    /// Pops the paint state pushed by the matching [`DrawSurface::save`].
    fn restore(&mut self);
    /// Multiplies `transform` onto the current transform.
    fn transform(&mut self, transform: Transform2D);
    /// Intersects the clip region with `rect`.
    fn clip_rect(&mut self, rect: BoundingBox);
    /// Shadow applied to subsequent fills and strokes until restore.
    fn set_shadow(&mut self, shadow: Shadow);
    fn fill_rect(&mut self, rect: BoundingBox, style: &FillStyle);
    fn fill_circle(&mut self, circle: Circle, style: &FillStyle);
    fn fill_path(&mut self, path: &Path, style: &FillStyle);
    fn stroke_path(&mut self, path: &Path, style: &StrokeStyle);
    /// Raw text at a baseline origin; only used when no glyph outlines exist.
    fn fill_text(&mut self, text: &str, position: Point, font: &str, style: &FillStyle);
}

/// A paint command for the renderer
#[derive(Clone, Debug, PartialEq)]
pub enum PaintCommand {
    Save,
    Restore,
    Transform {
        transform: Transform2D,
    },
    Clip {
        rect: BoundingBox,
    },
    SetShadow {
        shadow: Shadow,
    },
    FillRect {
        rect: BoundingBox,
        style: FillStyle,
    },
    FillCircle {
        circle: Circle,
        style: FillStyle,
    },
    FillPath {
        path: Path,
        style: FillStyle,
    },
    StrokePath {
        path: Path,
        style: StrokeStyle,
    },
    DrawText {
        text: String,
        position: Point,
        font: String,
        style: FillStyle,
    },
}

/// Recording drawing surface.
#[derive(Debug)]
pub struct PaintContext {
    commands: Vec<PaintCommand>,
    depth: usize,
}

impl PaintContext {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            depth: 0,
        }
    }

    /// Get all recorded commands
    pub fn commands(&self) -> &[PaintCommand] {
        &self.commands
    }

    /// Take ownership of recorded commands
    pub fn take_commands(&mut self) -> Vec<PaintCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Current save/restore nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Default for PaintContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawSurface for PaintContext {
    fn save(&mut self) {
        self.depth += 1;
        self.commands.push(PaintCommand::Save);
    }

    fn restore(&mut self) {
        if self.depth == 0 {
            tracing::warn!("restore() without matching save(), ignoring");
            return;
        }
        self.depth -= 1;
        self.commands.push(PaintCommand::Restore);
    }

    fn transform(&mut self, transform: Transform2D) {
        if transform.is_identity() {
            return;
        }
        self.commands.push(PaintCommand::Transform { transform });
    }

    fn clip_rect(&mut self, rect: BoundingBox) {
        self.commands.push(PaintCommand::Clip { rect });
    }

    fn set_shadow(&mut self, shadow: Shadow) {
        self.commands.push(PaintCommand::SetShadow { shadow });
    }

    fn fill_rect(&mut self, rect: BoundingBox, style: &FillStyle) {
        self.commands.push(PaintCommand::FillRect {
            rect,
            style: style.clone(),
        });
    }

    fn fill_circle(&mut self, circle: Circle, style: &FillStyle) {
        self.commands.push(PaintCommand::FillCircle {
            circle,
            style: style.clone(),
        });
    }

    fn fill_path(&mut self, path: &Path, style: &FillStyle) {
        if path.is_empty() {
            return;
        }
        self.commands.push(PaintCommand::FillPath {
            path: path.clone(),
            style: style.clone(),
        });
    }

    fn stroke_path(&mut self, path: &Path, style: &StrokeStyle) {
        if path.is_empty() || style.width <= 0.0 {
            return;
        }
        self.commands.push(PaintCommand::StrokePath {
            path: path.clone(),
            style: style.clone(),
        });
    }

    fn fill_text(&mut self, text: &str, position: Point, font: &str, style: &FillStyle) {
        self.commands.push(PaintCommand::DrawText {
            text: text.to_string(),
            position,
            font: font.to_string(),
            style: style.clone(),
        });
    }
}
