//! Inkset Paint API
//!
//! The 2D drawing layer laid-out text is emitted against.
//!
//! # Features
//!
//! - Colors parsed from CSS values
//! - `linear-gradient(...)` descriptors resolved over a bounding box
//! - Vector paths (move/line/quadratic/cubic) with exact bounds and affine transforms
//! - The [`DrawSurface`] contract and a recording [`PaintContext`]

pub mod color;
pub mod context;
pub mod gradient;
pub mod path;
pub mod primitives;
pub mod transform;

pub use color::Color;
pub use context::{
    DrawSurface, FillStyle, LineCap, LineJoin, PaintCommand, PaintContext, StrokeStyle,
};
pub use gradient::{Gradient, GradientStop, LinearGradient};
pub use path::{Path, PathBuilder, PathCommand, Point};
pub use primitives::*;
pub use transform::Transform2D;
