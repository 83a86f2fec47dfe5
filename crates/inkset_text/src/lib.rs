//! Styled multi-paragraph text layout
//!
//! This crate provides:
//! - Content parsing into a paragraph/fragment/character tree with cascading styles
//! - Line breaking for horizontal and vertical writing modes
//! - Box-model layout (inline, content, glyph and line boxes, 8-way vertical alignment)
//! - Glyph outline generation (italic skew, vertical rotation, synthesized decorations)
//! - An ordered effect pipeline (background, highlight, list markers, render, text decoration)
//!
//! ```ignore
//! use inkset_text::{measure_text, TextOptions};
//!
//! let options: TextOptions = serde_json::from_str(r#"{
//!     "content": [[{ "content": "Hi", "color": "red" }, " there"]],
//!     "style": { "fontSize": 24, "textAlign": "center" },
//!     "width": 300
//! }"#)?;
//! let measurement = measure_text(options, inkset_text::FontRegistry::global());
//! ```

pub mod assets;
pub mod content;
pub mod effects;
pub mod font;
pub mod geometry;
pub mod glyph;
pub mod layout;
pub mod options;
pub mod style;
pub mod svg;
pub mod text;
pub mod tree;
pub mod wrap;

pub use assets::{AssetCache, AssetLoader, DefaultLoader};
pub use content::{parse_content, Content, ContentItem, FragmentItem, FragmentSpec, ParagraphSpec};
pub use effects::{referenced_assets, Pipeline, PipelineStage, Stage, StageContext, StagePath};
pub use font::{
    ApproximateFonts, FontFace, FontMetrics, FontProvider, FontRegistry, FontSpec, InkBounds,
    Measurer, TextMetrics,
};
pub use geometry::{closest_divisor, Constraint};
pub use glyph::build_glyphs;
pub use inkset_paint::BoundingBox;
pub use layout::{aggregate, layout, LayoutBoxes};
pub use options::{Dimension, Effect, TextOptions};
pub use style::{
    resolve, Direction, FontStyle, FontWeight, HighlightLine, ImageFit, ListStyleType,
    PartialStyle, Style, TextAlign, TextDecoration, TextTransform, TextWrap, VerticalAlign,
    WritingMode,
};
pub use svg::SvgAsset;
pub use text::{measure_text, render_text, Measurement, Rendering, Text};
pub use tree::{
    Character, CharacterId, Fragment, FragmentId, FragmentSnapshot, Paragraph, ParagraphId,
    ParagraphSnapshot, TextTree,
};
pub use wrap::wrap;

use thiserror::Error;

/// Text layout errors
#[derive(Error, Debug)]
pub enum TextError {
    #[error("Failed to load font: {0}")]
    FontLoad(String),

    #[error("Failed to parse font: {0}")]
    FontParse(String),

    #[error("Failed to load asset '{source_id}': {reason}")]
    AssetLoad { source_id: String, reason: String },

    #[error("Failed to parse SVG: {0}")]
    SvgParse(String),

    #[error("Text must be updated before it can be rendered")]
    NotLaidOut,
}

pub type Result<T> = std::result::Result<T, TextError>;
