//! Font data providers
//!
//! Layout never talks to font files directly. It asks a [`FontProvider`]
//! for metrics, measured advances and glyph outlines, and the provider may
//! answer "unavailable" (`None`). [`Measurer`] wraps a provider and fills
//! those gaps with [`ApproximateFonts`] so layout always has numbers.

mod approx;
mod face;
mod registry;

pub use approx::ApproximateFonts;
pub use face::FontFace;
pub use registry::{FontRegistry, GenericFont};

use inkset_paint::{BoundingBox, Path, Point};

/// What to look a font up by.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Family name or a generic family (`serif`, `monospace`, ...). Empty
    /// selects the default sans-serif face.
    pub family: String,
    /// Size in pixels.
    pub size: f32,
    pub weight: u16,
    pub italic: bool,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            weight: 400,
            italic: false,
        }
    }

    /// Cache key; sizes are keyed at 1/100 px.
    pub(crate) fn cache_key(&self) -> String {
        format!(
            "{}:w{}:{}:{}",
            self.family,
            self.weight,
            if self.italic { "i" } else { "n" },
            (self.size * 100.0).round() as i64
        )
    }
}

/// Font-wide metrics scaled to pixels. Positions are measured upward from
/// the baseline; ascents and descents are positive magnitudes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
    pub typo_ascent: f32,
    pub typo_descent: f32,
    pub x_height: f32,
    pub cap_height: f32,
    /// Top of the underline stroke relative to the baseline (negative is below).
    pub underline_position: f32,
    pub underline_thickness: f32,
    /// Top of the strikeout stroke relative to the baseline.
    pub strikeout_position: f32,
    pub strikeout_size: f32,
}

impl FontMetrics {
    /// Height of the typographic box.
    pub fn typo_height(&self) -> f32 {
        self.typo_ascent + self.typo_descent
    }
}

/// Ink extent of a run relative to its pen start on the baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InkBounds {
    pub ascent: f32,
    pub descent: f32,
    pub left: f32,
    pub right: f32,
}

impl InkBounds {
    pub fn is_empty(&self) -> bool {
        self.right <= self.left && self.ascent + self.descent <= 0.0
    }

    /// The ink box for a run whose pen starts at `x` on `baseline`.
    pub fn to_box(&self, x: f32, baseline: f32) -> BoundingBox {
        if self.is_empty() {
            return BoundingBox::new(x, baseline, 0.0, 0.0);
        }
        BoundingBox::from_edges(
            x + self.left,
            baseline - self.ascent,
            x + self.right,
            baseline + self.descent,
        )
    }

    pub fn union(&self, other: &InkBounds, offset: f32) -> InkBounds {
        if other.is_empty() {
            return *self;
        }
        let shifted = InkBounds {
            left: other.left + offset,
            right: other.right + offset,
            ..*other
        };
        if self.is_empty() {
            return shifted;
        }
        InkBounds {
            ascent: self.ascent.max(shifted.ascent),
            descent: self.descent.max(shifted.descent),
            left: self.left.min(shifted.left),
            right: self.right.max(shifted.right),
        }
    }
}

/// Result of measuring a string.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    /// Advance width, without letter spacing.
    pub width: f32,
    pub ink: InkBounds,
}

/// Source of font metrics and glyph outlines. `None` means unavailable.
pub trait FontProvider: Send + Sync {
    fn font_metrics(&self, font: &FontSpec) -> Option<FontMetrics>;

    fn measure_text(&self, text: &str, font: &FontSpec) -> Option<TextMetrics>;

    fn glyph_advance(&self, c: char, font: &FontSpec) -> Option<f32> {
        let mut buf = [0u8; 4];
        self.measure_text(c.encode_utf8(&mut buf), font)
            .map(|m| m.width)
    }

    /// Outline of `c` with its pen at `origin` (baseline, y down). An empty
    /// path is a glyph without ink.
    fn glyph_path(&self, c: char, font: &FontSpec, origin: Point) -> Option<Path>;
}

/// Provider front end used by layout. Unavailable answers fall back to
/// approximate metrics; empty strings measure as zero.
pub struct Measurer<'a> {
    provider: &'a dyn FontProvider,
    fallback: ApproximateFonts,
}

impl<'a> Measurer<'a> {
    pub fn new(provider: &'a dyn FontProvider) -> Self {
        Self {
            provider,
            fallback: ApproximateFonts,
        }
    }

    pub fn metrics(&self, font: &FontSpec) -> FontMetrics {
        self.provider
            .font_metrics(font)
            .unwrap_or_else(|| self.fallback.metrics(font.size))
    }

    pub fn measure(&self, text: &str, font: &FontSpec) -> TextMetrics {
        if text.is_empty() {
            return TextMetrics::default();
        }
        self.provider
            .measure_text(text, font)
            .unwrap_or_else(|| self.fallback.measure(text, font.size))
    }

    pub fn advance(&self, c: char, font: &FontSpec) -> f32 {
        self.provider
            .glyph_advance(c, font)
            .unwrap_or_else(|| self.fallback.advance(c, font.size))
    }

    /// `None` when the provider has no outline; callers draw raw text then.
    pub fn glyph_path(&self, c: char, font: &FontSpec, origin: Point) -> Option<Path> {
        self.provider.glyph_path(c, font, origin)
    }
}
