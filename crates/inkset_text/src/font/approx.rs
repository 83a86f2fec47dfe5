//! Deterministic em-proportional font
//!
//! Used when no real font data is available and throughout the tests. Every
//! number is a fixed fraction of the font size, so layouts are reproducible
//! on any machine.

use inkset_paint::{BoundingBox, Path, Point};

use super::{FontMetrics, FontProvider, FontSpec, InkBounds, TextMetrics};

#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateFonts;

const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;
const X_HEIGHT: f32 = 0.5;
const CAP_HEIGHT: f32 = 0.7;
/// Horizontal ink inset on each side of the advance.
const SIDE_BEARING: f32 = 0.05;

impl ApproximateFonts {
    pub fn metrics(&self, size: f32) -> FontMetrics {
        FontMetrics {
            ascent: ASCENT * size,
            descent: DESCENT * size,
            line_gap: 0.0,
            typo_ascent: ASCENT * size,
            typo_descent: DESCENT * size,
            x_height: X_HEIGHT * size,
            cap_height: CAP_HEIGHT * size,
            underline_position: -0.1 * size,
            underline_thickness: 0.05 * size,
            strikeout_position: 0.3 * size,
            strikeout_size: 0.05 * size,
        }
    }

    pub fn advance(&self, c: char, size: f32) -> f32 {
        if c.is_control() {
            0.0
        } else if c == '\u{3000}' || is_wide(c) {
            size
        } else if c.is_whitespace() {
            0.25 * size
        } else {
            0.5 * size
        }
    }

    /// Ink of a single glyph relative to its pen position.
    pub fn ink(&self, c: char, size: f32) -> InkBounds {
        if c.is_whitespace() || c.is_control() {
            return InkBounds::default();
        }
        let advance = self.advance(c, size);
        if is_wide(c) {
            return InkBounds {
                ascent: ASCENT * size,
                descent: 0.1 * size,
                left: SIDE_BEARING * size,
                right: advance - SIDE_BEARING * size,
            };
        }
        let ascent = if c.is_lowercase() && !"bdfhiklt".contains(c) {
            X_HEIGHT
        } else {
            CAP_HEIGHT
        };
        let descent = if "gjpqy".contains(c) { DESCENT } else { 0.0 };
        InkBounds {
            ascent: ascent * size,
            descent: descent * size,
            left: SIDE_BEARING * size,
            right: advance - SIDE_BEARING * size,
        }
    }

    pub fn measure(&self, text: &str, size: f32) -> TextMetrics {
        let mut width = 0.0;
        let mut ink = InkBounds::default();
        for c in text.chars() {
            ink = ink.union(&self.ink(c, size), width);
            width += self.advance(c, size);
        }
        TextMetrics { width, ink }
    }
}

impl FontProvider for ApproximateFonts {
    fn font_metrics(&self, font: &FontSpec) -> Option<FontMetrics> {
        Some(self.metrics(font.size))
    }

    fn measure_text(&self, text: &str, font: &FontSpec) -> Option<TextMetrics> {
        Some(self.measure(text, font.size))
    }

    fn glyph_advance(&self, c: char, font: &FontSpec) -> Option<f32> {
        Some(self.advance(c, font.size))
    }

    /// Box outlines covering each glyph's ink.
    fn glyph_path(&self, c: char, font: &FontSpec, origin: Point) -> Option<Path> {
        let ink = self.ink(c, font.size);
        if ink.is_empty() {
            return Some(Path::new());
        }
        Some(Path::rect(&BoundingBox::from_edges(
            origin.x + ink.left,
            origin.y - ink.ascent,
            origin.x + ink.right,
            origin.y + ink.descent,
        )))
    }
}

/// East Asian wide and fullwidth ranges.
pub(crate) fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1F64F
        | 0x1F900..=0x1F9FF
        | 0x20000..=0x2FFFD
        | 0x30000..=0x3FFFD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_are_em_proportional() {
        let fonts = ApproximateFonts;
        assert_eq!(fonts.advance('A', 16.0), 8.0);
        assert_eq!(fonts.advance(' ', 16.0), 4.0);
        assert_eq!(fonts.advance('字', 16.0), 16.0);
        assert_eq!(fonts.advance('\n', 16.0), 0.0);
    }

    #[test]
    fn x_has_x_height_ink() {
        let ink = ApproximateFonts.measure("x", 20.0).ink;
        assert_eq!(ink.ascent, 10.0);
        assert_eq!(ink.descent, 0.0);
    }

    #[test]
    fn run_ink_spans_inked_glyphs_only() {
        let m = ApproximateFonts.measure("a b ", 10.0);
        assert_eq!(m.width, 15.0);
        assert!((m.ink.left - 0.5).abs() < 1e-5);
        assert!((m.ink.right - 12.0).abs() < 1e-5);
    }

    #[test]
    fn whitespace_has_no_outline() {
        let font = FontSpec::new("", 10.0);
        let path = ApproximateFonts.glyph_path(' ', &font, Point::ZERO).unwrap();
        assert!(path.is_empty());
        let path = ApproximateFonts.glyph_path('A', &font, Point::new(0.0, 10.0)).unwrap();
        let bounds = path.bounds().unwrap();
        assert!((bounds.left() - 0.5).abs() < 1e-4);
        assert!((bounds.top() - 3.0).abs() < 1e-4);
        assert!((bounds.right() - 4.5).abs() < 1e-4);
        assert!((bounds.bottom() - 10.0).abs() < 1e-4);
    }
}
