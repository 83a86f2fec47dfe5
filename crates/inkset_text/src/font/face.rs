//! A loaded font face: raw bytes plus the collection index
//!
//! The bytes are shared; `ttf-parser` and `rustybuzz` views are created on
//! demand because both borrow the data.

use std::sync::Arc;

use inkset_paint::{Path, PathBuilder, Point};
use ttf_parser::{GlyphId, OutlineBuilder};

use super::{FontMetrics, InkBounds, TextMetrics};
use crate::{Result, TextError};

#[derive(Clone)]
pub struct FontFace {
    data: Arc<Vec<u8>>,
    index: u32,
    family: String,
    units_per_em: f32,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("index", &self.index)
            .finish()
    }
}

impl FontFace {
    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        Self::from_data_with_index(data, 0)
    }

    pub fn from_data_with_index(data: Vec<u8>, index: u32) -> Result<Self> {
        let face = ttf_parser::Face::parse(&data, index)
            .map_err(|e| TextError::FontParse(e.to_string()))?;
        let family = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == ttf_parser::name_id::FAMILY)
            .find_map(|name| name.to_string())
            .unwrap_or_default();
        let units_per_em = face.units_per_em() as f32;
        Ok(Self {
            data: Arc::new(data),
            index,
            family,
            units_per_em,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family
    }

    pub fn face_index(&self) -> u32 {
        self.index
    }

    fn parse(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.index).ok()
    }

    fn scale(&self, size: f32) -> f32 {
        size / self.units_per_em
    }

    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.parse()?.glyph_index(c).map(|id| id.0)
    }

    pub fn metrics(&self, size: f32) -> Option<FontMetrics> {
        let face = self.parse()?;
        let scale = self.scale(size);
        let ascent = face.ascender() as f32 * scale;
        let descent = -(face.descender() as f32) * scale;
        let typo_ascent = face
            .typographic_ascender()
            .map(|v| v as f32 * scale)
            .unwrap_or(ascent);
        let typo_descent = face
            .typographic_descender()
            .map(|v| -(v as f32) * scale)
            .unwrap_or(descent);
        let x_height = face
            .x_height()
            .map(|v| v as f32 * scale)
            .unwrap_or(size * 0.5);
        let cap_height = face
            .capital_height()
            .map(|v| v as f32 * scale)
            .unwrap_or(size * 0.7);
        let (underline_position, underline_thickness) = face
            .underline_metrics()
            .map(|m| (m.position as f32 * scale, m.thickness as f32 * scale))
            .unwrap_or((-0.1 * size, 0.05 * size));
        let (strikeout_position, strikeout_size) = face
            .strikeout_metrics()
            .map(|m| (m.position as f32 * scale, m.thickness as f32 * scale))
            .unwrap_or((x_height * 0.6, underline_thickness));
        Some(FontMetrics {
            ascent,
            descent,
            line_gap: face.line_gap() as f32 * scale,
            typo_ascent,
            typo_descent,
            x_height,
            cap_height,
            underline_position,
            underline_thickness,
            strikeout_position,
            strikeout_size,
        })
    }

    /// Shapes `text` and reports its advance and ink extent.
    pub fn measure(&self, text: &str, size: f32) -> Option<TextMetrics> {
        let face = self.parse()?;
        let shaper = rustybuzz::Face::from_slice(&self.data, self.index)?;
        let scale = self.scale(size);

        let mut buffer = rustybuzz::UnicodeBuffer::new();
        buffer.push_str(text);
        let output = rustybuzz::shape(&shaper, &[], buffer);

        let mut pen = 0.0;
        let mut ink = InkBounds::default();
        for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
            if let Some(rect) = face.glyph_bounding_box(GlyphId(info.glyph_id as u16)) {
                let glyph_ink = InkBounds {
                    ascent: rect.y_max as f32 * scale,
                    descent: -(rect.y_min as f32) * scale,
                    left: (rect.x_min as f32 + pos.x_offset as f32) * scale,
                    right: (rect.x_max as f32 + pos.x_offset as f32) * scale,
                };
                ink = ink.union(&glyph_ink, pen);
            }
            pen += pos.x_advance as f32 * scale;
        }
        Some(TextMetrics { width: pen, ink })
    }

    pub fn glyph_advance(&self, c: char, size: f32) -> Option<f32> {
        let face = self.parse()?;
        let id = face.glyph_index(c)?;
        face.glyph_hor_advance(id)
            .map(|advance| advance as f32 * self.scale(size))
    }

    /// Outline of `c` with its pen at `origin`, flipped into y-down space.
    /// `None` when the face has no glyph for `c`.
    pub fn glyph_path(&self, c: char, size: f32, origin: Point) -> Option<Path> {
        let face = self.parse()?;
        let id = face.glyph_index(c)?;
        let mut outline = OutlinePath {
            builder: Some(PathBuilder::new()),
            origin,
            scale: self.scale(size),
        };
        if face.outline_glyph(id, &mut outline).is_none() {
            return Some(Path::new());
        }
        Some(outline.builder.map(PathBuilder::build).unwrap_or_default())
    }
}

struct OutlinePath {
    builder: Option<PathBuilder>,
    origin: Point,
    scale: f32,
}

impl OutlinePath {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin.x + x * self.scale, self.origin.y - y * self.scale)
    }

    fn with(&mut self, f: impl FnOnce(PathBuilder) -> PathBuilder) {
        self.builder = self.builder.take().map(f);
    }
}

impl OutlineBuilder for OutlinePath {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.with(|b| b.move_to(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.with(|b| b.line_to(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.with(|b| b.quad_to(x1, y1, x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.with(|b| b.cubic_to(x1, y1, x2, y2, x, y));
    }

    fn close(&mut self) {
        self.with(|b| b.close());
    }
}
