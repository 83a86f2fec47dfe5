//! Arena-backed paragraph / fragment / character tree
//!
//! Nodes live in [`SlotMap`] arenas owned by the [`TextTree`]. Parent links
//! are plain keys, so a fragment can find its paragraph (and a character its
//! fragment) without any ownership cycle.

use inkset_paint::{BoundingBox, Path, Point};
use serde::Serialize;
use slotmap::{new_key_type, SlotMap};

use crate::font::FontMetrics;
use crate::style::{PartialStyle, Style};

new_key_type! {
    pub struct ParagraphId;
    pub struct FragmentId;
    pub struct CharacterId;
}

/// A visual line after wrapping, or a source paragraph before it.
#[derive(Debug, Clone)]
pub struct Paragraph {
    pub style: Style,
    /// Overrides the author wrote on this paragraph.
    pub own_style: PartialStyle,
    pub fragments: Vec<FragmentId>,
    pub line_box: BoundingBox,
    pub content_box: BoundingBox,
    pub glyph_box: BoundingBox,
    /// Baseline y, or the central axis x of a vertical column.
    pub baseline: f32,
    pub x_height: f32,
    /// Set on lines produced by a wrap rather than by the author.
    pub continuation: bool,
}

/// A run of characters sharing one resolved style.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub paragraph: ParagraphId,
    /// Text after `text-transform`.
    pub content: String,
    pub style: Style,
    pub own_style: PartialStyle,
    pub characters: Vec<CharacterId>,
    pub inline_box: BoundingBox,
    pub content_box: BoundingBox,
    pub glyph_box: BoundingBox,
    pub center_x: f32,
    pub baseline: f32,
    pub metrics: FontMetrics,
}

/// Font-derived per-character measurements.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CharacterMetrics {
    pub advance_width: f32,
    pub advance_height: f32,
    pub baseline: f32,
    pub underline_position: f32,
    pub underline_thickness: f32,
    pub strikeout_position: f32,
    pub strikeout_size: f32,
    /// Horizontal distance between the ink center and the advance center.
    pub center_deviation: f32,
}

#[derive(Debug, Clone)]
pub struct Character {
    pub fragment: FragmentId,
    pub content: char,
    pub bounding_box: BoundingBox,
    pub glyph_box: BoundingBox,
    pub metrics: CharacterMetrics,
    /// Pen position on the baseline the outline is generated at.
    pub origin: Point,
    /// Turned 90 degrees in a vertical writing mode.
    pub rotated: bool,
    pub path: Path,
    /// False when the font provider had no outline; drawn as raw text.
    pub has_outline: bool,
    /// Synthesized underline/strikeout/overline bar, if any.
    pub decoration: Option<BoundingBox>,
}

impl Character {
    fn new(fragment: FragmentId, content: char) -> Self {
        Self {
            fragment,
            content,
            bounding_box: BoundingBox::ZERO,
            glyph_box: BoundingBox::ZERO,
            metrics: CharacterMetrics::default(),
            origin: Point::ZERO,
            rotated: false,
            path: Path::new(),
            has_outline: false,
            decoration: None,
        }
    }
}

/// The whole text: arenas plus paragraph order.
#[derive(Debug, Clone, Default)]
pub struct TextTree {
    paragraphs: SlotMap<ParagraphId, Paragraph>,
    fragments: SlotMap<FragmentId, Fragment>,
    characters: SlotMap<CharacterId, Character>,
    order: Vec<ParagraphId>,
    /// Root style every paragraph cascades from.
    pub style: Style,
}

impl TextTree {
    pub fn new(style: Style) -> Self {
        Self {
            style,
            ..Default::default()
        }
    }

    pub fn push_paragraph(
        &mut self,
        style: Style,
        own_style: PartialStyle,
        continuation: bool,
    ) -> ParagraphId {
        let id = self.paragraphs.insert(Paragraph {
            style,
            own_style,
            fragments: Vec::new(),
            line_box: BoundingBox::ZERO,
            content_box: BoundingBox::ZERO,
            glyph_box: BoundingBox::ZERO,
            baseline: 0.0,
            x_height: 0.0,
            continuation,
        });
        self.order.push(id);
        id
    }

    /// Appends a fragment to `paragraph` and instantiates one character per
    /// code point of `content`.
    pub fn push_fragment(
        &mut self,
        paragraph: ParagraphId,
        content: impl Into<String>,
        style: Style,
        own_style: PartialStyle,
    ) -> FragmentId {
        let content = content.into();
        let id = self.fragments.insert(Fragment {
            paragraph,
            content: String::new(),
            style,
            own_style,
            characters: Vec::new(),
            inline_box: BoundingBox::ZERO,
            content_box: BoundingBox::ZERO,
            glyph_box: BoundingBox::ZERO,
            center_x: 0.0,
            baseline: 0.0,
            metrics: FontMetrics::default(),
        });
        let characters: Vec<CharacterId> = content
            .chars()
            .map(|c| self.characters.insert(Character::new(id, c)))
            .collect();
        if let Some(fragment) = self.fragments.get_mut(id) {
            fragment.content = content;
            fragment.characters = characters;
        }
        if let Some(p) = self.paragraphs.get_mut(paragraph) {
            p.fragments.push(id);
        }
        id
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn paragraph_ids(&self) -> &[ParagraphId] {
        &self.order
    }

    /// Paragraphs in visual order.
    pub fn paragraphs(&self) -> impl Iterator<Item = (ParagraphId, &Paragraph)> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.paragraphs.get(*id).map(|p| (*id, p)))
    }

    pub fn paragraph(&self, id: ParagraphId) -> Option<&Paragraph> {
        self.paragraphs.get(id)
    }

    pub fn paragraph_mut(&mut self, id: ParagraphId) -> Option<&mut Paragraph> {
        self.paragraphs.get_mut(id)
    }

    pub fn fragment(&self, id: FragmentId) -> Option<&Fragment> {
        self.fragments.get(id)
    }

    pub fn fragment_mut(&mut self, id: FragmentId) -> Option<&mut Fragment> {
        self.fragments.get_mut(id)
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.get_mut(id)
    }

    /// Fragments of a paragraph in order.
    pub fn fragments_of(
        &self,
        paragraph: ParagraphId,
    ) -> impl Iterator<Item = (FragmentId, &Fragment)> + '_ {
        self.paragraphs
            .get(paragraph)
            .into_iter()
            .flat_map(|p| p.fragments.iter())
            .filter_map(move |id| self.fragments.get(*id).map(|f| (*id, f)))
    }

    /// Characters of a fragment in order.
    pub fn characters_of(
        &self,
        fragment: FragmentId,
    ) -> impl Iterator<Item = (CharacterId, &Character)> + '_ {
        self.fragments
            .get(fragment)
            .into_iter()
            .flat_map(|f| f.characters.iter())
            .filter_map(move |id| self.characters.get(*id).map(|c| (*id, c)))
    }

    /// Every character in reading order, with its owners.
    pub fn all_characters(
        &self,
    ) -> impl Iterator<Item = (ParagraphId, FragmentId, CharacterId)> + '_ {
        self.order.iter().flat_map(move |pid| {
            self.fragments_of(*pid).flat_map(move |(fid, f)| {
                f.characters.iter().map(move |cid| (*pid, fid, *cid))
            })
        })
    }

    pub fn paragraph_text(&self, paragraph: ParagraphId) -> String {
        self.fragments_of(paragraph)
            .map(|(_, f)| f.content.as_str())
            .collect()
    }

    /// All text, paragraphs concatenated without separators.
    pub fn text(&self) -> String {
        self.order.iter().map(|id| self.paragraph_text(*id)).collect()
    }

    /// Moves a fragment and everything it owns.
    pub fn translate_fragment(&mut self, id: FragmentId, dx: f32, dy: f32) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let Some(fragment) = self.fragments.get_mut(id) else {
            return;
        };
        fragment.inline_box = fragment.inline_box.translate(dx, dy);
        fragment.content_box = fragment.content_box.translate(dx, dy);
        fragment.glyph_box = fragment.glyph_box.translate(dx, dy);
        fragment.center_x += dx;
        // Columns keep their baseline on the x axis.
        fragment.baseline += if fragment.style.is_vertical() { dx } else { dy };
        for cid in &fragment.characters {
            if let Some(c) = self.characters.get_mut(*cid) {
                c.bounding_box = c.bounding_box.translate(dx, dy);
                c.glyph_box = c.glyph_box.translate(dx, dy);
                c.origin = Point::new(c.origin.x + dx, c.origin.y + dy);
                c.metrics.baseline += dy;
            }
        }
    }

    /// Moves a paragraph, its boxes and all of its fragments.
    pub fn translate_paragraph(&mut self, id: ParagraphId, dx: f32, dy: f32) {
        let Some(paragraph) = self.paragraphs.get_mut(id) else {
            return;
        };
        paragraph.line_box = paragraph.line_box.translate(dx, dy);
        paragraph.content_box = paragraph.content_box.translate(dx, dy);
        paragraph.glyph_box = paragraph.glyph_box.translate(dx, dy);
        paragraph.baseline += if paragraph.style.is_vertical() { dx } else { dy };
        let fragments = paragraph.fragments.clone();
        for fid in fragments {
            self.translate_fragment(fid, dx, dy);
        }
    }

    /// Serializable copy of the laid-out boxes.
    pub fn snapshot(&self) -> Vec<ParagraphSnapshot> {
        self.paragraphs()
            .map(|(pid, p)| ParagraphSnapshot {
                line_box: p.line_box,
                content_box: p.content_box,
                glyph_box: p.glyph_box,
                baseline: p.baseline,
                x_height: p.x_height,
                fragments: self
                    .fragments_of(pid)
                    .map(|(_, f)| FragmentSnapshot {
                        content: f.content.clone(),
                        inline_box: f.inline_box,
                        content_box: f.content_box,
                        glyph_box: f.glyph_box,
                        baseline: f.baseline,
                        center_x: f.center_x,
                    })
                    .collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphSnapshot {
    pub line_box: BoundingBox,
    pub content_box: BoundingBox,
    pub glyph_box: BoundingBox,
    pub baseline: f32,
    pub x_height: f32,
    pub fragments: Vec<FragmentSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentSnapshot {
    pub content: String,
    pub inline_box: BoundingBox,
    pub content_box: BoundingBox,
    pub glyph_box: BoundingBox,
    pub baseline: f32,
    pub center_x: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_own_one_character_per_code_point() {
        let mut tree = TextTree::new(Style::default());
        let p = tree.push_paragraph(Style::default(), PartialStyle::default(), false);
        let f = tree.push_fragment(p, "añ字", Style::default(), PartialStyle::default());
        let chars: Vec<char> = tree.characters_of(f).map(|(_, c)| c.content).collect();
        assert_eq!(chars, vec!['a', 'ñ', '字']);
        assert!(tree.characters_of(f).all(|(_, c)| c.fragment == f));
        assert_eq!(tree.fragment(f).map(|f| f.paragraph), Some(p));
        assert_eq!(tree.text(), "añ字");
    }

    #[test]
    fn translating_a_paragraph_moves_every_box() {
        let mut tree = TextTree::new(Style::default());
        let p = tree.push_paragraph(Style::default(), PartialStyle::default(), false);
        let f = tree.push_fragment(p, "a", Style::default(), PartialStyle::default());
        if let Some(fragment) = tree.fragment_mut(f) {
            fragment.inline_box = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
            fragment.baseline = 8.0;
        }
        tree.translate_paragraph(p, 5.0, 2.0);
        let fragment = tree.fragment(f).unwrap();
        assert_eq!(fragment.inline_box, BoundingBox::new(5.0, 2.0, 10.0, 10.0));
        assert_eq!(fragment.baseline, 10.0);
        assert_eq!(fragment.center_x, 5.0);
    }
}
