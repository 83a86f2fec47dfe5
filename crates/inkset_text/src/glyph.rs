//! Glyph outline generation
//!
//! Runs after layout. Every character gets its outline from the font
//! provider at its laid-out pen position, then:
//!
//! - rotated characters in vertical columns are turned 90° about their slot
//!   center;
//! - italic text is sheared around the glyph's own pivot;
//! - the fragment's `text-decoration` becomes a bar rectangle on
//!   [`Character::decoration`], oriented along the writing axis.
//!
//! Decoration bars are kept off the glyph path so the decoration stage can
//! merge a run of them into one seamless rectangle.
//!
//! [`Character::decoration`]: crate::tree::Character::decoration

use std::f32::consts::FRAC_PI_2;

use inkset_paint::{BoundingBox, Point, Transform2D};

use crate::font::{FontMetrics, FontSpec, Measurer};
use crate::style::TextDecoration;
use crate::tree::{Character, TextTree};

/// Y-to-X coupling of the synthesized oblique.
pub const ITALIC_SKEW: f32 = -0.24;

/// Per-fragment values every character of the fragment shares.
struct FragmentGeometry {
    font: FontSpec,
    vertical: bool,
    italic: bool,
    decoration: TextDecoration,
    metrics: FontMetrics,
    content_box: BoundingBox,
}

/// Builds outlines, glyph boxes and decoration bars for every character.
pub fn build_glyphs(tree: &mut TextTree, measurer: &Measurer) {
    let characters: Vec<_> = tree.all_characters().collect();
    let mut outlines = 0usize;
    for (_, fid, cid) in characters {
        let Some(fragment) = tree.fragment(fid) else {
            continue;
        };
        let geometry = FragmentGeometry {
            font: fragment.style.font(),
            vertical: fragment.style.is_vertical(),
            italic: fragment.style.is_italic(),
            decoration: fragment.style.text_decoration,
            metrics: fragment.metrics,
            content_box: fragment.content_box,
        };
        let Some(character) = tree.character_mut(cid) else {
            continue;
        };
        build_character(character, &geometry, measurer);
        outlines += usize::from(character.has_outline);
    }
    tracing::debug!("built {} glyph outlines", outlines);
}

fn build_character(character: &mut Character, geometry: &FragmentGeometry, measurer: &Measurer) {
    let outline = measurer.glyph_path(character.content, &geometry.font, character.origin);
    character.has_outline = outline.is_some();
    let mut path = outline.unwrap_or_default();

    let mut transform = Transform2D::identity();
    if character.rotated {
        let center = character.bounding_box.center();
        transform = Transform2D::rotate(FRAC_PI_2).around(center);
    }
    if geometry.italic {
        let pivot = if geometry.vertical {
            character.bounding_box.center()
        } else {
            Point::new(
                character.origin.x + character.metrics.advance_width / 2.0,
                character.origin.y,
            )
        };
        transform = transform.then(&Transform2D::skew(ITALIC_SKEW, 0.0).around(pivot));
    }
    if !transform.is_identity() {
        path.transform(&transform);
        if !character.glyph_box.is_empty() && !character.rotated {
            character.glyph_box = character.glyph_box.transform(&transform);
        }
    }
    if let Some(bounds) = path.bounds() {
        character.glyph_box = bounds;
    }
    character.path = path;
    character.decoration = decoration_bar(character, geometry);
}

/// The bar a decoration occupies under one character, or `None`.
///
/// In columns the bar runs down the column: underline on the left edge of
/// the fragment's content box, overline on the right, line-through on the
/// central axis.
fn decoration_bar(character: &Character, geometry: &FragmentGeometry) -> Option<BoundingBox> {
    let m = &character.metrics;
    let slot = character.bounding_box;
    if geometry.vertical {
        let content = geometry.content_box;
        let axis = content.center().x;
        return match geometry.decoration {
            TextDecoration::None => None,
            TextDecoration::Underline => Some(BoundingBox::new(
                content.left(),
                slot.top(),
                m.underline_thickness,
                slot.height,
            )),
            TextDecoration::Overline => Some(BoundingBox::new(
                content.right() - m.underline_thickness,
                slot.top(),
                m.underline_thickness,
                slot.height,
            )),
            TextDecoration::LineThrough => Some(BoundingBox::new(
                axis - m.strikeout_size / 2.0,
                slot.top(),
                m.strikeout_size,
                slot.height,
            )),
        };
    }

    let baseline = character.origin.y;
    let (top, thickness) = match geometry.decoration {
        TextDecoration::None => return None,
        TextDecoration::Underline => (baseline - m.underline_position, m.underline_thickness),
        TextDecoration::LineThrough => (baseline - m.strikeout_position, m.strikeout_size),
        TextDecoration::Overline => {
            (baseline - geometry.metrics.typo_ascent, m.underline_thickness)
        }
    };
    Some(BoundingBox::new(slot.left(), top, slot.width, thickness))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{parse_content, Content};
    use crate::font::{ApproximateFonts, FontProvider, TextMetrics};
    use crate::geometry::Constraint;
    use crate::layout::layout;
    use crate::style::{resolve, FontStyle, PartialStyle, Style, WritingMode};
    use crate::wrap::wrap;
    use inkset_paint::Path;

    fn built_with(text: &str, root: PartialStyle, provider: &dyn FontProvider) -> TextTree {
        let style = resolve(&Style::default(), &root);
        let measurer = Measurer::new(provider);
        let mut tree = wrap(
            &parse_content(&Content::from(text), &style),
            Constraint::AUTO,
            &measurer,
        );
        layout(&mut tree, Constraint::AUTO, &measurer);
        build_glyphs(&mut tree, &measurer);
        tree
    }

    fn built(text: &str, root: PartialStyle) -> TextTree {
        built_with(text, root, &ApproximateFonts)
    }

    fn first_char(tree: &TextTree) -> &Character {
        let (_, _, cid) = tree.all_characters().next().unwrap();
        tree.character(cid).unwrap()
    }

    #[test]
    fn outlines_sit_on_the_baseline() {
        let tree = built("A", PartialStyle::new().font_size(10.0));
        let c = first_char(&tree);
        assert!(c.has_outline);
        let bounds = c.path.bounds().unwrap();
        assert!((bounds.bottom() - c.origin.y).abs() < 1e-3);
        assert_eq!(bounds, c.glyph_box);
    }

    #[test]
    fn italic_leans_the_top_right() {
        let upright = built("A", PartialStyle::new().font_size(10.0));
        let italic = built(
            "A",
            PartialStyle::new().font_size(10.0).font_style(FontStyle::Italic),
        );
        let a = first_char(&upright).path.bounds().unwrap();
        let b = first_char(&italic).path.bounds().unwrap();
        assert!(b.right() > a.right());
        // The baseline row is the shear axis.
        assert!((b.left() - a.left()).abs() < 1e-3);
        assert!((a.top() - b.top()).abs() < 1e-3);
    }

    #[test]
    fn latin_in_a_column_is_turned() {
        let tree = built(
            "A",
            PartialStyle::new()
                .font_size(10.0)
                .writing_mode(WritingMode::VerticalRl),
        );
        let c = first_char(&tree);
        assert!(c.rotated);
        let bounds = c.path.bounds().unwrap();
        // 4px wide ink turned on its side becomes 4px tall.
        assert!((bounds.height - 4.0).abs() < 1e-3);
        assert!(c.bounding_box.contains(bounds.center()));
    }

    #[test]
    fn underline_bar_spans_the_advance() {
        let tree = built(
            "ab",
            PartialStyle::new()
                .font_size(20.0)
                .text_decoration(TextDecoration::Underline),
        );
        let c = first_char(&tree);
        let bar = c.decoration.unwrap();
        assert_eq!(bar.width, c.bounding_box.width);
        assert!((bar.top() - (c.origin.y + 2.0)).abs() < 1e-3);
        assert!((bar.height - 1.0).abs() < 1e-3);
    }

    #[test]
    fn column_strike_runs_down_the_axis() {
        let tree = built(
            "\u{4E00}",
            PartialStyle::new()
                .font_size(10.0)
                .writing_mode(WritingMode::VerticalLr)
                .text_decoration(TextDecoration::LineThrough),
        );
        let c = first_char(&tree);
        let bar = c.decoration.unwrap();
        assert!(bar.height > bar.width);
        assert!((bar.center().x - c.bounding_box.center().x).abs() < 1e-3);
    }

    struct NoOutlines;

    impl FontProvider for NoOutlines {
        fn font_metrics(&self, _: &FontSpec) -> Option<FontMetrics> {
            None
        }
        fn measure_text(&self, _: &str, _: &FontSpec) -> Option<TextMetrics> {
            None
        }
        fn glyph_path(&self, _: char, _: &FontSpec, _: Point) -> Option<Path> {
            None
        }
    }

    #[test]
    fn missing_outlines_are_flagged() {
        let tree = built_with("A", PartialStyle::new(), &NoOutlines);
        let c = first_char(&tree);
        assert!(!c.has_outline);
        assert!(c.path.is_empty());
        assert!(!c.glyph_box.is_empty());
    }
}
