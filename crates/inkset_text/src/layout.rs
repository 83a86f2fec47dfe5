//! Box-model layout
//!
//! Runs over a wrapped tree, one paragraph (visual line) at a time:
//!
//! 1. Size every fragment from font metrics: inline box (the reserved
//!    line-height slot), content box (typographic box), glyph box (ink) and
//!    baseline, plus per-character boxes.
//! 2. Pick the paragraph baseline and x-height from its tallest fragment.
//! 3. Place fragments along the writing axis and build the line box.
//! 4. Align: `text-align` along the line, `vertical-align` per fragment.
//!
//! Paragraphs are then stacked (downward, or in columns for vertical
//! writing modes) and [`aggregate`] unions everything into the overall
//! boxes.

use std::f32::consts::FRAC_PI_2;

use inkset_paint::{BoundingBox, Point, Transform2D};
use serde::Serialize;

use crate::font::{FontMetrics, FontSpec, Measurer, TextMetrics};
use crate::geometry::Constraint;
use crate::style::{VerticalAlign, WritingMode};
use crate::tree::{CharacterMetrics, Fragment, FragmentId, ParagraphId, TextTree};

/// Full-width punctuation that turns with Latin text in vertical columns.
const ROTATED_PUNCTUATION: &str = concat!(
    "\u{FF08}\u{FF09}\u{3010}\u{3011}\u{300E}\u{300F}\u{300C}\u{300D}",
    "\u{3008}\u{3009}\u{300A}\u{300B}\u{3014}\u{3015}\u{FF5B}\u{FF5D}",
    "\u{FF3B}\u{FF3D}\u{301C}\u{FF5E}\u{30FC}\u{2014}\u{2026}\u{2025}",
    "\u{FF0D}\u{FF1D}\u{FF1C}\u{FF1E}",
);

/// Whether `c` is turned 90 degrees in a vertical writing mode.
///
/// Narrow code points (up to U+0100, except a few symbols that read the
/// same either way) and bracket-like full-width punctuation rotate;
/// ideographs stay upright.
pub fn rotates_in_vertical(c: char) -> bool {
    let narrow = c as u32 <= 0x100 && !matches!(c, '\u{A9}' | '\u{AE}' | '\u{F7}');
    narrow || ROTATED_PUNCTUATION.contains(c)
}

/// Overall boxes of a laid-out tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutBoxes {
    /// Canvas box: the explicit size, grown to fit the content.
    #[serde(rename = "box")]
    pub bounding_box: BoundingBox,
    pub content_box: BoundingBox,
    pub glyph_box: BoundingBox,
}

/// Lays out every paragraph of a wrapped tree in place.
pub fn layout(tree: &mut TextTree, constraint: Constraint, measurer: &Measurer) {
    let ids = tree.paragraph_ids().to_vec();
    for &pid in &ids {
        let vertical = tree.paragraph(pid).is_some_and(|p| p.style.is_vertical());
        if vertical {
            layout_column(tree, pid, constraint, measurer);
        } else {
            layout_line(tree, pid, constraint, measurer);
        }
    }
    stack_paragraphs(tree, &ids);
}

/// Unions line boxes into the content box and paragraph ink into the glyph
/// box; the canvas is the explicit size grown to the content.
pub fn aggregate(tree: &TextTree, constraint: Constraint) -> LayoutBoxes {
    let lines: Vec<BoundingBox> = tree.paragraphs().map(|(_, p)| p.line_box).collect();
    let ink: Vec<BoundingBox> = tree
        .paragraphs()
        .map(|(_, p)| p.glyph_box)
        .filter(|b| !b.is_empty())
        .collect();
    let content_box = BoundingBox::from_boxes(&lines);
    let glyph_box = BoundingBox::from_boxes(&ink);
    let width = constraint.width.unwrap_or(0.0).max(content_box.right());
    let height = constraint.height.unwrap_or(0.0).max(content_box.bottom());
    LayoutBoxes {
        bounding_box: BoundingBox::new(0.0, 0.0, width, height),
        content_box,
        glyph_box,
    }
}

fn measure_char(measurer: &Measurer, c: char, font: &FontSpec) -> TextMetrics {
    let mut buf = [0u8; 4];
    measurer.measure(c.encode_utf8(&mut buf), font)
}

fn char_metrics(
    metrics: &FontMetrics,
    advance_width: f32,
    advance_height: f32,
    baseline: f32,
    ink: &TextMetrics,
) -> CharacterMetrics {
    let center_deviation = if ink.ink.is_empty() {
        0.0
    } else {
        (ink.ink.left + ink.ink.right) / 2.0 - advance_width / 2.0
    };
    CharacterMetrics {
        advance_width,
        advance_height,
        baseline,
        underline_position: metrics.underline_position,
        underline_thickness: metrics.underline_thickness,
        strikeout_position: metrics.strikeout_position,
        strikeout_size: metrics.strikeout_size,
        center_deviation,
    }
}

fn union_ink<'a>(boxes: impl IntoIterator<Item = &'a BoundingBox>, empty_at: Point) -> BoundingBox {
    let ink: Vec<&BoundingBox> = boxes.into_iter().filter(|b| !b.is_empty()).collect();
    if ink.is_empty() {
        return BoundingBox::new(empty_at.x, empty_at.y, 0.0, 0.0);
    }
    BoundingBox::from_boxes(ink)
}

fn fragment_ids(tree: &TextTree, pid: ParagraphId) -> Vec<FragmentId> {
    tree.paragraph(pid)
        .map(|p| p.fragments.clone())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Horizontal lines

fn size_horizontal_fragment(
    tree: &mut TextTree,
    fid: FragmentId,
    is_last: bool,
    measurer: &Measurer,
) {
    let Some(fragment) = tree.fragment(fid) else {
        return;
    };
    let font = fragment.style.font();
    let metrics = measurer.metrics(&font);
    let spacing = fragment.style.letter_spacing;
    let line_height = fragment.style.line_extent();
    let content = fragment.content.clone();
    let characters = fragment.characters.clone();

    let measured = measurer.measure(&content, &font);
    let width = measured.width + spacing * content.chars().count() as f32;
    let content_width = if is_last {
        // Trailing whitespace hangs outside the content box.
        let trimmed = content.trim_end();
        measurer.measure(trimmed, &font).width + spacing * trimmed.chars().count() as f32
    } else {
        width
    };
    let typo_height = metrics.typo_height();
    let top = (line_height - typo_height) / 2.0;
    let baseline = top + metrics.typo_ascent;

    let mut pen = 0.0;
    for cid in characters {
        let Some(character) = tree.character_mut(cid) else {
            continue;
        };
        let c = character.content;
        let advance = measurer.advance(c, &font);
        let ink = measure_char(measurer, c, &font);
        character.bounding_box = BoundingBox::new(pen, top, advance, typo_height);
        character.glyph_box = ink.ink.to_box(pen, baseline);
        character.origin = Point::new(pen, baseline);
        character.rotated = false;
        character.metrics = char_metrics(&metrics, advance, typo_height, baseline, &ink);
        pen += advance + spacing;
    }

    if let Some(fragment) = tree.fragment_mut(fid) {
        fragment.inline_box = BoundingBox::new(0.0, 0.0, width, line_height);
        fragment.content_box = BoundingBox::new(0.0, top, content_width, typo_height);
        fragment.glyph_box = measured.ink.to_box(0.0, baseline);
        fragment.center_x = width / 2.0;
        fragment.baseline = baseline;
        fragment.metrics = metrics;
    }
}

/// Baseline and x-height of the fragment with the tallest content box
/// (widest, for columns).
fn tallest_fragment_metrics(
    tree: &TextTree,
    fragments: &[FragmentId],
    measurer: &Measurer,
    vertical: bool,
) -> (f32, f32) {
    let extent = |b: &BoundingBox| if vertical { b.width } else { b.height };
    let tallest = fragments
        .iter()
        .filter_map(|id| tree.fragment(*id))
        .fold(None, |best: Option<&Fragment>, f| match best {
            Some(b) if extent(&b.content_box) >= extent(&f.content_box) => Some(b),
            _ => Some(f),
        });
    let Some(fragment) = tallest else {
        return (0.0, 0.0);
    };
    let x = measurer.measure("x", &fragment.style.font()).ink;
    let x_height = if x.is_empty() {
        fragment.metrics.x_height
    } else {
        x.ascent
    };
    (fragment.baseline, x_height)
}

fn layout_line(tree: &mut TextTree, pid: ParagraphId, constraint: Constraint, measurer: &Measurer) {
    let fragments = fragment_ids(tree, pid);
    let count = fragments.len();
    for (i, fid) in fragments.iter().enumerate() {
        size_horizontal_fragment(tree, *fid, i + 1 == count, measurer);
    }

    let mut x = 0.0;
    for fid in &fragments {
        tree.translate_fragment(*fid, x, 0.0);
        x += tree.fragment(*fid).map_or(0.0, |f| f.inline_box.width);
    }

    let (baseline, x_height) = tallest_fragment_metrics(tree, &fragments, measurer, false);
    let inline: Vec<BoundingBox> = fragments
        .iter()
        .filter_map(|id| tree.fragment(*id).map(|f| f.inline_box))
        .collect();
    let mut line_box = BoundingBox::from_boxes(&inline);
    if let Some(width) = constraint.width {
        line_box = line_box.union(&BoundingBox::new(width, 0.0, 0.0, 0.0));
    }
    if let Some(paragraph) = tree.paragraph_mut(pid) {
        paragraph.line_box = line_box;
        paragraph.baseline = baseline;
        paragraph.x_height = x_height;
    }
    refresh_paragraph_boxes(tree, pid);

    // text-align
    let Some(paragraph) = tree.paragraph(pid) else {
        return;
    };
    let factor = paragraph.style.align_factor();
    let content = paragraph.content_box;
    let dx = line_box.left() + (line_box.width - content.width) * factor - content.left();
    for fid in &fragments {
        tree.translate_fragment(*fid, dx, 0.0);
    }
    refresh_paragraph_boxes(tree, pid);

    // vertical-align
    let Some(paragraph) = tree.paragraph(pid) else {
        return;
    };
    let (baseline, x_height, line, ink) = (
        paragraph.baseline,
        paragraph.x_height,
        paragraph.line_box,
        paragraph.glyph_box,
    );
    for fid in &fragments {
        let Some(f) = tree.fragment(*fid) else {
            continue;
        };
        let dy = match f.style.vertical_align {
            VerticalAlign::Top => line.top() - f.content_box.top(),
            VerticalAlign::Bottom => line.bottom() - f.content_box.bottom(),
            VerticalAlign::Middle => (baseline - x_height / 2.0) - f.content_box.center().y,
            VerticalAlign::Sub => baseline - f.glyph_box.top(),
            VerticalAlign::Super => baseline - f.glyph_box.bottom(),
            VerticalAlign::TextTop => ink.top() - f.glyph_box.top(),
            VerticalAlign::TextBottom => ink.bottom() - f.glyph_box.bottom(),
            VerticalAlign::Baseline if f.inline_box.height < line.height => baseline - f.baseline,
            VerticalAlign::Baseline => 0.0,
        };
        tree.translate_fragment(*fid, 0.0, dy);
    }
    refresh_paragraph_boxes(tree, pid);
}

/// Recomputes a paragraph's content and glyph boxes from its fragments.
fn refresh_paragraph_boxes(tree: &mut TextTree, pid: ParagraphId) {
    let fragments = fragment_ids(tree, pid);
    let content: Vec<BoundingBox> = fragments
        .iter()
        .filter_map(|id| tree.fragment(*id).map(|f| f.content_box))
        .collect();
    let glyphs: Vec<BoundingBox> = fragments
        .iter()
        .filter_map(|id| tree.fragment(*id).map(|f| f.glyph_box))
        .collect();
    let Some(paragraph) = tree.paragraph_mut(pid) else {
        return;
    };
    paragraph.content_box = if content.is_empty() {
        BoundingBox::new(paragraph.line_box.x, paragraph.line_box.y, 0.0, 0.0)
    } else {
        BoundingBox::from_boxes(&content)
    };
    paragraph.glyph_box = union_ink(&glyphs, paragraph.content_box.origin());
}

// ---------------------------------------------------------------------------
// Vertical columns

fn size_vertical_fragment(tree: &mut TextTree, fid: FragmentId, measurer: &Measurer) {
    let Some(fragment) = tree.fragment(fid) else {
        return;
    };
    let font = fragment.style.font();
    let metrics = measurer.metrics(&font);
    let spacing = fragment.style.letter_spacing;
    let cross = fragment.style.line_extent();
    let characters = fragment.characters.clone();
    let axis = cross / 2.0;
    let size = font.size;
    let typo_height = metrics.typo_height();

    let mut pen = 0.0;
    let mut ink_boxes = Vec::with_capacity(characters.len());
    for cid in &characters {
        let Some(character) = tree.character_mut(*cid) else {
            continue;
        };
        let c = character.content;
        let advance = measurer.advance(c, &font);
        let ink = measure_char(measurer, c, &font);
        let rotated = rotates_in_vertical(c);
        let (extent, origin, bounding_box, glyph_box) = if rotated {
            // Laid out horizontally around the slot center, then turned.
            let center = Point::new(axis, pen + advance / 2.0);
            let origin = Point::new(
                center.x - advance / 2.0,
                center.y - typo_height / 2.0 + metrics.typo_ascent,
            );
            let turn = Transform2D::rotate(FRAC_PI_2).around(center);
            let glyph = ink.ink.to_box(origin.x, origin.y);
            let glyph = if glyph.is_empty() {
                glyph
            } else {
                glyph.transform(&turn)
            };
            let slot = BoundingBox::new(axis - typo_height / 2.0, pen, typo_height, advance);
            (advance, origin, slot, glyph)
        } else {
            let origin = Point::new(
                axis - advance / 2.0,
                pen + (size - typo_height) / 2.0 + metrics.typo_ascent,
            );
            let slot = BoundingBox::new(axis - size / 2.0, pen, size, size);
            (size, origin, slot, ink.ink.to_box(origin.x, origin.y))
        };
        character.bounding_box = bounding_box;
        character.glyph_box = glyph_box;
        character.origin = origin;
        character.rotated = rotated;
        character.metrics = char_metrics(&metrics, advance, extent, origin.y, &ink);
        ink_boxes.push(glyph_box);
        pen += extent + spacing;
    }
    let height = if characters.is_empty() {
        0.0
    } else {
        pen - spacing
    };

    if let Some(fragment) = tree.fragment_mut(fid) {
        fragment.inline_box = BoundingBox::new(0.0, 0.0, cross, height);
        fragment.content_box = BoundingBox::new(axis - size / 2.0, 0.0, size, height);
        fragment.glyph_box = union_ink(&ink_boxes, Point::new(axis, 0.0));
        fragment.center_x = axis;
        fragment.baseline = axis;
        fragment.metrics = metrics;
    }
}

fn layout_column(
    tree: &mut TextTree,
    pid: ParagraphId,
    constraint: Constraint,
    measurer: &Measurer,
) {
    let fragments = fragment_ids(tree, pid);
    for fid in &fragments {
        size_vertical_fragment(tree, *fid, measurer);
    }

    // Fragments share one central axis down the column.
    let column_width = fragments
        .iter()
        .filter_map(|id| tree.fragment(*id).map(|f| f.inline_box.width))
        .fold(0.0f32, f32::max);
    let mut y = 0.0;
    for fid in &fragments {
        let Some(f) = tree.fragment(*fid) else {
            continue;
        };
        let (cross, height) = (f.inline_box.width, f.inline_box.height);
        let gap = f.style.letter_spacing;
        let empty = f.characters.is_empty();
        tree.translate_fragment(*fid, (column_width - cross) / 2.0, y);
        if !empty {
            y += height + gap;
        }
    }

    let (baseline, x_height) = tallest_fragment_metrics(tree, &fragments, measurer, true);
    let inline: Vec<BoundingBox> = fragments
        .iter()
        .filter_map(|id| tree.fragment(*id).map(|f| f.inline_box))
        .collect();
    let mut line_box = BoundingBox::from_boxes(&inline);
    if let Some(height) = constraint.height {
        line_box = line_box.union(&BoundingBox::new(0.0, height, 0.0, 0.0));
    }
    if let Some(paragraph) = tree.paragraph_mut(pid) {
        paragraph.line_box = line_box;
        paragraph.baseline = baseline;
        paragraph.x_height = x_height;
    }
    refresh_paragraph_boxes(tree, pid);

    // text-align runs down the column
    let Some(paragraph) = tree.paragraph(pid) else {
        return;
    };
    let factor = paragraph.style.align_factor();
    let content = paragraph.content_box;
    let dy = line_box.top() + (line_box.height - content.height) * factor - content.top();
    for fid in &fragments {
        tree.translate_fragment(*fid, 0.0, dy);
    }
    refresh_paragraph_boxes(tree, pid);

    // vertical-align runs across the column: the line top is its left edge
    // and the central axis stands in for the baseline.
    let Some(paragraph) = tree.paragraph(pid) else {
        return;
    };
    let (axis, line, ink) = (paragraph.baseline, paragraph.line_box, paragraph.glyph_box);
    for fid in &fragments {
        let Some(f) = tree.fragment(*fid) else {
            continue;
        };
        let dx = match f.style.vertical_align {
            VerticalAlign::Top => line.left() - f.content_box.left(),
            VerticalAlign::Bottom => line.right() - f.content_box.right(),
            VerticalAlign::Middle => axis - f.content_box.center().x,
            VerticalAlign::Sub => axis - f.glyph_box.left(),
            VerticalAlign::Super => axis - f.glyph_box.right(),
            VerticalAlign::TextTop => ink.left() - f.glyph_box.left(),
            VerticalAlign::TextBottom => ink.right() - f.glyph_box.right(),
            VerticalAlign::Baseline => axis - f.baseline,
        };
        tree.translate_fragment(*fid, dx, 0.0);
    }
    refresh_paragraph_boxes(tree, pid);
}

// ---------------------------------------------------------------------------
// Paragraph stacking

/// Stacks paragraphs by their own writing mode.
///
/// Consecutive paragraphs sharing a mode form a block: lines run downward,
/// columns run left or right. Blocks follow each other downward.
fn stack_paragraphs(tree: &mut TextTree, ids: &[ParagraphId]) {
    let mode = |tree: &TextTree, pid: ParagraphId| {
        tree.paragraph(pid)
            .map_or(WritingMode::HorizontalTb, |p| p.style.writing_mode)
    };
    let extent = |tree: &TextTree, pid: ParagraphId| {
        tree.paragraph(pid)
            .map_or((0.0, 0.0), |p| (p.line_box.width, p.line_box.height))
    };
    let mut top = 0.0f32;
    let mut rest = ids;
    while let Some(&first) = rest.first() {
        let block_mode = mode(tree, first);
        let len = rest
            .iter()
            .take_while(|&&pid| mode(tree, pid) == block_mode)
            .count();
        let (block, tail) = rest.split_at(len);
        rest = tail;
        let mut height = 0.0f32;
        match block_mode {
            WritingMode::HorizontalTb => {
                for &pid in block {
                    tree.translate_paragraph(pid, 0.0, top + height);
                    height += extent(tree, pid).1;
                }
            }
            WritingMode::VerticalLr => {
                let mut x = 0.0;
                for &pid in block {
                    tree.translate_paragraph(pid, x, top);
                    let (width, column) = extent(tree, pid);
                    x += width;
                    height = height.max(column);
                }
            }
            WritingMode::VerticalRl => {
                let total: f32 = block.iter().map(|&pid| extent(tree, pid).0).sum();
                let mut right = total;
                for &pid in block {
                    let (width, column) = extent(tree, pid);
                    right -= width;
                    tree.translate_paragraph(pid, right, top);
                    height = height.max(column);
                }
            }
        }
        top += height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{parse_content, Content};
    use crate::font::ApproximateFonts;
    use crate::style::{resolve, PartialStyle, Style, TextAlign};
    use crate::tree::Paragraph;
    use crate::wrap::wrap;

    fn laid_out(json: &str, root: PartialStyle, constraint: Constraint) -> TextTree {
        let content: Content = serde_json::from_str(json).unwrap();
        let style = resolve(&Style::default(), &root);
        let measurer = Measurer::new(&ApproximateFonts);
        let mut tree = wrap(&parse_content(&content, &style), constraint, &measurer);
        layout(&mut tree, constraint, &measurer);
        tree
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn adjacent_fragments_touch() {
        let tree = laid_out(
            r#"[[{"content": "Hi", "color": "red"}, {"content": "Bye", "color": "blue"}]]"#,
            PartialStyle::new().font_size(20.0),
            Constraint::AUTO,
        );
        let (pid, _) = tree.paragraphs().next().unwrap();
        let boxes: Vec<BoundingBox> = tree.fragments_of(pid).map(|(_, f)| f.content_box).collect();
        assert!(close(boxes[1].x, boxes[0].x + boxes[0].width));
        assert!(close(boxes[0].x, 0.0));
    }

    #[test]
    fn centered_text_has_equal_gaps() {
        let tree = laid_out(
            r#""centered""#,
            PartialStyle::new().text_align(TextAlign::Center),
            Constraint::width(200.0),
        );
        let (_, p) = tree.paragraphs().next().unwrap();
        let left = p.content_box.left() - p.line_box.left();
        let right = p.line_box.right() - p.content_box.right();
        assert!(close(left, right), "{} vs {}", left, right);
        assert!(close(p.line_box.width, 200.0));
    }

    #[test]
    fn content_box_sits_inside_inline_box() {
        let tree = laid_out(r#""Hello""#, PartialStyle::new().line_height(1.5), Constraint::AUTO);
        for (pid, _) in tree.paragraphs() {
            for (_, f) in tree.fragments_of(pid) {
                assert!(f.inline_box.contains_box(&f.content_box, 1e-3));
                let expected = f.inline_box.top()
                    + (f.inline_box.height - f.metrics.typo_height()) / 2.0
                    + f.metrics.typo_ascent;
                assert!(close(f.baseline, expected));
            }
        }
    }

    #[test]
    fn smaller_fragment_sits_on_the_shared_baseline() {
        let tree = laid_out(
            r#"[[{"content": "Big", "fontSize": 40}, {"content": "small", "fontSize": 10}]]"#,
            PartialStyle::new(),
            Constraint::AUTO,
        );
        let (pid, p) = tree.paragraphs().next().unwrap();
        for (_, f) in tree.fragments_of(pid) {
            assert!(close(f.baseline, p.baseline));
        }
    }

    #[test]
    fn top_alignment_moves_content_to_line_top() {
        let tree = laid_out(
            r#"[[{"content": "Big", "fontSize": 40}, {"content": "up", "fontSize": 10, "verticalAlign": "top"}]]"#,
            PartialStyle::new(),
            Constraint::AUTO,
        );
        let (pid, p) = tree.paragraphs().next().unwrap();
        let (_, up) = tree.fragments_of(pid).nth(1).unwrap();
        assert!(close(up.content_box.top(), p.line_box.top()));
    }

    /// Lays out 40px "Big" followed by a 10px "x" with the given alignment.
    fn aligned_line(align: &str) -> (Paragraph, Fragment) {
        let tree = laid_out(
            &format!(
                r#"[[{{"content": "Big", "fontSize": 40}}, {{"content": "x", "fontSize": 10, "verticalAlign": "{}"}}]]"#,
                align
            ),
            PartialStyle::new(),
            Constraint::AUTO,
        );
        let (pid, p) = tree.paragraphs().next().unwrap();
        let (_, x) = tree.fragments_of(pid).nth(1).unwrap();
        (p.clone(), x.clone())
    }

    #[test]
    fn bottom_alignment_moves_content_to_line_bottom() {
        let (p, x) = aligned_line("bottom");
        assert!(close(x.content_box.bottom(), p.line_box.bottom()));
    }

    #[test]
    fn middle_alignment_centers_on_half_the_x_height() {
        let (p, x) = aligned_line("middle");
        assert!(close(x.content_box.center().y, p.baseline - p.x_height / 2.0));
        // 40px "x" ink reaches 20px above the baseline.
        assert!(close(p.x_height, 20.0));
    }

    #[test]
    fn sub_alignment_hangs_the_ink_from_the_baseline() {
        let (p, x) = aligned_line("sub");
        assert!(close(x.glyph_box.top(), p.baseline));
    }

    #[test]
    fn super_alignment_rests_the_ink_on_the_baseline() {
        let (p, x) = aligned_line("super");
        assert!(close(x.glyph_box.bottom(), p.baseline));
    }

    #[test]
    fn text_top_alignment_meets_the_line_ink_top() {
        let (p, x) = aligned_line("text-top");
        assert!(close(x.glyph_box.top(), p.glyph_box.top()));
        assert!(x.glyph_box.top() < p.baseline - 20.0);
    }

    #[test]
    fn text_bottom_alignment_meets_the_line_ink_bottom() {
        let (p, x) = aligned_line("text-bottom");
        assert!(close(x.glyph_box.bottom(), p.glyph_box.bottom()));
        // "g" descends below the baseline.
        assert!(x.glyph_box.bottom() > p.baseline);
    }

    /// A 20px vertical-rl column of "一二" followed by a 5px "x" with the
    /// given alignment.
    fn aligned_column(align: &str) -> (Paragraph, Fragment) {
        let tree = laid_out(
            &format!(
                r#"[["一二", {{"content": "x", "fontSize": 5, "verticalAlign": "{}"}}]]"#,
                align
            ),
            PartialStyle::new().writing_mode(WritingMode::VerticalRl).font_size(20.0),
            Constraint::AUTO,
        );
        let (pid, p) = tree.paragraphs().next().unwrap();
        let (_, x) = tree.fragments_of(pid).nth(1).unwrap();
        (p.clone(), x.clone())
    }

    #[test]
    fn column_alignments_move_across_the_axis() {
        let (p, baseline) = aligned_column("baseline");
        assert!(close(baseline.content_box.center().x, p.baseline));

        let (p, top) = aligned_column("top");
        assert!(close(top.content_box.left(), p.line_box.left()));
        let (p, bottom) = aligned_column("bottom");
        assert!(close(bottom.content_box.right(), p.line_box.right()));

        let (p, middle) = aligned_column("middle");
        assert!(close(middle.content_box.center().x, p.baseline));

        let (p, sub) = aligned_column("sub");
        assert!(close(sub.glyph_box.left(), p.baseline));
        let (p, sup) = aligned_column("super");
        assert!(close(sup.glyph_box.right(), p.baseline));
        assert!(sub.content_box.x > middle.content_box.x);
        assert!(sup.content_box.x < middle.content_box.x);

        let (p, text_top) = aligned_column("text-top");
        assert!(close(text_top.glyph_box.left(), p.glyph_box.left()));
        let (p, text_bottom) = aligned_column("text-bottom");
        assert!(close(text_bottom.glyph_box.right(), p.glyph_box.right()));
        assert!(text_top.glyph_box.left() < text_bottom.glyph_box.left());
    }

    #[test]
    fn vertical_rl_column_grows_per_character() {
        let style = PartialStyle::new()
            .writing_mode(WritingMode::VerticalRl)
            .font_size(10.0)
            .letter_spacing(2.0);
        let mut heights = Vec::new();
        for text in ["\"\u{4E00}\"", "\"\u{4E00}\u{4E8C}\"", "\"\u{4E00}\u{4E8C}\u{4E09}\""] {
            let tree = laid_out(text, style.clone(), Constraint::AUTO);
            let (pid, _) = tree.paragraphs().next().unwrap();
            let (_, f) = tree.fragments_of(pid).next().unwrap();
            heights.push(f.inline_box.height);
        }
        assert!(close(heights[0], 10.0));
        assert!(close(heights[1], 22.0));
        assert!(close(heights[2], 34.0));
    }

    #[test]
    fn vertical_rl_stacks_columns_right_to_left() {
        let tree = laid_out(
            r#"["一", "二"]"#,
            PartialStyle::new().writing_mode(WritingMode::VerticalRl).font_size(10.0),
            Constraint::AUTO,
        );
        let xs: Vec<f32> = tree.paragraphs().map(|(_, p)| p.line_box.x).collect();
        assert!(xs[0] > xs[1]);
        assert!(close(xs[1], 0.0));
    }

    #[test]
    fn paragraphs_stack_by_their_own_writing_mode() {
        let tree = laid_out(
            r#"["one", {"content": "一二", "writingMode": "vertical-rl"}, {"content": "三", "writingMode": "vertical-rl"}, "two"]"#,
            PartialStyle::new().font_size(10.0),
            Constraint::AUTO,
        );
        let boxes: Vec<BoundingBox> = tree.paragraphs().map(|(_, p)| p.line_box).collect();
        assert_eq!(boxes.len(), 4);
        // The columns sit side by side, right to left, under the first line.
        assert!(close(boxes[1].top(), boxes[0].bottom()));
        assert!(close(boxes[2].top(), boxes[0].bottom()));
        assert!(close(boxes[2].x, 0.0));
        assert!(boxes[1].x > boxes[2].x);
        // The next line starts below the taller column.
        assert!(close(boxes[3].top(), boxes[1].bottom()));
        assert!(boxes[1].height > boxes[2].height);
    }

    #[test]
    fn latin_rotates_and_ideographs_stay_upright() {
        assert!(rotates_in_vertical('A'));
        assert!(rotates_in_vertical('\u{FF08}'));
        assert!(!rotates_in_vertical('\u{A9}'));
        assert!(!rotates_in_vertical('\u{4E00}'));
    }

    #[test]
    fn paragraphs_stack_downward() {
        let tree = laid_out(
            r#"["one", "two"]"#,
            PartialStyle::new().font_size(10.0),
            Constraint::AUTO,
        );
        let tops: Vec<f32> = tree.paragraphs().map(|(_, p)| p.line_box.y).collect();
        assert!(close(tops[0], 0.0));
        assert!(close(tops[1], 12.0));
        let boxes = aggregate(&tree, Constraint::width(100.0));
        assert!(close(boxes.bounding_box.width, 100.0));
        assert!(close(boxes.content_box.height, 24.0));
    }
}
