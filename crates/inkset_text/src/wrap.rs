//! Line breaking
//!
//! [`wrap`] re-splits the parsed tree into visual lines. Every output
//! paragraph is one line; a line produced by breaking a longer paragraph is
//! flagged as a continuation.
//!
//! Horizontal text breaks at Unicode line-break opportunities, vertical text
//! after any character. In both modes no opportunity is taken right before
//! hanging punctuation, so `foo,` never starts a line with `,`. Trailing
//! whitespace hangs past the limit instead of forcing a break.

use std::collections::VecDeque;
use std::ops::Range;

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::font::{FontSpec, Measurer};
use crate::geometry::Constraint;
use crate::layout::rotates_in_vertical;
use crate::style::{PartialStyle, Style, TextWrap};
use crate::tree::{ParagraphId, TextTree};

/// Characters that stay on the line of the character before them.
pub const HANGING_PUNCTUATION: &str = concat!(
    ",.;:!?)]}%'\"\u{2019}\u{201D}\u{2026}",
    "\u{3001}\u{3002}\u{FF0C}\u{FF0E}\u{FF1A}\u{FF1B}\u{FF01}\u{FF1F}",
    "\u{FF09}\u{3011}\u{300F}\u{300D}\u{3009}\u{300B}\u{3015}\u{FF3D}\u{FF5D}",
    "\u{30FC}\u{2025}\u{30FB}\u{309D}\u{309E}\u{30FD}\u{30FE}\u{3005}\u{301C}",
);

pub fn is_hanging_punctuation(c: char) -> bool {
    HANGING_PUNCTUATION.contains(c)
}

const OVERFLOW_EPSILON: f32 = 0.01;

/// A fragment still waiting to be placed on a line.
#[derive(Debug, Clone)]
struct PendingFragment {
    content: String,
    style: Style,
    own_style: PartialStyle,
}

/// The unplaced rest of a paragraph.
#[derive(Debug, Clone)]
struct PendingLine {
    style: Style,
    own_style: PartialStyle,
    continuation: bool,
    fragments: Vec<PendingFragment>,
}

/// A breakable slice of a fragment.
#[derive(Debug, Clone, PartialEq)]
struct Unit {
    range: Range<usize>,
    /// Ends in a line terminator.
    hard: bool,
}

/// Splits every paragraph of `tree` into lines that fit `constraint`.
pub fn wrap(tree: &TextTree, constraint: Constraint, measurer: &Measurer) -> TextTree {
    let mut out = TextTree::new(tree.style.clone());
    for (pid, paragraph) in tree.paragraphs() {
        let first = PendingLine {
            style: paragraph.style.clone(),
            own_style: paragraph.own_style.clone(),
            continuation: paragraph.continuation,
            fragments: tree
                .fragments_of(pid)
                .map(|(_, f)| PendingFragment {
                    content: f.content.clone(),
                    style: f.style.clone(),
                    own_style: f.own_style.clone(),
                })
                .collect(),
        };
        let mut queue = VecDeque::from([first]);
        while let Some(line) = queue.pop_front() {
            if let Some(rest) = wrap_line(&mut out, line, constraint, measurer) {
                queue.push_front(rest);
            }
        }
    }
    out
}

/// Places as much of `line` as fits into one output paragraph and returns
/// whatever is left.
///
/// Break opportunities are found in the text of the whole line, so a word
/// or a hanging mark that crosses a fragment boundary is never split there.
fn wrap_line(
    out: &mut TextTree,
    line: PendingLine,
    constraint: Constraint,
    measurer: &Measurer,
) -> Option<PendingLine> {
    let vertical = line.style.is_vertical();
    let limit = match line.style.text_wrap {
        TextWrap::Wrap => constraint.main_axis(vertical),
        TextWrap::Nowrap => None,
    };
    let id = out.push_paragraph(line.style.clone(), line.own_style.clone(), line.continuation);

    let spans = fragment_spans(&line.fragments);
    let text: String = line.fragments.iter().map(|f| f.content.as_str()).collect();

    let mut used = 0.0f32;
    let mut has_units = false;
    for unit in break_units(&text, vertical) {
        let visible = text[unit.range.clone()].trim_end_matches(['\n', '\r']);
        let visible_end = unit.range.start + visible.len();
        let trimmed_end = unit.range.start + text[unit.range.start..visible_end].trim_end().len();
        let fit = extent(&line, &spans, unit.range.start..trimmed_end, vertical, measurer).0;
        let advance = extent(&line, &spans, unit.range.start..visible_end, vertical, measurer).1;

        let overflows = limit.is_some_and(|limit| used + fit > limit + OVERFLOW_EPSILON);
        if overflows && has_units {
            push_prefix(out, id, &line, &spans, unit.range.start);
            tracing::trace!("wrapped line after {:.1}px at {:?}", used, &text[..unit.range.start]);
            return Some(remainder(&line, &spans, unit.range.start));
        }

        // An oversized unit on an empty line is kept whole.
        used += advance;
        has_units = true;

        if unit.hard {
            push_prefix(out, id, &line, &spans, visible_end);
            return Some(remainder(&line, &spans, unit.range.end));
        }
    }
    for fragment in &line.fragments {
        push_slice(out, id, fragment, &fragment.content);
    }
    None
}

/// Byte range of every fragment within the joined line text.
fn fragment_spans(fragments: &[PendingFragment]) -> Vec<Range<usize>> {
    let mut start = 0;
    fragments
        .iter()
        .map(|f| {
            let span = start..start + f.content.len();
            start = span.end;
            span
        })
        .collect()
}

/// `(extent tested against the limit, extent added to the line)` of
/// `range`, each piece measured in its own fragment's font.
fn extent(
    line: &PendingLine,
    spans: &[Range<usize>],
    range: Range<usize>,
    vertical: bool,
    measurer: &Measurer,
) -> (f32, f32) {
    let mut total = (0.0, 0.0);
    for (fragment, span) in line.fragments.iter().zip(spans) {
        let start = range.start.max(span.start);
        let end = range.end.min(span.end);
        if start >= end {
            continue;
        }
        let piece = &fragment.content[start - span.start..end - span.start];
        let font = fragment.style.font();
        let spacing = fragment.style.letter_spacing;
        let (fit, advance) = if vertical {
            vertical_extent(piece, &font, spacing, measurer)
        } else {
            let width = horizontal_extent(piece, &font, spacing, measurer);
            (width, width)
        };
        total.0 += fit;
        total.1 += advance;
    }
    total
}

/// Pushes the first `cut` bytes of the line's text, fragment by fragment.
/// A line left empty still gets the fragment at `cut` for its height.
fn push_prefix(
    out: &mut TextTree,
    line_id: ParagraphId,
    line: &PendingLine,
    spans: &[Range<usize>],
    cut: usize,
) {
    for (fragment, span) in line.fragments.iter().zip(spans) {
        if span.end <= cut {
            push_slice(out, line_id, fragment, &fragment.content);
        } else if span.start < cut {
            push_slice(out, line_id, fragment, &fragment.content[..cut - span.start]);
        } else {
            push_slice(out, line_id, fragment, "");
            break;
        }
    }
}

/// Empty slices are only kept to give an otherwise empty line its height.
fn push_slice(out: &mut TextTree, line: ParagraphId, fragment: &PendingFragment, slice: &str) {
    let line_is_empty = out.paragraph(line).map_or(true, |p| p.fragments.is_empty());
    if slice.is_empty() && !line_is_empty {
        return;
    }
    out.push_fragment(line, slice, fragment.style.clone(), fragment.own_style.clone());
}

/// Everything from byte `offset` of the line's text onward, as a
/// continuation line. An offset at the very end keeps an empty piece of the
/// last fragment so the next line still has a height.
fn remainder(line: &PendingLine, spans: &[Range<usize>], offset: usize) -> PendingLine {
    let last = line.fragments.len().saturating_sub(1);
    let index = spans.iter().position(|span| span.end > offset).unwrap_or(last);
    let mut fragments = Vec::with_capacity(line.fragments.len() - index);
    if let (Some(current), Some(span)) = (line.fragments.get(index), spans.get(index)) {
        let local = offset.clamp(span.start, span.end) - span.start;
        fragments.push(PendingFragment {
            content: current.content[local..].to_string(),
            ..current.clone()
        });
        fragments.extend(line.fragments[index + 1..].iter().cloned());
    }
    PendingLine {
        style: line.style.clone(),
        own_style: line.own_style.clone(),
        continuation: true,
        fragments,
    }
}

fn horizontal_extent(text: &str, font: &FontSpec, spacing: f32, measurer: &Measurer) -> f32 {
    measurer.measure(text, font).width + spacing * text.chars().count() as f32
}

fn vertical_extent(text: &str, font: &FontSpec, spacing: f32, measurer: &Measurer) -> (f32, f32) {
    let extent: f32 = text
        .chars()
        .map(|c| {
            if rotates_in_vertical(c) {
                measurer.advance(c, font)
            } else {
                font.size
            }
        })
        .sum();
    (extent, extent + spacing * text.chars().count() as f32)
}

/// Breakable units of `content`, in order, covering it completely.
fn break_units(content: &str, vertical: bool) -> Vec<Unit> {
    let mut boundaries: Vec<(usize, bool)> = if vertical {
        let mut chars = content.char_indices().peekable();
        let mut boundaries = Vec::new();
        while let Some((i, c)) = chars.next() {
            let end = i + c.len_utf8();
            let next = chars.peek().map(|(_, n)| *n);
            if c == '\r' && next == Some('\n') {
                continue;
            }
            boundaries.push((end, c == '\n' || c == '\r'));
        }
        boundaries
    } else {
        linebreaks(content)
            .map(|(end, opportunity)| {
                let hard = opportunity == BreakOpportunity::Mandatory
                    && content[..end].ends_with(['\n', '\r']);
                (end, hard)
            })
            .collect()
    };

    // Punctuation hangs with whatever precedes it.
    boundaries.retain(|&(end, hard)| {
        hard || content[end..]
            .chars()
            .next()
            .map_or(true, |next| !is_hanging_punctuation(next))
    });

    let mut units = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0;
    for (end, hard) in boundaries {
        if end > start {
            units.push(Unit {
                range: start..end,
                hard,
            });
            start = end;
        }
    }
    if start < content.len() {
        units.push(Unit {
            range: start..content.len(),
            hard: false,
        });
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{parse_content, Content};
    use crate::font::ApproximateFonts;
    use crate::style::{resolve, WritingMode};

    fn lines(tree: &TextTree) -> Vec<String> {
        tree.paragraphs().map(|(id, _)| tree.paragraph_text(id)).collect()
    }

    fn wrap_text(text: &str, style: &Style, constraint: Constraint) -> TextTree {
        let tree = parse_content(&Content::from(text), style);
        wrap(&tree, constraint, &Measurer::new(&ApproximateFonts))
    }

    fn sized(size: f32) -> Style {
        resolve(&Style::default(), &PartialStyle::new().font_size(size))
    }

    #[test]
    fn splits_at_the_space() {
        // "A" is 8px at 16px; the limit is one pixel more.
        let tree = wrap_text("A B", &sized(16.0), Constraint::width(9.0));
        assert_eq!(lines(&tree), vec!["A ", "B"]);
        let continuation: Vec<bool> = tree.paragraphs().map(|(_, p)| p.continuation).collect();
        assert_eq!(continuation, vec![false, true]);
    }

    #[test]
    fn unconstrained_text_stays_on_one_line() {
        let tree = wrap_text("A long line of text", &sized(16.0), Constraint::AUTO);
        assert_eq!(lines(&tree), vec!["A long line of text"]);
    }

    #[test]
    fn newlines_always_break() {
        let tree = wrap_text("one\ntwo\r\n\nthree", &sized(16.0), Constraint::AUTO);
        assert_eq!(lines(&tree), vec!["one", "two", "", "three"]);
    }

    #[test]
    fn oversized_word_is_kept_whole() {
        let tree = wrap_text("abcdefgh ij", &sized(16.0), Constraint::width(20.0));
        assert_eq!(lines(&tree), vec!["abcdefgh ", "ij"]);
    }

    #[test]
    fn punctuation_does_not_start_a_line() {
        let tree = wrap_text(
            "\u{4F60}\u{597D}\u{3002}\u{4E16}",
            &sized(10.0),
            Constraint::width(20.0),
        );
        assert_eq!(lines(&tree), vec!["\u{4F60}", "\u{597D}\u{3002}", "\u{4E16}"]);
    }

    #[test]
    fn nowrap_ignores_the_limit() {
        let style = resolve(&sized(16.0), &PartialStyle::new().text_wrap(TextWrap::Nowrap));
        let tree = wrap_text("A B C", &style, Constraint::width(9.0));
        assert_eq!(lines(&tree), vec!["A B C"]);
    }

    #[test]
    fn vertical_text_breaks_between_any_characters() {
        let style = resolve(
            &sized(10.0),
            &PartialStyle::new().writing_mode(WritingMode::VerticalRl),
        );
        let tree = wrap_text("\u{4E00}\u{4E8C}\u{4E09}", &style, Constraint::height(25.0));
        assert_eq!(lines(&tree), vec!["\u{4E00}\u{4E8C}", "\u{4E09}"]);
    }

    #[test]
    fn fragments_keep_their_styles_across_a_break() {
        let content: Content = serde_json::from_str(
            r#"[[{"content": "aa ", "color": "red"}, {"content": "bb cc", "color": "blue"}]]"#,
        )
        .unwrap();
        let tree = parse_content(&content, &sized(10.0));
        let wrapped = wrap(&tree, Constraint::width(28.0), &Measurer::new(&ApproximateFonts));
        assert_eq!(lines(&wrapped), vec!["aa bb ", "cc"]);
        let (second, _) = wrapped.paragraphs().nth(1).unwrap();
        let colors: Vec<String> = wrapped
            .fragments_of(second)
            .map(|(_, f)| f.style.color.clone())
            .collect();
        assert_eq!(colors, vec!["blue"]);
    }

    fn wrap_json(json: &str, width: f32) -> TextTree {
        let content: Content = serde_json::from_str(json).unwrap();
        let tree = parse_content(&content, &sized(10.0));
        wrap(&tree, Constraint::width(width), &Measurer::new(&ApproximateFonts))
    }

    #[test]
    fn words_split_across_fragments_stay_whole() {
        let wrapped = wrap_json(r#"[["Hel", {"content": "lo world", "color": "red"}]]"#, 22.0);
        assert_eq!(lines(&wrapped), vec!["Hello ", "world"]);
        let (first, _) = wrapped.paragraphs().next().unwrap();
        let pieces: Vec<String> = wrapped
            .fragments_of(first)
            .map(|(_, f)| f.content.clone())
            .collect();
        assert_eq!(pieces, vec!["Hel", "lo "]);
    }

    #[test]
    fn punctuation_in_the_next_fragment_still_hangs() {
        let wrapped = wrap_json(r#"[["abcd", {"content": ", ef", "color": "red"}]]"#, 20.0);
        assert_eq!(lines(&wrapped), vec!["abcd, ", "ef"]);
    }

    #[test]
    fn newline_at_a_fragment_end_breaks_once() {
        let wrapped = wrap_json(r#"[["one\n", {"content": "two", "color": "red"}]]"#, 1000.0);
        assert_eq!(lines(&wrapped), vec!["one", "two"]);
        let (second, _) = wrapped.paragraphs().nth(1).unwrap();
        let colors: Vec<String> = wrapped
            .fragments_of(second)
            .map(|(_, f)| f.style.color.clone())
            .collect();
        assert_eq!(colors, vec!["red"]);
    }
}
