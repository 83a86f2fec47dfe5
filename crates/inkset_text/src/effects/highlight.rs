//! SVG highlight markers
//!
//! Consecutive characters whose styles carry the same highlight descriptor
//! and sit on the same baseline form a run. Each run gets the marker image
//! either stretched over the run (`outline`) or tiled along one of the
//! text's lines (`underline`, `line-through`, `overline`). Tiles are sized
//! so a whole number of them covers the run with the least distortion of the
//! marker's own aspect ratio.

use std::f32::consts::FRAC_PI_2;

use inkset_paint::{BoundingBox, Point, Transform2D};

use super::{load_asset, Stage, StageContext, StagePath};
use crate::font::FontMetrics;
use crate::geometry::closest_divisor;
use crate::style::{Highlight, HighlightLine, ImageFit};
use crate::svg::SvgAsset;
use crate::tree::{ParagraphId, TextTree};

/// Marker thickness as a fraction of the font size when none is given.
const DEFAULT_SIZE: f32 = 0.4;

/// The line a marker attaches to when the style leaves it open.
///
/// Compact markers that fill most of their view box height surround the
/// text. Everything else is judged by where its ink sits vertically: the
/// top third is an overline, the bottom third an underline.
pub fn infer_line(asset: &SvgAsset) -> HighlightLine {
    let view = asset.view_box;
    if view.height <= 0.0 {
        return HighlightLine::Underline;
    }
    let coverage = asset.bounds.height / view.height;
    if asset.aspect_ratio() <= 2.0 && coverage >= 0.5 {
        return HighlightLine::Outline;
    }
    let center = (asset.bounds.center().y - view.top()) / view.height;
    if center < 1.0 / 3.0 {
        HighlightLine::Overline
    } else if center > 2.0 / 3.0 {
        HighlightLine::Underline
    } else {
        HighlightLine::LineThrough
    }
}

/// A run of characters sharing one highlight.
struct Run {
    highlight: Highlight,
    baseline: f32,
    vertical: bool,
    font_size: f32,
    metrics: FontMetrics,
    /// Union of the run's character slots.
    area: BoundingBox,
    /// Content box union, used for the cross-axis edges of columns.
    content: BoundingBox,
}

#[derive(Debug, Clone, Default)]
pub struct HighlightStage {
    paths: Vec<StagePath>,
}

impl HighlightStage {
    fn place(&mut self, ctx: &StageContext<'_>, run: &Run) {
        let Some(asset) = load_asset(ctx, &run.highlight.image) else {
            return;
        };
        let asset = asset.with_colormap(&run.highlight.colormap);
        let line = run.highlight.line.unwrap_or_else(|| infer_line(&asset));
        let thickness = run.highlight.thickness;

        if line == HighlightLine::Outline {
            let transform = asset.fit_transform(&run.area, ImageFit::Stretch);
            self.paths.extend(
                asset
                    .transformed(&transform)
                    .into_iter()
                    .map(|svg| StagePath::from_svg(svg, thickness)),
            );
            return;
        }

        let size = run
            .highlight
            .size
            .filter(|s| *s > 0.0)
            .unwrap_or(run.font_size * DEFAULT_SIZE);
        let natural = size * asset.aspect_ratio();
        let length = if run.vertical {
            run.area.height
        } else {
            run.area.width
        };
        if natural <= 0.0 || length <= 0.0 {
            return;
        }
        let tiles = closest_divisor(length, natural);
        let tile = length / tiles as f32;
        let cross = line_position(run, line);

        for i in 0..tiles {
            let along = (i as f32 + 0.5) * tile;
            let center = if run.vertical {
                Point::new(cross, run.area.top() + along)
            } else {
                Point::new(run.area.left() + along, cross)
            };
            let target = BoundingBox::new(center.x - tile / 2.0, center.y - size / 2.0, tile, size);
            let mut transform = asset.fit_transform(&target, ImageFit::Stretch);
            if run.vertical {
                transform = transform.then(&Transform2D::rotate(FRAC_PI_2).around(center));
            }
            self.paths.extend(
                asset
                    .transformed(&transform)
                    .into_iter()
                    .map(|svg| StagePath::from_svg(svg, thickness)),
            );
        }
    }
}

/// Cross-axis coordinate of the marker's center line.
fn line_position(run: &Run, line: HighlightLine) -> f32 {
    let m = &run.metrics;
    if run.vertical {
        return match line {
            HighlightLine::Underline => run.content.left(),
            HighlightLine::Overline => run.content.right(),
            HighlightLine::LineThrough | HighlightLine::Outline => run.baseline,
        };
    }
    match line {
        HighlightLine::Underline => run.baseline - m.underline_position,
        HighlightLine::LineThrough => run.baseline - m.strikeout_position,
        HighlightLine::Overline => run.baseline - m.typo_ascent,
        HighlightLine::Outline => run.area.center().y,
    }
}

fn collect_runs(tree: &TextTree, pid: ParagraphId) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    let mut open = false;
    for (fid, fragment) in tree.fragments_of(pid) {
        let Some(highlight) = fragment.style.highlight() else {
            open = false;
            continue;
        };
        for (_, character) in tree.characters_of(fid) {
            let slot = character.bounding_box;
            match runs.last_mut() {
                Some(run)
                    if open
                        && run.highlight == highlight
                        && run.baseline == fragment.baseline =>
                {
                    run.area = run.area.union(&slot);
                    run.content = run.content.union(&fragment.content_box);
                }
                _ => {
                    runs.push(Run {
                        highlight: highlight.clone(),
                        baseline: fragment.baseline,
                        vertical: fragment.style.is_vertical(),
                        font_size: fragment.style.font_size,
                        metrics: fragment.metrics,
                        area: slot,
                        content: fragment.content_box,
                    });
                    open = true;
                }
            }
        }
    }
    runs
}

impl Stage for HighlightStage {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn order(&self) -> i32 {
        10
    }

    fn update(&mut self, ctx: &StageContext<'_>) {
        self.paths.clear();
        for (pid, _) in ctx.tree.paragraphs() {
            for run in collect_runs(ctx.tree, pid) {
                self.place(ctx, &run);
            }
        }
    }

    fn paths(&self) -> &[StagePath] {
        &self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetCache;
    use crate::effects::testing::prepared;
    use crate::geometry::Constraint;
    use crate::layout::aggregate;
    use crate::style::{PartialStyle, WritingMode};

    const WAVE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="10"><rect y="8" width="40" height="2" fill="red"/></svg>"#;
    const RING: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="none" stroke="red" stroke-width="1"/></svg>"#;

    /// A 40x10 marker whose ink is one horizontal band.
    fn band(top: f32, height: f32) -> SvgAsset {
        SvgAsset::from_svg_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="10"><rect y="{}" width="40" height="{}" fill="red"/></svg>"#,
            top, height
        ))
        .unwrap()
    }

    fn run_stage(json: &str, root: PartialStyle) -> (TextTree, HighlightStage) {
        let tree = prepared(json, root, Constraint::AUTO);
        let assets = AssetCache::new();
        let ctx = StageContext {
            tree: &tree,
            boxes: aggregate(&tree, Constraint::AUTO),
            assets: &assets,
            effects: &[],
        };
        let mut stage = HighlightStage::default();
        stage.update(&ctx);
        (tree, stage)
    }

    fn union(stage: &HighlightStage) -> BoundingBox {
        let boxes: Vec<BoundingBox> = stage.paths().iter().filter_map(StagePath::bounds).collect();
        BoundingBox::from_boxes(&boxes)
    }

    #[test]
    fn infers_the_line_from_ink_position() {
        assert_eq!(infer_line(&band(8.0, 2.0)), HighlightLine::Underline);
        assert_eq!(infer_line(&band(4.0, 2.0)), HighlightLine::LineThrough);
        assert_eq!(infer_line(&band(0.0, 2.0)), HighlightLine::Overline);
        assert_eq!(
            infer_line(&SvgAsset::from_svg_str(RING).unwrap()),
            HighlightLine::Outline
        );
    }

    #[test]
    fn one_run_spans_adjacent_fragments_with_the_same_marker() {
        let json = serde_json::json!([[
            "ab",
            {"content": "cd", "highlightImage": WAVE, "highlightSize": 5},
            {"content": "ef", "highlightImage": WAVE, "highlightSize": 5}
        ]])
        .to_string();
        let (tree, stage) = run_stage(&json, PartialStyle::new().font_size(10.0));
        // "cdef" is 20px long; a 5px tall 4:1 marker is exactly one tile.
        assert_eq!(stage.paths().len(), 1);
        let chars: Vec<BoundingBox> = tree
            .all_characters()
            .filter_map(|(_, _, cid)| tree.character(cid).map(|c| c.bounding_box))
            .collect();
        let bounds = union(&stage);
        assert!((bounds.left() - chars[2].left()).abs() < 1e-3);
        assert!((bounds.right() - chars[5].right()).abs() < 1e-3);
    }

    #[test]
    fn long_runs_are_tiled_under_the_baseline() {
        let json = serde_json::json!([
            {"content": "abcdefgh", "highlightImage": WAVE, "highlightSize": 5}
        ])
        .to_string();
        let (tree, stage) = run_stage(&json, PartialStyle::new().font_size(10.0));
        assert_eq!(stage.paths().len(), 2);
        let (pid, _) = tree.paragraphs().next().unwrap();
        let (_, fragment) = tree.fragments_of(pid).next().unwrap();
        // The tile is centered on the underline and its ink is its bottom fifth.
        let bounds = union(&stage);
        let underline = fragment.baseline - fragment.metrics.underline_position;
        assert!(bounds.top() > underline);
        assert!((bounds.bottom() - (underline + 2.5)).abs() < 1e-3);
    }

    #[test]
    fn outline_markers_cover_the_run() {
        let json = serde_json::json!([
            {"content": "ab", "highlightImage": RING, "highlightThickness": 3}
        ])
        .to_string();
        let (tree, stage) = run_stage(&json, PartialStyle::new().font_size(10.0));
        let path = &stage.paths()[0];
        assert_eq!(path.stroke.as_ref().map(|s| s.width), Some(3.0));
        let (pid, _) = tree.paragraphs().next().unwrap();
        let (_, fragment) = tree.fragments_of(pid).next().unwrap();
        assert!(path.path.bounds().unwrap().contains_box(&fragment.content_box, 1e-3));
    }

    #[test]
    fn column_markers_run_down_the_column() {
        let json = serde_json::json!([
            {
                "content": "\u{6587}\u{5B57}",
                "highlightImage": WAVE,
                "highlightSize": 5,
                "highlightLine": "line-through"
            }
        ])
        .to_string();
        let (tree, stage) = run_stage(
            &json,
            PartialStyle::new()
                .font_size(10.0)
                .writing_mode(WritingMode::VerticalRl),
        );
        let bounds = union(&stage);
        let (pid, _) = tree.paragraphs().next().unwrap();
        let (_, fragment) = tree.fragments_of(pid).next().unwrap();
        assert!(bounds.height > bounds.width);
        assert!(bounds.left() >= fragment.content_box.left() - 1e-3);
        assert!(bounds.right() <= fragment.content_box.right() + 1e-3);
    }

    #[test]
    fn unhighlighted_text_produces_nothing() {
        let (_, stage) = run_stage(r#""plain""#, PartialStyle::new());
        assert!(stage.paths().is_empty());
    }
}
