//! List item markers
//!
//! One marker before every paragraph that starts a list item. Lines the
//! wrapper split off are continuations and stay unmarked.

use inkset_paint::{BoundingBox, Path, Point};

use super::{load_asset, paint, Stage, StageContext, StagePath};
use crate::style::{ImageFit, ListStyleType};
use crate::tree::Paragraph;

/// Marker size as a fraction of the font size when none is given.
const DEFAULT_SIZE: f32 = 0.35;
/// Distance from the line start to the marker center, in font sizes.
const INDENT: f32 = 0.6;

#[derive(Debug, Clone, Default)]
pub struct ListStyleStage {
    paths: Vec<StagePath>,
}

/// Center of the marker slot ahead of `paragraph`.
fn marker_center(paragraph: &Paragraph) -> Point {
    let style = &paragraph.style;
    let indent = style.font_size * INDENT;
    if style.is_vertical() {
        Point::new(paragraph.baseline, paragraph.line_box.top() - indent)
    } else {
        Point::new(
            paragraph.line_box.left() - indent,
            paragraph.baseline - paragraph.x_height / 2.0,
        )
    }
}

impl ListStyleStage {
    fn push_marker(&mut self, ctx: &StageContext<'_>, paragraph: &Paragraph) {
        let style = &paragraph.style;
        let size = style
            .list_style_size
            .filter(|s| *s > 0.0)
            .unwrap_or(style.font_size * DEFAULT_SIZE);
        let center = marker_center(paragraph);
        let slot = BoundingBox::new(center.x - size / 2.0, center.y - size / 2.0, size, size);

        if let Some(source) = style.list_style_image.as_deref() {
            let Some(asset) = load_asset(ctx, source) else {
                return;
            };
            let asset = asset.with_colormap(&style.list_style_colormap);
            // Fit inside the square, keeping the image's proportions.
            let aspect = asset.aspect_ratio();
            let (width, height) = if aspect >= 1.0 {
                (size, size / aspect)
            } else {
                (size * aspect, size)
            };
            let target = BoundingBox::new(
                center.x - width / 2.0,
                center.y - height / 2.0,
                width,
                height,
            );
            let transform = asset.fit_transform(&target, ImageFit::Stretch);
            self.paths.extend(
                asset
                    .transformed(&transform)
                    .into_iter()
                    .map(|svg| StagePath::from_svg(svg, None)),
            );
            return;
        }

        if style.list_style_type == ListStyleType::Disc {
            if let Some(fill) = paint(&style.color, &slot) {
                self.paths
                    .push(StagePath::filled(Path::circle(center, size / 2.0), fill));
            }
        }
    }
}

impl Stage for ListStyleStage {
    fn name(&self) -> &'static str {
        "list-style"
    }

    fn order(&self) -> i32 {
        15
    }

    fn update(&mut self, ctx: &StageContext<'_>) {
        self.paths.clear();
        for (_, paragraph) in ctx.tree.paragraphs() {
            if paragraph.continuation {
                continue;
            }
            let style = &paragraph.style;
            if style.list_style_type == ListStyleType::None && style.list_style_image.is_none() {
                continue;
            }
            self.push_marker(ctx, paragraph);
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
    use crate::style::PartialStyle;
    use crate::tree::TextTree;

    fn run(tree: &TextTree, constraint: Constraint) -> (ListStyleStage, BoundingBox) {
        let assets = AssetCache::new();
        let ctx = StageContext {
            tree,
            boxes: aggregate(tree, constraint),
            assets: &assets,
            effects: &[],
        };
        let mut stage = ListStyleStage::default();
        stage.update(&ctx);
        let bounds = stage.extend_bounds(&ctx, ctx.boxes.bounding_box);
        (stage, bounds)
    }

    #[test]
    fn discs_sit_ahead_of_each_item() {
        let tree = prepared(
            r#"[{"content": "one", "listStyleType": "disc"}, {"content": "two", "listStyleType": "disc"}]"#,
            PartialStyle::new().font_size(10.0),
            Constraint::AUTO,
        );
        let (stage, bounds) = run(&tree, Constraint::AUTO);
        assert_eq!(stage.paths().len(), 2);
        let (_, first) = tree.paragraphs().next().unwrap();
        let disc = stage.paths()[0].bounds().unwrap();
        assert!(disc.right() < first.line_box.left());
        assert!((disc.center().y - (first.baseline - first.x_height / 2.0)).abs() < 1e-3);
        assert!((disc.width - 3.5).abs() < 1e-3);
        // The canvas grows to the left to keep the marker.
        assert!(bounds.left() < 0.0);
    }

    #[test]
    fn wrapped_lines_are_not_marked_again() {
        let constraint = Constraint::width(30.0);
        let tree = prepared(
            r#"[{"content": "one two three four", "listStyleType": "disc"}]"#,
            PartialStyle::new().font_size(10.0),
            constraint,
        );
        assert!(tree.len() > 1);
        let (stage, _) = run(&tree, constraint);
        assert_eq!(stage.paths().len(), 1);
    }

    #[test]
    fn image_markers_keep_their_proportions() {
        let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="#00f"/></svg>"##;
        let json = serde_json::json!([
            {"content": "item", "listStyleImage": svg, "listStyleSize": 8}
        ])
        .to_string();
        let tree = prepared(&json, PartialStyle::new().font_size(10.0), Constraint::AUTO);
        let (stage, _) = run(&tree, Constraint::AUTO);
        let marker = stage.paths()[0].bounds().unwrap();
        assert!((marker.width - 8.0).abs() < 1e-3);
        assert!((marker.height - 4.0).abs() < 1e-3);
    }

    #[test]
    fn plain_paragraphs_have_no_marker() {
        let tree = prepared(r#"["a", "b"]"#, PartialStyle::new(), Constraint::AUTO);
        assert!(run(&tree, Constraint::AUTO).0.paths().is_empty());
    }
}
