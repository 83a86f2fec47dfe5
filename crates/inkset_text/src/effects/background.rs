//! Background fills and images
//!
//! The root style paints the whole canvas, a paragraph's own background its
//! line box, a fragment's own background its inline box. Inherited values
//! are not painted again at every level.

use inkset_paint::{BoundingBox, Path};

use super::{load_asset, paint, Stage, StageContext, StagePath};
use crate::style::{ImageFit, PartialStyle, Style};

#[derive(Debug, Clone, Default)]
pub struct BackgroundStage {
    paths: Vec<StagePath>,
}

impl BackgroundStage {
    fn push_layer(
        &mut self,
        ctx: &StageContext<'_>,
        style: &Style,
        own: Option<&PartialStyle>,
        target: BoundingBox,
    ) {
        let declared = |value: Option<&Option<String>>| match value {
            None => true,
            Some(own) => own.as_deref().is_some_and(|v| !v.trim().is_empty()),
        };

        if declared(own.map(|o| &o.background_color)) {
            if let Some(fill) = style
                .background_color
                .as_deref()
                .and_then(|color| paint(color, &target))
            {
                self.paths.push(StagePath::filled(Path::rect(&target), fill));
            }
        }

        if !declared(own.map(|o| &o.background_image)) {
            return;
        }
        let Some(source) = style.background_image.as_deref() else {
            return;
        };
        let Some(asset) = load_asset(ctx, source) else {
            return;
        };
        let asset = asset.with_colormap(&style.background_colormap);
        let transform = asset.fit_transform(&target, style.background_fit);
        for svg in asset.transformed(&transform) {
            let path = StagePath::from_svg(svg, None);
            self.paths.push(match style.background_fit {
                ImageFit::Rigid => path.with_clip(target),
                ImageFit::Stretch => path,
            });
        }
    }
}

impl Stage for BackgroundStage {
    fn name(&self) -> &'static str {
        "background"
    }

    fn order(&self) -> i32 {
        0
    }

    fn update(&mut self, ctx: &StageContext<'_>) {
        self.paths.clear();
        let tree = ctx.tree;
        self.push_layer(ctx, &tree.style, None, ctx.boxes.bounding_box);
        for (pid, paragraph) in tree.paragraphs() {
            self.push_layer(ctx, &paragraph.style, Some(&paragraph.own_style), paragraph.line_box);
            for (_, fragment) in tree.fragments_of(pid) {
                self.push_layer(
                    ctx,
                    &fragment.style,
                    Some(&fragment.own_style),
                    fragment.inline_box,
                );
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
    use crate::tree::TextTree;
    use inkset_paint::{Color, FillStyle};

    fn run(tree: &TextTree, assets: &AssetCache) -> BackgroundStage {
        let ctx = StageContext {
            tree,
            boxes: aggregate(tree, Constraint::width(100.0)),
            assets,
            effects: &[],
        };
        let mut stage = BackgroundStage::default();
        stage.update(&ctx);
        stage
    }

    #[test]
    fn paints_each_declared_level_once() {
        let tree = prepared(
            r#"[{"content": "a", "backgroundColor": "red"}, "b"]"#,
            PartialStyle::new().background_color("#fff"),
            Constraint::AUTO,
        );
        let stage = run(&tree, &AssetCache::new());
        // Canvas plus the first paragraph; its fragment only inherits.
        assert_eq!(stage.paths().len(), 2);
        assert_eq!(stage.paths()[0].path.bounds().unwrap().width, 100.0);
        let (_, first) = tree.paragraphs().next().unwrap();
        assert_eq!(stage.paths()[1].path.bounds(), Some(first.line_box));
        assert_eq!(
            stage.paths()[1].fill,
            Some(FillStyle::Color(Color::from_rgba8(255, 0, 0, 255)))
        );
    }

    #[test]
    fn rigid_images_are_clipped_to_the_line() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="blue"/></svg>"#;
        let json =
            serde_json::json!([{"content": "wide text here", "backgroundImage": svg}]).to_string();
        let tree = prepared(&json, PartialStyle::new(), Constraint::AUTO);
        let stage = run(&tree, &AssetCache::new());
        let (_, paragraph) = tree.paragraphs().next().unwrap();
        let image = &stage.paths()[0];
        assert_eq!(image.clip, Some(paragraph.line_box));
        assert!(paragraph
            .line_box
            .contains_box(&image.bounds().unwrap(), 1e-3));
    }

    #[test]
    fn missing_images_draw_nothing() {
        let tree = prepared(
            r#"[{"content": "a", "backgroundImage": "/missing/bg.svg"}]"#,
            PartialStyle::new(),
            Constraint::AUTO,
        );
        assert!(run(&tree, &AssetCache::new()).paths().is_empty());
    }
}
