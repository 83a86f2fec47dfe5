//! Underline, line-through and overline
//!
//! Glyph building leaves one bar per character. Adjacent bars of the same
//! kind and color that line up across the writing axis are merged, so a
//! decorated run is one rectangle without seams between characters.

use inkset_paint::{BoundingBox, Path};

use super::{paint, Stage, StageContext, StagePath};
use crate::style::TextDecoration;

struct Bar {
    decoration: TextDecoration,
    color: String,
    vertical: bool,
    area: BoundingBox,
}

impl Bar {
    /// Whether `next` continues this bar.
    fn continues(&self, next: &Bar) -> bool {
        const EPSILON: f32 = 1e-3;
        let same_line = if self.vertical {
            (self.area.x - next.area.x).abs() < EPSILON
                && (self.area.width - next.area.width).abs() < EPSILON
        } else {
            (self.area.y - next.area.y).abs() < EPSILON
                && (self.area.height - next.area.height).abs() < EPSILON
        };
        self.decoration == next.decoration
            && self.color == next.color
            && self.vertical == next.vertical
            && same_line
    }
}

#[derive(Debug, Clone, Default)]
pub struct DecorationStage {
    paths: Vec<StagePath>,
}

impl Stage for DecorationStage {
    fn name(&self) -> &'static str {
        "text-decoration"
    }

    fn order(&self) -> i32 {
        30
    }

    fn update(&mut self, ctx: &StageContext<'_>) {
        self.paths.clear();
        let tree = ctx.tree;
        let mut bars: Vec<Bar> = Vec::new();
        for (pid, _) in tree.paragraphs() {
            let mut open = false;
            for (fid, fragment) in tree.fragments_of(pid) {
                for (_, character) in tree.characters_of(fid) {
                    let Some(area) = character.decoration else {
                        open = false;
                        continue;
                    };
                    let bar = Bar {
                        decoration: fragment.style.text_decoration,
                        color: fragment.style.color.clone(),
                        vertical: fragment.style.is_vertical(),
                        area,
                    };
                    match bars.last_mut() {
                        Some(last) if open && last.continues(&bar) => {
                            last.area = last.area.union(&bar.area);
                        }
                        _ => bars.push(bar),
                    }
                    open = true;
                }
            }
        }

        for bar in bars {
            if let Some(fill) = paint(&bar.color, &ctx.boxes.content_box) {
                self.paths.push(StagePath::filled(Path::rect(&bar.area), fill));
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
    use crate::tree::TextTree;

    fn run(tree: &TextTree) -> DecorationStage {
        let assets = AssetCache::new();
        let ctx = StageContext {
            tree,
            boxes: aggregate(tree, Constraint::AUTO),
            assets: &assets,
            effects: &[],
        };
        let mut stage = DecorationStage::default();
        stage.update(&ctx);
        stage
    }

    fn bars(stage: &DecorationStage) -> Vec<BoundingBox> {
        stage.paths().iter().filter_map(|p| p.path.bounds()).collect()
    }

    #[test]
    fn adjacent_fragments_share_one_underline() {
        let tree = prepared(
            r#"[["ab", {"content": "cd", "fontWeight": "bold"}]]"#,
            PartialStyle::new()
                .font_size(10.0)
                .text_decoration(TextDecoration::Underline),
            Constraint::AUTO,
        );
        let bars = bars(&run(&tree));
        assert_eq!(bars.len(), 1);
        assert!((bars[0].left() - 0.0).abs() < 1e-3);
        assert!((bars[0].width - 20.0).abs() < 1e-3);
    }

    #[test]
    fn a_color_change_splits_the_bar() {
        let tree = prepared(
            r#"[["ab", {"content": "cd", "color": "red"}]]"#,
            PartialStyle::new()
                .font_size(10.0)
                .text_decoration(TextDecoration::LineThrough),
            Constraint::AUTO,
        );
        let bars = bars(&run(&tree));
        assert_eq!(bars.len(), 2);
        assert!((bars[0].right() - bars[1].left()).abs() < 1e-3);
    }

    #[test]
    fn undecorated_gaps_end_the_run() {
        let tree = prepared(
            r#"[[{"content": "ab", "textDecoration": "underline"}, "cd", {"content": "ef", "textDecoration": "underline"}]]"#,
            PartialStyle::new().font_size(10.0),
            Constraint::AUTO,
        );
        assert_eq!(bars(&run(&tree)).len(), 2);
    }

    #[test]
    fn column_decorations_run_down_the_column() {
        let tree = prepared(
            r#""文字列""#,
            PartialStyle::new()
                .font_size(10.0)
                .writing_mode(WritingMode::VerticalRl)
                .text_decoration(TextDecoration::Overline),
            Constraint::AUTO,
        );
        let bars = bars(&run(&tree));
        assert_eq!(bars.len(), 1);
        assert!((bars[0].height - 30.0).abs() < 1e-3);
        assert!(bars[0].width < 1.0);
    }
}
