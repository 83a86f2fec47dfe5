//! Glyph rendering passes
//!
//! Without effects the text is drawn once in its own style. Each entry of
//! the effects list is otherwise a full pass over every fragment: the
//! effect's style is layered over the fragment style and the pass is drawn
//! under its own transform (skew about the center of the canvas box, then
//! translate and offset). Earlier effects are drawn first, so a shadow layer
//! listed first sits beneath the fill layer listed after it.

use inkset_paint::{
    BoundingBox, DrawSurface, FillStyle, Path, Point, Shadow, StrokeStyle, Transform2D,
};

use super::{paint, Stage, StageContext, StagePath};
use crate::options::Effect;
use crate::style::{resolve, Style};
use crate::tree::{FragmentId, TextTree};

/// A character drawn as raw text because its font had no outline.
#[derive(Debug, Clone, PartialEq)]
struct TextGlyph {
    text: String,
    position: Point,
    font: String,
    fill: FillStyle,
    slot: BoundingBox,
}

/// One fragment's ink within a pass.
#[derive(Debug, Clone, PartialEq)]
struct FragmentInk {
    /// Index into the stage's flat path list.
    path: Option<usize>,
    shadow: Option<Shadow>,
    glyphs: Vec<TextGlyph>,
}

#[derive(Debug, Clone, PartialEq)]
struct RenderPass {
    transform: Transform2D,
    items: Vec<FragmentInk>,
}

#[derive(Debug, Clone, Default)]
pub struct RenderStage {
    paths: Vec<StagePath>,
    passes: Vec<RenderPass>,
}

/// The transform an effect's pass is drawn under.
pub fn effect_transform(effect: &Effect, center: Point) -> Transform2D {
    let mut transform = Transform2D::identity();
    if effect.skew_x != 0.0 || effect.skew_y != 0.0 {
        transform = Transform2D::skew(effect.skew_x, effect.skew_y).around(center);
    }
    let dx = effect.translate_x + effect.offset_x;
    let dy = effect.translate_y + effect.offset_y;
    if dx != 0.0 || dy != 0.0 {
        transform = transform.then(&Transform2D::translate(dx, dy));
    }
    transform
}

impl RenderStage {
    /// Number of passes from the last update.
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    fn build_pass(&mut self, ctx: &StageContext<'_>, effect: Option<&Effect>) {
        let center = ctx.boxes.bounding_box.center();
        let transform = effect.map_or(Transform2D::identity(), |e| effect_transform(e, center));
        let mut items = Vec::new();
        for (pid, _) in ctx.tree.paragraphs() {
            for (fid, fragment) in ctx.tree.fragments_of(pid) {
                let style = match effect {
                    Some(effect) => resolve(&fragment.style, &effect.style),
                    None => fragment.style.clone(),
                };
                if let Some(item) = self.fragment_ink(ctx, fid, &style) {
                    items.push(item);
                }
            }
        }
        self.passes.push(RenderPass { transform, items });
    }

    fn fragment_ink(
        &mut self,
        ctx: &StageContext<'_>,
        fid: FragmentId,
        style: &Style,
    ) -> Option<FragmentInk> {
        let tree: &TextTree = ctx.tree;
        // Gradients span the whole text, not each fragment.
        let fill = paint(&style.color, &ctx.boxes.content_box);
        let stroke = style
            .text_stroke_color
            .as_deref()
            .filter(|_| style.text_stroke_width > 0.0)
            .and_then(|color| paint(color, &ctx.boxes.content_box))
            .map(|paint| StrokeStyle::new(paint, style.text_stroke_width));

        let mut outline = Path::new();
        let mut glyphs = Vec::new();
        for (_, character) in tree.characters_of(fid) {
            if character.has_outline {
                outline.extend(&character.path);
            } else if !character.content.is_whitespace() {
                if let Some(fill) = &fill {
                    glyphs.push(TextGlyph {
                        text: character.content.to_string(),
                        position: character.origin,
                        font: style.css_font(),
                        fill: fill.clone(),
                        slot: character.bounding_box,
                    });
                }
            }
        }

        let path = if outline.is_empty() || (fill.is_none() && stroke.is_none()) {
            None
        } else {
            self.paths.push(StagePath {
                path: outline,
                fill,
                stroke,
                clip: None,
            });
            Some(self.paths.len() - 1)
        };
        if path.is_none() && glyphs.is_empty() {
            return None;
        }
        Some(FragmentInk {
            path,
            shadow: style.shadow(),
            glyphs,
        })
    }
}

impl Stage for RenderStage {
    fn name(&self) -> &'static str {
        "render"
    }

    fn order(&self) -> i32 {
        20
    }

    fn update(&mut self, ctx: &StageContext<'_>) {
        self.paths.clear();
        self.passes.clear();
        if ctx.effects.is_empty() {
            self.build_pass(ctx, None);
        } else {
            for effect in ctx.effects {
                self.build_pass(ctx, Some(effect));
            }
        }
    }

    fn paths(&self) -> &[StagePath] {
        &self.paths
    }

    fn extend_bounds(&self, _ctx: &StageContext<'_>, bounds: BoundingBox) -> BoundingBox {
        let mut bounds = bounds;
        for pass in &self.passes {
            for item in &pass.items {
                let ink = item
                    .path
                    .and_then(|index| self.paths.get(index))
                    .and_then(StagePath::bounds);
                let slots = item.glyphs.iter().map(|g| g.slot);
                for area in ink.into_iter().chain(slots) {
                    let area = item.shadow.map_or(area, |shadow| shadow.extend(&area));
                    bounds = bounds.union(&area.transform(&pass.transform));
                }
            }
        }
        bounds
    }

    fn draw(&self, _ctx: &StageContext<'_>, surface: &mut dyn DrawSurface) {
        for pass in &self.passes {
            surface.save();
            surface.transform(pass.transform);
            for item in &pass.items {
                if let Some(shadow) = item.shadow {
                    surface.save();
                    surface.set_shadow(shadow);
                }
                if let Some(path) = item.path.and_then(|index| self.paths.get(index)) {
                    path.draw(surface);
                }
                for glyph in &item.glyphs {
                    surface.fill_text(&glyph.text, glyph.position, &glyph.font, &glyph.fill);
                }
                if item.shadow.is_some() {
                    surface.restore();
                }
            }
            surface.restore();
        }
    }
}
