//! Effect and decoration pipeline
//!
//! Stages run over a fully laid-out tree. Each one computes extra paths in
//! [`Stage::update`], grows the canvas box in [`Stage::extend_bounds`] and
//! emits draw calls in [`Stage::draw`]. The set of stages is closed
//! ([`PipelineStage`]); [`Pipeline`] keeps them sorted by [`Stage::order`]
//! and draws lowest first:
//!
//! | stage | order |
//! |-------|-------|
//! | background | 0 |
//! | highlight | 10 |
//! | list style | 15 |
//! | render | 20 |
//! | text decoration | 30 |

mod background;
mod decoration;
mod highlight;
mod list_style;
mod render;

pub use background::BackgroundStage;
pub use decoration::DecorationStage;
pub use highlight::{infer_line, HighlightStage};
pub use list_style::ListStyleStage;
pub use render::RenderStage;

use std::sync::Arc;

use inkset_paint::{BoundingBox, DrawSurface, FillStyle, Path, StrokeStyle};

use crate::assets::AssetCache;
use crate::layout::LayoutBoxes;
use crate::options::Effect;
use crate::svg::{SvgAsset, SvgPath};
use crate::tree::TextTree;

/// Everything a stage may read.
pub struct StageContext<'a> {
    pub tree: &'a TextTree,
    /// Boxes from layout, before any stage extended them.
    pub boxes: LayoutBoxes,
    pub assets: &'a AssetCache,
    pub effects: &'a [Effect],
}

/// A path a stage draws, with its paint.
#[derive(Debug, Clone, PartialEq)]
pub struct StagePath {
    pub path: Path,
    pub fill: Option<FillStyle>,
    pub stroke: Option<StrokeStyle>,
    /// Clip applied while drawing this path.
    pub clip: Option<BoundingBox>,
}

impl StagePath {
    pub fn filled(path: Path, fill: FillStyle) -> Self {
        Self {
            path,
            fill: Some(fill),
            stroke: None,
            clip: None,
        }
    }

    pub fn from_svg(svg: SvgPath, thickness: Option<f32>) -> Self {
        Self {
            path: svg.path,
            fill: svg.fill.map(FillStyle::from),
            stroke: svg.stroke.map(|(color, width)| {
                StrokeStyle::new(color, thickness.unwrap_or(width))
            }),
            clip: None,
        }
    }

    pub fn with_clip(mut self, clip: BoundingBox) -> Self {
        self.clip = Some(clip);
        self
    }

    /// Painted area: path bounds plus half the stroke, cut to the clip.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut bounds = self.path.bounds()?;
        if let Some(stroke) = &self.stroke {
            bounds = bounds.inflate(stroke.width / 2.0);
        }
        if let Some(clip) = self.clip {
            let left = bounds.left().max(clip.left());
            let top = bounds.top().max(clip.top());
            let right = bounds.right().min(clip.right());
            let bottom = bounds.bottom().min(clip.bottom());
            if right < left || bottom < top {
                return None;
            }
            bounds = BoundingBox::from_edges(left, top, right, bottom);
        }
        Some(bounds)
    }

    pub fn draw(&self, surface: &mut dyn DrawSurface) {
        if let Some(clip) = self.clip {
            surface.save();
            surface.clip_rect(clip);
        }
        if let Some(fill) = &self.fill {
            surface.fill_path(&self.path, fill);
        }
        if let Some(stroke) = &self.stroke {
            surface.stroke_path(&self.path, stroke);
        }
        if self.clip.is_some() {
            surface.restore();
        }
    }
}

/// Resolves a CSS paint over `bounds`; unrecognized values are logged.
pub(crate) fn paint(value: &str, bounds: &BoundingBox) -> Option<FillStyle> {
    let fill = FillStyle::from_css(value, bounds);
    if fill.is_none() {
        tracing::warn!("unrecognized paint value '{}'", value);
    }
    fill.filter(FillStyle::is_visible)
}

/// The asset behind `source`, loading it on a miss. Failures are logged and
/// yield `None`; the stage then draws nothing for it.
pub(crate) fn load_asset(ctx: &StageContext<'_>, source: &str) -> Option<Arc<SvgAsset>> {
    match ctx.assets.load(source) {
        Ok(asset) => Some(asset),
        Err(e) => {
            tracing::warn!("{}", e);
            None
        }
    }
}

/// One pipeline capability set.
pub trait Stage {
    fn name(&self) -> &'static str;

    /// Draw position; lower orders are drawn first.
    fn order(&self) -> i32;

    /// Recomputes this stage's paths from the tree.
    fn update(&mut self, ctx: &StageContext<'_>);

    fn paths(&self) -> &[StagePath];

    /// Grows `bounds` to cover everything this stage draws.
    fn extend_bounds(&self, _ctx: &StageContext<'_>, bounds: BoundingBox) -> BoundingBox {
        self.paths()
            .iter()
            .filter_map(StagePath::bounds)
            .fold(bounds, |acc, b| acc.union(&b))
    }

    fn draw(&self, _ctx: &StageContext<'_>, surface: &mut dyn DrawSurface) {
        for path in self.paths() {
            path.draw(surface);
        }
    }
}

/// The closed set of stages.
#[derive(Debug, Clone)]
pub enum PipelineStage {
    Background(BackgroundStage),
    Highlight(HighlightStage),
    ListStyle(ListStyleStage),
    Render(RenderStage),
    TextDecoration(DecorationStage),
}

impl PipelineStage {
    fn inner(&self) -> &dyn Stage {
        match self {
            PipelineStage::Background(stage) => stage,
            PipelineStage::Highlight(stage) => stage,
            PipelineStage::ListStyle(stage) => stage,
            PipelineStage::Render(stage) => stage,
            PipelineStage::TextDecoration(stage) => stage,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Stage {
        match self {
            PipelineStage::Background(stage) => stage,
            PipelineStage::Highlight(stage) => stage,
            PipelineStage::ListStyle(stage) => stage,
            PipelineStage::Render(stage) => stage,
            PipelineStage::TextDecoration(stage) => stage,
        }
    }
}

impl Stage for PipelineStage {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn order(&self) -> i32 {
        self.inner().order()
    }

    fn update(&mut self, ctx: &StageContext<'_>) {
        self.inner_mut().update(ctx)
    }

    fn paths(&self) -> &[StagePath] {
        self.inner().paths()
    }

    fn extend_bounds(&self, ctx: &StageContext<'_>, bounds: BoundingBox) -> BoundingBox {
        self.inner().extend_bounds(ctx, bounds)
    }

    fn draw(&self, ctx: &StageContext<'_>, surface: &mut dyn DrawSurface) {
        self.inner().draw(ctx, surface)
    }
}

/// Ordered stage list.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<PipelineStage>,
}

impl Pipeline {
    pub fn new(mut stages: Vec<PipelineStage>) -> Self {
        stages.sort_by_key(|stage| stage.order());
        Self { stages }
    }

    /// Every stage.
    pub fn standard() -> Self {
        Self::new(vec![
            PipelineStage::Background(BackgroundStage::default()),
            PipelineStage::Highlight(HighlightStage::default()),
            PipelineStage::ListStyle(ListStyleStage::default()),
            PipelineStage::Render(RenderStage::default()),
            PipelineStage::TextDecoration(DecorationStage::default()),
        ])
    }

    pub fn stages(&self) -> &[PipelineStage] {
        &self.stages
    }

    pub fn update(&mut self, ctx: &StageContext<'_>) {
        for stage in &mut self.stages {
            stage.update(ctx);
            tracing::trace!("{} stage produced {} paths", stage.name(), stage.paths().len());
        }
    }

    /// The layout canvas box grown by every stage.
    pub fn bounding_box(&self, ctx: &StageContext<'_>) -> BoundingBox {
        self.stages
            .iter()
            .fold(ctx.boxes.bounding_box, |bounds, stage| stage.extend_bounds(ctx, bounds))
    }

    pub fn draw(&self, ctx: &StageContext<'_>, surface: &mut dyn DrawSurface) {
        for stage in &self.stages {
            stage.draw(ctx, surface);
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// Every image source the tree's styles reference, deduplicated, in first
/// use order.
pub fn referenced_assets(tree: &TextTree) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    let mut push = |source: &Option<String>| {
        if let Some(source) = source.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if !sources.iter().any(|s| s == source) {
                sources.push(source.to_string());
            }
        }
    };
    let styles = std::iter::once(&tree.style)
        .chain(tree.paragraphs().map(|(_, p)| &p.style))
        .chain(
            tree.paragraphs()
                .flat_map(|(pid, _)| tree.fragments_of(pid).map(|(_, f)| &f.style)),
        );
    for style in styles {
        push(&style.background_image);
        push(&style.highlight_image);
        push(&style.list_style_image);
    }
    sources
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::content::{parse_content, Content};
    use crate::font::{ApproximateFonts, FontProvider, Measurer};
    use crate::geometry::Constraint;
    use crate::glyph::build_glyphs;
    use crate::layout::layout;
    use crate::style::{resolve, PartialStyle, Style};
    use crate::tree::TextTree;
    use crate::wrap::wrap;

    /// Parsed, wrapped, laid out and with outlines, using approximate fonts.
    pub(crate) fn prepared(json: &str, root: PartialStyle, constraint: Constraint) -> TextTree {
        prepared_with(json, root, constraint, &ApproximateFonts)
    }

    pub(crate) fn prepared_with(
        json: &str,
        root: PartialStyle,
        constraint: Constraint,
        provider: &dyn FontProvider,
    ) -> TextTree {
        let content: Content = serde_json::from_str(json).unwrap();
        let measurer = Measurer::new(provider);
        let style = resolve(&Style::default(), &root);
        let mut tree = wrap(&parse_content(&content, &style), constraint, &measurer);
        layout(&mut tree, constraint, &measurer);
        build_glyphs(&mut tree, &measurer);
        tree
    }
}
