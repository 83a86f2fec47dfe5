//! Text instances and the one-shot entry points
//!
//! [`Text`] owns one options document and the result of laying it out.
//! [`Text::update`] runs the whole pipeline: parse, wrap, layout, glyph
//! outlines, image loading and every effect stage. [`Text::render`] only
//! replays the stages onto a surface, so it fails until an update has run.

use std::sync::Arc;

use inkset_paint::{BoundingBox, DrawSurface, PaintContext, Transform2D};
use serde::Serialize;

use crate::assets::AssetCache;
use crate::content::parse_content;
use crate::effects::{referenced_assets, Pipeline, StageContext};
use crate::font::{FontProvider, Measurer};
use crate::glyph::build_glyphs;
use crate::layout::{aggregate, layout, LayoutBoxes};
use crate::options::TextOptions;
use crate::style::{resolve, Style};
use crate::tree::{ParagraphSnapshot, TextTree};
use crate::wrap::wrap;
use crate::{Result, TextError};

/// Boxes of a laid-out text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    /// Canvas box from layout: the explicit size grown to the content.
    #[serde(rename = "box")]
    pub bounding_box: BoundingBox,
    pub content_box: BoundingBox,
    pub glyph_box: BoundingBox,
    /// Everything any stage paints into, including effect offsets, strokes,
    /// shadows and list markers.
    pub view_box: BoundingBox,
    pub paragraphs: Vec<ParagraphSnapshot>,
}

struct LaidOut {
    tree: TextTree,
    boxes: LayoutBoxes,
    view_box: BoundingBox,
}

/// A text layer: options in, boxes and draw calls out.
pub struct Text {
    options: TextOptions,
    fonts: Arc<dyn FontProvider>,
    assets: Arc<AssetCache>,
    pipeline: Pipeline,
    laid_out: Option<LaidOut>,
}

impl Text {
    /// A text using the process-wide asset cache and every stage.
    pub fn new(options: TextOptions, fonts: Arc<dyn FontProvider>) -> Self {
        Self {
            options,
            fonts,
            assets: AssetCache::global(),
            pipeline: Pipeline::standard(),
            laid_out: None,
        }
    }

    pub fn with_assets(mut self, assets: Arc<AssetCache>) -> Self {
        self.assets = assets;
        self.laid_out = None;
        self
    }

    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self.laid_out = None;
        self
    }

    pub fn options(&self) -> &TextOptions {
        &self.options
    }

    /// Replaces the options. The previous layout is dropped; call
    /// [`Text::update`] before rendering again.
    pub fn set_options(&mut self, options: TextOptions) {
        self.options = options;
        self.laid_out = None;
    }

    pub fn is_laid_out(&self) -> bool {
        self.laid_out.is_some()
    }

    /// The laid-out tree, once [`Text::update`] has run.
    pub fn tree(&self) -> Option<&TextTree> {
        self.laid_out.as_ref().map(|l| &l.tree)
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Lays the text out and prepares every stage.
    ///
    /// Images referenced by the styles are loaded before the stages run;
    /// the ones that fail are logged and drawn as nothing.
    pub fn update(&mut self) -> &mut Self {
        let constraint = self.options.constraint();
        let base = resolve(&Style::default(), &self.options.style);
        let measurer = Measurer::new(self.fonts.as_ref());

        let parsed = parse_content(&self.options.content, &base);
        let mut tree = wrap(&parsed, constraint, &measurer);
        layout(&mut tree, constraint, &measurer);
        build_glyphs(&mut tree, &measurer);

        let sources = referenced_assets(&tree);
        let failed = self.assets.load_all(sources.iter().map(String::as_str));
        if failed > 0 {
            tracing::debug!("{} of {} images failed to load", failed, sources.len());
        }

        let boxes = aggregate(&tree, constraint);
        let ctx = StageContext {
            tree: &tree,
            boxes,
            assets: &self.assets,
            effects: &self.options.effects,
        };
        self.pipeline.update(&ctx);
        let view_box = self.pipeline.bounding_box(&ctx);
        tracing::debug!(
            "laid out {} lines, view box {}x{}",
            tree.len(),
            view_box.width,
            view_box.height
        );
        self.laid_out = Some(LaidOut {
            tree,
            boxes,
            view_box,
        });
        self
    }

    /// Current boxes, laying out first when needed.
    pub fn measure(&mut self) -> Measurement {
        if self.laid_out.is_none() {
            self.update();
        }
        match &self.laid_out {
            Some(laid_out) => Measurement {
                bounding_box: laid_out.boxes.bounding_box,
                content_box: laid_out.boxes.content_box,
                glyph_box: laid_out.boxes.glyph_box,
                view_box: laid_out.view_box,
                paragraphs: laid_out.tree.snapshot(),
            },
            None => Measurement {
                bounding_box: BoundingBox::ZERO,
                content_box: BoundingBox::ZERO,
                glyph_box: BoundingBox::ZERO,
                view_box: BoundingBox::ZERO,
                paragraphs: Vec::new(),
            },
        }
    }

    /// Draws every stage in order, in layout coordinates.
    pub fn render(&self, surface: &mut dyn DrawSurface) -> Result<()> {
        let laid_out = self.laid_out.as_ref().ok_or(TextError::NotLaidOut)?;
        let ctx = StageContext {
            tree: &laid_out.tree,
            boxes: laid_out.boxes,
            assets: &self.assets,
            effects: &self.options.effects,
        };
        self.pipeline.draw(&ctx, surface);
        Ok(())
    }
}

impl std::fmt::Debug for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Text")
            .field("options", &self.options)
            .field("laid_out", &self.is_laid_out())
            .finish()
    }
}

/// Lays out `options` and returns its boxes.
pub fn measure_text(options: TextOptions, fonts: Arc<dyn FontProvider>) -> Measurement {
    Text::new(options, fonts).measure()
}

/// A recorded rendering, with the view box origin moved to (0, 0).
#[derive(Debug)]
pub struct Rendering {
    pub measurement: Measurement,
    pub surface: PaintContext,
}

/// Lays out `options` and records its draw calls.
pub fn render_text(options: TextOptions, fonts: Arc<dyn FontProvider>) -> Result<Rendering> {
    let mut text = Text::new(options, fonts);
    let measurement = text.measure();
    let mut surface = PaintContext::new();
    let view = measurement.view_box;
    surface.save();
    surface.transform(Transform2D::translate(-view.x, -view.y));
    text.render(&mut surface)?;
    surface.restore();
    Ok(Rendering {
        measurement,
        surface,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::ApproximateFonts;
    use crate::options::Effect;
    use crate::style::PartialStyle;
    use inkset_paint::PaintCommand;

    fn fonts() -> Arc<dyn FontProvider> {
        Arc::new(ApproximateFonts)
    }

    fn options(json: &str) -> TextOptions {
        TextOptions::from_json(json).unwrap()
    }

    #[test]
    fn render_requires_an_update() {
        let mut text = Text::new(TextOptions::new("hello"), fonts());
        let mut surface = PaintContext::new();
        assert!(matches!(text.render(&mut surface), Err(TextError::NotLaidOut)));
        text.update();
        assert!(text.render(&mut surface).is_ok());
        assert!(!surface.commands().is_empty());

        text.set_options(TextOptions::new("again"));
        assert!(matches!(text.render(&mut surface), Err(TextError::NotLaidOut)));
    }

    #[test]
    fn measure_reports_the_explicit_width() {
        let m = measure_text(
            options(r#"{"content": ["Hi", "Bye"], "style": {"fontSize": 10}, "width": 100}"#),
            fonts(),
        );
        assert_eq!(m.bounding_box.width, 100.0);
        assert_eq!(m.paragraphs.len(), 2);
        assert_eq!(m.content_box.height, 24.0);
        assert_eq!(m.view_box, m.bounding_box);
    }

    #[test]
    fn effect_offsets_widen_the_view_box() {
        let m = measure_text(
            TextOptions::new("Hi")
                .with_style(PartialStyle::new().font_size(10.0))
                .with_effects(vec![
                    Effect::new(PartialStyle::new().color("#0004")).offset(20.0, 0.0),
                    Effect::new(PartialStyle::new()),
                ]),
            fonts(),
        );
        assert!(m.view_box.right() >= m.glyph_box.right() + 20.0 - 1e-3);
        assert_eq!(m.view_box.left(), m.bounding_box.left());
    }

    #[test]
    fn rendering_is_balanced_and_moved_to_the_view_box() {
        let rendering = render_text(
            options(r#"{"content": [{"content": "item", "listStyleType": "disc"}], "style": {"fontSize": 10}}"#),
            fonts(),
        )
        .unwrap();
        assert!(rendering.measurement.view_box.left() < 0.0);
        let commands = rendering.surface.commands();
        let saves = commands.iter().filter(|c| **c == PaintCommand::Save).count();
        let restores = commands.iter().filter(|c| **c == PaintCommand::Restore).count();
        assert_eq!(saves, restores);
        assert_eq!(rendering.surface.depth(), 0);
        assert!(format!("{:?}", rendering).contains("PaintContext"));
        let shift = -rendering.measurement.view_box.left();
        assert!(commands.contains(&PaintCommand::Transform {
            transform: Transform2D::translate(shift, 0.0)
        }));
    }

    #[test]
    fn measurement_serializes_with_css_keys() {
        let m = measure_text(TextOptions::new("a"), fonts());
        let json = serde_json::to_value(&m).unwrap();
        assert!(json.get("box").is_some());
        assert!(json.get("viewBox").is_some());
        assert!(json["paragraphs"][0].get("lineBox").is_some());
    }
}
