//! Style records and the cascade
//!
//! [`PartialStyle`] is what authors write: every key optional. [`Style`] is
//! the fully resolved record every paragraph, fragment and character carries.
//! [`resolve`] layers a node's own overrides onto its parent's resolved
//! style; unset keys and blank strings fall through to the parent.

use std::collections::BTreeMap;

use inkset_paint::{Color, Shadow};
use serde::{Deserialize, Serialize};

use crate::font::FontSpec;

/// Horizontal alignment of fragments within their line box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextAlign {
    #[default]
    Start,
    End,
    Left,
    Right,
    Center,
}

/// Vertical alignment of a fragment relative to its paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerticalAlign {
    #[default]
    Baseline,
    Top,
    Middle,
    Bottom,
    Sub,
    Super,
    TextTop,
    TextBottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    LineThrough,
    Overline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextTransform {
    #[default]
    None,
    Uppercase,
    Lowercase,
    Capitalize,
}

impl TextTransform {
    pub fn apply(&self, content: &str) -> String {
        match self {
            TextTransform::None => content.to_string(),
            TextTransform::Uppercase => content.to_uppercase(),
            TextTransform::Lowercase => content.to_lowercase(),
            TextTransform::Capitalize => {
                let mut out = String::with_capacity(content.len());
                let mut word_start = true;
                for c in content.chars() {
                    if word_start && c.is_alphabetic() {
                        out.extend(c.to_uppercase());
                    } else {
                        out.push(c);
                    }
                    word_start = c.is_whitespace();
                }
                out
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextWrap {
    #[default]
    Wrap,
    Nowrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritingMode {
    #[default]
    HorizontalTb,
    VerticalLr,
    VerticalRl,
}

impl WritingMode {
    pub fn is_vertical(&self) -> bool {
        !matches!(self, WritingMode::HorizontalTb)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

/// Numeric font weight (100-900). Accepts numbers and the CSS keywords
/// `normal` and `bold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFontWeight")]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const BOLD: FontWeight = FontWeight(700);
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFontWeight {
    Number(f64),
    Keyword(String),
}

impl TryFrom<RawFontWeight> for FontWeight {
    type Error = String;

    fn try_from(raw: RawFontWeight) -> Result<Self, Self::Error> {
        match raw {
            RawFontWeight::Number(n) if (1.0..=1000.0).contains(&n) => Ok(FontWeight(n as u16)),
            RawFontWeight::Number(n) => Err(format!("font weight {} out of range", n)),
            RawFontWeight::Keyword(k) => match k.trim() {
                "normal" => Ok(FontWeight::NORMAL),
                "bold" | "bolder" => Ok(FontWeight::BOLD),
                "lighter" => Ok(FontWeight(300)),
                other => other
                    .parse::<u16>()
                    .map(FontWeight)
                    .map_err(|_| format!("unknown font weight '{}'", other)),
            },
        }
    }
}

/// Which line of the text a highlight marker attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HighlightLine {
    Outline,
    Underline,
    Overline,
    LineThrough,
}

/// How a background image is fitted into its target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageFit {
    /// Keep the aspect ratio, cover the box and clip the excess.
    #[default]
    Rigid,
    /// Scale both axes independently.
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListStyleType {
    #[default]
    None,
    Disc,
}

/// Color remap table: source color string to replacement color string.
pub type Colormap = BTreeMap<String, String>;

/// A resolved highlight descriptor. Two characters belong to the same
/// highlight run only if their descriptors compare equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub image: String,
    pub colormap: Colormap,
    pub line: Option<HighlightLine>,
    pub size: Option<f32>,
    pub thickness: Option<f32>,
}

/// Fully resolved style.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    /// Paint value: CSS color or `linear-gradient(...)`.
    pub color: String,
    pub background_color: Option<String>,
    pub text_stroke_color: Option<String>,
    pub text_stroke_width: f32,
    /// Multiplier of the font size.
    pub line_height: f32,
    pub letter_spacing: f32,
    pub text_align: TextAlign,
    pub vertical_align: VerticalAlign,
    pub text_decoration: TextDecoration,
    pub text_transform: TextTransform,
    pub text_wrap: TextWrap,
    pub writing_mode: WritingMode,
    pub direction: Direction,
    pub shadow_color: Option<String>,
    pub shadow_offset_x: f32,
    pub shadow_offset_y: f32,
    pub shadow_blur: f32,
    pub highlight_image: Option<String>,
    pub highlight_colormap: Colormap,
    pub highlight_line: Option<HighlightLine>,
    pub highlight_size: Option<f32>,
    pub highlight_thickness: Option<f32>,
    pub background_image: Option<String>,
    pub background_fit: ImageFit,
    pub background_colormap: Colormap,
    pub list_style_type: ListStyleType,
    pub list_style_image: Option<String>,
    pub list_style_size: Option<f32>,
    pub list_style_colormap: Colormap,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            font_family: String::new(),
            font_size: 14.0,
            font_weight: FontWeight::NORMAL,
            font_style: FontStyle::Normal,
            color: "#000000".to_string(),
            background_color: None,
            text_stroke_color: None,
            text_stroke_width: 0.0,
            line_height: 1.2,
            letter_spacing: 0.0,
            text_align: TextAlign::Start,
            vertical_align: VerticalAlign::Baseline,
            text_decoration: TextDecoration::None,
            text_transform: TextTransform::None,
            text_wrap: TextWrap::Wrap,
            writing_mode: WritingMode::HorizontalTb,
            direction: Direction::Ltr,
            shadow_color: None,
            shadow_offset_x: 0.0,
            shadow_offset_y: 0.0,
            shadow_blur: 0.0,
            highlight_image: None,
            highlight_colormap: Colormap::new(),
            highlight_line: None,
            highlight_size: None,
            highlight_thickness: None,
            background_image: None,
            background_fit: ImageFit::Rigid,
            background_colormap: Colormap::new(),
            list_style_type: ListStyleType::None,
            list_style_image: None,
            list_style_size: None,
            list_style_colormap: Colormap::new(),
        }
    }
}

impl Style {
    pub fn is_vertical(&self) -> bool {
        self.writing_mode.is_vertical()
    }

    pub fn is_italic(&self) -> bool {
        matches!(self.font_style, FontStyle::Italic | FontStyle::Oblique)
    }

    pub fn font(&self) -> FontSpec {
        FontSpec {
            family: self.font_family.clone(),
            size: self.font_size,
            weight: self.font_weight.0,
            italic: self.is_italic(),
        }
    }

    /// The reserved line slot: font size times line height.
    pub fn line_extent(&self) -> f32 {
        self.font_size * self.line_height
    }

    /// Alignment as a fraction of the free space: 0 start, 0.5 center, 1 end.
    pub fn align_factor(&self) -> f32 {
        let rtl = self.direction == Direction::Rtl;
        match self.text_align {
            TextAlign::Left => 0.0,
            TextAlign::Right => 1.0,
            TextAlign::Center => 0.5,
            TextAlign::Start if rtl => 1.0,
            TextAlign::Start => 0.0,
            TextAlign::End if rtl => 0.0,
            TextAlign::End => 1.0,
        }
    }

    pub fn shadow(&self) -> Option<Shadow> {
        let color = Color::parse(self.shadow_color.as_deref()?)?;
        let shadow = Shadow {
            offset_x: self.shadow_offset_x,
            offset_y: self.shadow_offset_y,
            blur_radius: self.shadow_blur.max(0.0),
            color,
        };
        shadow.is_visible().then_some(shadow)
    }

    pub fn highlight(&self) -> Option<Highlight> {
        let image = self.highlight_image.clone()?;
        Some(Highlight {
            image,
            colormap: self.highlight_colormap.clone(),
            line: self.highlight_line,
            size: self.highlight_size,
            thickness: self.highlight_thickness,
        })
    }

    /// CSS font shorthand for surfaces that draw raw text.
    pub fn css_font(&self) -> String {
        let style = match self.font_style {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
            FontStyle::Oblique => "oblique",
        };
        let family = if self.font_family.is_empty() {
            "sans-serif"
        } else {
            &self.font_family
        };
        format!("{} {} {}px {}", style, self.font_weight.0, self.font_size, family)
    }
}

/// Author-supplied overrides. Keys use the CSS camelCase spelling
/// (`fontSize`, `textAlign`, `writingMode`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_stroke_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_stroke_width: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<VerticalAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_decoration: Option<TextDecoration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_transform: Option<TextTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_wrap: Option<TextWrap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writing_mode: Option<WritingMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_offset_x: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_offset_y: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow_blur: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_colormap: Option<Colormap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_line: Option<HighlightLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_thickness: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_fit: Option<ImageFit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_colormap: Option<Colormap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_style_type: Option<ListStyleType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_style_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_style_size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_style_colormap: Option<Colormap>,
}

impl PartialStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    pub fn background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    pub fn text_align(mut self, align: TextAlign) -> Self {
        self.text_align = Some(align);
        self
    }

    pub fn vertical_align(mut self, align: VerticalAlign) -> Self {
        self.vertical_align = Some(align);
        self
    }

    pub fn writing_mode(mut self, mode: WritingMode) -> Self {
        self.writing_mode = Some(mode);
        self
    }

    pub fn letter_spacing(mut self, spacing: f32) -> Self {
        self.letter_spacing = Some(spacing);
        self
    }

    pub fn line_height(mut self, line_height: f32) -> Self {
        self.line_height = Some(line_height);
        self
    }

    pub fn text_decoration(mut self, decoration: TextDecoration) -> Self {
        self.text_decoration = Some(decoration);
        self
    }

    pub fn font_style(mut self, style: FontStyle) -> Self {
        self.font_style = Some(style);
        self
    }

    pub fn text_wrap(mut self, wrap: TextWrap) -> Self {
        self.text_wrap = Some(wrap);
        self
    }

    pub fn text_transform(mut self, transform: TextTransform) -> Self {
        self.text_transform = Some(transform);
        self
    }

    pub fn text_stroke(mut self, color: impl Into<String>, width: f32) -> Self {
        self.text_stroke_color = Some(color.into());
        self.text_stroke_width = Some(width);
        self
    }

    pub fn shadow(
        mut self,
        color: impl Into<String>,
        offset_x: f32,
        offset_y: f32,
        blur: f32,
    ) -> Self {
        self.shadow_color = Some(color.into());
        self.shadow_offset_x = Some(offset_x);
        self.shadow_offset_y = Some(offset_y);
        self.shadow_blur = Some(blur);
        self
    }
}

/// Values that never override a parent value even when present.
trait Blank {
    fn is_blank(&self) -> bool {
        false
    }
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Blank for f32 {
    fn is_blank(&self) -> bool {
        !self.is_finite()
    }
}

impl Blank for Colormap {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Blank for TextAlign {}
impl Blank for VerticalAlign {}
impl Blank for TextDecoration {}
impl Blank for TextTransform {}
impl Blank for TextWrap {}
impl Blank for WritingMode {}
impl Blank for Direction {}
impl Blank for FontStyle {}
impl Blank for FontWeight {}
impl Blank for HighlightLine {}
impl Blank for ImageFit {}
impl Blank for ListStyleType {}

fn pick<T: Clone + Blank>(own: &Option<T>, parent: &T) -> T {
    match own {
        Some(value) if !value.is_blank() => value.clone(),
        _ => parent.clone(),
    }
}

fn pick_opt<T: Clone + Blank>(own: &Option<T>, parent: &Option<T>) -> Option<T> {
    match own {
        Some(value) if !value.is_blank() => Some(value.clone()),
        _ => parent.clone(),
    }
}

/// Layers `own` onto `parent`.
///
/// Every key of the result is `own`'s value when it is set and not blank
/// (empty strings, NaN sizes and empty colormaps are blank), else the
/// parent's resolved value.
pub fn resolve(parent: &Style, own: &PartialStyle) -> Style {
    Style {
        font_family: pick(&own.font_family, &parent.font_family),
        font_size: pick(&own.font_size, &parent.font_size),
        font_weight: pick(&own.font_weight, &parent.font_weight),
        font_style: pick(&own.font_style, &parent.font_style),
        color: pick(&own.color, &parent.color),
        background_color: pick_opt(&own.background_color, &parent.background_color),
        text_stroke_color: pick_opt(&own.text_stroke_color, &parent.text_stroke_color),
        text_stroke_width: pick(&own.text_stroke_width, &parent.text_stroke_width),
        line_height: pick(&own.line_height, &parent.line_height),
        letter_spacing: pick(&own.letter_spacing, &parent.letter_spacing),
        text_align: pick(&own.text_align, &parent.text_align),
        vertical_align: pick(&own.vertical_align, &parent.vertical_align),
        text_decoration: pick(&own.text_decoration, &parent.text_decoration),
        text_transform: pick(&own.text_transform, &parent.text_transform),
        text_wrap: pick(&own.text_wrap, &parent.text_wrap),
        writing_mode: pick(&own.writing_mode, &parent.writing_mode),
        direction: pick(&own.direction, &parent.direction),
        shadow_color: pick_opt(&own.shadow_color, &parent.shadow_color),
        shadow_offset_x: pick(&own.shadow_offset_x, &parent.shadow_offset_x),
        shadow_offset_y: pick(&own.shadow_offset_y, &parent.shadow_offset_y),
        shadow_blur: pick(&own.shadow_blur, &parent.shadow_blur),
        highlight_image: pick_opt(&own.highlight_image, &parent.highlight_image),
        highlight_colormap: pick(&own.highlight_colormap, &parent.highlight_colormap),
        highlight_line: pick_opt(&own.highlight_line, &parent.highlight_line),
        highlight_size: pick_opt(&own.highlight_size, &parent.highlight_size),
        highlight_thickness: pick_opt(&own.highlight_thickness, &parent.highlight_thickness),
        background_image: pick_opt(&own.background_image, &parent.background_image),
        background_fit: pick(&own.background_fit, &parent.background_fit),
        background_colormap: pick(&own.background_colormap, &parent.background_colormap),
        list_style_type: pick(&own.list_style_type, &parent.list_style_type),
        list_style_image: pick_opt(&own.list_style_image, &parent.list_style_image),
        list_style_size: pick_opt(&own.list_style_size, &parent.list_style_size),
        list_style_colormap: pick(&own.list_style_colormap, &parent.list_style_colormap),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_prefers_most_specific_non_blank_color() {
        let root = resolve(&Style::default(), &PartialStyle::new().color("#111111"));
        let paragraph = resolve(&root, &PartialStyle::new().color("#222222"));
        let fragment = resolve(&paragraph, &PartialStyle::new().color("#333333"));
        assert_eq!(fragment.color, "#333333");

        let blank_fragment = resolve(&paragraph, &PartialStyle::new().color(""));
        assert_eq!(blank_fragment.color, "#222222");

        let blank_paragraph = resolve(&root, &PartialStyle::new().color("  "));
        let fragment = resolve(&blank_paragraph, &PartialStyle::new());
        assert_eq!(fragment.color, "#111111");
    }

    #[test]
    fn unset_keys_pass_through() {
        let parent = resolve(
            &Style::default(),
            &PartialStyle::new()
                .font_size(32.0)
                .writing_mode(WritingMode::VerticalRl),
        );
        let child = resolve(&parent, &PartialStyle::new().color("red"));
        assert_eq!(child.font_size, 32.0);
        assert_eq!(child.writing_mode, WritingMode::VerticalRl);
        assert_eq!(child.color, "red");
    }

    #[test]
    fn deserializes_css_spellings() {
        let style: PartialStyle = serde_json::from_str(
            r##"{
                "fontSize": 20,
                "fontWeight": "bold",
                "verticalAlign": "text-top",
                "writingMode": "vertical-rl",
                "textDecoration": "line-through",
                "highlightColormap": { "#000": "#f00" }
            }"##,
        )
        .unwrap();
        assert_eq!(style.font_size, Some(20.0));
        assert_eq!(style.font_weight, Some(FontWeight::BOLD));
        assert_eq!(style.vertical_align, Some(VerticalAlign::TextTop));
        assert_eq!(style.writing_mode, Some(WritingMode::VerticalRl));
        assert_eq!(style.text_decoration, Some(TextDecoration::LineThrough));
        assert_eq!(
            style.highlight_colormap.unwrap().get("#000").map(String::as_str),
            Some("#f00")
        );
    }

    #[test]
    fn capitalize_uppercases_word_starts() {
        assert_eq!(TextTransform::Capitalize.apply("hello big world"), "Hello Big World");
        assert_eq!(TextTransform::Uppercase.apply("straße"), "STRASSE");
    }

    #[test]
    fn rtl_flips_logical_alignment() {
        let mut style = Style::default();
        assert_eq!(style.align_factor(), 0.0);
        style.direction = Direction::Rtl;
        assert_eq!(style.align_factor(), 1.0);
        style.text_align = TextAlign::Center;
        assert_eq!(style.align_factor(), 0.5);
    }
}
