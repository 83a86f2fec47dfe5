//! Options documents
//!
//! The JSON surface callers configure a [`Text`](crate::Text) with:
//!
//! ```json
//! {
//!   "content": ["Hello", [{"content": "world", "color": "red"}]],
//!   "style": {"fontSize": 24, "writingMode": "horizontal-tb"},
//!   "width": 300,
//!   "height": "auto",
//!   "effects": [{"color": "#0003", "offsetX": 2, "offsetY": 2}, {"color": "#000"}]
//! }
//! ```

use serde::{Deserialize, Serialize, Serializer};

use crate::content::Content;
use crate::geometry::Constraint;
use crate::style::PartialStyle;

/// An explicit size, or `"auto"` to size to content.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(try_from = "RawDimension")]
pub enum Dimension {
    #[default]
    Auto,
    Px(f32),
}

impl Dimension {
    /// The size in pixels; `None` for auto and non-positive sizes.
    pub fn px(self) -> Option<f32> {
        match self {
            Dimension::Px(px) if px > 0.0 => Some(px),
            _ => None,
        }
    }
}

impl From<f32> for Dimension {
    fn from(px: f32) -> Self {
        Dimension::Px(px)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDimension {
    Number(f32),
    Keyword(String),
}

impl TryFrom<RawDimension> for Dimension {
    type Error = String;

    fn try_from(raw: RawDimension) -> Result<Self, Self::Error> {
        match raw {
            RawDimension::Number(px) => Ok(Dimension::Px(px)),
            RawDimension::Keyword(k) => match k.trim() {
                "auto" | "" => Ok(Dimension::Auto),
                other => other
                    .trim_end_matches("px")
                    .parse()
                    .map(Dimension::Px)
                    .map_err(|_| format!("invalid size '{}'", other)),
            },
        }
    }
}

impl Serialize for Dimension {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Dimension::Auto => serializer.serialize_str("auto"),
            Dimension::Px(px) => serializer.serialize_f32(*px),
        }
    }
}

/// One render pass over every character.
///
/// The style overlays the character's own style (typically `color`,
/// `textStrokeColor`/`textStrokeWidth` or a shadow). Skews are raw shear
/// factors; all geometric parts compose around the center of the render
/// box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Effect {
    #[serde(flatten)]
    pub style: PartialStyle,
    pub offset_x: f32,
    pub offset_y: f32,
    pub skew_x: f32,
    pub skew_y: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Effect {
    pub fn new(style: PartialStyle) -> Self {
        Self {
            style,
            ..Default::default()
        }
    }

    pub fn offset(mut self, x: f32, y: f32) -> Self {
        self.offset_x = x;
        self.offset_y = y;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextOptions {
    pub content: Content,
    pub style: PartialStyle,
    pub width: Dimension,
    pub height: Dimension,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<Effect>,
}

impl TextOptions {
    pub fn new(content: impl Into<Content>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: PartialStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_width(mut self, width: impl Into<Dimension>) -> Self {
        self.width = width.into();
        self
    }

    pub fn with_height(mut self, height: impl Into<Dimension>) -> Self {
        self.height = height.into();
        self
    }

    pub fn with_effects(mut self, effects: Vec<Effect>) -> Self {
        self.effects = effects;
        self
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn constraint(&self) -> Constraint {
        Constraint::new(self.width.px(), self.height.px())
    }
}
