//! Content descriptions and the parser that turns them into a [`TextTree`]
//!
//! Accepted shapes:
//! - `"text"`: one paragraph with one fragment
//! - `["a", "b"]`: one paragraph per string
//! - `[["a", {"content": "b", "color": "red"}]]`: one paragraph per inner
//!   array, one fragment per inner item
//! - `{"fragments": [...], ...style}`: one paragraph, its other keys are the
//!   paragraph style
//! - `{"content": "text", ...style}`: one paragraph with one fragment
//!
//! Anything else is skipped with a warning.

use serde::{Deserialize, Serialize};

use crate::style::{resolve, PartialStyle, Style};
use crate::tree::{ParagraphId, TextTree};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Paragraphs(Vec<ContentItem>),
    Paragraph(ParagraphSpec),
    Other(serde_json::Value),
}

impl Default for Content {
    fn default() -> Self {
        Content::Text(String::new())
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<Vec<ContentItem>> for Content {
    fn from(items: Vec<ContentItem>) -> Self {
        Content::Paragraphs(items)
    }
}

/// One element of a top-level content array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentItem {
    Text(String),
    Fragments(Vec<FragmentItem>),
    Paragraph(ParagraphSpec),
    Other(serde_json::Value),
}

impl From<&str> for ContentItem {
    fn from(text: &str) -> Self {
        ContentItem::Text(text.to_string())
    }
}

impl From<ParagraphSpec> for ContentItem {
    fn from(spec: ParagraphSpec) -> Self {
        ContentItem::Paragraph(spec)
    }
}

impl From<Vec<FragmentItem>> for ContentItem {
    fn from(items: Vec<FragmentItem>) -> Self {
        ContentItem::Fragments(items)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FragmentItem {
    Text(String),
    Fragment(FragmentSpec),
    Other(serde_json::Value),
}

impl From<&str> for FragmentItem {
    fn from(text: &str) -> Self {
        FragmentItem::Text(text.to_string())
    }
}

impl From<FragmentSpec> for FragmentItem {
    fn from(spec: FragmentSpec) -> Self {
        FragmentItem::Fragment(spec)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragments: Option<Vec<FragmentItem>>,
    #[serde(flatten)]
    pub style: PartialStyle,
}

impl ParagraphSpec {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn fragments(fragments: Vec<FragmentItem>) -> Self {
        Self {
            fragments: Some(fragments),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: PartialStyle) -> Self {
        self.style = style;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub style: PartialStyle,
}

impl FragmentSpec {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            style: PartialStyle::default(),
        }
    }

    pub fn with_style(mut self, style: PartialStyle) -> Self {
        self.style = style;
        self
    }
}

/// Builds the unwrapped tree. Paragraph styles resolve against `base`,
/// fragment styles against their paragraph.
pub fn parse_content(content: &Content, base: &Style) -> TextTree {
    let mut tree = TextTree::new(base.clone());
    match content {
        Content::Text(text) => push_text_paragraph(&mut tree, text, &PartialStyle::default()),
        Content::Paragraphs(items) => {
            for (index, item) in items.iter().enumerate() {
                match item {
                    ContentItem::Text(text) => {
                        push_text_paragraph(&mut tree, text, &PartialStyle::default())
                    }
                    ContentItem::Fragments(fragments) => {
                        push_fragment_paragraph(&mut tree, fragments, &PartialStyle::default())
                    }
                    ContentItem::Paragraph(spec) => push_spec(&mut tree, spec, index),
                    ContentItem::Other(value) => {
                        tracing::warn!(
                            "skipping content item {}: unsupported shape {}",
                            index,
                            value
                        )
                    }
                }
            }
        }
        Content::Paragraph(spec) => push_spec(&mut tree, spec, 0),
        Content::Other(value) => tracing::warn!("ignoring content of unsupported shape {}", value),
    }
    tree
}

fn push_spec(tree: &mut TextTree, spec: &ParagraphSpec, index: usize) {
    match (&spec.fragments, &spec.content) {
        (Some(fragments), _) => push_fragment_paragraph(tree, fragments, &spec.style),
        (None, Some(text)) => push_text_paragraph(tree, text, &spec.style),
        (None, None) => {
            tracing::warn!("skipping content item {}: neither content nor fragments", index)
        }
    }
}

fn open_paragraph(tree: &mut TextTree, own: &PartialStyle) -> (ParagraphId, Style) {
    let style = resolve(&tree.style, own);
    let id = tree.push_paragraph(style.clone(), own.clone(), false);
    (id, style)
}

fn push_text_paragraph(tree: &mut TextTree, text: &str, own: &PartialStyle) {
    let (id, style) = open_paragraph(tree, own);
    let content = style.text_transform.apply(text);
    tree.push_fragment(id, content, style, PartialStyle::default());
}

fn push_fragment_paragraph(tree: &mut TextTree, fragments: &[FragmentItem], own: &PartialStyle) {
    let (id, paragraph_style) = open_paragraph(tree, own);
    for (index, item) in fragments.iter().enumerate() {
        let (text, fragment_own) = match item {
            FragmentItem::Text(text) => (text.as_str(), PartialStyle::default()),
            FragmentItem::Fragment(FragmentSpec {
                content: Some(text),
                style,
            }) => (text.as_str(), style.clone()),
            FragmentItem::Fragment(_) => {
                tracing::warn!("skipping fragment {}: no content", index);
                continue;
            }
            FragmentItem::Other(value) => {
                tracing::warn!("skipping fragment {}: unsupported shape {}", index, value);
                continue;
            }
        };
        let style = resolve(&paragraph_style, &fragment_own);
        let content = style.text_transform.apply(text);
        tree.push_fragment(id, content, style, fragment_own);
    }
}
