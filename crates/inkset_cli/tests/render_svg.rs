//! End-to-end rendering from options JSON to an SVG document

use std::sync::Arc;

use inkset_cli::SvgWriter;
use inkset_text::{render_text, ApproximateFonts, TextOptions};

fn render(json: &str) -> String {
    let options = TextOptions::from_json(json).expect("options should parse");
    let rendering =
        render_text(options, Arc::new(ApproximateFonts)).expect("rendering should succeed");
    let view = rendering.measurement.view_box;
    SvgWriter::new(view.width, view.height).write(rendering.surface.commands())
}

#[test]
fn document_is_sized_to_the_view_box() {
    let svg = render(r#"{"content": "Hello", "style": {"fontSize": 10}, "width": 120}"#);
    assert!(
        svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="120""#),
        "unexpected header: {}",
        svg.lines().next().unwrap_or_default()
    );
    assert!(svg.trim_end().ends_with("</svg>"));
}

#[test]
fn colored_fragments_are_filled_with_their_color() {
    let svg = render(
        r##"{"content": [["plain ", {"content": "red", "color": "#ff0000"}]], "style": {"fontSize": 10}}"##,
    );
    assert!(svg.contains(r#"fill="rgb(255,0,0)""#), "red fragment missing:\n{}", svg);
    assert!(svg.contains(r#"fill="rgb(0,0,0)""#), "default fill missing:\n{}", svg);
}

#[test]
fn gradient_colors_are_defined_once_per_use() {
    let svg = render(
        r#"{"content": "Grad", "style": {"fontSize": 10, "color": "linear-gradient(90deg, red, blue)"}}"#,
    );
    assert!(svg.contains("<linearGradient"), "gradient definition missing:\n{}", svg);
    assert!(svg.contains(r#"fill="url(#g"#));
}

#[test]
fn shadows_become_filters() {
    let svg = render(
        r##"{"content": "Hi", "style": {"fontSize": 10, "shadowColor": "#000", "shadowOffsetX": 2, "shadowBlur": 4}}"##,
    );
    assert!(svg.contains(r#"stdDeviation="2""#), "filter missing:\n{}", svg);
}
