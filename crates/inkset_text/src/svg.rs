//! SVG marker and background images
//!
//! `usvg` does the parsing; every path node is flattened into an
//! [`inkset_paint::Path`] in document space together with its solid fill
//! and stroke. Gradient and pattern paints are dropped.

use inkset_paint::{BoundingBox, Color, Path, PathBuilder, Transform2D};

use crate::style::{Colormap, ImageFit};
use crate::{Result, TextError};

/// One flattened path node.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgPath {
    pub path: Path,
    pub fill: Option<Color>,
    /// Stroke color and width, already in document units.
    pub stroke: Option<(Color, f32)>,
}

/// A parsed SVG document.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgAsset {
    /// Document viewport; the coordinate space of [`SvgAsset::paths`].
    pub view_box: BoundingBox,
    /// Union of every path's bounds.
    pub bounds: BoundingBox,
    pub paths: Vec<SvgPath>,
}

impl SvgAsset {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let options = usvg::Options::default();
        let tree = usvg::Tree::from_data(data, &options)
            .map_err(|e| TextError::SvgParse(e.to_string()))?;
        let size = tree.size();
        let mut paths = Vec::new();
        collect_group(tree.root(), &mut paths);
        let bounds: Vec<BoundingBox> = paths.iter().filter_map(|p| p.path.bounds()).collect();
        let bounds = if bounds.is_empty() {
            BoundingBox::ZERO
        } else {
            BoundingBox::from_boxes(&bounds)
        };
        Ok(Self {
            view_box: BoundingBox::new(0.0, 0.0, size.width(), size.height()),
            bounds,
            paths,
        })
    }

    pub fn from_svg_str(svg: &str) -> Result<Self> {
        Self::parse(svg.as_bytes())
    }

    /// Width over height of the view box.
    pub fn aspect_ratio(&self) -> f32 {
        if self.view_box.height <= 0.0 {
            return 1.0;
        }
        self.view_box.width / self.view_box.height
    }

    /// A copy with fill and stroke colors swapped per `colormap`.
    ///
    /// Keys and values are CSS colors; keys match by their RGBA bytes, so
    /// `"#f00"` also matches a `red` fill.
    pub fn with_colormap(&self, colormap: &Colormap) -> SvgAsset {
        if colormap.is_empty() {
            return self.clone();
        }
        let table: Vec<([u8; 4], Color)> = colormap
            .iter()
            .filter_map(|(from, to)| Some((Color::parse(from)?.to_rgba8(), Color::parse(to)?)))
            .collect();
        let remap = |color: Color| {
            let key = color.to_rgba8();
            table
                .iter()
                .find(|(from, _)| *from == key)
                .map_or(color, |(_, to)| *to)
        };
        let mut asset = self.clone();
        for path in &mut asset.paths {
            path.fill = path.fill.map(remap);
            path.stroke = path.stroke.map(|(color, width)| (remap(color), width));
        }
        asset
    }

    /// Maps the view box onto `target`.
    ///
    /// `Stretch` scales each axis independently. `Rigid` keeps the aspect
    /// ratio and covers `target`; callers clip the overflow.
    pub fn fit_transform(&self, target: &BoundingBox, fit: ImageFit) -> Transform2D {
        let view = self.view_box;
        if view.width <= 0.0 || view.height <= 0.0 {
            return Transform2D::translate(target.x, target.y);
        }
        let sx = target.width / view.width;
        let sy = target.height / view.height;
        let (sx, sy) = match fit {
            ImageFit::Stretch => (sx, sy),
            ImageFit::Rigid => {
                let s = sx.max(sy);
                (s, s)
            }
        };
        let dx = target.x + (target.width - view.width * sx) / 2.0;
        let dy = target.y + (target.height - view.height * sy) / 2.0;
        Transform2D::translate(-view.x, -view.y)
            .then(&Transform2D::scale(sx, sy))
            .then(&Transform2D::translate(dx, dy))
    }

    /// Paths mapped through `transform`.
    pub fn transformed(&self, transform: &Transform2D) -> Vec<SvgPath> {
        let scale = (transform.a * transform.d - transform.b * transform.c).abs().sqrt();
        self.paths
            .iter()
            .map(|p| SvgPath {
                path: p.path.transformed(transform),
                fill: p.fill,
                stroke: p.stroke.map(|(color, width)| (color, width * scale)),
            })
            .collect()
    }
}

fn collect_group(group: &usvg::Group, out: &mut Vec<SvgPath>) {
    for node in group.children() {
        match node {
            usvg::Node::Group(group) => collect_group(group, out),
            usvg::Node::Path(path) => {
                if let Some(path) = convert_path(path) {
                    out.push(path);
                }
            }
            usvg::Node::Text(text) => collect_group(text.flattened(), out),
            usvg::Node::Image(_) => {
                tracing::debug!("skipping embedded raster image in SVG asset");
            }
        }
    }
}

fn convert_path(node: &usvg::Path) -> Option<SvgPath> {
    if !node.is_visible() {
        return None;
    }
    let mut builder = PathBuilder::new();
    for segment in node.data().segments() {
        use usvg::tiny_skia_path::PathSegment;
        builder = match segment {
            PathSegment::MoveTo(p) => builder.move_to(p.x, p.y),
            PathSegment::LineTo(p) => builder.line_to(p.x, p.y),
            PathSegment::QuadTo(c, p) => builder.quad_to(c.x, c.y, p.x, p.y),
            PathSegment::CubicTo(c1, c2, p) => builder.cubic_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
            PathSegment::Close => builder.close(),
        };
    }
    let t = node.abs_transform();
    let transform = Transform2D {
        a: t.sx,
        b: t.ky,
        c: t.kx,
        d: t.sy,
        e: t.tx,
        f: t.ty,
    };
    let mut path = builder.build();
    if !transform.is_identity() {
        path.transform(&transform);
    }
    let fill = node
        .fill()
        .and_then(|fill| solid_color(fill.paint(), fill.opacity().get()));
    let stroke = node.stroke().and_then(|stroke| {
        solid_color(stroke.paint(), stroke.opacity().get())
            .map(|color| (color, stroke.width().get()))
    });
    if fill.is_none() && stroke.is_none() {
        return None;
    }
    Some(SvgPath { path, fill, stroke })
}

fn solid_color(paint: &usvg::Paint, opacity: f32) -> Option<Color> {
    match paint {
        usvg::Paint::Color(c) => Some(Color::from_rgba8(
            c.red,
            c.green,
            c.blue,
            (opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAVE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="10" viewBox="0 0 40 10">
        <path d="M0 8 L40 8 L40 10 L0 10 Z" fill="#ff0000"/>
        <rect x="0" y="0" width="10" height="2" fill="blue" stroke="#00ff00" stroke-width="1"/>
    </svg>"##;

    #[test]
    fn flattens_paths_with_colors() {
        let asset = SvgAsset::from_svg_str(WAVE).unwrap();
        assert_eq!(asset.view_box, BoundingBox::new(0.0, 0.0, 40.0, 10.0));
        assert_eq!(asset.paths.len(), 2);
        assert_eq!(asset.paths[0].fill, Some(Color::from_rgba8(255, 0, 0, 255)));
        assert!(asset.paths[1].stroke.is_some());
        assert_eq!(asset.aspect_ratio(), 4.0);
    }

    #[test]
    fn colormap_replaces_matching_colors_only() {
        let asset = SvgAsset::from_svg_str(WAVE).unwrap();
        let mut colormap = Colormap::new();
        colormap.insert("red".to_string(), "#000000".to_string());
        let mapped = asset.with_colormap(&colormap);
        assert_eq!(mapped.paths[0].fill, Some(Color::BLACK));
        assert_eq!(mapped.paths[1].fill, asset.paths[1].fill);
    }

    #[test]
    fn stretch_fills_the_target_exactly() {
        let asset = SvgAsset::from_svg_str(WAVE).unwrap();
        let target = BoundingBox::new(10.0, 20.0, 80.0, 5.0);
        let t = asset.fit_transform(&target, ImageFit::Stretch);
        let placed = asset.view_box.transform(&t);
        assert!((placed.x - 10.0).abs() < 1e-3 && (placed.width - 80.0).abs() < 1e-3);
        assert!((placed.y - 20.0).abs() < 1e-3 && (placed.height - 5.0).abs() < 1e-3);
    }

    #[test]
    fn rigid_keeps_the_aspect_ratio() {
        let asset = SvgAsset::from_svg_str(WAVE).unwrap();
        let target = BoundingBox::new(0.0, 0.0, 40.0, 40.0);
        let placed = asset
            .view_box
            .transform(&asset.fit_transform(&target, ImageFit::Rigid));
        assert!((placed.width / placed.height - 4.0).abs() < 1e-3);
        assert!(placed.contains_box(&target, 1e-3));
    }

    #[test]
    fn malformed_markup_is_an_error() {
        let err = SvgAsset::from_svg_str("<svg").unwrap_err();
        assert!(matches!(err, TextError::SvgParse(_)));
    }
}
