//! SVG output
//!
//! [`SvgWriter`] replays recorded [`PaintCommand`]s into a standalone SVG
//! document. Transforms are baked into each element; clips and shadows are
//! applied by a wrapping group in document space, the way a canvas applies
//! them regardless of the current transform.

use std::fmt::Write as _;

use inkset_paint::{
    BoundingBox, Color, FillStyle, Gradient, PaintCommand, Path, PathCommand, Shadow, StrokeStyle,
    Transform2D,
};

#[derive(Debug, Clone, Copy, Default)]
struct State {
    transform: Option<Transform2D>,
    clip: Option<usize>,
    shadow: Option<usize>,
}

impl State {
    fn transform(&self) -> Transform2D {
        self.transform.unwrap_or_else(Transform2D::identity)
    }
}

/// Builds an SVG document from paint commands.
#[derive(Debug)]
pub struct SvgWriter {
    width: f32,
    height: f32,
    defs: String,
    body: String,
    state: State,
    stack: Vec<State>,
    next_id: usize,
}

impl SvgWriter {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            defs: String::new(),
            body: String::new(),
            state: State::default(),
            stack: Vec::new(),
            next_id: 0,
        }
    }

    /// Replays `commands` and returns the finished document.
    pub fn write(mut self, commands: &[PaintCommand]) -> String {
        for command in commands {
            self.apply(command);
        }
        self.finish()
    }

    fn apply(&mut self, command: &PaintCommand) {
        match command {
            PaintCommand::Save => self.stack.push(self.state),
            PaintCommand::Restore => match self.stack.pop() {
                Some(state) => self.state = state,
                None => tracing::warn!("unbalanced restore in paint commands"),
            },
            PaintCommand::Transform { transform } => {
                self.state.transform = Some(transform.then(&self.state.transform()));
            }
            PaintCommand::Clip { rect } => {
                let id = self.id();
                let _ = write!(
                    self.defs,
                    r#"<clipPath id="c{}"><path d="{}"/></clipPath>"#,
                    id,
                    path_data(&Path::rect(rect).transformed(&self.state.transform()))
                );
                self.state.clip = Some(id);
            }
            PaintCommand::SetShadow { shadow } => {
                let id = self.shadow(shadow);
                self.state.shadow = Some(id);
            }
            PaintCommand::FillRect { rect, style } => self.fill(&Path::rect(rect), style),
            PaintCommand::FillCircle { circle, style } => {
                self.fill(&Path::circle(circle.center, circle.radius), style)
            }
            PaintCommand::FillPath { path, style } => self.fill(path, style),
            PaintCommand::StrokePath { path, style } => self.stroke(path, style),
            PaintCommand::DrawText {
                text,
                position,
                font,
                style,
            } => {
                let paint = self.paint(style);
                let element = format!(
                    r#"<text x="{}" y="{}" style="font: {}" transform="{}" {}>{}</text>"#,
                    num(position.x),
                    num(position.y),
                    escape(font),
                    matrix(&self.state.transform()),
                    paint_attrs("fill", &paint),
                    escape(text)
                );
                self.push(element);
            }
        }
    }

    fn fill(&mut self, path: &Path, style: &FillStyle) {
        let paint = self.paint(style);
        let element = format!(
            r#"<path d="{}" {}/>"#,
            path_data(&path.transformed(&self.state.transform())),
            paint_attrs("fill", &paint)
        );
        self.push(element);
    }

    fn stroke(&mut self, path: &Path, style: &StrokeStyle) {
        let paint = self.paint(&style.paint);
        let t = self.state.transform();
        let scale = (t.a * t.d - t.b * t.c).abs().sqrt();
        let element = format!(
            r#"<path d="{}" fill="none" {} stroke-width="{}"/>"#,
            path_data(&path.transformed(&t)),
            paint_attrs("stroke", &paint),
            num(style.width * scale)
        );
        self.push(element);
    }

    /// Wraps `element` in the current clip and shadow.
    fn push(&mut self, element: String) {
        let mut attrs = String::new();
        if let Some(clip) = self.state.clip {
            let _ = write!(attrs, r#" clip-path="url(#c{})""#, clip);
        }
        if let Some(shadow) = self.state.shadow {
            let _ = write!(attrs, r#" filter="url(#s{})""#, shadow);
        }
        if attrs.is_empty() {
            self.body.push_str(&element);
        } else {
            let _ = write!(self.body, "<g{}>{}</g>", attrs, element);
        }
        self.body.push('\n');
    }

    fn id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    fn shadow(&mut self, shadow: &Shadow) -> usize {
        let id = self.id();
        let [r, g, b, _] = shadow.color.to_rgba8();
        let _ = write!(
            self.defs,
            r#"<filter id="s{}" x="-50%" y="-50%" width="200%" height="200%"><feDropShadow dx="{}" dy="{}" stdDeviation="{}" flood-color="rgb({},{},{})" flood-opacity="{}"/></filter>"#,
            id,
            num(shadow.offset_x),
            num(shadow.offset_y),
            num(shadow.blur_radius / 2.0),
            r,
            g,
            b,
            num(shadow.color.a)
        );
        id
    }

    /// Resolves a fill to an SVG paint, defining gradients as needed.
    fn paint(&mut self, style: &FillStyle) -> SvgPaint {
        match style {
            FillStyle::Color(color) => SvgPaint::Color(*color),
            FillStyle::Gradient(gradient) => {
                let id = self.id();
                let t = self.state.transform();
                let (open, close) = match gradient {
                    Gradient::Linear { start, end, .. } => {
                        let (start, end) = (t.apply(*start), t.apply(*end));
                        (
                            format!(
                                r#"<linearGradient id="g{}" gradientUnits="userSpaceOnUse" x1="{}" y1="{}" x2="{}" y2="{}">"#,
                                id,
                                num(start.x),
                                num(start.y),
                                num(end.x),
                                num(end.y)
                            ),
                            "</linearGradient>",
                        )
                    }
                    Gradient::Radial { center, radius, .. } => {
                        let center = t.apply(*center);
                        let scale = (t.a * t.d - t.b * t.c).abs().sqrt();
                        (
                            format!(
                                r#"<radialGradient id="g{}" gradientUnits="userSpaceOnUse" cx="{}" cy="{}" r="{}">"#,
                                id,
                                num(center.x),
                                num(center.y),
                                num(radius * scale)
                            ),
                            "</radialGradient>",
                        )
                    }
                };
                self.defs.push_str(&open);
                for stop in gradient.stops() {
                    let [r, g, b, _] = stop.color.to_rgba8();
                    let _ = write!(
                        self.defs,
                        r#"<stop offset="{}" stop-color="rgb({},{},{})" stop-opacity="{}"/>"#,
                        num(stop.offset),
                        r,
                        g,
                        b,
                        num(stop.color.a)
                    );
                }
                self.defs.push_str(close);
                SvgPaint::Reference(id)
            }
        }
    }

    fn finish(self) -> String {
        let view = BoundingBox::new(0.0, 0.0, self.width, self.height);
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="{} {} {} {}">"#,
            num(view.width),
            num(view.height),
            num(view.x),
            num(view.y),
            num(view.width),
            num(view.height)
        );
        if !self.defs.is_empty() {
            let _ = writeln!(out, "<defs>{}</defs>", self.defs);
        }
        out.push_str(&self.body);
        out.push_str("</svg>\n");
        out
    }
}

enum SvgPaint {
    Color(Color),
    Reference(usize),
}

fn paint_attrs(kind: &str, paint: &SvgPaint) -> String {
    match paint {
        SvgPaint::Color(color) => {
            let [r, g, b, _] = color.to_rgba8();
            if color.a >= 1.0 {
                format!(r#"{}="rgb({},{},{})""#, kind, r, g, b)
            } else {
                format!(
                    r#"{}="rgb({},{},{})" {}-opacity="{}""#,
                    kind,
                    r,
                    g,
                    b,
                    kind,
                    num(color.a)
                )
            }
        }
        SvgPaint::Reference(id) => format!(r#"{}="url(#g{})""#, kind, id),
    }
}

fn path_data(path: &Path) -> String {
    let mut d = String::new();
    for command in path.commands() {
        if !d.is_empty() {
            d.push(' ');
        }
        let _ = match command {
            PathCommand::MoveTo(p) => write!(d, "M{} {}", num(p.x), num(p.y)),
            PathCommand::LineTo(p) => write!(d, "L{} {}", num(p.x), num(p.y)),
            PathCommand::QuadTo { control, end } => write!(
                d,
                "Q{} {} {} {}",
                num(control.x),
                num(control.y),
                num(end.x),
                num(end.y)
            ),
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => write!(
                d,
                "C{} {} {} {} {} {}",
                num(control1.x),
                num(control1.y),
                num(control2.x),
                num(control2.y),
                num(end.x),
                num(end.y)
            ),
            PathCommand::Close => write!(d, "Z"),
        };
    }
    d
}

fn matrix(t: &Transform2D) -> String {
    format!(
        "matrix({} {} {} {} {} {})",
        num(t.a),
        num(t.b),
        num(t.c),
        num(t.d),
        num(t.e),
        num(t.f)
    )
}

/// Three decimals, trailing zeros trimmed.
fn num(value: f32) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        s => s.to_string(),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkset_paint::{DrawSurface, PaintContext, Point};

    #[test]
    fn formats_numbers_compactly() {
        assert_eq!(num(1.0), "1");
        assert_eq!(num(0.125), "0.125");
        assert_eq!(num(-0.0001), "0");
        assert_eq!(num(2.5), "2.5");
    }

    #[test]
    fn bakes_transforms_into_path_data() {
        let mut ctx = PaintContext::new();
        ctx.save();
        ctx.transform(Transform2D::translate(10.0, 0.0));
        ctx.fill_rect(BoundingBox::new(0.0, 0.0, 2.0, 2.0), &Color::BLACK.into());
        ctx.restore();
        ctx.fill_rect(BoundingBox::new(0.0, 0.0, 2.0, 2.0), &Color::BLACK.into());
        let svg = SvgWriter::new(20.0, 10.0).write(ctx.commands());
        assert!(svg.contains(r#"<path d="M10 0 L12 0 L12 2 L10 2 Z" fill="rgb(0,0,0)"/>"#));
        assert!(svg.contains(r#"<path d="M0 0 L2 0 L2 2 L0 2 Z" fill="rgb(0,0,0)"/>"#));
    }

    #[test]
    fn clips_and_shadows_wrap_elements() {
        let mut ctx = PaintContext::new();
        ctx.save();
        ctx.clip_rect(BoundingBox::new(0.0, 0.0, 5.0, 5.0));
        ctx.set_shadow(Shadow {
            offset_x: 1.0,
            offset_y: 1.0,
            blur_radius: 2.0,
            color: Color::BLACK,
        });
        ctx.fill_text("a&b", Point::new(0.0, 4.0), "normal 400 10px serif", &Color::BLACK.into());
        ctx.restore();
        let svg = SvgWriter::new(5.0, 5.0).write(ctx.commands());
        assert!(svg.contains("<clipPath id=\"c1\">"));
        assert!(svg.contains("feDropShadow"));
        assert!(svg.contains(r#"<g clip-path="url(#c1)" filter="url(#s2)">"#));
        assert!(svg.contains("a&amp;b"));
    }

    #[test]
    fn gradients_become_definitions() {
        let gradient = Gradient::linear_simple(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Color::BLACK,
            Color::WHITE,
        );
        let mut ctx = PaintContext::new();
        ctx.fill_rect(BoundingBox::new(0.0, 0.0, 10.0, 10.0), &gradient.into());
        let svg = SvgWriter::new(10.0, 10.0).write(ctx.commands());
        assert!(svg.contains(
            r#"<linearGradient id="g1" gradientUnits="userSpaceOnUse" x1="0" y1="0" x2="10" y2="0">"#
        ));
        assert!(svg.contains(r#"fill="url(#g1)""#));
    }
}
