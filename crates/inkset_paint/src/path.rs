//! Path building and representation

use lyon::geom::{CubicBezierSegment, QuadraticBezierSegment};
use lyon::math::point;
use serde::Serialize;
use smallvec::SmallVec;

use crate::primitives::BoundingBox;
use crate::transform::Transform2D;

/// A 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[repr(C)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Path command
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo {
        control: Point,
        end: Point,
    },
    CubicTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    Close,
}

impl PathCommand {
    /// Maps every point of the command through `f`.
    pub fn map_points(self, mut f: impl FnMut(Point) -> Point) -> Self {
        match self {
            PathCommand::MoveTo(p) => PathCommand::MoveTo(f(p)),
            PathCommand::LineTo(p) => PathCommand::LineTo(f(p)),
            PathCommand::QuadTo { control, end } => PathCommand::QuadTo {
                control: f(control),
                end: f(end),
            },
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => PathCommand::CubicTo {
                control1: f(control1),
                control2: f(control2),
                end: f(end),
            },
            PathCommand::Close => PathCommand::Close,
        }
    }
}

/// A 2D path composed of commands
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    commands: SmallVec<[PathCommand; 16]>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// A closed rectangle contour (clockwise in y-down space).
    pub fn rect(rect: &BoundingBox) -> Self {
        PathBuilder::new()
            .move_to(rect.left(), rect.top())
            .line_to(rect.right(), rect.top())
            .line_to(rect.right(), rect.bottom())
            .line_to(rect.left(), rect.bottom())
            .close()
            .build()
    }

    /// A closed circle approximated by four cubic arcs.
    pub fn circle(center: Point, radius: f32) -> Self {
        const KAPPA: f32 = 0.552_284_8;
        let (cx, cy, r) = (center.x, center.y, radius);
        let k = r * KAPPA;
        PathBuilder::new()
            .move_to(cx + r, cy)
            .cubic_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r)
            .cubic_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy)
            .cubic_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r)
            .cubic_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy)
            .close()
            .build()
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn push(&mut self, command: PathCommand) {
        self.commands.push(command);
    }

    /// Appends every command of `other`.
    pub fn extend(&mut self, other: &Path) {
        self.commands.extend_from_slice(&other.commands);
    }

    pub fn map_points(&mut self, mut f: impl FnMut(Point) -> Point) {
        for command in self.commands.iter_mut() {
            *command = command.map_points(&mut f);
        }
    }

    pub fn transform(&mut self, transform: &Transform2D) {
        if transform.is_identity() {
            return;
        }
        self.map_points(|p| transform.apply(p));
    }

    pub fn transformed(&self, transform: &Transform2D) -> Path {
        let mut path = self.clone();
        path.transform(transform);
        path
    }

    /// Tight bounds of the path, curve extrema included. `None` for paths
    /// without any drawn segment.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let mut min = point(f32::INFINITY, f32::INFINITY);
        let mut max = point(f32::NEG_INFINITY, f32::NEG_INFINITY);
        let mut include = |x: f32, y: f32| {
            min.x = min.x.min(x);
            min.y = min.y.min(y);
            max.x = max.x.max(x);
            max.y = max.y.max(y);
        };

        let mut current = Point::ZERO;
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => {
                    include(p.x, p.y);
                    current = p;
                }
                PathCommand::QuadTo { control, end } => {
                    let aabb = QuadraticBezierSegment {
                        from: point(current.x, current.y),
                        ctrl: point(control.x, control.y),
                        to: point(end.x, end.y),
                    }
                    .bounding_box();
                    include(aabb.min.x, aabb.min.y);
                    include(aabb.max.x, aabb.max.y);
                    current = end;
                }
                PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => {
                    let aabb = CubicBezierSegment {
                        from: point(current.x, current.y),
                        ctrl1: point(control1.x, control1.y),
                        ctrl2: point(control2.x, control2.y),
                        to: point(end.x, end.y),
                    }
                    .bounding_box();
                    include(aabb.min.x, aabb.min.y);
                    include(aabb.max.x, aabb.max.y);
                    current = end;
                }
                PathCommand::Close => {}
            }
        }

        if min.x > max.x || min.y > max.y {
            return None;
        }
        Some(BoundingBox::from_edges(min.x, min.y, max.x, max.y))
    }
}

/// Builder for constructing paths
pub struct PathBuilder {
    path: Path,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self { path: Path::new() }
    }

    pub fn move_to(mut self, x: f32, y: f32) -> Self {
        self.path.push(PathCommand::MoveTo(Point::new(x, y)));
        self
    }

    pub fn line_to(mut self, x: f32, y: f32) -> Self {
        self.path.push(PathCommand::LineTo(Point::new(x, y)));
        self
    }

    pub fn quad_to(mut self, cx: f32, cy: f32, x: f32, y: f32) -> Self {
        self.path.push(PathCommand::QuadTo {
            control: Point::new(cx, cy),
            end: Point::new(x, y),
        });
        self
    }

    pub fn cubic_to(mut self, c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32) -> Self {
        self.path.push(PathCommand::CubicTo {
            control1: Point::new(c1x, c1y),
            control2: Point::new(c2x, c2y),
            end: Point::new(x, y),
        });
        self
    }

    pub fn close(mut self) -> Self {
        self.path.push(PathCommand::Close);
        self
    }

    pub fn build(self) -> Path {
        self.path
    }
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}
