use serde::Serialize;

use crate::layout::{Bounds, Point, Size};

/// Where the anchor point of a text block sits relative to the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    Center,
    /// Anchor at the bottom middle; text sits above it.
    Above,
    /// Anchor at the top middle; text hangs below it.
    Below,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    pub color: String,
    pub font_family: String,
    pub font_size: f32,
    /// Line advance as a multiple of the font size.
    pub line_height: f32,
}

/// One primitive drawn on the canvas, in component-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    Rect {
        bounds: Bounds,
        fill: String,
        stroke: String,
        stroke_width: f32,
    },
    Circle {
        center: Point,
        radius: f32,
        fill: Option<String>,
        stroke: Option<String>,
        stroke_width: f32,
    },
    Polyline {
        points: Vec<Point>,
        stroke: String,
        width: f32,
        start_arrow: bool,
        end_arrow: bool,
    },
    Text {
        at: Point,
        anchor: TextAnchor,
        lines: Vec<String>,
        size: Size,
        /// Clockwise rotation in degrees around `at`.
        rotation: f32,
        style: TextStyle,
    },
}

impl Shape {
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Shape::Rect { bounds, .. } => Some(*bounds),
            Shape::Circle { center, radius, .. } => Some(Bounds::from_circle(*center, *radius)),
            Shape::Polyline { points, width, .. } => {
                let half = width / 2.0;
                Bounds::from_points(points).map(|b| Bounds {
                    min_x: b.min_x - half,
                    min_y: b.min_y - half,
                    max_x: b.max_x + half,
                    max_y: b.max_y + half,
                })
            }
            Shape::Text {
                at,
                anchor,
                size,
                rotation,
                ..
            } => {
                let top = text_top(*at, *anchor, size.height);
                let corners = [
                    Point::new(at.x - size.width / 2.0, top),
                    Point::new(at.x + size.width / 2.0, top),
                    Point::new(at.x - size.width / 2.0, top + size.height),
                    Point::new(at.x + size.width / 2.0, top + size.height),
                ];
                let rotated: Vec<Point> = corners
                    .iter()
                    .map(|corner| rotate_about(*corner, *at, *rotation))
                    .collect();
                Bounds::from_points(&rotated)
            }
        }
    }
}

/// Y of the top edge of an unrotated text block.
pub(crate) fn text_top(at: Point, anchor: TextAnchor, height: f32) -> f32 {
    match anchor {
        TextAnchor::Center => at.y - height / 2.0,
        TextAnchor::Above => at.y - height,
        TextAnchor::Below => at.y,
    }
}

fn rotate_about(point: Point, pivot: Point, degrees: f32) -> Point {
    if degrees == 0.0 {
        return point;
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    let dx = point.x - pivot.x;
    let dy = point.y - pivot.y;
    Point::new(pivot.x + dx * cos - dy * sin, pivot.y + dx * sin + dy * cos)
}

/// Container for the shapes one vertex or line draws.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Group {
    shapes: Vec<Shape>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.shapes
            .iter()
            .filter_map(Shape::bounds)
            .reduce(Bounds::union)
    }
}

/// Selection decoration, kept apart from the main shapes so it can be dropped on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    shapes: Vec<Shape>,
}

impl Highlight {
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }
}
