use crate::config::LayoutConfig;
use crate::error::DiagramError;
use crate::layout::{Bounds, Point, Size, measure_lines};
use crate::theme::Stylesheet;

use super::aggline::{AggLine, adjust_endpoints};
use super::shape::{Group, Highlight, Shape, TextAnchor, TextStyle};
use super::vertex::Vertex;

/// Draws vertices. `paint` fills the group and reports the size of what it drew.
pub trait VertexPainter {
    fn paint(&self, vertex: &Vertex, group: &mut Group) -> Size;
    fn show_selected(&self, vertex: &Vertex) -> Highlight;
}

/// Draws aggregate lines between two already drawn vertices.
pub trait EdgePainter {
    fn paint(
        &self,
        line: &AggLine,
        origin: &Vertex,
        dest: &Vertex,
        group: &mut Group,
    ) -> Result<(), DiagramError>;
    fn show_selected(
        &self,
        line: &AggLine,
        origin: &Vertex,
        dest: &Vertex,
    ) -> Result<Highlight, DiagramError>;
}

/// The pair of painters a canvas draws with.
pub struct Painters {
    pub vertex: Box<dyn VertexPainter>,
    pub edge: Box<dyn EdgePainter>,
}

impl Painters {
    pub fn new(vertex: impl VertexPainter + 'static, edge: impl EdgePainter + 'static) -> Self {
        Self {
            vertex: Box::new(vertex),
            edge: Box::new(edge),
        }
    }

    /// Box vertices and labelled lines styled by the given stylesheets.
    pub fn standard(vertex: &Stylesheet, edge: &Stylesheet, layout: &LayoutConfig) -> Self {
        Self::new(BoxPainter::new(vertex.clone(), layout), LinePainter::new(edge.clone(), layout))
    }
}

fn text_style(sheet: &Stylesheet, line_height: f32) -> TextStyle {
    TextStyle {
        color: sheet.text_color.clone(),
        font_family: sheet.font_family.clone(),
        font_size: sheet.font_size,
        line_height,
    }
}

/// Square box around the centered label.
#[derive(Debug, Clone)]
pub struct BoxPainter {
    style: Stylesheet,
    padding: f32,
    line_height: f32,
    fast_metrics: bool,
}

impl BoxPainter {
    pub fn new(style: Stylesheet, layout: &LayoutConfig) -> Self {
        Self {
            style,
            padding: layout.vertex_padding,
            line_height: layout.label_line_height,
            fast_metrics: layout.fast_text_metrics,
        }
    }
}

impl VertexPainter for BoxPainter {
    fn paint(&self, vertex: &Vertex, group: &mut Group) -> Size {
        let text = measure_lines(
            vertex.text(),
            self.style.font_size,
            &self.style.font_family,
            self.line_height,
            self.fast_metrics,
        );
        let side = text.width.max(text.height) + 2.0 * self.padding;
        let center = vertex.center();
        group.push(Shape::Rect {
            bounds: Bounds::from_rect(center.x - side / 2.0, center.y - side / 2.0, side, side),
            fill: self.style.fill_color.clone(),
            stroke: self.style.stroke_color.clone(),
            stroke_width: 1.0,
        });
        group.push(Shape::Text {
            at: center,
            anchor: TextAnchor::Center,
            lines: vertex.text().to_vec(),
            size: text,
            rotation: 0.0,
            style: text_style(&self.style, self.line_height),
        });
        Size::new(side, side)
    }

    fn show_selected(&self, vertex: &Vertex) -> Highlight {
        Highlight::new(vec![Shape::Circle {
            center: vertex.center(),
            radius: vertex.radius(),
            fill: None,
            stroke: Some(self.style.selection_color.clone()),
            stroke_width: self.style.selection_width,
        }])
    }
}

/// Straight line with arrowheads, half as wide as the mean weight, with the heaviest
/// labels written along it.
#[derive(Debug, Clone)]
pub struct LinePainter {
    style: Stylesheet,
    label_offset: f32,
    line_height: f32,
    fast_metrics: bool,
}

impl LinePainter {
    pub fn new(style: Stylesheet, layout: &LayoutConfig) -> Self {
        Self {
            style,
            label_offset: layout.edge_label_offset,
            line_height: layout.label_line_height,
            fast_metrics: layout.fast_text_metrics,
        }
    }

    fn label(&self, text: String, at: Point, anchor: TextAnchor, rotation: f32) -> Shape {
        let lines = vec![text];
        let size = measure_lines(
            &lines,
            self.style.font_size,
            &self.style.font_family,
            self.line_height,
            self.fast_metrics,
        );
        Shape::Text {
            at,
            anchor,
            lines,
            size,
            rotation,
            style: text_style(&self.style, self.line_height),
        }
    }
}

/// Text above the line: "A likes B; B distrusts A".
pub fn top_label(line: &AggLine, origin: &str, dest: &str) -> String {
    let labels = line.labels();
    let mut parts = Vec::new();
    if let Some((_, to)) = &labels.to {
        parts.push(format!("{origin} {to} {dest}"));
    }
    if let Some((_, from)) = &labels.from {
        parts.push(format!("{dest} {from} {origin}"));
    }
    parts.join("; ")
}

/// Text below the line: "Both trusts".
pub fn bottom_label(line: &AggLine) -> String {
    line.labels()
        .both
        .as_ref()
        .map(|(_, both)| format!("Both {both}"))
        .unwrap_or_default()
}

impl EdgePainter for LinePainter {
    fn paint(
        &self,
        line: &AggLine,
        origin: &Vertex,
        dest: &Vertex,
        group: &mut Group,
    ) -> Result<(), DiagramError> {
        let (start, end) = adjust_endpoints(origin, dest)?;
        group.push(Shape::Polyline {
            points: vec![start, end],
            stroke: self.style.stroke_color.clone(),
            width: line.width().unwrap_or_default() / 2.0,
            start_arrow: line.start_arrow(),
            end_arrow: line.end_arrow(),
        });

        // unit vector pointing from the destination back to the origin
        let (o, d) = (origin.center(), dest.center());
        let mag = o.distance(d);
        let (dx, dy) = ((o.x - d.x) / mag, (o.y - d.y) / mag);
        let rotation = (dy / dx).atan().to_degrees();
        // perpendicular that keeps the top label on the upper side of the line
        let (nx, ny) = if dx < 0.0 { (-dy, dx) } else { (dy, -dx) };
        let center = line.center(origin, dest);
        let off = self.label_offset;

        let top = top_label(line, origin.label(), dest.label());
        if !top.is_empty() {
            let at = center.offset(nx * off, ny * off);
            group.push(self.label(top, at, TextAnchor::Above, rotation));
        }
        let bottom = bottom_label(line);
        if !bottom.is_empty() {
            let at = center.offset(-nx * off, -ny * off);
            group.push(self.label(bottom, at, TextAnchor::Below, rotation));
        }
        Ok(())
    }

    fn show_selected(
        &self,
        line: &AggLine,
        origin: &Vertex,
        dest: &Vertex,
    ) -> Result<Highlight, DiagramError> {
        let (start, end) = adjust_endpoints(origin, dest)?;
        Ok(Highlight::new(vec![Shape::Polyline {
            points: vec![start, end],
            stroke: self.style.selection_color.clone(),
            width: line.width().unwrap_or_default() / 2.0 + self.style.selection_width * 2.0,
            start_arrow: line.start_arrow(),
            end_arrow: line.end_arrow(),
        }]))
    }
}
