use crate::layout::{Bounds, Point, Size};
use crate::model::{Node, NodeId};

use super::paint::VertexPainter;
use super::shape::{Group, Highlight};

/// Index of a vertex inside its component's arena.
pub type VertexId = usize;

/// Drawn form of one node.
#[derive(Debug, Clone)]
pub struct Vertex {
    label: String,
    node: NodeId,
    text: Vec<String>,
    center: Point,
    size: Size,
    radius: f32,
    selected: bool,
    group: Group,
    highlight: Option<Highlight>,
}

impl Vertex {
    /// An undrawn vertex centered on `center`. `text` is the wrapped display label.
    pub fn new(node: &Node, center: Point, text: Vec<String>) -> Self {
        Self {
            label: node.label.clone(),
            node: node.id,
            text,
            center,
            size: Size::default(),
            radius: 0.0,
            selected: false,
            group: Group::new(),
            highlight: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn text(&self) -> &[String] {
        &self.text
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Distance from the center to the top-left corner of the drawn shape.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn xyr(&self) -> (Point, f32) {
        (self.center, self.radius)
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    /// Takes a new label and display text from the node without drawing.
    pub fn update_from(&mut self, node: &Node, text: Vec<String>) {
        self.label = node.label.clone();
        self.node = node.id;
        self.text = text;
    }

    /// Repaints from scratch and recomputes the radius from what was drawn.
    pub fn draw(&mut self, painter: &dyn VertexPainter) {
        let mut group = std::mem::take(&mut self.group);
        group.clear();
        self.size = painter.paint(self, &mut group);
        let top_left = group.bounds().map(|b| b.top_left()).unwrap_or(Point::new(
            self.center.x - self.size.width / 2.0,
            self.center.y - self.size.height / 2.0,
        ));
        self.radius = top_left.distance(self.center);
        self.group = group;
        if self.selected {
            self.highlight = Some(painter.show_selected(self));
        }
    }

    pub fn set_selected(&mut self, state: bool, painter: &dyn VertexPainter) {
        self.selected = state;
        self.highlight = if state {
            Some(painter.show_selected(self))
        } else {
            None
        };
    }

    /// Footprint of the drawn shapes, or of the bounding circle before any drawing.
    pub fn bounds(&self) -> Bounds {
        self.group
            .bounds()
            .unwrap_or_else(|| Bounds::from_circle(self.center, self.radius))
    }

    /// Attribute listing for hover text, sorted by name then value. `None` for a node
    /// without attributes.
    pub fn tooltip(node: &Node) -> Option<String> {
        if node.attributes.is_empty() {
            return None;
        }
        let mut attrs: Vec<(&str, &str)> = node
            .attributes
            .iter()
            .map(|attr| (attr.name.as_str(), attr.value.as_str()))
            .collect();
        attrs.sort();
        let lines: Vec<String> = attrs
            .into_iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect();
        Some(lines.join("\n"))
    }
}
