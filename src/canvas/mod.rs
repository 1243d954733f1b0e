pub mod aggline;
pub mod component;
pub mod paint;
pub mod shape;
pub mod vertex;

pub use aggline::{AggLine, Aggregate, LabelBuckets, adjust_endpoints, derive};
pub use component::{Component, Spacer};
pub use paint::{BoxPainter, EdgePainter, LinePainter, Painters, VertexPainter};
pub use shape::{Group, Highlight, Shape, TextAnchor, TextStyle};
pub use vertex::{Vertex, VertexId};

use tracing::debug;

use crate::config::{Config, LayoutConfig};
use crate::error::{DiagramError, GraphError};
use crate::graph::{EdgeChange, Sociograph};
use crate::layout::{Bounds, ForceLayout, LayoutOracle, Point, Size, pack_boxes};
use crate::model::RelId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CanvasState {
    #[default]
    Empty,
    LaidOut,
}

/// What changed in the graph since the last draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Touch {
    /// A node's label, attributes or notes changed. `previous_label` is set when the
    /// label itself changed.
    Node {
        label: String,
        previous_label: Option<String>,
    },
    /// A relationship was edited in place.
    Relationship(RelId),
    /// A relationship should be deleted; the canvas removes it from the graph.
    RelationshipDeleted(RelId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Only the touched objects were redrawn.
    Refreshed,
    /// The change needed a new layout.
    Redrawn,
}

/// A selectable object, also what `hit_test` reports. Lines are named by their ends in
/// either order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Vertex(String),
    Line(String, String),
}

/// The drawn diagram: one component per connected subgraph, packed side by side.
pub struct Canvas {
    layout: LayoutConfig,
    painters: Painters,
    oracle: Box<dyn LayoutOracle>,
    components: Vec<Component>,
    state: CanvasState,
    selection: Option<Selection>,
}

impl Canvas {
    /// A canvas using the standard painters and force layout for `config`.
    pub fn new(config: &Config) -> Self {
        Self::with_parts(
            config.layout.clone(),
            Painters::standard(&config.theme.vertex, &config.theme.edge, &config.layout),
            ForceLayout::new(config.layout.force.clone()),
        )
    }

    pub fn with_parts(
        layout: LayoutConfig,
        painters: Painters,
        oracle: impl LayoutOracle + 'static,
    ) -> Self {
        Self {
            layout,
            painters,
            oracle: Box::new(oracle),
            components: Vec::new(),
            state: CanvasState::Empty,
            selection: None,
        }
    }

    pub fn state(&self) -> CanvasState {
        self.state
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Lays out every connected component, draws it and packs the components.
    pub fn redraw(&mut self, graph: &Sociograph) -> Result<(), DiagramError> {
        self.components.clear();
        self.state = CanvasState::Empty;

        let mut components = Vec::new();
        for subgraph in graph.components() {
            let edges: Vec<(String, String)> = subgraph
                .edges
                .iter()
                .map(|key| {
                    let (a, b) = key.ends();
                    (a.to_string(), b.to_string())
                })
                .collect();
            let positions = self.oracle.layout(&subgraph.nodes, &edges);
            components.push(Component::build(
                graph,
                &subgraph,
                &positions,
                &self.painters,
                self.layout.wrap_width,
            )?);
        }

        let spacing = self.layout.component_spacing;
        let extents: Vec<Bounds> = components
            .iter()
            .map(|component| {
                component
                    .bounds()
                    .unwrap_or_else(|| Bounds::from_rect(0.0, 0.0, 0.0, 0.0))
            })
            .collect();
        let sizes: Vec<Size> = extents
            .iter()
            .map(|b| Size::new(b.width() + 2.0 * spacing, b.height() + 2.0 * spacing))
            .collect();
        let places = pack_boxes(&sizes)?;
        for ((component, extent), place) in components.iter_mut().zip(&extents).zip(places) {
            component.set_offset(Point::new(
                place.x + spacing - extent.min_x,
                place.y + spacing - extent.min_y,
            ));
        }
        debug!(
            components = components.len(),
            nodes = graph.node_count(),
            "redrew canvas"
        );

        self.components = components;
        self.state = CanvasState::LaidOut;
        if let Some(target) = self.selection.take() {
            // a selection whose target vanished is dropped
            let _ = self.select(target);
        }
        Ok(())
    }

    /// Redraws only what `touch` affects, without a new layout. Deleting the last
    /// relationship between two nodes falls back to a full redraw.
    pub fn refresh(
        &mut self,
        graph: &mut Sociograph,
        touch: Touch,
    ) -> Result<RefreshOutcome, DiagramError> {
        if self.state == CanvasState::Empty {
            return Err(DiagramError::NotLaidOut);
        }
        match touch {
            Touch::Node {
                label,
                previous_label,
            } => {
                let key = previous_label.as_deref().unwrap_or(&label);
                let idx = self
                    .container_index(key)
                    .ok_or_else(|| DiagramError::MissingVertex(key.to_string()))?;
                if !graph.contains_node(&label) {
                    return Err(GraphError::MissingNode(label).into());
                }
                if let Some(previous) = previous_label.as_deref().filter(|p| *p != label) {
                    self.components[idx].relabel(previous, &label)?;
                    self.rename_selection(previous, &label);
                }
                self.components[idx].refresh_vertex(
                    graph,
                    &label,
                    &self.painters,
                    self.layout.wrap_width,
                )?;
                debug!(node = %label, "refreshed vertex");
                Ok(RefreshOutcome::Refreshed)
            }
            Touch::Relationship(id) => {
                let (idx, line) = self.locate_line(graph, id)?;
                self.components[idx].refresh_relationship(line, id, graph, self.painters.edge.as_ref())?;
                debug!(relationship = %id, "refreshed line");
                Ok(RefreshOutcome::Refreshed)
            }
            Touch::RelationshipDeleted(id) => {
                let (idx, line) = self.locate_line(graph, id)?;
                let change = graph.remove_relationship(id)?;
                if change == EdgeChange::Removed {
                    self.components[idx].remove_line(line);
                    debug!(relationship = %id, "last relationship on edge removed; redrawing");
                    self.redraw(graph)?;
                    return Ok(RefreshOutcome::Redrawn);
                }
                self.components[idx].remove_relationship(line, id, graph, self.painters.edge.as_ref())?;
                debug!(relationship = %id, "removed relationship from line");
                Ok(RefreshOutcome::Refreshed)
            }
        }
    }

    /// Drops every component and the selection.
    pub fn clear(&mut self) {
        self.components.clear();
        self.selection = None;
        self.state = CanvasState::Empty;
    }

    pub fn vertex(&self, label: &str) -> Option<&Vertex> {
        self.components.iter().find_map(|c| c.vertex(label))
    }

    pub fn line(&self, a: &str, b: &str) -> Option<&AggLine> {
        self.components.iter().find_map(|c| c.line_between(a, b))
    }

    pub fn lines_touching(&self, label: &str) -> Vec<&AggLine> {
        self.container(label)
            .map(|c| c.lines_touching(label))
            .unwrap_or_default()
    }

    pub fn container(&self, label: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.contains(label))
    }

    /// Canvas position of a vertex's center.
    pub fn vertex_center(&self, label: &str) -> Option<Point> {
        let component = self.container(label)?;
        let center = component.vertex(label)?.center();
        let offset = component.offset();
        Some(center.offset(offset.x, offset.y))
    }

    /// Canvas position of the midpoint of a line.
    pub fn line_center(&self, a: &str, b: &str) -> Option<Point> {
        let component = self.container(a)?;
        let line = component.line_between(a, b)?;
        let (origin, dest) = component.ends(line);
        let center = line.center(origin, dest);
        let offset = component.offset();
        Some(center.offset(offset.x, offset.y))
    }

    /// Extent of everything drawn, in canvas coordinates.
    pub fn bounds(&self) -> Option<Bounds> {
        self.components
            .iter()
            .filter_map(|c| {
                let offset = c.offset();
                c.bounds().map(|b| b.translate(offset.x, offset.y))
            })
            .reduce(Bounds::union)
    }

    /// The vertex or line under a canvas point.
    pub fn hit_test(&self, point: Point) -> Option<Selection> {
        self.components.iter().find_map(|c| {
            let offset = c.offset();
            c.hit_test(point.offset(-offset.x, -offset.y), self.layout.hit_tolerance)
        })
    }

    /// Selects a vertex or line, replacing the current selection. For a line, returns
    /// its heaviest relationship.
    pub fn select(&mut self, target: Selection) -> Result<Option<RelId>, DiagramError> {
        self.clear_selection();
        let picked = match &target {
            Selection::Vertex(label) => {
                let idx = self
                    .container_index(label)
                    .ok_or_else(|| DiagramError::MissingVertex(label.clone()))?;
                self.components[idx].set_vertex_selected(label, true, self.painters.vertex.as_ref())?;
                None
            }
            Selection::Line(a, b) => {
                let (idx, line) = self
                    .line_position(a, b)
                    .ok_or_else(|| DiagramError::MissingLine(a.clone(), b.clone()))?;
                let component = &mut self.components[idx];
                component.set_line_selected(line, true, self.painters.edge.as_ref())?;
                component.lines()[line].heaviest()
            }
        };
        self.selection = Some(target);
        Ok(picked)
    }

    pub fn clear_selection(&mut self) {
        let Some(target) = self.selection.take() else {
            return;
        };
        // the target may already be gone; nothing is left to unmark then
        match target {
            Selection::Vertex(label) => {
                if let Some(idx) = self.container_index(&label) {
                    let _ = self.components[idx].set_vertex_selected(
                        &label,
                        false,
                        self.painters.vertex.as_ref(),
                    );
                }
            }
            Selection::Line(a, b) => {
                if let Some((idx, line)) = self.line_position(&a, &b) {
                    let _ = self.components[idx].set_line_selected(
                        line,
                        false,
                        self.painters.edge.as_ref(),
                    );
                }
            }
        }
    }

    fn container_index(&self, label: &str) -> Option<usize> {
        self.components.iter().position(|c| c.contains(label))
    }

    fn line_position(&self, a: &str, b: &str) -> Option<(usize, usize)> {
        let idx = self.container_index(a)?;
        let line = self.components[idx].line_index(a, b)?;
        Some((idx, line))
    }

    fn locate_line(&self, graph: &Sociograph, id: RelId) -> Result<(usize, usize), DiagramError> {
        let rel = graph
            .relationship(id)
            .ok_or(GraphError::MissingRelationship(id))?;
        self.line_position(&rel.origin, &rel.destination)
            .ok_or_else(|| DiagramError::MissingLine(rel.origin.clone(), rel.destination.clone()))
    }

    fn rename_selection(&mut self, old: &str, new: &str) {
        let rename = |label: &mut String| {
            if label.as_str() == old {
                *label = new.to_string();
            }
        };
        match &mut self.selection {
            Some(Selection::Vertex(label)) => rename(label),
            Some(Selection::Line(a, b)) => {
                rename(a);
                rename(b);
            }
            None => {}
        }
    }
}
