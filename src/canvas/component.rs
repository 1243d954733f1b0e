use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::error::{DiagramError, GraphError};
use crate::graph::{Sociograph, Subgraph};
use crate::layout::{Bounds, Point, wrap_label};
use crate::model::RelId;

use super::Selection;
use super::aggline::AggLine;
use super::paint::{EdgePainter, Painters, VertexPainter};
use super::vertex::{Vertex, VertexId};

/// Invisible ring covering a vertex's full circular footprint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spacer {
    pub center: Point,
    pub radius: f32,
}

impl Spacer {
    fn around(vertex: &Vertex) -> Self {
        let (center, radius) = vertex.xyr();
        Self { center, radius }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_circle(self.center, self.radius)
    }
}

/// The drawn form of one connected component. Geometry is local; `offset` places the
/// component on the canvas.
#[derive(Debug, Clone)]
pub struct Component {
    offset: Point,
    vertices: Vec<Vertex>,
    index: HashMap<String, VertexId>,
    spacers: HashMap<String, Spacer>,
    lines: Vec<AggLine>,
}

impl Component {
    /// Draws every vertex at its laid-out position, then one line per edge slot. A line
    /// points from the origin of the first relationship in its slot.
    pub fn build(
        graph: &Sociograph,
        subgraph: &Subgraph,
        positions: &HashMap<String, Point>,
        painters: &Painters,
        wrap_width: usize,
    ) -> Result<Self, DiagramError> {
        let mut component = Self {
            offset: Point::default(),
            vertices: Vec::with_capacity(subgraph.nodes.len()),
            index: HashMap::with_capacity(subgraph.nodes.len()),
            spacers: HashMap::with_capacity(subgraph.nodes.len()),
            lines: Vec::with_capacity(subgraph.edges.len()),
        };

        for label in &subgraph.nodes {
            let node = graph
                .node(label)
                .ok_or_else(|| GraphError::MissingNode(label.clone()))?;
            let center = positions.get(label).copied().unwrap_or_else(|| {
                warn!(node = %label, "layout returned no position; using the origin");
                Point::default()
            });
            let mut vertex = Vertex::new(node, center, wrap_label(&node.label, wrap_width));
            vertex.draw(painters.vertex.as_ref());
            component.index.insert(label.clone(), component.vertices.len());
            component.vertices.push(vertex);
            component.add_spacer(label)?;
        }

        for key in &subgraph.edges {
            let (a, b) = key.ends();
            let Some(first) = graph
                .edge(a, b)
                .and_then(|rels| rels.first())
                .and_then(|id| graph.relationship(*id))
            else {
                continue;
            };
            let origin = component.require(&first.origin)?;
            let dest = component.require(&first.destination)?;
            let mut line = AggLine::new(origin, dest);
            for &id in graph.edge(a, b).unwrap_or_default() {
                line.add_relationship(id, graph, &component.vertices[origin], &component.vertices[dest]);
            }
            component.lines.push(line);
            component.draw_line(component.lines.len() - 1, painters.edge.as_ref())?;
        }
        Ok(component)
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn lines(&self) -> &[AggLine] {
        &self.lines
    }

    pub fn spacers(&self) -> impl Iterator<Item = (&str, &Spacer)> {
        self.spacers.iter().map(|(label, spacer)| (label.as_str(), spacer))
    }

    pub fn spacer(&self, label: &str) -> Option<&Spacer> {
        self.spacers.get(label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    pub fn vertex_id(&self, label: &str) -> Option<VertexId> {
        self.index.get(label).copied()
    }

    pub fn vertex(&self, label: &str) -> Option<&Vertex> {
        self.vertex_id(label).map(|id| &self.vertices[id])
    }

    /// Both ends of a line belonging to this component.
    pub fn ends(&self, line: &AggLine) -> (&Vertex, &Vertex) {
        (&self.vertices[line.origin()], &self.vertices[line.dest()])
    }

    pub fn line_index(&self, a: &str, b: &str) -> Option<usize> {
        let (a, b) = (self.vertex_id(a)?, self.vertex_id(b)?);
        self.lines.iter().position(|line| line.joins(a, b))
    }

    pub fn line_between(&self, a: &str, b: &str) -> Option<&AggLine> {
        self.line_index(a, b).map(|idx| &self.lines[idx])
    }

    pub fn lines_touching(&self, label: &str) -> Vec<&AggLine> {
        match self.vertex_id(label) {
            Some(id) => self.lines.iter().filter(|line| line.touches(id)).collect(),
            None => Vec::new(),
        }
    }

    /// Moves a vertex to a new key. Its spacer is dropped until `add_spacer` is called.
    pub fn relabel(&mut self, old: &str, new: &str) -> Result<(), DiagramError> {
        let id = self
            .index
            .remove(old)
            .ok_or_else(|| DiagramError::MissingVertex(old.to_string()))?;
        self.index.insert(new.to_string(), id);
        self.spacers.remove(old);
        Ok(())
    }

    /// (Re)sizes the spacer for `label` to the vertex's current radius.
    pub fn add_spacer(&mut self, label: &str) -> Result<(), DiagramError> {
        let id = self.require(label)?;
        let spacer = Spacer::around(&self.vertices[id]);
        self.spacers.insert(label.to_string(), spacer);
        Ok(())
    }

    /// Re-reads the node, repaints its vertex in place and redraws every line touching it.
    pub fn refresh_vertex(
        &mut self,
        graph: &Sociograph,
        label: &str,
        painters: &Painters,
        wrap_width: usize,
    ) -> Result<(), DiagramError> {
        let node = graph
            .node(label)
            .ok_or_else(|| GraphError::MissingNode(label.to_string()))?;
        let id = self.require(label)?;
        let vertex = &mut self.vertices[id];
        vertex.update_from(node, wrap_label(&node.label, wrap_width));
        vertex.draw(painters.vertex.as_ref());
        self.add_spacer(label)?;

        let touching: Vec<usize> = (0..self.lines.len())
            .filter(|&idx| self.lines[idx].touches(id))
            .collect();
        for idx in touching {
            let line = &mut self.lines[idx];
            let (origin, dest) = (&self.vertices[line.origin()], &self.vertices[line.dest()]);
            line.recompute(graph, origin, dest);
            self.draw_line(idx, painters.edge.as_ref())?;
        }
        Ok(())
    }

    /// Adds or updates one member of a line and redraws only that line.
    pub fn refresh_relationship(
        &mut self,
        line: usize,
        id: RelId,
        graph: &Sociograph,
        painter: &dyn EdgePainter,
    ) -> Result<(), DiagramError> {
        let agg = &mut self.lines[line];
        let (origin, dest) = (&self.vertices[agg.origin()], &self.vertices[agg.dest()]);
        agg.add_relationship(id, graph, origin, dest);
        self.draw_line(line, painter)
    }

    /// Drops one member of a line and redraws it. Returns whether it was a member.
    pub fn remove_relationship(
        &mut self,
        line: usize,
        id: RelId,
        graph: &Sociograph,
        painter: &dyn EdgePainter,
    ) -> Result<bool, DiagramError> {
        let agg = &mut self.lines[line];
        let (origin, dest) = (&self.vertices[agg.origin()], &self.vertices[agg.dest()]);
        let removed = agg.remove_relationship(id, graph, origin, dest);
        self.draw_line(line, painter)?;
        Ok(removed)
    }

    pub fn remove_line(&mut self, line: usize) -> AggLine {
        self.lines.remove(line)
    }

    /// Local bounds of everything drawn, spacer rings included.
    pub fn bounds(&self) -> Option<Bounds> {
        self.vertices
            .iter()
            .map(Vertex::bounds)
            .chain(self.spacers.values().map(Spacer::bounds))
            .chain(self.lines.iter().filter_map(AggLine::bounds))
            .reduce(Bounds::union)
    }

    pub fn set_vertex_selected(
        &mut self,
        label: &str,
        state: bool,
        painter: &dyn VertexPainter,
    ) -> Result<(), DiagramError> {
        let id = self.require(label)?;
        self.vertices[id].set_selected(state, painter);
        Ok(())
    }

    pub fn set_line_selected(
        &mut self,
        line: usize,
        state: bool,
        painter: &dyn EdgePainter,
    ) -> Result<(), DiagramError> {
        let agg = &mut self.lines[line];
        let (origin, dest) = (&self.vertices[agg.origin()], &self.vertices[agg.dest()]);
        agg.set_selected(state, origin, dest, painter)
    }

    /// What lies under a local point: the closest spacer ring first, then any line within
    /// `tolerance` of its stroke.
    pub fn hit_test(&self, point: Point, tolerance: f32) -> Option<Selection> {
        let ring = self
            .spacers
            .iter()
            .map(|(label, spacer)| (label, point.distance(spacer.center), spacer.radius))
            .filter(|(_, distance, radius)| distance <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        if let Some((label, _, _)) = ring {
            return Some(Selection::Vertex(label.clone()));
        }

        self.lines
            .iter()
            .filter_map(|line| {
                let reach = line.width().unwrap_or_default() / 2.0 + tolerance;
                line.distance_to(point)
                    .filter(|distance| *distance <= reach)
                    .map(|distance| (line, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(line, _)| {
                let (origin, dest) = self.ends(line);
                Selection::Line(origin.label().to_string(), dest.label().to_string())
            })
    }

    fn require(&self, label: &str) -> Result<VertexId, DiagramError> {
        self.vertex_id(label)
            .ok_or_else(|| DiagramError::MissingVertex(label.to_string()))
    }

    /// Draws one line, skipping it with a warning when its ends coincide.
    fn draw_line(&mut self, idx: usize, painter: &dyn EdgePainter) -> Result<(), DiagramError> {
        let line = &mut self.lines[idx];
        let (origin, dest) = (&self.vertices[line.origin()], &self.vertices[line.dest()]);
        match line.draw(origin, dest, painter) {
            Err(DiagramError::DegenerateGeometry { origin, dest }) => {
                warn!(%origin, %dest, "vertices share a center; line not drawn");
                Ok(())
            }
            other => other,
        }
    }
}
