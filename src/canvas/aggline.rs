use serde::Serialize;
use tracing::warn;

use crate::error::DiagramError;
use crate::graph::Sociograph;
use crate::layout::{Bounds, Point};
use crate::model::{RelId, Relationship};

use super::paint::EdgePainter;
use super::shape::{Group, Highlight};
use super::vertex::{Vertex, VertexId};

/// Heaviest `(weight, label)` per direction class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelBuckets {
    /// Relationships ending at the line's origin vertex.
    pub from: Option<(i32, String)>,
    /// Relationships ending at the line's destination vertex.
    pub to: Option<(i32, String)>,
    pub both: Option<(i32, String)>,
}

/// Everything about a line that follows from its member relationships.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregate {
    /// Mean member weight; `None` without members.
    pub width: Option<f32>,
    pub start_arrow: bool,
    pub end_arrow: bool,
    pub labels: LabelBuckets,
}

/// Derives line width, arrows and labels from a set of relationships between the
/// vertices labelled `origin` and `dest`.
pub fn derive<'a>(
    members: impl IntoIterator<Item = &'a Relationship>,
    origin: &str,
    dest: &str,
) -> Aggregate {
    let mut aggregate = Aggregate::default();
    let mut total = 0i64;
    let mut count = 0usize;
    for rel in members {
        total += i64::from(rel.weight);
        count += 1;
        if rel.mutual {
            aggregate.start_arrow = true;
            aggregate.end_arrow = true;
            keep_heaviest(&mut aggregate.labels.both, rel);
            continue;
        }
        if rel.ends_at(origin) {
            aggregate.start_arrow = true;
            keep_heaviest(&mut aggregate.labels.from, rel);
        }
        if rel.ends_at(dest) {
            aggregate.end_arrow = true;
            keep_heaviest(&mut aggregate.labels.to, rel);
        }
    }
    if count > 0 {
        aggregate.width = Some(total as f32 / count as f32);
    }
    aggregate
}

fn keep_heaviest(bucket: &mut Option<(i32, String)>, rel: &Relationship) {
    let heavier = match bucket {
        Some((weight, label)) => rel.rank() > (*weight, label.as_str()),
        None => true,
    };
    if heavier {
        *bucket = Some((rel.weight, rel.label.clone()));
    }
}

/// Moves both ends of the center-to-center segment inward by each end's radius.
/// `None` when the centers coincide.
pub fn pull_in(origin: Point, origin_radius: f32, dest: Point, dest_radius: f32) -> Option<(Point, Point)> {
    let dx = dest.x - origin.x;
    let dy = dest.y - origin.y;
    let mag = dx.hypot(dy);
    if mag <= f32::EPSILON {
        return None;
    }
    let (ux, uy) = (dx / mag, dy / mag);
    Some((
        origin.offset(ux * origin_radius, uy * origin_radius),
        dest.offset(-ux * dest_radius, -uy * dest_radius),
    ))
}

/// Segment between two drawn vertices, stopping at their bounding circles.
pub fn adjust_endpoints(origin: &Vertex, dest: &Vertex) -> Result<(Point, Point), DiagramError> {
    let (o, ro) = origin.xyr();
    let (d, rd) = dest.xyr();
    pull_in(o, ro, d, rd).ok_or_else(|| DiagramError::DegenerateGeometry {
        origin: origin.label().to_string(),
        dest: dest.label().to_string(),
    })
}

/// One drawn line standing for every relationship between a pair of vertices.
#[derive(Debug, Clone)]
pub struct AggLine {
    origin: VertexId,
    dest: VertexId,
    /// Sorted heaviest first.
    members: Vec<RelId>,
    aggregate: Aggregate,
    segment: Option<(Point, Point)>,
    selected: bool,
    group: Group,
    highlight: Option<Highlight>,
}

impl AggLine {
    pub fn new(origin: VertexId, dest: VertexId) -> Self {
        Self {
            origin,
            dest,
            members: Vec::new(),
            aggregate: Aggregate::default(),
            segment: None,
            selected: false,
            group: Group::new(),
            highlight: None,
        }
    }

    pub fn origin(&self) -> VertexId {
        self.origin
    }

    pub fn dest(&self) -> VertexId {
        self.dest
    }

    pub fn joins(&self, a: VertexId, b: VertexId) -> bool {
        a != b && (self.origin == a || self.dest == a) && (self.origin == b || self.dest == b)
    }

    pub fn touches(&self, vertex: VertexId) -> bool {
        self.origin == vertex || self.dest == vertex
    }

    pub fn members(&self) -> &[RelId] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    pub fn width(&self) -> Option<f32> {
        self.aggregate.width
    }

    pub fn start_arrow(&self) -> bool {
        self.aggregate.start_arrow
    }

    pub fn end_arrow(&self) -> bool {
        self.aggregate.end_arrow
    }

    pub fn labels(&self) -> &LabelBuckets {
        &self.aggregate.labels
    }

    /// Adds a member, or refreshes it when already present, then re-derives.
    pub fn add_relationship(&mut self, id: RelId, graph: &Sociograph, origin: &Vertex, dest: &Vertex) {
        if !self.members.contains(&id) {
            self.members.push(id);
        }
        self.recompute(graph, origin, dest);
    }

    /// Drops a member and re-derives. Returns whether it was a member.
    pub fn remove_relationship(
        &mut self,
        id: RelId,
        graph: &Sociograph,
        origin: &Vertex,
        dest: &Vertex,
    ) -> bool {
        let before = self.members.len();
        self.members.retain(|member| *member != id);
        let removed = self.members.len() != before;
        self.recompute(graph, origin, dest);
        removed
    }

    /// Re-reads every member from the graph, dropping ones that no longer join this
    /// pair, and rebuilds the derived state.
    pub fn recompute(&mut self, graph: &Sociograph, origin: &Vertex, dest: &Vertex) {
        let (o, d) = (origin.label(), dest.label());
        let mut rels: Vec<&Relationship> = self
            .members
            .iter()
            .filter_map(|id| graph.relationship(*id))
            .filter(|rel| rel.spans(o, d))
            .collect();
        rels.sort_by(|a, b| b.rank().cmp(&a.rank()));
        self.members = rels.iter().map(|rel| rel.id).collect();
        self.aggregate = derive(rels, o, d);
    }

    /// The default selection target.
    pub fn heaviest(&self) -> Option<RelId> {
        self.members.first().copied()
    }

    /// Midpoint between the two vertex centers.
    pub fn center(&self, origin: &Vertex, dest: &Vertex) -> Point {
        origin.center().midpoint(dest.center())
    }

    /// The adjusted segment from the last successful draw.
    pub fn segment(&self) -> Option<(Point, Point)> {
        self.segment
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.group.bounds()
    }

    /// Repaints the line. An empty line draws nothing; coincident endpoints leave the
    /// line blank and report `DegenerateGeometry`.
    pub fn draw(
        &mut self,
        origin: &Vertex,
        dest: &Vertex,
        painter: &dyn EdgePainter,
    ) -> Result<(), DiagramError> {
        self.group.clear();
        self.segment = None;
        self.highlight = None;
        if self.is_empty() {
            return Ok(());
        }
        self.segment = Some(adjust_endpoints(origin, dest)?);
        let mut group = std::mem::take(&mut self.group);
        let painted = painter.paint(self, origin, dest, &mut group);
        self.group = group;
        painted?;
        if self.selected {
            self.highlight = Some(painter.show_selected(self, origin, dest)?);
        }
        Ok(())
    }

    pub fn set_selected(
        &mut self,
        state: bool,
        origin: &Vertex,
        dest: &Vertex,
        painter: &dyn EdgePainter,
    ) -> Result<(), DiagramError> {
        self.selected = state;
        self.highlight = None;
        if !state || self.is_empty() {
            return Ok(());
        }
        match painter.show_selected(self, origin, dest) {
            Ok(highlight) => self.highlight = Some(highlight),
            Err(DiagramError::DegenerateGeometry { origin, dest }) => {
                warn!(%origin, %dest, "vertices share a center; highlight not drawn");
            }
            Err(err) => {
                self.selected = false;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Member listing for hover text, heaviest first. `None` when nothing is drawn.
    pub fn tooltip(&self, graph: &Sociograph) -> Option<String> {
        if !(self.start_arrow() || self.end_arrow()) {
            return None;
        }
        let lines: Vec<String> = self
            .members
            .iter()
            .filter_map(|id| graph.relationship(*id))
            .map(|rel| {
                if rel.mutual {
                    format!("Both {}", rel.label)
                } else {
                    rel.to_string()
                }
            })
            .collect();
        Some(lines.join("\n"))
    }

    /// Distance from `point` to the drawn segment, in component-local coordinates.
    pub fn distance_to(&self, point: Point) -> Option<f32> {
        let (a, b) = self.segment?;
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len_sq = dx * dx + dy * dy;
        let t = if len_sq <= f32::EPSILON {
            0.0
        } else {
            (((point.x - a.x) * dx + (point.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
        };
        Some(point.distance(Point::new(a.x + t * dx, a.y + t * dy)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;

    fn pair(graph: &mut Sociograph) -> (Vertex, Vertex) {
        graph.add_node("A", []).unwrap();
        graph.add_node("B", []).unwrap();
        let a = Vertex::new(graph.node("A").unwrap(), Point::new(0.0, 0.0), vec![]);
        let b = Vertex::new(graph.node("B").unwrap(), Point::new(100.0, 0.0), vec![]);
        (a, b)
    }

    #[test]
    fn likes_then_distrusts() {
        let mut graph = Sociograph::new();
        let (a, b) = pair(&mut graph);
        let mut line = AggLine::new(0, 1);

        let likes = graph.add_relationship("likes", "A", "B", 5, false, []).unwrap();
        line.add_relationship(likes, &graph, &a, &b);
        assert!(!line.start_arrow());
        assert!(line.end_arrow());
        assert_eq!(line.width(), Some(5.0));
        assert_eq!(line.labels().to, Some((5, "likes".to_string())));

        let distrusts = graph
            .add_relationship("distrusts", "B", "A", 3, false, [])
            .unwrap();
        line.add_relationship(distrusts, &graph, &a, &b);
        assert_eq!(line.width(), Some(4.0));
        assert!(line.start_arrow());
        assert!(line.end_arrow());
        assert_eq!(line.labels().from, Some((3, "distrusts".to_string())));
        assert_eq!(line.labels().to, Some((5, "likes".to_string())));
        assert_eq!(line.labels().both, None);
    }

    #[test]
    fn mutual_sets_both_arrows() {
        let a = Relationship::new("trusts", "A", "B", 2, true);
        let aggregate = derive([&a], "A", "B");
        assert!(aggregate.start_arrow && aggregate.end_arrow);
        assert_eq!(aggregate.labels.both, Some((2, "trusts".to_string())));
        assert_eq!(aggregate.labels.to, None);
    }

    #[test]
    fn buckets_break_weight_ties_by_label() {
        let first = Relationship::new("admires", "A", "B", 4, false);
        let second = Relationship::new("envies", "A", "B", 4, false);
        let aggregate = derive([&first, &second], "A", "B");
        assert_eq!(aggregate.labels.to, Some((4, "envies".to_string())));
        let reversed = derive([&second, &first], "A", "B");
        assert_eq!(reversed, aggregate);
    }

    #[test]
    fn empty_membership_has_no_width() {
        assert_eq!(derive(Vec::<&Relationship>::new(), "A", "B"), Aggregate::default());
    }

    #[test]
    fn adding_twice_keeps_one_member() {
        let mut graph = Sociograph::new();
        let (a, b) = pair(&mut graph);
        let mut line = AggLine::new(0, 1);
        let id = graph.add_relationship("knows", "A", "B", 1, false, []).unwrap();
        line.add_relationship(id, &graph, &a, &b);
        graph.set_weight(id, 7).unwrap();
        line.add_relationship(id, &graph, &a, &b);
        assert_eq!(line.members(), &[id]);
        assert_eq!(line.width(), Some(7.0));
    }

    #[test]
    fn members_sort_heaviest_first() {
        let mut graph = Sociograph::new();
        let (a, b) = pair(&mut graph);
        let mut line = AggLine::new(0, 1);
        let light = graph.add_relationship("nods", "A", "B", 1, false, []).unwrap();
        let heavy = graph.add_relationship("hugs", "B", "A", 9, true, []).unwrap();
        line.add_relationship(light, &graph, &a, &b);
        line.add_relationship(heavy, &graph, &a, &b);
        assert_eq!(line.heaviest(), Some(heavy));
        assert_eq!(line.members(), &[heavy, light]);

        assert!(line.remove_relationship(heavy, &graph, &a, &b));
        assert_eq!(line.members(), &[light]);
        assert!(!line.remove_relationship(heavy, &graph, &a, &b));
    }

    #[test]
    fn tooltip_lists_members() {
        let mut graph = Sociograph::new();
        let (a, b) = pair(&mut graph);
        let mut line = AggLine::new(0, 1);
        assert_eq!(line.tooltip(&graph), None);
        let mutual = graph.add_relationship("trusts", "A", "B", 3, true, []).unwrap();
        let one_way = graph.add_relationship("owes", "B", "A", 1, false, []).unwrap();
        line.add_relationship(mutual, &graph, &a, &b);
        line.add_relationship(one_way, &graph, &a, &b);
        assert_eq!(line.tooltip(&graph).as_deref(), Some("Both trusts\nB owes A"));
    }

    #[test]
    fn endpoints_stop_at_radii() {
        let (start, end) = pull_in(Point::new(0.0, 0.0), 10.0, Point::new(100.0, 0.0), 20.0).unwrap();
        assert_eq!(start, Point::new(10.0, 0.0));
        assert_eq!(end, Point::new(80.0, 0.0));
        assert!(pull_in(Point::new(3.0, 3.0), 1.0, Point::new(3.0, 3.0), 1.0).is_none());
    }

    #[test]
    fn coincident_vertices_are_degenerate() {
        let a = Vertex::new(&Node::new("A"), Point::new(5.0, 5.0), vec![]);
        let b = Vertex::new(&Node::new("B"), Point::new(5.0, 5.0), vec![]);
        assert_eq!(
            adjust_endpoints(&a, &b),
            Err(DiagramError::DegenerateGeometry {
                origin: "A".to_string(),
                dest: "B".to_string(),
            })
        );
    }
}
