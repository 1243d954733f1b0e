use tracing::debug;

use crate::canvas::{Canvas, RefreshOutcome, Selection, Touch, Vertex};
use crate::error::{DiagramError, GraphError};
use crate::graph::Sociograph;
use crate::layout::Point;
use crate::model::{AttrId, Attribute, NodeId, RelId};

/// An editing session over one graph and its canvas. Each edit updates the graph and
/// then either refreshes the touched objects or redraws the whole diagram.
pub struct Editor {
    graph: Sociograph,
    canvas: Canvas,
    /// Relationship being edited while a line is selected.
    picked: Option<RelId>,
}

impl Editor {
    /// Takes ownership of the graph and draws it.
    pub fn open(graph: Sociograph, canvas: Canvas) -> Result<Self, DiagramError> {
        let mut editor = Self {
            graph,
            canvas,
            picked: None,
        };
        editor.canvas.redraw(&editor.graph)?;
        Ok(editor)
    }

    pub fn graph(&self) -> &Sociograph {
        &self.graph
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn into_graph(self) -> Sociograph {
        self.graph
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.canvas.selection()
    }

    /// The relationship an edge selection currently edits.
    pub fn picked_relationship(&self) -> Option<RelId> {
        self.picked
    }

    /// New layout for everything, keeping the selection where possible.
    pub fn redraw(&mut self) -> Result<(), DiagramError> {
        self.canvas.redraw(&self.graph)?;
        self.follow_picked();
        Ok(())
    }

    pub fn add_node(
        &mut self,
        label: &str,
        attrs: impl IntoIterator<Item = Attribute>,
    ) -> Result<NodeId, DiagramError> {
        let id = self.graph.add_node(label, attrs)?;
        self.redraw()?;
        Ok(id)
    }

    pub fn add_relationship(
        &mut self,
        label: &str,
        from: &str,
        to: &str,
        weight: i32,
        mutual: bool,
        attrs: impl IntoIterator<Item = Attribute>,
    ) -> Result<RelId, DiagramError> {
        let id = self
            .graph
            .add_relationship(label, from, to, weight, mutual, attrs)?;
        self.redraw()?;
        Ok(id)
    }

    /// Selects a vertex or line. A line starts out editing its heaviest relationship.
    pub fn select(&mut self, target: Selection) -> Result<(), DiagramError> {
        self.picked = self.canvas.select(target)?;
        Ok(())
    }

    /// Chooses which member of the selected line to edit.
    pub fn pick_relationship(&mut self, id: RelId) -> Result<(), DiagramError> {
        let Some(Selection::Line(a, b)) = self.canvas.selection() else {
            return Err(GraphError::MissingRelationship(id).into());
        };
        let line = self
            .canvas
            .line(a, b)
            .ok_or_else(|| DiagramError::MissingLine(a.clone(), b.clone()))?;
        if !line.members().contains(&id) {
            return Err(GraphError::MissingRelationship(id).into());
        }
        self.picked = Some(id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.canvas.clear_selection();
        self.picked = None;
    }

    /// Selects the node labelled `label` and returns its canvas center so a view can
    /// scroll to it.
    pub fn find_node(&mut self, label: &str) -> Result<Point, DiagramError> {
        if !self.graph.contains_node(label) {
            return Err(GraphError::MissingNode(label.to_string()).into());
        }
        self.select(Selection::Vertex(label.to_string()))?;
        self.canvas
            .vertex_center(label)
            .ok_or_else(|| DiagramError::MissingVertex(label.to_string()))
    }

    pub fn relabel_node(&mut self, old: &str, new: &str) -> Result<RefreshOutcome, DiagramError> {
        self.graph.relabel_node(old, new)?;
        self.refresh(Touch::Node {
            label: new.to_string(),
            previous_label: Some(old.to_string()),
        })
    }

    pub fn relabel_relationship(
        &mut self,
        id: RelId,
        label: &str,
    ) -> Result<RefreshOutcome, DiagramError> {
        self.graph.relabel_relationship(id, label)?;
        self.refresh(Touch::Relationship(id))
    }

    pub fn set_weight(&mut self, id: RelId, weight: i32) -> Result<RefreshOutcome, DiagramError> {
        self.graph.set_weight(id, weight)?;
        self.refresh(Touch::Relationship(id))
    }

    pub fn set_mutual(&mut self, id: RelId, mutual: bool) -> Result<RefreshOutcome, DiagramError> {
        self.graph.set_mutual(id, mutual)?;
        self.refresh(Touch::Relationship(id))
    }

    /// Gives a relationship a new origin. Naming the current destination swaps the two
    /// ends and only refreshes; any other origin needs a new layout.
    pub fn move_origin(&mut self, id: RelId, origin: &str) -> Result<RefreshOutcome, DiagramError> {
        let rel = self
            .graph
            .relationship(id)
            .ok_or(GraphError::MissingRelationship(id))?;
        if rel.origin == origin {
            return Ok(RefreshOutcome::Refreshed);
        }
        if rel.destination == origin {
            let old_origin = rel.origin.clone();
            self.graph
                .move_relationship(id, Some(origin), Some(&old_origin))?;
            return self.refresh(Touch::Relationship(id));
        }
        self.graph.move_relationship(id, Some(origin), None)?;
        self.redraw()?;
        Ok(RefreshOutcome::Redrawn)
    }

    /// Gives a relationship a new destination, swapping ends when the new destination is
    /// the current origin.
    pub fn move_destination(
        &mut self,
        id: RelId,
        dest: &str,
    ) -> Result<RefreshOutcome, DiagramError> {
        let rel = self
            .graph
            .relationship(id)
            .ok_or(GraphError::MissingRelationship(id))?;
        if rel.destination == dest {
            return Ok(RefreshOutcome::Refreshed);
        }
        if rel.origin == dest {
            let old_dest = rel.destination.clone();
            self.graph
                .move_relationship(id, Some(&old_dest), Some(dest))?;
            return self.refresh(Touch::Relationship(id));
        }
        self.graph.move_relationship(id, None, Some(dest))?;
        self.redraw()?;
        Ok(RefreshOutcome::Redrawn)
    }

    /// Deletes the selected node, or the picked relationship of the selected line.
    /// `None` when nothing is selected.
    pub fn delete_selection(&mut self) -> Result<Option<RefreshOutcome>, DiagramError> {
        match self.canvas.selection().cloned() {
            None => Ok(None),
            Some(Selection::Vertex(label)) => {
                self.graph.remove_node(&label)?;
                self.clear_selection();
                self.redraw()?;
                Ok(Some(RefreshOutcome::Redrawn))
            }
            Some(Selection::Line(a, b)) => {
                let id = match self.picked {
                    Some(id) => id,
                    None => self
                        .canvas
                        .line(&a, &b)
                        .and_then(|line| line.heaviest())
                        .ok_or_else(|| DiagramError::MissingLine(a.clone(), b.clone()))?,
                };
                let outcome = self.refresh(Touch::RelationshipDeleted(id))?;
                self.picked = match self.canvas.selection() {
                    Some(Selection::Line(a, b)) => {
                        self.canvas.line(a, b).and_then(|line| line.heaviest())
                    }
                    _ => None,
                };
                Ok(Some(outcome))
            }
        }
    }

    pub fn set_node_notes(&mut self, label: &str, notes: &str) -> Result<(), DiagramError> {
        self.graph.set_node_notes(label, notes)?;
        Ok(())
    }

    pub fn set_relationship_notes(&mut self, id: RelId, notes: &str) -> Result<(), DiagramError> {
        self.graph.set_relationship_notes(id, notes)?;
        Ok(())
    }

    /// Adds or replaces (by id) an attribute on a node.
    pub fn set_node_attribute(
        &mut self,
        label: &str,
        attr: Attribute,
    ) -> Result<AttrId, DiagramError> {
        let id = self.graph.node_attributes_mut(label)?.insert(attr);
        self.refresh(Touch::Node {
            label: label.to_string(),
            previous_label: None,
        })?;
        Ok(id)
    }

    pub fn remove_node_attribute(
        &mut self,
        label: &str,
        attr: AttrId,
    ) -> Result<Attribute, DiagramError> {
        let removed = self.graph.remove_node_attribute(label, attr)?;
        self.refresh(Touch::Node {
            label: label.to_string(),
            previous_label: None,
        })?;
        Ok(removed)
    }

    pub fn set_relationship_attribute(
        &mut self,
        id: RelId,
        attr: Attribute,
    ) -> Result<AttrId, DiagramError> {
        let attr_id = self.graph.relationship_attributes_mut(id)?.insert(attr);
        self.refresh(Touch::Relationship(id))?;
        Ok(attr_id)
    }

    pub fn remove_relationship_attribute(
        &mut self,
        id: RelId,
        attr: AttrId,
    ) -> Result<Attribute, DiagramError> {
        let removed = self.graph.remove_relationship_attribute(id, attr)?;
        self.refresh(Touch::Relationship(id))?;
        Ok(removed)
    }

    /// Hover text for whatever lies under a canvas point.
    pub fn tooltip_at(&self, point: Point) -> Option<String> {
        match self.canvas.hit_test(point)? {
            Selection::Vertex(label) => Vertex::tooltip(self.graph.node(&label)?),
            Selection::Line(a, b) => self.canvas.line(&a, &b)?.tooltip(&self.graph),
        }
    }

    /// Targeted refresh, falling back to a full redraw when the canvas no longer has the
    /// object the touch names.
    fn refresh(&mut self, touch: Touch) -> Result<RefreshOutcome, DiagramError> {
        match self.canvas.refresh(&mut self.graph, touch) {
            Err(DiagramError::MissingLine(..) | DiagramError::MissingVertex(_)) => {
                debug!("touched object not on canvas; redrawing");
                self.redraw()?;
                Ok(RefreshOutcome::Redrawn)
            }
            other => other,
        }
    }

    /// After a redraw, keeps an edge selection on the line that now holds the picked
    /// relationship.
    fn follow_picked(&mut self) {
        let Some(id) = self.picked else {
            return;
        };
        let target = self
            .graph
            .relationship(id)
            .map(|rel| Selection::Line(rel.origin.clone(), rel.destination.clone()));
        let reselected = match target {
            Some(target) => self.canvas.select(target).is_ok(),
            None => false,
        };
        if !reselected {
            self.picked = match self.canvas.selection() {
                Some(Selection::Line(a, b)) => self.canvas.line(a, b).and_then(|line| line.heaviest()),
                _ => None,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::canvas::Painters;
    use crate::config::{Config, LayoutConfig};

    fn row(nodes: &[String], _edges: &[(String, String)]) -> HashMap<String, Point> {
        nodes
            .iter()
            .enumerate()
            .map(|(i, label)| (label.clone(), Point::new(i as f32 * 180.0, (i % 2) as f32 * 60.0)))
            .collect()
    }

    fn editor(graph: Sociograph) -> Editor {
        let config = Config::default();
        let layout = LayoutConfig {
            fast_text_metrics: true,
            ..config.layout.clone()
        };
        let painters = Painters::standard(&config.theme.vertex, &config.theme.edge, &layout);
        Editor::open(graph, Canvas::with_parts(layout, painters, row)).unwrap()
    }

    fn people() -> (Sociograph, RelId, RelId) {
        let mut graph = Sociograph::new();
        for label in ["Ann", "Bob", "Cy"] {
            graph.add_node(label, []).unwrap();
        }
        let likes = graph.add_relationship("likes", "Ann", "Bob", 5, false, []).unwrap();
        let owes = graph.add_relationship("owes", "Bob", "Cy", 2, false, []).unwrap();
        (graph, likes, owes)
    }

    #[test]
    fn adding_nodes_redraws() {
        let (graph, _, _) = people();
        let mut editor = editor(graph);
        assert_eq!(editor.canvas().components().len(), 1);
        editor.add_node("Dee", []).unwrap();
        assert_eq!(editor.canvas().components().len(), 2);
        assert!(matches!(
            editor.add_node("Dee", []),
            Err(DiagramError::Graph(GraphError::DuplicateLabel(_)))
        ));
    }

    #[test]
    fn swapping_ends_only_refreshes() {
        let (graph, likes, _) = people();
        let mut editor = editor(graph);
        let before = editor.canvas().vertex_center("Ann");
        assert_eq!(editor.move_origin(likes, "Bob").unwrap(), RefreshOutcome::Refreshed);
        let rel = editor.graph().relationship(likes).unwrap();
        assert_eq!((rel.origin.as_str(), rel.destination.as_str()), ("Bob", "Ann"));
        let line = editor.canvas().line("Ann", "Bob").unwrap();
        assert!(line.start_arrow());
        assert!(!line.end_arrow());
        assert_eq!(editor.canvas().vertex_center("Ann"), before);
    }

    #[test]
    fn rewiring_redraws_and_follows_selection() {
        let (graph, likes, _) = people();
        let mut editor = editor(graph);
        editor
            .select(Selection::Line("Ann".to_string(), "Bob".to_string()))
            .unwrap();
        assert_eq!(editor.picked_relationship(), Some(likes));
        assert_eq!(editor.move_destination(likes, "Cy").unwrap(), RefreshOutcome::Redrawn);
        assert!(editor.canvas().line("Ann", "Bob").is_none());
        assert_eq!(
            editor.selection(),
            Some(&Selection::Line("Ann".to_string(), "Cy".to_string()))
        );
        assert_eq!(editor.picked_relationship(), Some(likes));
    }

    #[test]
    fn failed_move_changes_nothing() {
        let (graph, likes, _) = people();
        let mut editor = editor(graph);
        assert!(editor.move_origin(likes, "Nobody").is_err());
        let rel = editor.graph().relationship(likes).unwrap();
        assert_eq!(rel.origin, "Ann");
    }

    #[test]
    fn deleting_a_selected_node_drops_its_lines() {
        let (graph, _, _) = people();
        let mut editor = editor(graph);
        editor.select(Selection::Vertex("Bob".to_string())).unwrap();
        assert_eq!(editor.delete_selection().unwrap(), Some(RefreshOutcome::Redrawn));
        assert!(editor.selection().is_none());
        assert_eq!(editor.graph().relationship_count(), 0);
        assert_eq!(editor.canvas().components().len(), 2);
        assert_eq!(editor.delete_selection().unwrap(), None);
    }

    #[test]
    fn deleting_one_member_keeps_the_line_selected() {
        let (graph, likes, _) = people();
        let mut editor = editor(graph);
        let dislikes = editor
            .add_relationship("dislikes", "Bob", "Ann", 1, false, [])
            .unwrap();
        editor
            .select(Selection::Line("Ann".to_string(), "Bob".to_string()))
            .unwrap();
        editor.pick_relationship(dislikes).unwrap();
        assert_eq!(editor.delete_selection().unwrap(), Some(RefreshOutcome::Refreshed));
        assert_eq!(editor.picked_relationship(), Some(likes));
        assert_eq!(editor.delete_selection().unwrap(), Some(RefreshOutcome::Redrawn));
        assert!(editor.selection().is_none());
        assert!(editor.canvas().line("Ann", "Bob").is_none());
    }

    #[test]
    fn attribute_edits_reach_tooltips() {
        let (graph, _, _) = people();
        let mut editor = editor(graph);
        let id = editor
            .set_node_attribute("Cy", Attribute::new("team", "blue", true))
            .unwrap();
        let center = editor.find_node("Cy").unwrap();
        assert_eq!(editor.tooltip_at(center).as_deref(), Some("team: blue"));
        editor.remove_node_attribute("Cy", id).unwrap();
        assert_eq!(editor.tooltip_at(center), None);
        assert!(editor.find_node("Zed").is_err());
    }

    #[test]
    fn weight_edits_refresh_width() {
        let (graph, _, owes) = people();
        let mut editor = editor(graph);
        assert_eq!(editor.set_weight(owes, 8).unwrap(), RefreshOutcome::Refreshed);
        assert_eq!(editor.canvas().line("Bob", "Cy").unwrap().width(), Some(8.0));
        editor.set_mutual(owes, true).unwrap();
        assert!(editor.canvas().line("Cy", "Bob").unwrap().start_arrow());
        editor.relabel_relationship(owes, "pays").unwrap();
        assert_eq!(
            editor.canvas().line("Cy", "Bob").unwrap().labels().both,
            Some((8, "pays".to_string()))
        );
    }
}
