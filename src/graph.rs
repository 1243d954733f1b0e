use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::GraphError;
use crate::model::{AttrId, Attribute, Attributes, Node, NodeId, RelId, Relationship};

/// Unordered pair of node labels identifying one edge slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    low: String,
    high: String,
}

impl EdgeKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self {
                low: a.to_string(),
                high: b.to_string(),
            }
        } else {
            Self {
                low: b.to_string(),
                high: a.to_string(),
            }
        }
    }

    pub fn ends(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.low == label || self.high == label
    }

    pub fn other(&self, label: &str) -> Option<&str> {
        if self.low == label {
            Some(&self.high)
        } else if self.high == label {
            Some(&self.low)
        } else {
            None
        }
    }
}

/// What happened to an edge slot after a relationship was added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeChange {
    Created,
    Extended,
    Retained,
    Removed,
}

/// Result of moving a relationship between endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeMove {
    /// The relationship still joins the same pair of nodes (no-op or a swap).
    SamePair,
    /// The relationship now sits on a different edge slot.
    Rewired,
}

/// A maximal connected set of nodes and the edge slots between them.
#[derive(Debug, Clone, PartialEq)]
pub struct Subgraph {
    pub nodes: Vec<String>,
    pub edges: Vec<EdgeKey>,
}

/// Node store plus the undirected multigraph of relationships, keyed by node label.
#[derive(Debug, Clone, Default)]
pub struct Sociograph {
    nodes: BTreeMap<String, Node>,
    relationships: HashMap<RelId, Relationship>,
    edges: BTreeMap<EdgeKey, Vec<RelId>>,
}

impl Sociograph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        label: &str,
        attrs: impl IntoIterator<Item = Attribute>,
    ) -> Result<NodeId, GraphError> {
        self.insert_node(Node::new(label).with_attributes(attrs))
    }

    /// Adds a fully formed node, keeping its id. Used when loading documents.
    pub fn insert_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if node.label.trim().is_empty() {
            return Err(GraphError::BlankLabel);
        }
        if self.nodes.contains_key(&node.label) {
            return Err(GraphError::DuplicateLabel(node.label));
        }
        let id = node.id;
        self.nodes.insert(node.label.clone(), node);
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
    ) -> Result<RelId, GraphError> {
        let mut rel = Relationship::new(label, from, to, weight, mutual);
        rel.attributes = attrs.into_iter().collect();
        let id = rel.id;
        self.insert_relationship(rel)?;
        Ok(id)
    }

    /// Adds a fully formed relationship, keeping its id.
    pub fn insert_relationship(&mut self, rel: Relationship) -> Result<EdgeChange, GraphError> {
        self.check_endpoints(&rel.origin, &rel.destination)?;
        let id = rel.id;
        if let Some(old) = self.relationships.get(&id).cloned() {
            self.detach(&old);
        }
        let key = EdgeKey::new(&rel.origin, &rel.destination);
        self.relationships.insert(id, rel);
        Ok(self.attach(key, id))
    }

    /// Removes a relationship and reports whether its edge slot survived.
    pub fn remove_relationship(&mut self, id: RelId) -> Result<EdgeChange, GraphError> {
        let rel = self
            .relationships
            .remove(&id)
            .ok_or(GraphError::MissingRelationship(id))?;
        Ok(self.detach(&rel))
    }

    /// Re-points a relationship. Passing the current destination as the new origin (or
    /// the reverse) swaps the two ends without leaving the edge slot.
    pub fn move_relationship(
        &mut self,
        id: RelId,
        origin: Option<&str>,
        dest: Option<&str>,
    ) -> Result<EdgeMove, GraphError> {
        let rel = self
            .relationships
            .get(&id)
            .ok_or(GraphError::MissingRelationship(id))?;
        if origin.is_none() && dest.is_none() {
            return Ok(EdgeMove::SamePair);
        }
        let new_origin = origin.unwrap_or(&rel.origin).to_string();
        let new_dest = dest.unwrap_or(&rel.destination).to_string();
        self.check_endpoints(&new_origin, &new_dest)?;

        let old_key = EdgeKey::new(&rel.origin, &rel.destination);
        let new_key = EdgeKey::new(&new_origin, &new_dest);
        let rel = rel.clone();
        self.detach(&rel);
        if let Some(stored) = self.relationships.get_mut(&id) {
            stored.origin = new_origin;
            stored.destination = new_dest;
        }
        self.attach(new_key.clone(), id);
        if old_key == new_key {
            Ok(EdgeMove::SamePair)
        } else {
            Ok(EdgeMove::Rewired)
        }
    }

    /// Removes a node together with every relationship touching it.
    pub fn remove_node(&mut self, label: &str) -> Result<Node, GraphError> {
        if !self.nodes.contains_key(label) {
            return Err(GraphError::MissingNode(label.to_string()));
        }
        let touching: Vec<RelId> = self
            .relationships
            .values()
            .filter(|rel| rel.touches(label))
            .map(|rel| rel.id)
            .collect();
        for id in touching {
            if let Some(rel) = self.relationships.remove(&id) {
                self.detach(&rel);
            }
        }
        self.nodes
            .remove(label)
            .ok_or_else(|| GraphError::MissingNode(label.to_string()))
    }

    /// Renames a node, rewriting relationship endpoints and edge slot keys.
    pub fn relabel_node(&mut self, old: &str, new: &str) -> Result<(), GraphError> {
        if new.trim().is_empty() {
            return Err(GraphError::BlankLabel);
        }
        if !self.nodes.contains_key(old) {
            return Err(GraphError::MissingNode(old.to_string()));
        }
        if old == new {
            return Ok(());
        }
        if self.nodes.contains_key(new) {
            return Err(GraphError::DuplicateLabel(new.to_string()));
        }

        if let Some(mut node) = self.nodes.remove(old) {
            node.label = new.to_string();
            self.nodes.insert(new.to_string(), node);
        }
        for rel in self.relationships.values_mut() {
            if rel.origin == old {
                rel.origin = new.to_string();
            }
            if rel.destination == old {
                rel.destination = new.to_string();
            }
        }
        let stale: Vec<EdgeKey> = self
            .edges
            .keys()
            .filter(|key| key.contains(old))
            .cloned()
            .collect();
        for key in stale {
            if let (Some(rels), Some(other)) = (self.edges.remove(&key), key.other(old)) {
                self.edges.insert(EdgeKey::new(new, other), rels);
            }
        }
        Ok(())
    }

    pub fn relabel_relationship(&mut self, id: RelId, label: &str) -> Result<(), GraphError> {
        if label.trim().is_empty() {
            return Err(GraphError::BlankLabel);
        }
        self.relationship_mut(id)?.label = label.to_string();
        Ok(())
    }

    pub fn set_weight(&mut self, id: RelId, weight: i32) -> Result<(), GraphError> {
        self.relationship_mut(id)?.weight = weight;
        Ok(())
    }

    pub fn set_mutual(&mut self, id: RelId, mutual: bool) -> Result<(), GraphError> {
        self.relationship_mut(id)?.mutual = mutual;
        Ok(())
    }

    pub fn set_node_notes(&mut self, label: &str, notes: &str) -> Result<(), GraphError> {
        self.node_mut(label)?.notes = notes.to_string();
        Ok(())
    }

    pub fn set_relationship_notes(&mut self, id: RelId, notes: &str) -> Result<(), GraphError> {
        self.relationship_mut(id)?.notes = notes.to_string();
        Ok(())
    }

    pub fn node_attributes_mut(&mut self, label: &str) -> Result<&mut Attributes, GraphError> {
        Ok(&mut self.node_mut(label)?.attributes)
    }

    pub fn relationship_attributes_mut(
        &mut self,
        id: RelId,
    ) -> Result<&mut Attributes, GraphError> {
        Ok(&mut self.relationship_mut(id)?.attributes)
    }

    pub fn remove_node_attribute(&mut self, label: &str, attr: AttrId) -> Result<Attribute, GraphError> {
        self.node_attributes_mut(label)?.remove(attr)
    }

    pub fn remove_relationship_attribute(
        &mut self,
        id: RelId,
        attr: AttrId,
    ) -> Result<Attribute, GraphError> {
        self.relationship_attributes_mut(id)?.remove(attr)
    }

    pub fn node(&self, label: &str) -> Option<&Node> {
        self.nodes.get(label)
    }

    pub fn contains_node(&self, label: &str) -> bool {
        self.nodes.contains_key(label)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship(&self, id: RelId) -> Option<&Relationship> {
        self.relationships.get(&id)
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Relationship ids on the slot joining `a` and `b`, in insertion order.
    pub fn edge(&self, a: &str, b: &str) -> Option<&[RelId]> {
        self.edges.get(&EdgeKey::new(a, b)).map(Vec::as_slice)
    }

    pub fn edges(&self) -> impl Iterator<Item = (&EdgeKey, &[RelId])> {
        self.edges.iter().map(|(key, rels)| (key, rels.as_slice()))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn neighbors(&self, label: &str) -> Vec<&str> {
        self.edges
            .keys()
            .filter_map(|key| key.other(label))
            .collect()
    }

    /// Splits the graph into connected components. Components and their node lists are
    /// sorted so the result is stable for a given graph.
    pub fn components(&self) -> Vec<Subgraph> {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for key in self.edges.keys() {
            let (a, b) = key.ends();
            adjacency.entry(a).or_default().push(b);
            adjacency.entry(b).or_default().push(a);
        }

        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut components = Vec::new();
        for label in self.nodes.keys() {
            if !visited.insert(label.as_str()) {
                continue;
            }
            let mut stack = vec![label.as_str()];
            let mut members = BTreeSet::new();
            while let Some(cur) = stack.pop() {
                members.insert(cur);
                if let Some(neighbors) = adjacency.get(cur) {
                    for &next in neighbors {
                        if visited.insert(next) {
                            stack.push(next);
                        }
                    }
                }
            }
            let edges = self
                .edges
                .keys()
                .filter(|key| members.contains(key.ends().0))
                .cloned()
                .collect();
            components.push(Subgraph {
                nodes: members.into_iter().map(str::to_string).collect(),
                edges,
            });
        }
        components
    }

    fn node_mut(&mut self, label: &str) -> Result<&mut Node, GraphError> {
        self.nodes
            .get_mut(label)
            .ok_or_else(|| GraphError::MissingNode(label.to_string()))
    }

    fn relationship_mut(&mut self, id: RelId) -> Result<&mut Relationship, GraphError> {
        self.relationships
            .get_mut(&id)
            .ok_or(GraphError::MissingRelationship(id))
    }

    fn check_endpoints(&self, origin: &str, dest: &str) -> Result<(), GraphError> {
        for end in [origin, dest] {
            if !self.nodes.contains_key(end) {
                return Err(GraphError::MissingNode(end.to_string()));
            }
        }
        if origin == dest {
            return Err(GraphError::SelfRelationship(origin.to_string()));
        }
        Ok(())
    }

    fn attach(&mut self, key: EdgeKey, id: RelId) -> EdgeChange {
        match self.edges.get_mut(&key) {
            Some(rels) => {
                rels.push(id);
                EdgeChange::Extended
            }
            None => {
                self.edges.insert(key, vec![id]);
                EdgeChange::Created
            }
        }
    }

    fn detach(&mut self, rel: &Relationship) -> EdgeChange {
        let key = EdgeKey::new(&rel.origin, &rel.destination);
        let Some(rels) = self.edges.get_mut(&key) else {
            return EdgeChange::Removed;
        };
        rels.retain(|id| *id != rel.id);
        if rels.is_empty() {
            self.edges.remove(&key);
            EdgeChange::Removed
        } else {
            EdgeChange::Retained
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> Sociograph {
        let mut graph = Sociograph::new();
        graph.add_node("A", []).unwrap();
        graph.add_node("B", []).unwrap();
        graph
    }

    fn assert_no_empty_slots(graph: &Sociograph) {
        for (key, rels) in graph.edges() {
            assert!(!rels.is_empty(), "empty slot {:?}", key);
        }
    }

    #[test]
    fn duplicate_label_is_rejected() {
        let mut graph = pair();
        assert_eq!(
            graph.add_node("A", []),
            Err(GraphError::DuplicateLabel("A".to_string()))
        );
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn relationship_needs_both_endpoints() {
        let mut graph = pair();
        let err = graph.add_relationship("likes", "A", "C", 1, false, []);
        assert_eq!(err, Err(GraphError::MissingNode("C".to_string())));
        assert_eq!(graph.relationship_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn relationships_share_an_unordered_slot() {
        let mut graph = pair();
        let likes = graph.add_relationship("likes", "A", "B", 5, false, []).unwrap();
        let distrusts = graph
            .add_relationship("distrusts", "B", "A", 3, false, [])
            .unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge("B", "A"), Some(&[likes, distrusts][..]));
    }

    #[test]
    fn removing_last_relationship_removes_slot() {
        let mut graph = pair();
        let likes = graph.add_relationship("likes", "A", "B", 5, false, []).unwrap();
        let knows = graph.add_relationship("knows", "B", "A", 1, true, []).unwrap();
        assert_eq!(graph.remove_relationship(knows), Ok(EdgeChange::Retained));
        assert_eq!(graph.edge("A", "B").map(<[RelId]>::len), Some(1));
        assert_eq!(graph.remove_relationship(likes), Ok(EdgeChange::Removed));
        assert_eq!(graph.edge("A", "B"), None);
        assert_no_empty_slots(&graph);
    }

    #[test]
    fn move_handles_swap_without_dropping() {
        let mut graph = pair();
        let likes = graph.add_relationship("likes", "A", "B", 5, false, []).unwrap();
        let moved = graph.move_relationship(likes, Some("B"), Some("A")).unwrap();
        assert_eq!(moved, EdgeMove::SamePair);
        let rel = graph.relationship(likes).unwrap();
        assert_eq!((rel.origin.as_str(), rel.destination.as_str()), ("B", "A"));
        assert_eq!(graph.edge("A", "B"), Some(&[likes][..]));
    }

    #[test]
    fn move_to_new_pair_rewires_slots() {
        let mut graph = pair();
        graph.add_node("C", []).unwrap();
        let likes = graph.add_relationship("likes", "A", "B", 5, false, []).unwrap();
        assert_eq!(
            graph.move_relationship(likes, None, Some("C")),
            Ok(EdgeMove::Rewired)
        );
        assert_eq!(graph.edge("A", "B"), None);
        assert_eq!(graph.edge("A", "C"), Some(&[likes][..]));
    }

    #[test]
    fn failed_move_leaves_graph_untouched() {
        let mut graph = pair();
        let likes = graph.add_relationship("likes", "A", "B", 5, false, []).unwrap();
        assert_eq!(
            graph.move_relationship(likes, Some("B"), None),
            Err(GraphError::SelfRelationship("B".to_string()))
        );
        assert_eq!(
            graph.move_relationship(likes, Some("Z"), None),
            Err(GraphError::MissingNode("Z".to_string()))
        );
        assert_eq!(graph.relationship(likes).unwrap().origin, "A");
        assert_eq!(graph.edge("A", "B"), Some(&[likes][..]));
    }

    #[test]
    fn removing_node_drops_touching_relationships() {
        let mut graph = pair();
        graph.add_node("C", []).unwrap();
        graph.add_relationship("likes", "A", "B", 5, false, []).unwrap();
        graph.add_relationship("fears", "C", "A", 2, false, []).unwrap();
        let keep = graph.add_relationship("helps", "B", "C", 4, true, []).unwrap();
        graph.remove_node("A").unwrap();
        assert_eq!(graph.relationship_count(), 1);
        assert!(graph.relationship(keep).is_some());
        for rel in graph.relationships() {
            assert!(graph.contains_node(&rel.origin));
            assert!(graph.contains_node(&rel.destination));
        }
        assert_eq!(graph.edge_count(), 1);
        assert_no_empty_slots(&graph);
    }

    #[test]
    fn relabel_rewrites_endpoints_and_keys() {
        let mut graph = pair();
        graph.add_node("C", []).unwrap();
        let likes = graph.add_relationship("likes", "A", "B", 5, false, []).unwrap();
        let fears = graph.add_relationship("fears", "C", "A", 2, false, []).unwrap();
        graph.relabel_node("A", "Ann").unwrap();

        assert!(!graph.contains_node("A"));
        assert_eq!(graph.node("Ann").map(|n| n.label.as_str()), Some("Ann"));
        assert_eq!(graph.relationship(likes).unwrap().origin, "Ann");
        assert_eq!(graph.relationship(fears).unwrap().destination, "Ann");
        assert_eq!(graph.edge("Ann", "B"), Some(&[likes][..]));
        assert_eq!(graph.edge("C", "Ann"), Some(&[fears][..]));
        assert!(graph.edges().all(|(key, _)| !key.contains("A")));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn relabel_to_taken_label_fails_cleanly() {
        let mut graph = pair();
        let likes = graph.add_relationship("likes", "A", "B", 5, false, []).unwrap();
        assert_eq!(
            graph.relabel_node("A", "B"),
            Err(GraphError::DuplicateLabel("B".to_string()))
        );
        assert_eq!(graph.relationship(likes).unwrap().origin, "A");
        assert!(graph.contains_node("A"));
    }

    #[test]
    fn components_are_split_and_sorted() {
        let mut graph = pair();
        for label in ["C", "D", "E"] {
            graph.add_node(label, []).unwrap();
        }
        graph.add_relationship("likes", "A", "B", 1, false, []).unwrap();
        graph.add_relationship("knows", "D", "C", 1, false, []).unwrap();
        let components = graph.components();
        let nodes: Vec<Vec<String>> = components.iter().map(|c| c.nodes.clone()).collect();
        assert_eq!(
            nodes,
            vec![
                vec!["A".to_string(), "B".to_string()],
                vec!["C".to_string(), "D".to_string()],
                vec!["E".to_string()],
            ]
        );
        assert_eq!(components[1].edges, vec![EdgeKey::new("C", "D")]);
        assert!(components[2].edges.is_empty());
    }

    #[test]
    fn slots_never_empty_under_churn() {
        let mut graph = pair();
        graph.add_node("C", []).unwrap();
        let mut ids = Vec::new();
        for (i, (a, b)) in [("A", "B"), ("B", "C"), ("C", "A"), ("B", "A")]
            .iter()
            .enumerate()
        {
            ids.push(graph.add_relationship("r", a, b, i as i32, false, []).unwrap());
        }
        for id in ids.iter().step_by(2) {
            graph.remove_relationship(*id).unwrap();
            assert_no_empty_slots(&graph);
        }
        graph.move_relationship(ids[1], Some("A"), None).unwrap();
        assert_no_empty_slots(&graph);
        graph.remove_node("B").unwrap();
        assert_no_empty_slots(&graph);
    }
}
