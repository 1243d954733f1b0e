use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::graph::Sociograph;
use crate::model::{Node, Relationship};

/// Saved form of a graph. Relationships are listed edge slot by edge slot, so loading
/// a saved document rebuilds the same slot order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl GraphDocument {
    /// Parses JSON; comments, trailing commas and unquoted keys are accepted as well.
    pub fn parse(input: &str) -> Result<Self> {
        json5::from_str(input).context("invalid graph document")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&contents)
    }

    pub fn from_graph(graph: &Sociograph) -> Self {
        let nodes = graph.nodes().cloned().collect();
        let relationships = graph
            .edges()
            .flat_map(|(_, rels)| rels.iter())
            .filter_map(|id| graph.relationship(*id))
            .cloned()
            .collect();
        Self {
            nodes,
            relationships,
        }
    }

    /// Builds the graph, keeping every id. Fails on the first invalid entry.
    pub fn into_graph(self) -> Result<Sociograph, GraphError> {
        let mut graph = Sociograph::new();
        for node in self.nodes {
            graph.insert_node(node)?;
        }
        for rel in self.relationships {
            graph.insert_relationship(rel)?;
        }
        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attribute;

    #[test]
    fn relaxed_json_is_accepted() {
        let doc = GraphDocument::parse(
            r#"{
                // people
                nodes: [{ label: "Ann" }, { label: "Bob", notes: "new hire" }],
                relationships: [
                    { label: "mentors", from: "Ann", to: "Bob", weight: 3 },
                ],
            }"#,
        )
        .unwrap();
        let graph = doc.into_graph().unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.node("Bob").unwrap().notes, "new hire");
        let rels = graph.edge("Bob", "Ann").unwrap();
        let rel = graph.relationship(rels[0]).unwrap();
        assert_eq!((rel.weight, rel.mutual), (3, false));
    }

    #[test]
    fn saved_graph_reloads_identically() {
        let mut graph = Sociograph::new();
        graph
            .add_node("Ann", [Attribute::new("age", "30", true)])
            .unwrap();
        graph.add_node("Bob", []).unwrap();
        graph.add_node("Cy", []).unwrap();
        let first = graph.add_relationship("owes", "Bob", "Ann", 2, false, []).unwrap();
        let second = graph.add_relationship("likes", "Ann", "Bob", 4, true, []).unwrap();
        graph.add_relationship("knows", "Cy", "Ann", 1, false, []).unwrap();

        let json = GraphDocument::from_graph(&graph).to_json().unwrap();
        let reloaded = GraphDocument::parse(&json).unwrap().into_graph().unwrap();
        assert_eq!(reloaded.edge("Ann", "Bob"), Some(&[first, second][..]));
        assert_eq!(
            GraphDocument::from_graph(&reloaded),
            GraphDocument::from_graph(&graph)
        );
    }

    #[test]
    fn dangling_relationship_is_rejected() {
        let doc = GraphDocument::parse(
            r#"{ "nodes": [{ "label": "Ann" }],
                 "relationships": [{ "label": "x", "origin": "Ann", "destination": "Zed" }] }"#,
        )
        .unwrap();
        assert_eq!(
            doc.into_graph().unwrap_err(),
            GraphError::MissingNode("Zed".to_string())
        );
    }
}
