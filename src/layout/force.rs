use std::collections::HashMap;
use std::f32::consts::TAU;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};

use crate::config::ForceConfig;

use super::{LayoutOracle, Point};

/// Force-directed placement on top of `force_graph`. Nodes start evenly spread on a
/// circle and the simulation runs a fixed number of steps.
#[derive(Debug, Clone)]
pub struct ForceLayout {
    config: ForceConfig,
}

impl ForceLayout {
    pub fn new(config: ForceConfig) -> Self {
        Self { config }
    }
}

impl Default for ForceLayout {
    fn default() -> Self {
        Self::new(ForceConfig::default())
    }
}

impl LayoutOracle for ForceLayout {
    fn layout(&self, nodes: &[String], edges: &[(String, String)]) -> HashMap<String, Point> {
        let mut positions = HashMap::new();
        if nodes.len() < 2 {
            for label in nodes {
                positions.insert(label.clone(), Point::default());
            }
            return positions;
        }

        let cfg = &self.config;
        let mut graph: ForceGraph<String, ()> = ForceGraph::new(SimulationParameters {
            force_charge: cfg.charge,
            force_spring: cfg.spring,
            force_max: cfg.max_force,
            node_speed: cfg.node_speed,
            damping_factor: cfg.damping,
        });

        let radius = cfg.initial_radius * nodes.len() as f32;
        let mut index = HashMap::new();
        for (i, label) in nodes.iter().enumerate() {
            let angle = i as f32 * TAU / nodes.len() as f32;
            let idx = graph.add_node(NodeData {
                x: radius * angle.cos(),
                y: radius * angle.sin(),
                mass: cfg.mass,
                is_anchor: false,
                user_data: label.clone(),
            });
            index.insert(label.as_str(), idx);
        }
        for (a, b) in edges {
            if let (Some(&src), Some(&tgt)) = (index.get(a.as_str()), index.get(b.as_str())) {
                graph.add_edge(src, tgt, EdgeData::default());
            }
        }

        for _ in 0..cfg.iterations {
            graph.update(cfg.step);
        }

        let scale = cfg.scale;
        graph.visit_nodes(|node| {
            positions.insert(
                node.data.user_data.clone(),
                Point::new(node.x() * scale, node.y() * scale),
            );
        });
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: usize) -> (Vec<String>, Vec<(String, String)>) {
        let nodes: Vec<String> = (0..n).map(|i| format!("N{i}")).collect();
        let edges = nodes
            .windows(2)
            .map(|w| (w[0].clone(), w[1].clone()))
            .collect();
        (nodes, edges)
    }

    #[test]
    fn one_position_per_node() {
        let (nodes, edges) = chain(6);
        let positions = ForceLayout::default().layout(&nodes, &edges);
        assert_eq!(positions.len(), nodes.len());
        for label in &nodes {
            let p = positions[label];
            assert!(p.x.is_finite() && p.y.is_finite());
        }
    }

    #[test]
    fn singleton_sits_at_origin() {
        let positions = ForceLayout::default().layout(&["solo".to_string()], &[]);
        assert_eq!(positions.get("solo"), Some(&Point::default()));
    }

    #[test]
    fn edges_to_unknown_nodes_are_ignored() {
        let (nodes, mut edges) = chain(3);
        edges.push(("N0".to_string(), "ghost".to_string()));
        let positions = ForceLayout::default().layout(&nodes, &edges);
        assert_eq!(positions.len(), 3);
        assert!(!positions.contains_key("ghost"));
    }
}
