mod force;
pub mod packer;
mod text;
pub(crate) mod types;

pub use force::ForceLayout;
pub use packer::{Packer, pack_boxes};
pub use text::{measure_lines, text_width, wrap_label};
pub use types::*;

use std::collections::HashMap;

/// Places the nodes of one connected component. Must return exactly one position per
/// input node; positions are centers and only advisory, the canvas may translate them.
pub trait LayoutOracle {
    fn layout(&self, nodes: &[String], edges: &[(String, String)]) -> HashMap<String, Point>;
}

impl<F> LayoutOracle for F
where
    F: Fn(&[String], &[(String, String)]) -> HashMap<String, Point>,
{
    fn layout(&self, nodes: &[String], edges: &[(String, String)]) -> HashMap<String, Point> {
        self(nodes, edges)
    }
}
