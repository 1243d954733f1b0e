use thiserror::Error;

use crate::model::{AttrId, RelId};

/// Failures reported by the graph model. None of them leave the model partially mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node label `{0}` is already in use")]
    DuplicateLabel(String),
    #[error("node `{0}` is not in the graph")]
    MissingNode(String),
    #[error("relationship {0} is not in the graph")]
    MissingRelationship(RelId),
    #[error("attribute {0} does not exist")]
    MissingAttribute(AttrId),
    #[error("a relationship cannot start and end at `{0}`")]
    SelfRelationship(String),
    #[error("labels cannot be blank")]
    BlankLabel,
}

/// Failures raised while laying out or refreshing the drawn diagram.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagramError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("vertices `{origin}` and `{dest}` share a center; line not drawn")]
    DegenerateGeometry { origin: String, dest: String },
    #[error("packer could not place a {width}x{height} box")]
    PackingOverflow { width: f32, height: f32 },
    #[error("diagram has not been laid out")]
    NotLaidOut,
    #[error("no vertex labeled `{0}` on the canvas")]
    MissingVertex(String),
    #[error("no line between `{0}` and `{1}` on the canvas")]
    MissingLine(String, String),
}
