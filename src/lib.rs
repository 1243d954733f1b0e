#[cfg(feature = "cli")]
pub mod cli;
pub mod canvas;
pub mod config;
pub mod document;
pub mod dump;
pub mod editor;
pub mod error;
pub mod graph;
pub mod layout;
pub mod model;
pub mod render;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use canvas::{Canvas, RefreshOutcome, Selection, Touch};
pub use config::Config;
pub use document::GraphDocument;
pub use editor::Editor;
pub use error::{DiagramError, GraphError};
pub use graph::{EdgeChange, Sociograph};
pub use model::{Attribute, Node, NodeId, RelId, Relationship};
pub use theme::Theme;
