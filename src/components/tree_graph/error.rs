//! Error types for the tree model and layout.

use thiserror::Error;

use super::types::NodeId;

/// Result type for tree graph operations.
pub type Result<T> = std::result::Result<T, TreeGraphError>;

/// Errors surfaced by the tree model, layout, and configuration.
#[derive(Error, Debug)]
pub enum TreeGraphError {
	/// A configuration node could not be read.
	#[error("malformed configuration at `{path}`: {reason}")]
	MalformedConfig { path: String, reason: String },

	/// A toggle or lookup named a node the structure does not contain.
	#[error("unknown node `{0}`")]
	UnknownNode(NodeId),

	/// Node size components must be positive and finite.
	#[error("invalid node size {width}x{height}")]
	InvalidNodeSize { width: f64, height: f64 },

	/// Viewer settings out of range.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// JSON text could not be parsed at all.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}
