//! Error types for the editor

use optclause_parser::ParseError;
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Paragraph not found: {node_id}")]
    NodeNotFound { node_id: String },
}

impl EditorError {
    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        EditorError::NodeNotFound {
            node_id: node_id.into(),
        }
    }
}
