pub mod numbering;
pub mod options;
pub mod render;

pub use numbering::{numbering, NumberingArgs};
pub use options::{options, OptionsArgs};
pub use render::{render, RenderArgs};

use anyhow::{Context, Result};
use optclause_evaluator::OptionStateMap;
use optclause_parser::Document;
use std::path::Path;

/// Read and decode a document file
pub(crate) fn load_document(path: &Path) -> Result<Document> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read document {}", path.display()))?;
    Document::from_json_str(&source).with_context(|| format!("Invalid document {}", path.display()))
}

/// Read an `{ "option": "state" }` file, or start from all defaults
pub(crate) fn load_states(path: Option<&Path>) -> Result<OptionStateMap> {
    let Some(path) = path else {
        return Ok(OptionStateMap::new());
    };
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read option states {}", path.display()))?;
    serde_json::from_str(&source)
        .with_context(|| format!("Invalid option states {}", path.display()))
}
