//! # Optclause Parser
//!
//! Text-level building blocks for contract documents with optional clauses:
//!
//! - [`bracket`]: locating option markers and their balanced clause bodies
//! - [`document`]: the paragraph tree and its total JSON decoder

pub mod bracket;
pub mod document;
pub mod error;

pub use bracket::{parse_inline_option, parse_option_info, InlineMatch, OptionInfoSplit};
pub use document::{decode_node, decode_option, Document, OptionDescriptor, ParagraphNode};
pub use error::{ParseError, ParseResult};
