//! # Document Model
//!
//! Paragraph tree and the decoder that builds it from raw JSON nodes.
//!
//! Decoding is total. Raw nodes come from a live editor and may be partial or
//! stale, so every malformed piece degrades to "absent" instead of an error:
//! unreadable option metadata yields no attached option, inline entries
//! without an id are dropped, missing text is empty.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ParseError, ParseResult};

/// An option referenced by a paragraph, with its static metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDescriptor {
    pub id: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl OptionDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// String metadata entry, if present.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Human readable name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.meta_str("name")
            .or_else(|| self.meta_str("label"))
            .unwrap_or(&self.id)
    }

    /// Id and metadata as one comparable string. Metadata keys are sorted.
    pub fn fingerprint(&self) -> String {
        format!("{}{}", self.id, Value::Object(self.metadata.clone()))
    }
}

/// One paragraph of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphNode {
    pub id: String,
    pub raw_text: String,
    /// Option governing the whole paragraph. Never set together with
    /// `inline_options`.
    pub attached_option: Option<OptionDescriptor>,
    /// Options embedded in the text, in text order.
    pub inline_options: Vec<OptionDescriptor>,
    pub children: Vec<ParagraphNode>,
    /// Bumped on structural edits to force fragment remounts.
    pub reset_version: u64,
}

impl ParagraphNode {
    pub fn new(id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw_text: raw_text.into(),
            attached_option: None,
            inline_options: Vec::new(),
            children: Vec::new(),
            reset_version: 0,
        }
    }

    /// Attach a paragraph-wide option, clearing any inline options.
    pub fn with_attached_option(mut self, option: OptionDescriptor) -> Self {
        self.inline_options.clear();
        self.attached_option = Some(option);
        self
    }

    /// Add an inline option, clearing any attached option.
    pub fn with_inline_option(mut self, option: OptionDescriptor) -> Self {
        self.attached_option = None;
        self.inline_options.push(option);
        self
    }

    pub fn with_child(mut self, child: ParagraphNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<ParagraphNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Id of the attached option, if any.
    pub fn attached_option_id(&self) -> Option<&str> {
        self.attached_option.as_ref().map(|o| o.id.as_str())
    }

    /// The option the paragraph is identified with: the attached option,
    /// otherwise its first inline option.
    pub fn paragraph_option_id(&self) -> Option<&str> {
        self.attached_option_id()
            .or_else(|| self.inline_options.first().map(|o| o.id.as_str()))
    }

    pub fn inline_option(&self, id: &str) -> Option<&OptionDescriptor> {
        self.inline_options.iter().find(|o| o.id == id)
    }

    /// Every option id this paragraph reads, attached first.
    pub fn option_ids(&self) -> impl Iterator<Item = &str> {
        self.attached_option
            .iter()
            .chain(self.inline_options.iter())
            .map(|o| o.id.as_str())
    }

    /// Fingerprints of every option descriptor, attached first.
    pub fn descriptor_signature(&self) -> String {
        self.attached_option
            .iter()
            .chain(self.inline_options.iter())
            .map(OptionDescriptor::fingerprint)
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// A decoded document: the ordered top-level paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub paragraphs: Vec<ParagraphNode>,
}

impl Document {
    pub fn new(paragraphs: Vec<ParagraphNode>) -> Self {
        Self { paragraphs }
    }

    /// Parse a document from JSON text.
    ///
    /// The root may be an array of paragraph nodes or an object whose
    /// `children` (or `paragraphs`) hold them.
    pub fn from_json_str(source: &str) -> ParseResult<Self> {
        let value: Value = serde_json::from_str(source)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> ParseResult<Self> {
        let nodes = match value {
            Value::Array(items) => items.as_slice(),
            Value::Object(map) => map
                .get("children")
                .or_else(|| map.get("paragraphs"))
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            other => return Err(ParseError::invalid_root(json_kind(other))),
        };

        let paragraphs = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| decode_node_at(node, &idx.to_string()))
            .collect();

        Ok(Self { paragraphs })
    }

    /// Follow a path of child indices from the top level.
    pub fn node_at(&self, path: &[usize]) -> Option<&ParagraphNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.paragraphs.get(*first)?;
        for idx in rest {
            node = node.children.get(*idx)?;
        }
        Some(node)
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut ParagraphNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.paragraphs.get_mut(*first)?;
        for idx in rest {
            node = node.children.get_mut(*idx)?;
        }
        Some(node)
    }

    /// Index path of the node with `id`, depth-first.
    pub fn path_of(&self, id: &str) -> Option<Vec<usize>> {
        fn search(nodes: &[ParagraphNode], id: &str, path: &mut Vec<usize>) -> bool {
            for (idx, node) in nodes.iter().enumerate() {
                path.push(idx);
                if node.id == id || search(&node.children, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        search(&self.paragraphs, id, &mut path).then_some(path)
    }

    /// Visit every node depth-first, in document order.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a ParagraphNode, &[usize])) {
        fn go<'a>(
            nodes: &'a [ParagraphNode],
            path: &mut Vec<usize>,
            visit: &mut dyn FnMut(&'a ParagraphNode, &[usize]),
        ) {
            for (idx, node) in nodes.iter().enumerate() {
                path.push(idx);
                visit(node, path);
                go(&node.children, path, visit);
                path.pop();
            }
        }

        go(&self.paragraphs, &mut Vec::new(), visit);
    }
}

/// Decode one raw node and its subtree. Never fails.
pub fn decode_node(raw: &Value) -> ParagraphNode {
    decode_node_at(raw, "0")
}

fn decode_node_at(raw: &Value, fallback_id: &str) -> ParagraphNode {
    let id = string_field(raw, &["element_id", "id"]).unwrap_or_else(|| fallback_id.to_string());
    let raw_text = string_field(raw, &["text", "content"]).unwrap_or_default();
    let reset_version = raw
        .get("resetVersion")
        .or_else(|| raw.get("reset_version"))
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let mut attached_option = raw
        .get("optioninfo")
        .or_else(|| raw.get("option"))
        .and_then(decode_option);
    let inline_options: Vec<OptionDescriptor> = raw
        .get("inlineoptions")
        .or_else(|| raw.get("inline_options"))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(decode_option).collect())
        .unwrap_or_default();

    if attached_option.is_some() && !inline_options.is_empty() {
        warn!(node = %id, "Paragraph carries both an attached and inline options; keeping inline options");
        attached_option = None;
    }

    let children = raw
        .get("children")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .enumerate()
                .map(|(idx, child)| decode_node_at(child, &format!("{id}.{idx}")))
                .collect()
        })
        .unwrap_or_default();

    ParagraphNode {
        id,
        raw_text,
        attached_option,
        inline_options,
        children,
        reset_version,
    }
}

/// Decode option metadata given either as an object or as JSON-encoded text.
pub fn decode_option(raw: &Value) -> Option<OptionDescriptor> {
    match raw {
        Value::Object(map) => descriptor_from_map(map),
        Value::String(text) if !text.trim().is_empty() => {
            match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => descriptor_from_map(&map),
                Ok(_) | Err(_) => {
                    debug!("Ignoring unreadable option metadata");
                    None
                }
            }
        }
        _ => None,
    }
}

fn descriptor_from_map(map: &Map<String, Value>) -> Option<OptionDescriptor> {
    let id = match map.get("id")? {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    let metadata = map
        .iter()
        .filter(|(key, _)| key.as_str() != "id")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Some(OptionDescriptor { id, metadata })
}

fn string_field(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
