use optclause_parser::OptionDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::status::{BracketFlags, ParagraphLayout, ParentInfo, RenderingMode};

/// Rendered document node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RenderNode {
    /// Numbered paragraph with its own content and rendered children
    Paragraph {
        node_id: String,
        numbering: String,
        /// Level the paragraph was rendered at (its parent context's level)
        level: u32,
        layout: ParagraphLayout,
        #[serde(skip_serializing_if = "Option::is_none")]
        option_id: Option<String>,
        mode: RenderingMode,
        focused: bool,
        /// An ancestor's option state already suppresses bracket decoration
        suppressed: bool,
        content: Vec<RenderNode>,
        children: Vec<RenderNode>,
    },

    /// Document text produced by the leaf renderer
    Leaf {
        content_id: String,
        /// Remount key, changes whenever the paragraph's reset version does
        key: String,
        text: String,
        mode: RenderingMode,
        focused: bool,
        preserve_brackets: bool,
    },

    /// Inline option body, kept addressable for focus tracking
    Clause {
        option_id: String,
        focused: bool,
        children: Vec<RenderNode>,
    },

    /// Synthetic begin marker
    Marker { text: String },

    /// Whitespace in front of a synthetic bracket
    Spacing { text: String },

    /// Synthetic closing bracket
    Bracket,

    /// Deferred closing text of an option
    Footer { text: String, mode: RenderingMode },
}

impl RenderNode {
    pub fn node_id(&self) -> Option<&str> {
        match self {
            RenderNode::Paragraph { node_id, .. } => Some(node_id),
            _ => None,
        }
    }

    pub fn numbering(&self) -> Option<&str> {
        match self {
            RenderNode::Paragraph { numbering, .. } => Some(numbering),
            _ => None,
        }
    }

    pub fn content(&self) -> &[RenderNode] {
        match self {
            RenderNode::Paragraph { content, .. } => content,
            RenderNode::Clause { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children(&self) -> &[RenderNode] {
        match self {
            RenderNode::Paragraph { children, .. } => children,
            _ => &[],
        }
    }

    /// Inline text of this node, without nested paragraphs.
    pub fn inline_text(&self) -> String {
        let mut out = String::new();
        self.write_inline(&mut out);
        out
    }

    fn write_inline(&self, out: &mut String) {
        match self {
            RenderNode::Paragraph { content, .. } | RenderNode::Clause { children: content, .. } => {
                for node in content {
                    node.write_inline(out);
                }
            }
            RenderNode::Leaf { text, .. }
            | RenderNode::Marker { text }
            | RenderNode::Spacing { text }
            | RenderNode::Footer { text, .. } => out.push_str(text),
            RenderNode::Bracket => out.push(']'),
        }
    }

    /// Every footer text rendered in this subtree.
    pub fn footers(&self) -> Vec<&str> {
        let mut found = Vec::new();
        self.collect_footers(&mut found);
        found
    }

    fn collect_footers<'a>(&'a self, found: &mut Vec<&'a str>) {
        match self {
            RenderNode::Footer { text, .. } => found.push(text),
            RenderNode::Paragraph {
                content, children, ..
            } => {
                for node in content.iter().chain(children) {
                    node.collect_footers(found);
                }
            }
            RenderNode::Clause { children, .. } => {
                for node in children {
                    node.collect_footers(found);
                }
            }
            _ => {}
        }
    }
}

/// Numbering computed for a paragraph during a walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingUpdate {
    pub node_id: String,
    pub numbering: String,
}

/// A paragraph reading an option, to be registered with the observer registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSubscription {
    pub option_id: String,
    pub node_id: String,
    pub descriptor: OptionDescriptor,
}

/// Position of a paragraph among its siblings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListInfo {
    /// First of a run of consecutive siblings sharing one attached option
    pub is_first: bool,
}

/// Everything a paragraph was rendered with, enough to re-render it alone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeContext {
    pub path: Vec<usize>,
    pub index: usize,
    pub parent_info: ParentInfo,
    pub list: ListInfo,
    pub flags: BracketFlags,
}

/// Result of a render walk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub nodes: Vec<RenderNode>,
    /// Numbering side channel, in document order
    pub numbering: Vec<NumberingUpdate>,
    /// Option subscriptions side channel, in document order
    pub subscriptions: Vec<OptionSubscription>,
    #[serde(skip)]
    pub contexts: BTreeMap<String, NodeContext>,
}

impl RenderedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered paragraph at an index path.
    pub fn node_at(&self, path: &[usize]) -> Option<&RenderNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.get(*first)?;
        for idx in rest {
            node = node.children().get(*idx)?;
        }
        Some(node)
    }

    /// Find a rendered paragraph by node id.
    pub fn find(&self, node_id: &str) -> Option<&RenderNode> {
        let context = self.contexts.get(node_id)?;
        self.node_at(&context.path)
    }

    /// Replace the paragraph at `path` with a re-rendered one.
    ///
    /// Numbering entries of the re-rendered paragraphs are updated in place.
    /// Their subscriptions are replaced and kept in document order.
    /// Returns `false` if the path does not exist.
    pub fn splice(&mut self, path: &[usize], partial: RenderedDocument) -> bool {
        let RenderedDocument {
            nodes,
            numbering,
            subscriptions,
            contexts,
        } = partial;
        let Some(node) = nodes.into_iter().next() else {
            return false;
        };
        let Some(slot) = node_at_mut(&mut self.nodes, path) else {
            return false;
        };
        *slot = node;

        for update in numbering {
            if let Some(existing) = self
                .numbering
                .iter_mut()
                .find(|existing| existing.node_id == update.node_id)
            {
                *existing = update;
            }
        }
        self.subscriptions
            .retain(|sub| !contexts.contains_key(&sub.node_id));
        self.contexts.extend(contexts);
        self.subscriptions.extend(subscriptions);
        let contexts = &self.contexts;
        self.subscriptions
            .sort_by_key(|sub| contexts.get(&sub.node_id).map(|c| c.path.clone()));
        true
    }

    /// Plain-text rendering, one line per paragraph.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            write_plain(node, 0, &mut out);
        }
        out
    }
}

fn node_at_mut<'a>(nodes: &'a mut [RenderNode], path: &[usize]) -> Option<&'a mut RenderNode> {
    let (first, rest) = path.split_first()?;
    let node = nodes.get_mut(*first)?;
    if rest.is_empty() {
        return Some(node);
    }
    match node {
        RenderNode::Paragraph { children, .. } => node_at_mut(children, rest),
        _ => None,
    }
}

fn write_plain(node: &RenderNode, depth: usize, out: &mut String) {
    if let RenderNode::Paragraph {
        numbering,
        children,
        ..
    } = node
    {
        out.push_str(&"  ".repeat(depth));
        out.push_str(numbering);
        let text = node.inline_text();
        if !text.is_empty() {
            out.push(' ');
            out.push_str(&text);
        }
        out.push('\n');
        for child in children {
            write_plain(child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(id: &str, numbering: &str, text: &str, children: Vec<RenderNode>) -> RenderNode {
        RenderNode::Paragraph {
            node_id: id.to_string(),
            numbering: numbering.to_string(),
            level: 0,
            layout: ParagraphLayout::Headline,
            option_id: None,
            mode: RenderingMode::Plain,
            focused: false,
            suppressed: false,
            content: vec![RenderNode::Marker {
                text: text.to_string(),
            }],
            children,
        }
    }

    #[test]
    fn test_plain_text_indents_children() {
        let doc = RenderedDocument {
            nodes: vec![paragraph("a", "1", "Intro", vec![paragraph("b", "1.1", "Detail", vec![])])],
            ..RenderedDocument::default()
        };

        assert_eq!(doc.to_plain_text(), "1 Intro\n  1.1 Detail\n");
    }

    #[test]
    fn test_splice_replaces_nested_node() {
        let mut doc = RenderedDocument {
            nodes: vec![paragraph("a", "1", "Intro", vec![paragraph("b", "1.1", "Old", vec![])])],
            ..RenderedDocument::default()
        };
        let partial = RenderedDocument {
            nodes: vec![paragraph("b", "1.1", "New", vec![])],
            ..RenderedDocument::default()
        };

        assert!(doc.splice(&[0, 0], partial));
        assert_eq!(doc.node_at(&[0, 0]).unwrap().inline_text(), "New");
        assert!(!doc.splice(&[3], RenderedDocument::default()));
    }

    fn context(path: Vec<usize>) -> NodeContext {
        NodeContext {
            index: path.last().copied().unwrap_or_default(),
            path,
            parent_info: ParentInfo::root(),
            list: ListInfo::default(),
            flags: BracketFlags::default(),
        }
    }

    fn subscription(option_id: &str, node_id: &str) -> OptionSubscription {
        OptionSubscription {
            option_id: option_id.to_string(),
            node_id: node_id.to_string(),
            descriptor: OptionDescriptor::new(option_id),
        }
    }

    #[test]
    fn test_splice_replaces_subscriptions_of_spliced_nodes() {
        let mut doc = RenderedDocument {
            nodes: vec![
                paragraph("a", "1", "Intro", vec![paragraph("b", "1.1", "Old", vec![])]),
                paragraph("c", "2", "Tail", vec![]),
            ],
            subscriptions: vec![subscription("x", "b"), subscription("y", "c")],
            contexts: BTreeMap::from([
                ("a".to_string(), context(vec![0])),
                ("b".to_string(), context(vec![0, 0])),
                ("c".to_string(), context(vec![1])),
            ]),
            ..RenderedDocument::default()
        };
        let partial = RenderedDocument {
            nodes: vec![paragraph("a", "1", "Intro", vec![paragraph("b", "1.1", "New", vec![])])],
            subscriptions: vec![subscription("z", "a"), subscription("w", "b")],
            contexts: BTreeMap::from([
                ("a".to_string(), context(vec![0])),
                ("b".to_string(), context(vec![0, 0])),
            ]),
            ..RenderedDocument::default()
        };

        assert!(doc.splice(&[0], partial));
        let pairs: Vec<_> = doc
            .subscriptions
            .iter()
            .map(|s| (s.option_id.as_str(), s.node_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("z", "a"), ("w", "b"), ("y", "c")]);
    }

    #[test]
    fn test_bracket_renders_as_text() {
        let clause = RenderNode::Clause {
            option_id: "x".to_string(),
            focused: false,
            children: vec![
                RenderNode::Spacing {
                    text: " ".to_string(),
                },
                RenderNode::Bracket,
            ],
        };
        assert_eq!(clause.inline_text(), " ]");
    }
}
