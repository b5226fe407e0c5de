//! # Render Status
//!
//! Per-paragraph formatting state and the context record passed from a
//! paragraph to its children.
//!
//! A [`ParentInfo`] is never mutated once built. Each level derives a new one
//! for its children with [`ParentInfo::derive_for_children`], and each child
//! gets its own copy through [`ParentInfo::for_child`].

use optclause_parser::ParagraphNode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::option_state::{OptionState, OptionStore};
use crate::provider::TextItem;

/// Tri-state formatting flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderingMode {
    #[default]
    Plain,
    Highlighted,
    Emphasized,
}

impl RenderingMode {
    fn specificity(self) -> u8 {
        match self {
            RenderingMode::Plain => 0,
            RenderingMode::Highlighted => 1,
            RenderingMode::Emphasized => 2,
        }
    }

    /// Merge an inherited mode with a paragraph's own mode.
    ///
    /// The more specific mode wins; on a tie the child's own mode is kept.
    pub fn update_parent(parent: RenderingMode, child: RenderingMode) -> RenderingMode {
        if child.specificity() >= parent.specificity() {
            child
        } else {
            parent
        }
    }
}

/// Formatting state of one paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderStatus {
    pub paragraph_mode: RenderingMode,
    pub default_mode: RenderingMode,
    pub content_mode: RenderingMode,
    pub focused: bool,
    /// Default marker text may render.
    pub is_default_visible: bool,
}

impl RenderStatus {
    pub const INITIAL: RenderStatus = RenderStatus {
        paragraph_mode: RenderingMode::Plain,
        default_mode: RenderingMode::Plain,
        content_mode: RenderingMode::Plain,
        focused: false,
        is_default_visible: true,
    };

    /// Status for a paragraph governed by an option in `state`.
    pub fn from_state(state: Option<&OptionState>, focused: bool) -> RenderStatus {
        let mut status = match state {
            None => RenderStatus::INITIAL,
            Some(OptionState::Default) => RenderStatus {
                paragraph_mode: RenderingMode::Highlighted,
                default_mode: RenderingMode::Highlighted,
                content_mode: RenderingMode::Highlighted,
                focused: false,
                is_default_visible: true,
            },
            Some(OptionState::Hidden) => RenderStatus {
                is_default_visible: false,
                ..RenderStatus::INITIAL
            },
            Some(OptionState::Choice(_)) => RenderStatus {
                content_mode: RenderingMode::Highlighted,
                is_default_visible: false,
                ..RenderStatus::INITIAL
            },
        };

        if focused && state.is_some() {
            status.focused = true;
            status.paragraph_mode = RenderingMode::Emphasized;
        }
        status
    }

    /// Status of `node` from its attached option's current state.
    pub fn for_node(node: &ParagraphNode, store: &dyn OptionStore, focus: Option<&str>) -> RenderStatus {
        match node.attached_option_id() {
            Some(id) => RenderStatus::from_state(Some(&store.state_of(id)), focus == Some(id)),
            None => RenderStatus::INITIAL,
        }
    }
}

impl Default for RenderStatus {
    fn default() -> Self {
        RenderStatus::INITIAL
    }
}

/// Last known status of each mounted paragraph.
#[derive(Debug, Clone, Default)]
pub struct StatusTable {
    statuses: HashMap<String, RenderStatus>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node_id: &str) -> Option<RenderStatus> {
        self.statuses.get(node_id).copied()
    }

    pub fn insert(&mut self, node_id: impl Into<String>, status: RenderStatus) -> Option<RenderStatus> {
        self.statuses.insert(node_id.into(), status)
    }

    pub fn remove(&mut self, node_id: &str) -> Option<RenderStatus> {
        self.statuses.remove(node_id)
    }

    /// Recorded status, or a freshly derived one for paragraphs not yet mounted.
    pub fn resolve(&self, node: &ParagraphNode, store: &dyn OptionStore, focus: Option<&str>) -> RenderStatus {
        self.get(&node.id)
            .unwrap_or_else(|| RenderStatus::for_node(node, store, focus))
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.statuses.retain(|id, _| keep(id));
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

/// Who renders the closing text of an option that spans several paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterRenderStatus {
    pub content: Vec<TextItem>,
    pub should_child_place_footer: bool,
    pub mode: RenderingMode,
}

/// Formatting inherited down the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CriticalRenderStatus {
    pub mode: RenderingMode,
    pub focused: bool,
}

/// Context a paragraph hands to its children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentInfo {
    pub footer_render_status: FooterRenderStatus,
    pub last_critical_render_status: CriticalRenderStatus,
    pub numbering_string: String,
    pub level: u32,
}

impl ParentInfo {
    /// Context for the top-level paragraphs.
    pub fn root() -> Self {
        Self::default()
    }

    /// Derive the context for the children of a paragraph with `status`.
    ///
    /// `claim` is true when the paragraph defers its own closing text to a
    /// descendant. The text is recorded only by the first claim on the chain.
    pub fn derive_for_children(
        &self,
        status: &RenderStatus,
        claim: bool,
        end_text: impl FnOnce() -> Vec<TextItem>,
        numbering_string: String,
    ) -> ParentInfo {
        let incoming = &self.footer_render_status;
        let footer_render_status = FooterRenderStatus {
            content: if claim && !incoming.should_child_place_footer {
                end_text()
            } else {
                incoming.content.clone()
            },
            should_child_place_footer: incoming.should_child_place_footer || claim,
            mode: if incoming.should_child_place_footer {
                incoming.mode
            } else {
                status.default_mode
            },
        };

        let inherited = self.last_critical_render_status;
        ParentInfo {
            footer_render_status,
            last_critical_render_status: CriticalRenderStatus {
                mode: RenderingMode::update_parent(inherited.mode, status.paragraph_mode),
                focused: inherited.focused || status.focused,
            },
            numbering_string,
            level: self.level + 1,
        }
    }

    /// The copy handed to the child at `index`.
    ///
    /// Only the first child inherits a live footer placement.
    pub fn for_child(&self, index: usize) -> ParentInfo {
        let mut info = self.clone();
        if index > 0 {
            info.footer_render_status.should_child_place_footer = false;
        }
        info
    }
}

/// Dotted position label of the child at `index`.
pub fn child_numbering(parent: &str, index: usize) -> String {
    if parent.is_empty() {
        (index + 1).to_string()
    } else {
        format!("{}.{}", parent, index + 1)
    }
}

/// Bracket decoration flags, sticky once set on an ancestor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BracketFlags {
    pub suppress_option_bracket: bool,
    pub parent_option_id_shown: bool,
}

impl BracketFlags {
    /// Flags for the children of a paragraph whose attached option is in
    /// `state`.
    pub fn propagate(self, state: Option<&OptionState>, has_children: bool) -> BracketFlags {
        BracketFlags {
            suppress_option_bracket: self.suppress_option_bracket
                || state.is_some_and(|s| !s.is_default()),
            parent_option_id_shown: self.parent_option_id_shown
                || (state.is_some_and(OptionState::is_active_choice) && has_children),
        }
    }
}

/// Presentation class of a paragraph, from the level it is rendered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParagraphLayout {
    Headline,
    Standard,
    Indented,
}

impl ParagraphLayout {
    pub fn for_level(level: u32) -> ParagraphLayout {
        match level {
            0 | 1 => ParagraphLayout::Headline,
            2 => ParagraphLayout::Standard,
            _ => ParagraphLayout::Indented,
        }
    }
}
