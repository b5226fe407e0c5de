//! Leaf content rendering contract.
//!
//! The evaluator decides *which* text is shown; a [`LeafRenderer`] decides how
//! one piece of document text becomes a node. Renderers hold no state of their
//! own.

use crate::status::{CriticalRenderStatus, RenderStatus, RenderingMode};
use crate::vdom::RenderNode;

/// One piece of document text to render.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafRequest<'a> {
    pub content_id: String,
    pub raw_text: &'a str,
    pub render_status: RenderStatus,
    pub parent_status: CriticalRenderStatus,
    /// Option the paragraph is identified with.
    pub governing_option: Option<&'a str>,
    pub preview_only: bool,
    pub schedule_num: Option<u32>,
    /// Literal bracket characters in the text must be kept.
    pub preserve_bracket_formats: bool,
    /// Set for whole-paragraph text: an ancestor option already closes the
    /// bracket this text may end with.
    pub suppress_option_bracket: Option<bool>,
    pub remount_key: u64,
}

pub trait LeafRenderer: std::fmt::Debug {
    fn render_leaf(&self, request: &LeafRequest<'_>) -> RenderNode;
}

/// Renders text as-is into [`RenderNode::Leaf`].
///
/// When bracket suppression is requested, the first `" ]"` closing marker is
/// dropped from the text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLeafRenderer;

impl LeafRenderer for TextLeafRenderer {
    fn render_leaf(&self, request: &LeafRequest<'_>) -> RenderNode {
        let text = if request.suppress_option_bracket == Some(true) {
            request.raw_text.replacen(" ]", "", 1)
        } else {
            request.raw_text.to_string()
        };

        RenderNode::Leaf {
            key: format!("{}-{}", request.content_id, request.remount_key),
            content_id: request.content_id.clone(),
            text,
            mode: RenderingMode::update_parent(
                request.parent_status.mode,
                request.render_status.content_mode,
            ),
            focused: request.parent_status.focused || request.render_status.focused,
            preserve_brackets: request.preserve_bracket_formats,
        }
    }
}
