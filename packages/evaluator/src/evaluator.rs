//! # Optclause Evaluator
//!
//! Renders a paragraph tree into [`RenderNode`]s for the current option states.
//!
//! ## Purpose
//!
//! The evaluator walks the document depth-first. At every paragraph it:
//!
//! - computes the dotted numbering string from the parent's numbering and the
//!   sibling index
//! - resolves the paragraph's optional clauses against the option store
//! - merges its own formatting status into the inherited critical status
//! - decides whether it, or a descendant, renders its option's closing text
//! - propagates bracket suppression to its children
//!
//! ## Determinism Contract
//!
//! **INVARIANT: Rendering is a pure function of its inputs.**
//!
//! For the same document, parent info, options, option states and status
//! table, `render()` produces identical output on every invocation. This is
//! what makes both the fragment cache and subtree re-rendering sound: a cached
//! entry is reused only under an identical key, and a subtree rendered from its
//! recorded [`NodeContext`] is identical to the same subtree in a full walk.
//!
//! ## Context Threading
//!
//! Every level derives a fresh [`ParentInfo`] for its children; nothing is
//! shared between siblings and nothing is mutated in place. Footer ownership
//! travels down inside the same record: the first paragraph that defers its
//! closing text records it, and only the first child of each level receives
//! the live placement flag, so exactly one leaf renders it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use optclause_evaluator::{Evaluator, OptionStateMap, ParentInfo, RenderOptions, RenderState, StatusTable};
//! use optclause_parser::Document;
//!
//! let doc = Document::from_json_str(source)?;
//! let store = OptionStateMap::new().with("pets", "hidden");
//! let statuses = StatusTable::new();
//!
//! let mut evaluator = Evaluator::new();
//! let rendered = evaluator.render(
//!     &doc,
//!     &ParentInfo::root(),
//!     &RenderOptions::default(),
//!     &RenderState::new(&store, &statuses),
//! );
//! println!("{}", rendered.to_plain_text());
//! ```

use optclause_parser::{parse_option_info, Document, ParagraphNode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::cache::{FragmentCache, FragmentKey};
use crate::leaf::{LeafRenderer, LeafRequest, TextLeafRenderer};
use crate::option_state::{state_signature, OptionStore};
use crate::provider::{format_text_items, DefaultTextProvider, TemplateTextProvider};
use crate::resolver::{
    resolve_inline_options, resolve_option, ClauseParts, ContentSlot, Fragment, ResolveContext,
};
use crate::status::{
    child_numbering, BracketFlags, CriticalRenderStatus, ParagraphLayout, ParentInfo,
    RenderStatus, RenderingMode, StatusTable,
};
use crate::vdom::{
    ListInfo, NodeContext, NumberingUpdate, OptionSubscription, RenderNode, RenderedDocument,
};

/// Host-level rendering switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Read-only rendering: no markers, no brackets, no side channels
    pub preview_only: bool,
    /// Schedule tag forwarded to the leaf renderer
    pub schedule_num: Option<u32>,
}

/// Shared state read during a walk
#[derive(Clone, Copy)]
pub struct RenderState<'a> {
    pub store: &'a dyn OptionStore,
    pub statuses: &'a StatusTable,
    /// Option currently focused by the user
    pub focus: Option<&'a str>,
}

impl<'a> RenderState<'a> {
    pub fn new(store: &'a dyn OptionStore, statuses: &'a StatusTable) -> Self {
        Self {
            store,
            statuses,
            focus: None,
        }
    }

    pub fn with_focus(mut self, focus: Option<&'a str>) -> Self {
        self.focus = focus;
        self
    }
}

struct WalkEnv<'e, 'a> {
    options: &'e RenderOptions,
    state: &'e RenderState<'a>,
}

impl WalkEnv<'_, '_> {
    fn interactive(&self) -> bool {
        !self.options.preview_only
    }
}

/// Fields shared by every leaf request of one paragraph
struct LeafTemplate<'a> {
    status: RenderStatus,
    parent_status: CriticalRenderStatus,
    governing_option: Option<&'a str>,
    preview_only: bool,
    schedule_num: Option<u32>,
    remount_key: u64,
}

impl<'a> LeafTemplate<'a> {
    fn request<'t>(
        &self,
        content_id: String,
        raw_text: &'t str,
        suppress_option_bracket: Option<bool>,
    ) -> LeafRequest<'t>
    where
        'a: 't,
    {
        LeafRequest {
            content_id,
            raw_text,
            render_status: self.status,
            parent_status: self.parent_status,
            governing_option: self.governing_option,
            preview_only: self.preview_only,
            schedule_num: self.schedule_num,
            preserve_bracket_formats: true,
            suppress_option_bracket,
            remount_key: self.remount_key,
        }
    }
}

#[derive(Debug)]
pub struct Evaluator {
    provider: Box<dyn DefaultTextProvider>,
    leaf_renderer: Box<dyn LeafRenderer>,
    cache: FragmentCache,
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            provider: Box::new(TemplateTextProvider::default()),
            leaf_renderer: Box::new(TextLeafRenderer),
            cache: FragmentCache::new(),
        }
    }

    pub fn with_provider(mut self, provider: impl DefaultTextProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self.cache.clear();
        self
    }

    pub fn with_leaf_renderer(mut self, renderer: impl LeafRenderer + 'static) -> Self {
        self.leaf_renderer = Box::new(renderer);
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = FragmentCache::with_capacity(capacity);
        self
    }

    pub fn provider(&self) -> &dyn DefaultTextProvider {
        self.provider.as_ref()
    }

    pub fn cache(&self) -> &FragmentCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Render the whole document below `parent_info`.
    #[instrument(skip_all, fields(paragraphs = document.paragraphs.len(), preview = options.preview_only))]
    pub fn render(
        &mut self,
        document: &Document,
        parent_info: &ParentInfo,
        options: &RenderOptions,
        state: &RenderState<'_>,
    ) -> RenderedDocument {
        let env = WalkEnv { options, state };
        let mut out = RenderedDocument::new();
        let mut path = Vec::new();

        let nodes = self.render_children(
            &document.paragraphs,
            parent_info,
            BracketFlags::default(),
            &mut path,
            &env,
            &mut out,
        );
        out.nodes = nodes;

        info!(
            paragraphs = out.contexts.len(),
            cache_hits = self.cache.hits(),
            cache_misses = self.cache.misses(),
            "Render walk complete"
        );
        out
    }

    /// Re-render the paragraph at `context.path` with the context it was last
    /// rendered with. Returns `None` if the path no longer exists.
    #[instrument(skip_all, fields(path = ?context.path))]
    pub fn render_subtree(
        &mut self,
        document: &Document,
        context: &NodeContext,
        options: &RenderOptions,
        state: &RenderState<'_>,
    ) -> Option<RenderedDocument> {
        let node = document.node_at(&context.path)?;
        let env = WalkEnv { options, state };
        let mut out = RenderedDocument::new();

        let rendered = self.render_paragraph(node, context, &env, &mut out);
        out.nodes.push(rendered);

        debug!(paragraphs = out.contexts.len(), "Subtree re-rendered");
        Some(out)
    }

    fn render_children(
        &mut self,
        nodes: &[ParagraphNode],
        template: &ParentInfo,
        flags: BracketFlags,
        path: &mut Vec<usize>,
        env: &WalkEnv<'_, '_>,
        out: &mut RenderedDocument,
    ) -> Vec<RenderNode> {
        let mut rendered = Vec::with_capacity(nodes.len());

        for (index, node) in nodes.iter().enumerate() {
            path.push(index);
            let context = NodeContext {
                path: path.clone(),
                index,
                parent_info: template.for_child(index),
                list: list_info(nodes, index),
                flags,
            };
            rendered.push(self.render_paragraph(node, &context, env, out));
            path.pop();
        }

        rendered
    }

    fn render_paragraph(
        &mut self,
        node: &ParagraphNode,
        context: &NodeContext,
        env: &WalkEnv<'_, '_>,
        out: &mut RenderedDocument,
    ) -> RenderNode {
        let store = env.state.store;
        let status = env.state.statuses.resolve(node, store, env.state.focus);
        let parent = &context.parent_info;
        let numbering = child_numbering(&parent.numbering_string, context.index);

        if env.interactive() {
            out.numbering.push(NumberingUpdate {
                node_id: node.id.clone(),
                numbering: numbering.clone(),
            });
            for descriptor in node.attached_option.iter().chain(&node.inline_options) {
                out.subscriptions.push(OptionSubscription {
                    option_id: descriptor.id.clone(),
                    node_id: node.id.clone(),
                    descriptor: descriptor.clone(),
                });
            }
        }
        out.contexts.insert(node.id.clone(), context.clone());

        let attached_state = node
            .attached_option
            .as_ref()
            .map(|option| store.state_of(&option.id));

        let claim = env.interactive()
            && status.is_default_visible
            && node.attached_option.is_some()
            && node.has_children();
        if claim && !parent.footer_render_status.should_child_place_footer {
            debug!(node = %node.id, "Deferring closing text to first leaf descendant");
        }

        let child_info = parent.derive_for_children(
            &status,
            claim,
            || {
                node.attached_option
                    .as_ref()
                    .map(|option| self.provider.end_text(option))
                    .unwrap_or_default()
            },
            numbering.clone(),
        );

        let mut content = self.render_content(node, &status, context, env);
        if let Some(footer) = self.footer_for(node, &status, parent, env) {
            content.push(footer);
        }

        let child_flags = context
            .flags
            .propagate(attached_state.as_ref(), node.has_children());
        let mut path = context.path.clone();
        let children =
            self.render_children(&node.children, &child_info, child_flags, &mut path, env, out);

        let inherited = parent.last_critical_render_status;
        RenderNode::Paragraph {
            node_id: node.id.clone(),
            numbering,
            level: parent.level,
            layout: ParagraphLayout::for_level(parent.level),
            option_id: node.paragraph_option_id().map(str::to_string),
            mode: RenderingMode::update_parent(inherited.mode, status.paragraph_mode),
            focused: inherited.focused || status.focused,
            suppressed: context.flags.suppress_option_bracket,
            content,
            children,
        }
    }

    fn render_content(
        &mut self,
        node: &ParagraphNode,
        status: &RenderStatus,
        context: &NodeContext,
        env: &WalkEnv<'_, '_>,
    ) -> Vec<RenderNode> {
        let store = env.state.store;
        let template = LeafTemplate {
            status: *status,
            parent_status: context.parent_info.last_critical_render_status,
            governing_option: node.paragraph_option_id(),
            preview_only: env.options.preview_only,
            schedule_num: env.options.schedule_num,
            remount_key: node.reset_version,
        };
        let resolve_ctx = ResolveContext {
            preview_only: env.options.preview_only,
            parent_option_id_shown: context.flags.parent_option_id_shown,
        };
        let provider = self.provider.as_ref();

        if !node.inline_options.is_empty() {
            let key = fragment_key(node, store, resolve_ctx, true);
            let fragments = self.cache.get_or_insert_with(key, || {
                resolve_inline_options(
                    &node.raw_text,
                    &node.inline_options,
                    store,
                    resolve_ctx,
                    provider,
                )
            });
            if let Some(fragments) = fragments {
                return self.materialize(node, &fragments, &template, env.state.focus);
            }
        } else if let Some(option) = &node.attached_option {
            let request_marker = context.list.is_first;
            let key = fragment_key(node, store, resolve_ctx, request_marker);
            let fragments = self.cache.get_or_insert_with(key, || {
                let parts = ClauseParts::from(parse_option_info(&node.raw_text));
                let state = store.state_of(&option.id);
                Some(resolve_option(
                    option,
                    &state,
                    &parts,
                    resolve_ctx,
                    request_marker,
                    provider,
                ))
            });
            return self.materialize(node, &fragments.unwrap_or_default(), &template, env.state.focus);
        }

        let request = template.request(
            node.id.clone(),
            &node.raw_text,
            Some(context.flags.parent_option_id_shown),
        );
        vec![self.leaf_renderer.render_leaf(&request)]
    }

    fn materialize(
        &self,
        node: &ParagraphNode,
        fragments: &[Fragment],
        template: &LeafTemplate<'_>,
        focus: Option<&str>,
    ) -> Vec<RenderNode> {
        fragments
            .iter()
            .map(|fragment| match fragment {
                Fragment::Content { slot, text } => {
                    let request = template.request(slot.content_id(&node.id), text, None);
                    let leaf = self.leaf_renderer.render_leaf(&request);
                    match slot {
                        ContentSlot::Inside { option_id, .. } => {
                            let focused = focus == Some(option_id.as_str());
                            RenderNode::Clause {
                                option_id: option_id.clone(),
                                focused,
                                children: vec![emphasize(leaf, focused)],
                            }
                        }
                        _ => leaf,
                    }
                }
                Fragment::MarkerText { text } => RenderNode::Marker { text: text.clone() },
                Fragment::Spacing { text } => RenderNode::Spacing { text: text.clone() },
                Fragment::Bracket => RenderNode::Bracket,
            })
            .collect()
    }

    /// Closing text rendered by a leaf: the deferred text it was handed, or
    /// its own option's when nothing was deferred to it.
    fn footer_for(
        &self,
        node: &ParagraphNode,
        status: &RenderStatus,
        parent: &ParentInfo,
        env: &WalkEnv<'_, '_>,
    ) -> Option<RenderNode> {
        if !env.interactive() || node.has_children() {
            return None;
        }

        let incoming = &parent.footer_render_status;
        let (items, mode) = if incoming.should_child_place_footer {
            (incoming.content.clone(), incoming.mode)
        } else {
            let option = node
                .attached_option
                .as_ref()
                .filter(|_| status.is_default_visible)?;
            (self.provider.end_text(option), status.default_mode)
        };

        let text = format_text_items(&items);
        (!text.is_empty()).then_some(RenderNode::Footer { text, mode })
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// Inline clause leaves of the focused option are emphasized.
fn emphasize(leaf: RenderNode, focused: bool) -> RenderNode {
    match leaf {
        RenderNode::Leaf {
            content_id,
            key,
            text,
            preserve_brackets,
            ..
        } if focused => RenderNode::Leaf {
            content_id,
            key,
            text,
            mode: RenderingMode::Emphasized,
            focused: true,
            preserve_brackets,
        },
        other => other,
    }
}

fn fragment_key(
    node: &ParagraphNode,
    store: &dyn OptionStore,
    context: ResolveContext,
    request_marker: bool,
) -> FragmentKey {
    FragmentKey {
        node_id: node.id.clone(),
        state_signature: state_signature(store, node.option_ids()),
        descriptor_signature: node.descriptor_signature(),
        raw_text: node.raw_text.clone(),
        reset_version: node.reset_version,
        context,
        request_marker,
    }
}

/// A paragraph opens a list unless its previous sibling carries the same
/// attached option.
fn list_info(siblings: &[ParagraphNode], index: usize) -> ListInfo {
    let current = siblings[index].attached_option_id();
    let continues = index > 0
        && current.is_some()
        && siblings[index - 1].attached_option_id() == current;
    ListInfo {
        is_first: !continues,
    }
}
