//! # Render Session
//!
//! Owns a document, its option states and everything derived from them, and
//! keeps the rendered output current as states, focus and text change.
//!
//! Every change is turned into a set of dirty paragraphs. Their render status
//! is recomputed, and the walk restarts at the lowest common ancestor of the
//! dirty set, reusing the context that ancestor was last rendered with. Only
//! when the dirty paragraphs share no ancestor is the whole document walked
//! again.

use optclause_evaluator::{
    Evaluator, OptionState, OptionStateMap, ParentInfo, RenderOptions, RenderState,
    RenderStatus, RenderedDocument, StatusTable,
};
use optclause_parser::Document;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

use crate::broadcast::{NumberingBroadcaster, SubscriberId};
use crate::errors::{EditorError, EditorResult};
use crate::registry::{OptionObserverRegistry, Subscription};

#[derive(Debug)]
pub struct RenderSession {
    document: Document,
    store: OptionStateMap,
    focus: Option<String>,
    statuses: StatusTable,
    registry: OptionObserverRegistry,
    broadcaster: NumberingBroadcaster,
    evaluator: Evaluator,
    options: RenderOptions,
    root_info: ParentInfo,
    rendered: RenderedDocument,
}

impl RenderSession {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            store: OptionStateMap::new(),
            focus: None,
            statuses: StatusTable::new(),
            registry: OptionObserverRegistry::new(),
            broadcaster: NumberingBroadcaster::new(),
            evaluator: Evaluator::new(),
            options: RenderOptions::default(),
            root_info: ParentInfo::root(),
            rendered: RenderedDocument::new(),
        }
    }

    pub fn from_json_str(source: &str) -> EditorResult<Self> {
        Ok(Self::new(Document::from_json_str(source)?))
    }

    pub fn with_states(mut self, store: OptionStateMap) -> Self {
        self.store = store;
        self
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Context the top-level paragraphs are rendered with, e.g. to continue
    /// numbering from an enclosing document.
    pub fn with_root_info(mut self, root_info: ParentInfo) -> Self {
        self.root_info = root_info;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn rendered(&self) -> &RenderedDocument {
        &self.rendered
    }

    pub fn states(&self) -> &OptionStateMap {
        &self.store
    }

    pub fn statuses(&self) -> &StatusTable {
        &self.statuses
    }

    pub fn registry(&self) -> &OptionObserverRegistry {
        &self.registry
    }

    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    pub fn subscribe_numbering(
        &mut self,
        node_id: impl Into<String>,
        callback: impl FnMut(&str, &str) + 'static,
    ) -> SubscriberId {
        self.broadcaster.subscribe(node_id, callback)
    }

    pub fn subscribe_all_numbering(
        &mut self,
        callback: impl FnMut(&str, &str) + 'static,
    ) -> SubscriberId {
        self.broadcaster.subscribe_all(callback)
    }

    pub fn unsubscribe_numbering(&mut self, id: SubscriberId) -> bool {
        self.broadcaster.unsubscribe(id)
    }

    /// Walk the whole document.
    #[instrument(skip(self))]
    pub fn render(&mut self) -> &RenderedDocument {
        let mut mounted = BTreeSet::new();
        let store = &self.store;
        let focus = self.focus.as_deref();
        let statuses = &mut self.statuses;
        self.document.walk(&mut |node, _| {
            statuses.insert(node.id.clone(), RenderStatus::for_node(node, store, focus));
            mounted.insert(node.id.clone());
        });
        self.statuses.retain(|id| mounted.contains(id));

        let state = RenderState::new(&self.store, &self.statuses).with_focus(focus);
        let rendered = self
            .evaluator
            .render(&self.document, &self.root_info, &self.options, &state);

        let unmounted: Vec<String> = self
            .rendered
            .contexts
            .keys()
            .filter(|id| !mounted.contains(*id))
            .cloned()
            .collect();
        for node_id in &unmounted {
            self.teardown_node(node_id);
        }
        for node_id in rendered.contexts.keys() {
            self.registry.unregister_node(node_id);
        }

        self.publish(&rendered);
        self.rendered = rendered;
        &self.rendered
    }

    /// Change one option's state. Returns the paragraphs that were re-rendered.
    #[instrument(skip(self, state), fields(state = %state))]
    pub fn set_option_state(&mut self, option_id: &str, state: OptionState) -> Vec<String> {
        if !self.store.set(option_id, state) {
            return Vec::new();
        }
        let dirty = self.readers_of(option_id);
        self.refresh(&dirty);
        dirty
    }

    /// Move focus to `option_id`, or clear it. Returns the paragraphs that were
    /// re-rendered.
    pub fn set_focus(&mut self, option_id: Option<&str>) -> Vec<String> {
        if self.focus.as_deref() == option_id {
            return Vec::new();
        }
        let previous = std::mem::replace(&mut self.focus, option_id.map(str::to_string));

        let mut dirty = Vec::new();
        for id in previous.iter().map(String::as_str).chain(option_id) {
            for node_id in self.readers_of(id) {
                if !dirty.contains(&node_id) {
                    dirty.push(node_id);
                }
            }
        }
        self.refresh(&dirty);
        dirty
    }

    /// Replace a paragraph's text. Its content is remounted.
    pub fn update_text(&mut self, node_id: &str, text: impl Into<String>) -> EditorResult<()> {
        let node = self
            .document
            .path_of(node_id)
            .and_then(|path| self.document.node_at_mut(&path))
            .ok_or_else(|| EditorError::node_not_found(node_id))?;
        node.raw_text = text.into();
        node.reset_version += 1;

        self.refresh(&[node_id.to_string()]);
        Ok(())
    }

    /// Swap in a new document and walk it. Paragraphs that no longer exist are
    /// torn down.
    pub fn replace_document(&mut self, document: Document) -> &RenderedDocument {
        self.document = document;
        self.render()
    }

    /// Unregister every paragraph and drop all derived state.
    pub fn close(&mut self) {
        let mounted: Vec<String> = self.rendered.contexts.keys().cloned().collect();
        for node_id in &mounted {
            self.teardown_node(node_id);
        }
        self.registry.clear();
        self.rendered = RenderedDocument::new();
        self.evaluator.clear_cache();
        info!(paragraphs = mounted.len(), "Session closed");
    }

    /// Paragraphs reading `option_id`.
    ///
    /// Preview walks publish no subscriptions, so the document is scanned.
    fn readers_of(&self, option_id: &str) -> Vec<String> {
        if !self.options.preview_only {
            return self.registry.notify(option_id);
        }
        let mut readers = Vec::new();
        self.document.walk(&mut |node, _| {
            if node.option_ids().any(|id| id == option_id) {
                readers.push(node.id.clone());
            }
        });
        readers
    }

    fn refresh(&mut self, dirty: &[String]) {
        if dirty.is_empty() {
            return;
        }
        if self.rendered.nodes.is_empty() {
            self.render();
            return;
        }

        let focus = self.focus.as_deref();
        let mut paths = Vec::with_capacity(dirty.len());
        for node_id in dirty {
            let Some(path) = self.document.path_of(node_id) else {
                continue;
            };
            if let Some(node) = self.document.node_at(&path) {
                self.statuses
                    .insert(node_id.clone(), RenderStatus::for_node(node, &self.store, focus));
            }
            paths.push(path);
        }

        let Some(ancestor) = lowest_common_ancestor(&paths) else {
            debug!(dirty = dirty.len(), "Dirty paragraphs share no ancestor, full walk");
            self.render();
            return;
        };
        let context = self
            .document
            .node_at(&ancestor)
            .and_then(|node| self.rendered.contexts.get(&node.id))
            .cloned();
        let Some(context) = context else {
            self.render();
            return;
        };

        let state = RenderState::new(&self.store, &self.statuses).with_focus(focus);
        let Some(partial) =
            self.evaluator
                .render_subtree(&self.document, &context, &self.options, &state)
        else {
            self.render();
            return;
        };

        debug!(
            dirty = dirty.len(),
            ancestor = ?ancestor,
            paragraphs = partial.contexts.len(),
            "Re-rendered from common ancestor"
        );
        for node_id in partial.contexts.keys() {
            self.registry.unregister_node(node_id);
        }
        self.publish(&partial);
        self.rendered.splice(&ancestor, partial);
    }

    /// Feed a walk's side channels to the registry and the broadcaster.
    fn publish(&mut self, rendered: &RenderedDocument) {
        for sub in &rendered.subscriptions {
            self.registry
                .register(sub.option_id.clone(), Subscription::from(sub.clone()));
        }
        for update in &rendered.numbering {
            self.broadcaster.broadcast(&update.node_id, &update.numbering);
        }
    }

    fn teardown_node(&mut self, node_id: &str) {
        self.registry.unregister_node(node_id);
        self.broadcaster.forget(node_id);
        self.statuses.remove(node_id);
    }
}

/// Longest index path shared by every path. `None` when empty or when the
/// paths only share the document root.
pub fn lowest_common_ancestor(paths: &[Vec<usize>]) -> Option<Vec<usize>> {
    let (first, rest) = paths.split_first()?;
    let mut common = first.clone();
    for path in rest {
        let shared = common
            .iter()
            .zip(path)
            .take_while(|(a, b)| a == b)
            .count();
        common.truncate(shared);
    }
    (!common.is_empty()).then_some(common)
}
