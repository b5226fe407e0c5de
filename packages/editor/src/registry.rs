//! # Option Observer Registry
//!
//! Maps each option id to the paragraphs that read it, so a state change can
//! be turned into a set of dirty paragraphs.
//!
//! The registry is an ordinary value owned by whoever drives rendering. It is
//! filled from the subscription side channel of a render walk and emptied
//! paragraph by paragraph when paragraphs are torn down.

use optclause_evaluator::OptionSubscription;
use optclause_parser::OptionDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A paragraph observing one option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub node_id: String,
    pub descriptor: OptionDescriptor,
}

impl From<OptionSubscription> for Subscription {
    fn from(sub: OptionSubscription) -> Self {
        Self {
            node_id: sub.node_id,
            descriptor: sub.descriptor,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OptionObserverRegistry {
    observers: BTreeMap<String, Vec<Subscription>>,
}

impl OptionObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscription` under `option_id`.
    ///
    /// Re-registering the same paragraph replaces its previous entry. Returns
    /// `true` if the paragraph was not yet registered for this option.
    pub fn register(&mut self, option_id: impl Into<String>, subscription: Subscription) -> bool {
        let entries = self.observers.entry(option_id.into()).or_default();
        match entries
            .iter_mut()
            .find(|existing| existing.node_id == subscription.node_id)
        {
            Some(existing) => {
                *existing = subscription;
                false
            }
            None => {
                entries.push(subscription);
                true
            }
        }
    }

    pub fn unregister(&mut self, option_id: &str, node_id: &str) -> bool {
        let Some(entries) = self.observers.get_mut(option_id) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|sub| sub.node_id != node_id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.observers.remove(option_id);
        }
        removed
    }

    /// Drop every subscription held by `node_id`. Returns how many were removed.
    pub fn unregister_node(&mut self, node_id: &str) -> usize {
        let mut removed = 0;
        self.observers.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|sub| sub.node_id != node_id);
            removed += before - entries.len();
            !entries.is_empty()
        });
        if removed > 0 {
            debug!(node = %node_id, removed, "Unregistered paragraph");
        }
        removed
    }

    /// Paragraphs to re-render after `option_id` changed, in registration order.
    pub fn notify(&self, option_id: &str) -> Vec<String> {
        self.subscribers(option_id)
            .iter()
            .map(|sub| sub.node_id.clone())
            .collect()
    }

    pub fn subscribers(&self, option_id: &str) -> &[Subscription] {
        self.observers
            .get(option_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Descriptor of `option_id` as registered by its first observer.
    pub fn descriptor(&self, option_id: &str) -> Option<&OptionDescriptor> {
        self.subscribers(option_id).first().map(|sub| &sub.descriptor)
    }

    pub fn option_ids(&self) -> impl Iterator<Item = &str> {
        self.observers.keys().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.observers.clear();
    }

    /// Number of observed options.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
