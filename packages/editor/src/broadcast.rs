//! Numbering change notifications.
//!
//! A paragraph's numbering string is published after every walk that
//! computes it. Subscribers only hear about changes: a value equal to the one
//! last delivered for the same paragraph is dropped, and a subscriber that
//! joins late does not get a replay.

use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

/// Called with `(node_id, numbering)`.
pub type NumberingCallback = Box<dyn FnMut(&str, &str)>;

struct Subscriber {
    id: SubscriberId,
    /// `None` listens to every paragraph
    node_id: Option<String>,
    callback: NumberingCallback,
}

#[derive(Default)]
pub struct NumberingBroadcaster {
    next_id: u64,
    subscribers: Vec<Subscriber>,
    last: HashMap<String, String>,
}

impl NumberingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        node_id: impl Into<String>,
        callback: impl FnMut(&str, &str) + 'static,
    ) -> SubscriberId {
        self.add(Some(node_id.into()), Box::new(callback))
    }

    pub fn subscribe_all(&mut self, callback: impl FnMut(&str, &str) + 'static) -> SubscriberId {
        self.add(None, Box::new(callback))
    }

    fn add(&mut self, node_id: Option<String>, callback: NumberingCallback) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            node_id,
            callback,
        });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|sub| sub.id != id);
        self.subscribers.len() != before
    }

    /// Publish `numbering` for `node_id`. Returns the number of callbacks run,
    /// zero when the value did not change.
    pub fn broadcast(&mut self, node_id: &str, numbering: &str) -> usize {
        if self.last.get(node_id).is_some_and(|prev| prev == numbering) {
            return 0;
        }
        self.last.insert(node_id.to_string(), numbering.to_string());

        let mut delivered = 0;
        for sub in &mut self.subscribers {
            if sub.node_id.as_deref().map_or(true, |id| id == node_id) {
                (sub.callback)(node_id, numbering);
                delivered += 1;
            }
        }
        delivered
    }

    /// Last numbering published for `node_id`.
    pub fn last(&self, node_id: &str) -> Option<&str> {
        self.last.get(node_id).map(String::as_str)
    }

    /// Forget the last value of an unmounted paragraph, so a remount is
    /// published again.
    pub fn forget(&mut self, node_id: &str) {
        self.last.remove(node_id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl fmt::Debug for NumberingBroadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumberingBroadcaster")
            .field("subscribers", &self.subscribers.len())
            .field("last", &self.last)
            .finish()
    }
}
