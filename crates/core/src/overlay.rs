//! Priority-ordered stack of open overlays (dialogs, drawers, toasts).
//!
//! Overlays are ordered by priority; among equal priorities the most recently
//! opened one sits on top. The stack is plain data and knows nothing about
//! rendering, so any view layer can drive it.

use std::collections::{BTreeMap, HashMap};

/// Position of an overlay: higher priority first, then later insertion.
type Slot = (i32, u64);

/// An ordered set of open overlays keyed by id.
#[derive(Debug, Default, Clone)]
pub struct OverlayStack {
    order: BTreeMap<Slot, String>,
    slots: HashMap<String, Slot>,
    next_seq: u64,
}

impl OverlayStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an overlay at the given priority.
    ///
    /// Reopening an id that is already open moves it to the new priority and
    /// treats it as the newest overlay at that priority.
    pub fn open(&mut self, id: impl Into<String>, priority: i32) {
        let id = id.into();
        if let Some(old) = self.slots.remove(&id) {
            self.order.remove(&old);
        }
        let slot = (priority, self.next_seq);
        self.next_seq += 1;
        self.order.insert(slot, id.clone());
        self.slots.insert(id, slot);
    }

    /// Close an overlay by id. Returns false if it was not open.
    pub fn close(&mut self, id: &str) -> bool {
        match self.slots.remove(id) {
            Some(slot) => {
                self.order.remove(&slot);
                true
            }
            None => false,
        }
    }

    /// Close and return the topmost overlay.
    pub fn close_top(&mut self) -> Option<String> {
        let (_, id) = self.order.pop_last()?;
        self.slots.remove(&id);
        Some(id)
    }

    /// Close every overlay, returning their ids from top to bottom.
    pub fn close_all(&mut self) -> Vec<String> {
        self.slots.clear();
        std::mem::take(&mut self.order).into_values().rev().collect()
    }

    /// The topmost overlay, if any.
    pub fn top(&self) -> Option<&str> {
        self.order.last_key_value().map(|(_, id)| id.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Open overlays from bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.values().map(String::as_str)
    }
}
