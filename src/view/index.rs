//! Sorted message sequence with an identity map.

use crate::types::{Direction, Message, MessageId};
use std::collections::HashMap;
use std::sync::Arc;

/// Messages sorted by `(timestamp, id)` plus an id lookup table.
///
/// Both structures always hold the same set of messages.
#[derive(Default)]
pub struct MessageIndex {
    /// Canonical order for iteration and navigation.
    messages: Vec<Arc<Message>>,

    /// Message id to message.
    by_id: HashMap<MessageId, Arc<Message>>,
}

impl MessageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a message at its sorted position.
    ///
    /// Returns the insertion index, or `None` if a message with the same id
    /// is already present (nothing changes in that case).
    pub fn insert(&mut self, message: Arc<Message>) -> Option<usize> {
        if self.by_id.contains_key(&message.id) {
            return None;
        }

        let key = message.key();
        let idx = self.messages.partition_point(|m| m.key() < key);
        self.by_id.insert(message.id.clone(), Arc::clone(&message));
        self.messages.insert(idx, message);
        Some(idx)
    }

    pub fn get(&self, id: &MessageId) -> Option<&Arc<Message>> {
        self.by_id.get(id)
    }

    pub fn contains_id(&self, id: &MessageId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Binary search on the full key.
    pub fn contains(&self, message: &Message) -> bool {
        self.search(message).is_ok()
    }

    /// Current index of a known message.
    pub fn position(&self, id: &MessageId) -> Option<usize> {
        let message = self.by_id.get(id)?;
        self.search(message).ok()
    }

    /// Message adjacent to `id` in sort order.
    ///
    /// Outer `None` means `id` is unknown; inner `None` means `id` sits at
    /// the end being stepped past.
    pub fn neighbor(&self, id: &MessageId, direction: Direction) -> Option<Option<&Arc<Message>>> {
        let idx = self.position(id)?;
        let next = match direction {
            Direction::Forward => self.messages.get(idx + 1),
            Direction::Backward => idx.checked_sub(1).and_then(|i| self.messages.get(i)),
        };
        Some(next)
    }

    pub fn at(&self, idx: usize) -> Option<&Arc<Message>> {
        self.messages.get(idx)
    }

    pub fn first(&self) -> Option<&Arc<Message>> {
        self.messages.first()
    }

    pub fn last(&self) -> Option<&Arc<Message>> {
        self.messages.last()
    }

    pub fn as_slice(&self) -> &[Arc<Message>] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn search(&self, message: &Message) -> Result<usize, usize> {
        let key = message.key();
        self.messages.binary_search_by(|m| m.key().cmp(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;

    fn msg(ts: f64, id: &str) -> Arc<Message> {
        Arc::new(Message::new(Timestamp(ts)).with_id(id))
    }

    fn ids(index: &MessageIndex) -> Vec<&str> {
        index.as_slice().iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_insert_sorted_with_ties() {
        let mut index = MessageIndex::new();

        assert_eq!(index.insert(msg(10.0, "c")), Some(0));
        assert_eq!(index.insert(msg(10.0, "a")), Some(0));
        assert_eq!(index.insert(msg(10.0, "b")), Some(1));
        assert_eq!(index.insert(msg(1.0, "z")), Some(0));

        assert_eq!(ids(&index), vec!["z", "a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_id_is_noop() {
        let mut index = MessageIndex::new();
        index.insert(msg(10.0, "a"));

        // Same id with a different timestamp must not move or duplicate it.
        assert_eq!(index.insert(msg(1.0, "a")), None);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&"a".into()).unwrap().timestamp, Timestamp(10.0));
    }

    #[test]
    fn test_contains_uses_full_key() {
        let mut index = MessageIndex::new();
        index.insert(msg(10.0, "a"));

        assert!(index.contains(&msg(10.0, "a")));
        assert!(!index.contains(&msg(10.0, "b")));
        // Known id, wrong timestamp: not the stored message's key.
        assert!(!index.contains(&msg(11.0, "a")));
    }

    #[test]
    fn test_neighbors() {
        let mut index = MessageIndex::new();
        index.insert(msg(1.0, "a"));
        index.insert(msg(2.0, "b"));

        let a = MessageId::from("a");
        let b = MessageId::from("b");

        assert_eq!(index.neighbor(&a, Direction::Forward).unwrap().unwrap().id, b);
        assert!(index.neighbor(&a, Direction::Backward).unwrap().is_none());
        assert!(index.neighbor(&b, Direction::Forward).unwrap().is_none());
        assert!(index.neighbor(&"x".into(), Direction::Forward).is_none());
        assert_eq!(index.position(&b), Some(1));
    }
}
