//! The View: ordered, deduplicated, observable message store.

use crate::error::{Error, Result};
use crate::event::Event;
use crate::types::{Direction, Message, MessageId};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, trace};

use super::index::MessageIndex;

/// Argument of the [`View::on_message`] event.
#[derive(Clone, Debug)]
pub struct MessageAdded {
    pub message: Arc<Message>,
    /// Position the message was inserted at, at the time of insertion.
    pub index: usize,
}

/// All messages seen so far, in `(timestamp, id)` order.
///
/// Messages are only ever added. Queries take a read lock and may be called
/// from any thread, including from inside an `on_message` observer.
pub struct View {
    /// Sorted sequence and id map.
    index: RwLock<MessageIndex>,

    /// Serializes insert + notify so notifications follow insertion order.
    write_lock: Mutex<()>,

    on_message: Event<MessageAdded>,
}

impl View {
    /// Create an empty view.
    pub fn new() -> Self {
        Self {
            index: RwLock::new(MessageIndex::new()),
            write_lock: Mutex::new(()),
            on_message: Event::new("View.on_message"),
        }
    }

    /// Create a view seeded with `messages`, each added as by `add_message`.
    pub fn from_messages(messages: impl IntoIterator<Item = Message>) -> Result<Self> {
        let view = Self::new();
        for message in messages {
            view.add_message(message)?;
        }
        Ok(view)
    }

    /// Fired once per newly inserted message, after the insertion is visible.
    pub fn on_message(&self) -> &Event<MessageAdded> {
        &self.on_message
    }

    /// Insert a message at its sorted position and notify observers.
    ///
    /// Returns the insertion index, or `None` if a message with the same id
    /// was already present; duplicates are absorbed without notification.
    ///
    /// An observer error is returned after the message has been stored.
    /// Observers must not call `add_message`.
    pub fn add_message(&self, message: Message) -> Result<Option<usize>> {
        let _lock = self.write_lock.lock();

        let message = Arc::new(message);
        let inserted = self.index.write().insert(Arc::clone(&message));
        let Some(index) = inserted else {
            trace!(id = %message.id, "duplicate message ignored");
            return Ok(None);
        };
        debug!(id = %message.id, index, "message inserted");

        self.on_message.fire(&MessageAdded { message, index })?;
        Ok(Some(index))
    }

    /// Get a message by id.
    pub fn get_message(&self, id: &MessageId) -> Result<Arc<Message>> {
        self.index
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::MessageNotFound(id.clone()))
    }

    /// Return the message following (or preceding) the one with `id`.
    ///
    /// `Ok(None)` at either end of the view.
    pub fn next_message(&self, id: &MessageId, direction: Direction) -> Result<Option<Arc<Message>>> {
        self.index
            .read()
            .neighbor(id, direction)
            .map(|m| m.cloned())
            .ok_or_else(|| Error::MessageNotFound(id.clone()))
    }

    /// Current position of a message.
    pub fn position(&self, id: &MessageId) -> Result<usize> {
        self.index
            .read()
            .position(id)
            .ok_or_else(|| Error::MessageNotFound(id.clone()))
    }

    /// Whether this exact message (by key) is in the view.
    pub fn contains(&self, message: &Message) -> bool {
        self.index.read().contains(message)
    }

    pub fn contains_id(&self, id: &MessageId) -> bool {
        self.index.read().contains_id(id)
    }

    pub fn first(&self) -> Option<Arc<Message>> {
        self.index.read().first().cloned()
    }

    pub fn last(&self) -> Option<Arc<Message>> {
        self.index.read().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Copy of the current sequence.
    pub fn snapshot(&self) -> Vec<Arc<Message>> {
        self.index.read().as_slice().to_vec()
    }

    /// Iterate messages in ascending order.
    ///
    /// The iterator is a live cursor over positions: messages inserted ahead
    /// of the cursor while iterating shift what it yields next.
    pub fn iter(&self) -> Iter<'_> {
        Iter { view: self, pos: 0 }
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

/// Live cursor over a [`View`].
pub struct Iter<'a> {
    view: &'a View,
    pos: usize,
}

impl Iterator for Iter<'_> {
    type Item = Arc<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        let message = self.view.index.read().at(self.pos).cloned()?;
        self.pos += 1;
        Some(message)
    }
}

impl<'a> IntoIterator for &'a View {
    type Item = Arc<Message>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
