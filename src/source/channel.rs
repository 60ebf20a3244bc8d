//! In-memory message source backed by a channel.

use crate::error::{Error, Result};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

use super::types::{Subscription, Topic};
use super::MessageSource;

/// Source fed through a channel [`Sender`].
///
/// Stands in for a protocol library in tests and demos. Dropping every
/// sender closes the source.
pub struct ChannelSource<T> {
    receiver: Receiver<T>,
    topics: Vec<Topic>,
}

impl<T> ChannelSource<T> {
    /// Create a source and the sender that feeds it.
    pub fn new() -> (Self, Sender<T>) {
        let (sender, receiver) = unbounded();
        (
            Self {
                receiver,
                topics: Vec::new(),
            },
            sender,
        )
    }

    /// Topics subscribed so far.
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }
}

impl<T> MessageSource for ChannelSource<T>
where
    T: Into<crate::types::Message>,
{
    type Item = T;

    fn subscribe(&mut self, topics: &[Topic]) -> Result<Subscription> {
        for topic in topics {
            if !self.topics.contains(topic) {
                self.topics.push(topic.clone());
            }
        }
        Ok(Subscription {
            topics: self.topics.clone(),
        })
    }

    fn try_receive(&mut self) -> Result<Option<T>> {
        match self.receiver.try_recv() {
            Ok(item) => Ok(Some(item)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Error::SourceClosed),
        }
    }
}
