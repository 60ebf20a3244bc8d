//! Boundary to the external notification source.
//!
//! The protocol library itself is not part of this crate. Anything that can
//! subscribe to topics and hand over one message at a time without blocking
//! implements [`MessageSource`] and can drive the ingestion loop.

mod channel;
mod types;

pub use channel::ChannelSource;
pub use types::{Notice, NoticeUid, Subscription, Topic};

use crate::error::Result;
use crate::types::Message;

/// Non-blocking source of inbound messages.
pub trait MessageSource {
    /// Raw item type, normalized into a [`Message`] on ingestion.
    type Item: Into<Message>;

    /// Subscribe to `topics`. Called once before ingestion starts.
    fn subscribe(&mut self, topics: &[Topic]) -> Result<Subscription>;

    /// Next pending item, or `None` if nothing is available right now.
    ///
    /// Errors are treated as fatal by the ingestion loop.
    fn try_receive(&mut self) -> Result<Option<Self::Item>>;
}
