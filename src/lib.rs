//! # Notice View
//!
//! The message core of a terminal client for a publish/subscribe notice
//! service: an ordered, observable view of everything received so far, fed
//! by a polling ingestion loop.
//!
//! ## Core Concepts
//!
//! - **View**: All messages sorted by `(timestamp, id)`, deduplicated by id
//! - **Event**: Named list of callbacks fired synchronously in order
//! - **Ingestion**: Polls a non-blocking source and inserts into the view
//! - **Client**: Application context owning the view for UI components
//!
//! ## Example
//!
//! ```ignore
//! use noticeview::{observer, ChannelSource, Client, ClientConfig, Message, MessageAdded, Topic};
//!
//! let client = Client::new(ClientConfig {
//!     topics: vec![Topic::class("help")],
//!     ..Default::default()
//! });
//!
//! // Keep a widget list in sync with the view
//! let on_message = observer(|added: &MessageAdded| {
//!     println!("insert {} at {}", added.message.id, added.index);
//!     Ok(())
//! });
//! client.view().on_message().add_observer(&on_message)?;
//!
//! let (source, sender) = ChannelSource::<Message>::new();
//! let running = client.start(source)?;
//! // ...
//! running.quit()?;
//! client.view().on_message().remove_observer(&on_message)?;
//! ```

pub mod client;
pub mod error;
pub mod event;
pub mod ingest;
pub mod source;
pub mod types;
pub mod view;

// Re-exports
pub use client::{Client, ClientConfig, RunningClient};
pub use error::{Error, Result};
pub use event::{observer, Event, Observer};
pub use ingest::{CancelHandle, IngestConfig, IngestLoop, IngestStats, DEFAULT_POLL_INTERVAL};
pub use source::{ChannelSource, MessageSource, Notice, NoticeUid, Subscription, Topic};
pub use types::*;
pub use view::{Iter, MessageAdded, MessageIndex, View};
