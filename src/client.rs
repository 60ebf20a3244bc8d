//! Client context tying the view, configuration, and ingestion together.

use crate::error::Result;
use crate::ingest::{self, CancelHandle, IngestConfig, IngestLoop, IngestStats, DEFAULT_POLL_INTERVAL};
use crate::source::{MessageSource, Subscription, Topic};
use crate::types::Message;
use crate::view::View;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::info;

/// Client configuration.
///
/// Missing fields take their [`Default`] values when deserializing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Wait between polls of an idle source. Serialized as whole
    /// milliseconds; a value with a sub-millisecond part fails to serialize.
    /// Default: 1ms
    #[serde(rename = "poll_interval_ms", with = "duration_millis")]
    pub poll_interval: Duration,

    /// Topics subscribed before ingestion starts.
    pub topics: Vec<Topic>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            topics: Vec::new(),
        }
    }
}

mod duration_millis {
    use serde::ser::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        if d.subsec_nanos() % 1_000_000 != 0 {
            return Err(S::Error::custom(format!(
                "poll interval {:?} is not a whole number of milliseconds",
                d
            )));
        }
        let millis = u64::try_from(d.as_millis())
            .map_err(|_| S::Error::custom("poll interval out of range"))?;
        s.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

/// Application context handed to UI components.
///
/// Owns the one [`View`] for the session. Widgets observe
/// `view().on_message()` and query the view for navigation.
pub struct Client {
    config: ClientConfig,
    view: Arc<View>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            view: Arc::new(View::new()),
        }
    }

    /// Start from previously received messages.
    pub fn with_history(
        config: ClientConfig,
        history: impl IntoIterator<Item = Message>,
    ) -> Result<Self> {
        Ok(Self {
            config,
            view: Arc::new(View::from_messages(history)?),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn view(&self) -> &Arc<View> {
        &self.view
    }

    /// Subscribe `source` to the configured topics and start ingesting on a
    /// background thread.
    pub fn start<S>(&self, mut source: S) -> Result<RunningClient>
    where
        S: MessageSource + Send + 'static,
    {
        let subscription = source.subscribe(&self.config.topics)?;
        info!(topics = subscription.topics.len(), "subscribed");

        let config = IngestConfig {
            poll_interval: self.config.poll_interval,
        };
        let (ingest, cancel) = IngestLoop::new(source, Arc::clone(&self.view), config);

        Ok(RunningClient {
            subscription,
            cancel,
            handle: ingest.spawn(),
        })
    }
}

/// A client whose ingestion loop is running.
pub struct RunningClient {
    subscription: Subscription,
    cancel: CancelHandle,
    handle: JoinHandle<Result<IngestStats>>,
}

impl RunningClient {
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Handle for stopping ingestion from elsewhere (e.g. a key handler).
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Whether the loop has exited, by cancellation or by error.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop ingestion and wait for the loop to exit.
    pub fn quit(self) -> Result<IngestStats> {
        self.cancel.cancel();
        ingest::join(self.handle)
    }
}
