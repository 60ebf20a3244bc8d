//! Polling loop that feeds a message source into a [`View`].

use crate::error::{Error, Result};
use crate::source::MessageSource;
use crate::view::View;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{info, trace, warn};

/// Default wait between polls of an empty source.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Ingestion loop configuration.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// How long to wait after the source reports nothing pending.
    /// Default: 1ms
    pub poll_interval: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Counters for one run of the loop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Items taken from the source.
    pub received: u64,
    /// Items that were new to the view.
    pub inserted: u64,
    /// Items the view already had.
    pub duplicates: u64,
    /// Polls that found nothing and waited.
    pub idle_polls: u64,
}

/// Stops a running [`IngestLoop`].
///
/// Dropping every handle also stops the loop, at its next wait.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    sender: Sender<()>,
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            // Wake the loop if it is waiting; a full buffer means it was already woken.
            let _ = self.sender.try_send(());
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Bridges a non-blocking [`MessageSource`] into [`View::add_message`].
///
/// The loop is the view's only writer. It checks for cancellation before
/// every poll and while waiting out the poll interval, and never stops in
/// the middle of an insertion.
pub struct IngestLoop<S> {
    source: S,
    view: Arc<View>,
    config: IngestConfig,
    cancelled: Arc<AtomicBool>,
    wakeup: Receiver<()>,
}

impl<S: MessageSource> IngestLoop<S> {
    /// Create a loop and the handle that cancels it.
    pub fn new(source: S, view: Arc<View>, config: IngestConfig) -> (Self, CancelHandle) {
        let (sender, wakeup) = bounded(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let handle = CancelHandle {
            sender,
            cancelled: Arc::clone(&cancelled),
        };
        let ingest = Self {
            source,
            view,
            config,
            cancelled,
            wakeup,
        };
        (ingest, handle)
    }

    pub fn view(&self) -> &Arc<View> {
        &self.view
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run until cancelled.
    ///
    /// Source errors and observer errors end the loop and are returned; the
    /// loop cannot tell a broken source from an idle one, so it does not
    /// retry.
    pub fn run(&mut self) -> Result<IngestStats> {
        info!(poll_interval = ?self.config.poll_interval, "ingestion started");

        let result = self.poll_until_cancelled();
        match &result {
            Ok(stats) => info!(
                received = stats.received,
                inserted = stats.inserted,
                duplicates = stats.duplicates,
                "ingestion stopped"
            ),
            Err(e) => warn!(error = %e, "ingestion failed"),
        }
        result
    }

    fn poll_until_cancelled(&mut self) -> Result<IngestStats> {
        let mut stats = IngestStats::default();

        while !self.cancelled.load(Ordering::SeqCst) {
            match self.source.try_receive()? {
                Some(item) => {
                    stats.received += 1;
                    match self.view.add_message(item.into())? {
                        Some(_) => stats.inserted += 1,
                        None => stats.duplicates += 1,
                    }
                }
                None => {
                    stats.idle_polls += 1;
                    trace!("source idle");
                    match self.wakeup.recv_timeout(self.config.poll_interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            }
        }

        Ok(stats)
    }
}

impl<S> IngestLoop<S>
where
    S: MessageSource + Send + 'static,
{
    /// Run the loop on a dedicated thread.
    pub fn spawn(mut self) -> JoinHandle<Result<IngestStats>> {
        std::thread::spawn(move || self.run())
    }
}

/// Wait for a spawned loop, turning a panic into an error.
pub fn join(handle: JoinHandle<Result<IngestStats>>) -> Result<IngestStats> {
    handle.join().map_err(|_| Error::IngestPanicked)?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::observer;
    use crate::source::ChannelSource;
    use crate::types::{Message, Timestamp};
    use crate::view::MessageAdded;
    use std::time::Instant;

    fn msg(ts: f64, id: &str) -> Message {
        Message::new(Timestamp(ts)).with_id(id)
    }

    fn wait_for(view: &View, len: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while view.len() < len {
            assert!(Instant::now() < deadline, "timed out waiting for {} messages", len);
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_cancel_before_run() {
        let (source, _sender) = ChannelSource::<Message>::new();
        let view = Arc::new(View::new());
        let (mut ingest, cancel) = IngestLoop::new(source, Arc::clone(&view), IngestConfig::default());
        assert!(Arc::ptr_eq(ingest.view(), &view));
        assert!(ingest.source().topics().is_empty());

        cancel.cancel();
        cancel.cancel();

        assert_eq!(ingest.run().unwrap(), IngestStats::default());
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_cancel_from_observer_stops_after_insert() {
        let (source, sender) = ChannelSource::<Message>::new();
        let view = Arc::new(View::new());
        let (mut ingest, cancel) = IngestLoop::new(source, Arc::clone(&view), IngestConfig::default());

        let stopper = {
            let cancel = cancel.clone();
            observer(move |added: &MessageAdded| {
                if added.message.id.as_str() == "b" {
                    cancel.cancel();
                }
                Ok(())
            })
        };
        view.on_message().add_observer(&stopper).unwrap();

        for m in [msg(1.0, "a"), msg(1.0, "a"), msg(2.0, "b"), msg(3.0, "c")] {
            sender.send(m).unwrap();
        }

        let stats = ingest.run().unwrap();

        assert_eq!(stats.received, 3);
        assert_eq!(stats.inserted, 2);
        assert_eq!(stats.duplicates, 1);
        // "c" is left in the source untouched.
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn test_spawned_loop_ingests_and_cancels() {
        let (source, sender) = ChannelSource::<Message>::new();
        let view = Arc::new(View::new());
        let config = IngestConfig {
            poll_interval: Duration::from_millis(5),
        };
        let (ingest, cancel) = IngestLoop::new(source, Arc::clone(&view), config);
        let handle = ingest.spawn();

        sender.send(msg(10.0, "a")).unwrap();
        sender.send(msg(5.0, "b")).unwrap();
        wait_for(&view, 2);

        cancel.cancel();
        let stats = join(handle).unwrap();

        assert_eq!(stats.inserted, 2);
        assert_eq!(view.first().unwrap().id.as_str(), "b");
    }

    #[test]
    fn test_closed_source_is_fatal() {
        let (source, sender) = ChannelSource::<Message>::new();
        sender.send(msg(1.0, "a")).unwrap();
        drop(sender);

        let view = Arc::new(View::new());
        let (mut ingest, _cancel) = IngestLoop::new(source, Arc::clone(&view), IngestConfig::default());

        assert!(matches!(ingest.run(), Err(Error::SourceClosed)));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_dropped_handle_stops_idle_loop() {
        let (source, _sender) = ChannelSource::<Message>::new();
        let view = Arc::new(View::new());
        let (mut ingest, cancel) = IngestLoop::new(source, view, IngestConfig::default());
        drop(cancel);

        let stats = ingest.run().unwrap();
        assert_eq!(stats.idle_polls, 1);
    }
}
