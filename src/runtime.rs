//! Event processing plumbing.
//!
//! The catalog runs as one logical event processor: the owner of
//! [`crate::session::Session`] pulls [`Event`]s off a channel and applies
//! them one at a time. Anything that has to wait (the batch fetch, image
//! loads, image timeouts, the scroll debounce) is spawned through a
//! [`Scheduler`] as a job that resolves to exactly one `Event`.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::AbortHandle;

use crate::error::FetchError;
use crate::state::data::Item;
use crate::view::preview::ImageSignal;
use crate::view::item::ViewToken;

/// Typed signals delivered back to the event processor
#[derive(Debug, Clone)]
pub enum Event {
    /// Terminal outcome of the one-shot batch fetch
    BatchFetched(Result<Vec<Item>, FetchError>),
    /// A load, error, abort or timeout signal for one item view instance
    Image { token: ViewToken, signal: ImageSignal },
    /// The scroll debounce timer of the given generation expired
    ScrollSettled { generation: u64 },
}

/// A unit of asynchronous work that ends in one event
pub type Job = Pin<Box<dyn Future<Output = Event> + Send + 'static>>;

/// Spawns jobs and hands back a handle that can cancel them.
pub trait Scheduler: Send + Sync {
    fn spawn(&self, job: Job) -> TaskHandle;
}

/// Cancellation handle for a spawned job.
///
/// Cancelling is synchronous: once `cancel` returns the job will not run
/// again. An event the job already queued can still be in the channel,
/// which is why every event carries an identity its receiver validates.
/// Dropping the handle cancels the job too.
#[derive(Default)]
pub struct TaskHandle {
    abort: Option<AbortHandle>,
}

impl TaskHandle {
    pub fn new(abort: AbortHandle) -> Self {
        Self { abort: Some(abort) }
    }

    /// Whether the job has neither been cancelled nor finished
    pub fn is_active(&self) -> bool {
        self.abort.as_ref().is_some_and(|abort| !abort.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(abort) = self.abort.take() {
            abort.abort();
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Scheduler backed by a tokio runtime; finished jobs are sent to the
/// event channel.
#[derive(Clone)]
pub struct TokioScheduler {
    runtime: Handle,
    events: UnboundedSender<Event>,
}

impl TokioScheduler {
    pub fn new(runtime: Handle, events: UnboundedSender<Event>) -> Self {
        Self { runtime, events }
    }

    /// Scheduler plus the receiving end of its event channel
    pub fn channel(runtime: Handle) -> (Self, UnboundedReceiver<Event>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (Self::new(runtime, events), receiver)
    }
}

impl Scheduler for TokioScheduler {
    fn spawn(&self, job: Job) -> TaskHandle {
        let events = self.events.clone();
        let task = self.runtime.spawn(async move {
            let event = job.await;
            if events.send(event).is_err() {
                log::trace!("event processor is gone, dropping event");
            }
        });
        TaskHandle::new(task.abort_handle())
    }
}

impl fmt::Debug for TokioScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioScheduler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_job_result_reaches_channel() {
        let (scheduler, mut events) = TokioScheduler::channel(Handle::current());

        let _handle = scheduler.spawn(Box::pin(async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Event::ScrollSettled { generation: 7 }
        }));

        match events.recv().await {
            Some(Event::ScrollSettled { generation }) => assert_eq!(generation, 7),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_job_never_fires() {
        let (scheduler, mut events) = TokioScheduler::channel(Handle::current());

        let mut handle = scheduler.spawn(Box::pin(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Event::ScrollSettled { generation: 1 }
        }));
        assert!(handle.is_active());

        handle.cancel();
        assert!(!handle.is_active());

        let waited = tokio::time::timeout(Duration::from_secs(1), events.recv()).await;
        assert!(waited.is_err(), "cancelled job delivered an event");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels() {
        let (scheduler, mut events) = TokioScheduler::channel(Handle::current());

        drop(scheduler.spawn(Box::pin(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Event::ScrollSettled { generation: 2 }
        })));

        let waited = tokio::time::timeout(Duration::from_secs(1), events.recv()).await;
        assert!(waited.is_err());
    }
}
