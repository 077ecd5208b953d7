//! Lazy card backgrounds.
//!
//! Every item view with a preview URL owns an [`ImageLoadSupervisor`] that
//! races the load against a fixed timeout and settles exactly once.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use crate::runtime::{Event, Scheduler, TaskHandle};
use crate::view::item::ViewToken;

/// A successfully decoded image, ready to be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Raw signals an image load can produce
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSignal {
    Loaded(ImageHandle),
    Failed(String),
    Aborted,
    TimedOut,
}

/// Per-view image state. Leaves `Pending` once and never again.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ImageLoadState {
    #[default]
    Pending,
    Loaded(ImageHandle),
    Unavailable,
}

/// The single resolution of a load
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Loaded(ImageHandle),
    Unavailable,
}

pub type LoadFuture = Pin<Box<dyn Future<Output = ImageSignal> + Send + 'static>>;

/// Something that can fetch and decode an image URL.
pub trait ImageLoader: Send + Sync {
    fn load(&self, url: &str) -> LoadFuture;
}

/// Resolve a catalog URL against the catalog's directory.
///
/// `file://` prefixes are stripped; absolute paths are kept as they are.
pub fn resolve_url(base_dir: &Path, url: &str) -> PathBuf {
    let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Loads images from the local filesystem
#[derive(Debug, Clone)]
pub struct DiskImageLoader {
    base_dir: PathBuf,
}

impl DiskImageLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl ImageLoader for DiskImageLoader {
    fn load(&self, url: &str) -> LoadFuture {
        let path = resolve_url(&self.base_dir, url);

        Box::pin(async move {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(err) => return ImageSignal::Failed(format!("{}: {err}", path.display())),
            };

            // Decoding is CPU-bound, keep it off the async workers
            let decoded = tokio::task::spawn_blocking(move || {
                image::load_from_memory(&bytes).map(|img| (img.width(), img.height()))
            })
            .await;

            match decoded {
                Ok(Ok((width, height))) => ImageSignal::Loaded(ImageHandle {
                    source: path,
                    width,
                    height,
                }),
                Ok(Err(err)) => ImageSignal::Failed(format!("{}: {err}", path.display())),
                Err(_) => ImageSignal::Aborted,
            }
        })
    }
}

/// Races one image load against a timeout.
///
/// Both racers deliver their signals as [`Event::Image`] tagged with the
/// owning view's token. The first signal settles the supervisor; anything
/// arriving afterwards (a load that completes after the timeout, an error
/// that trails a success) is ignored.
#[derive(Debug)]
pub struct ImageLoadSupervisor {
    token: ViewToken,
    url: String,
    state: ImageLoadState,
    load: TaskHandle,
    timer: TaskHandle,
}

impl ImageLoadSupervisor {
    /// Begin the load attempt and its timer.
    pub fn start(
        token: ViewToken,
        url: &str,
        loader: &dyn ImageLoader,
        scheduler: &dyn Scheduler,
        timeout: Duration,
    ) -> Self {
        let attempt = loader.load(url);
        let load = scheduler.spawn(Box::pin(async move {
            Event::Image {
                token,
                signal: attempt.await,
            }
        }));

        let timer = scheduler.spawn(Box::pin(async move {
            tokio::time::sleep(timeout).await;
            Event::Image {
                token,
                signal: ImageSignal::TimedOut,
            }
        }));

        Self {
            token,
            url: url.to_string(),
            state: ImageLoadState::Pending,
            load,
            timer,
        }
    }

    pub fn state(&self) -> &ImageLoadState {
        &self.state
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self.state, ImageLoadState::Pending)
    }

    /// Whether the load or the timer can still deliver a signal
    pub fn has_pending_work(&self) -> bool {
        self.load.is_active() || self.timer.is_active()
    }

    /// Feed one signal. Returns the settlement the first time only.
    pub fn on_signal(&mut self, signal: ImageSignal) -> Option<Settlement> {
        if self.is_settled() {
            log::trace!("{:?}: ignoring {:?} after settlement", self.token, signal);
            return None;
        }

        let settlement = match signal {
            ImageSignal::Loaded(handle) => Settlement::Loaded(handle),
            ImageSignal::Failed(reason) => {
                log::debug!("{:?}: preview {} failed: {reason}", self.token, self.url);
                Settlement::Unavailable
            }
            ImageSignal::Aborted => {
                log::debug!("{:?}: preview {} aborted", self.token, self.url);
                Settlement::Unavailable
            }
            ImageSignal::TimedOut => {
                log::debug!("{:?}: preview {} timed out", self.token, self.url);
                Settlement::Unavailable
            }
        };

        // Whichever side lost the race is released now
        self.load.cancel();
        self.timer.cancel();

        self.state = match &settlement {
            Settlement::Loaded(handle) => ImageLoadState::Loaded(handle.clone()),
            Settlement::Unavailable => ImageLoadState::Unavailable,
        };
        Some(settlement)
    }

    /// Cancel the timer and stop listening to the load.
    pub fn teardown(&mut self) {
        self.load.cancel();
        self.timer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::TokioScheduler;
    use crate::testing::{InertScheduler, ScriptedLoader};
    use tokio::runtime::Handle;

    const T: Duration = Duration::from_secs(10);

    fn handle(name: &str) -> ImageHandle {
        ImageHandle {
            source: PathBuf::from(name),
            width: 4,
            height: 3,
        }
    }

    fn supervisor() -> ImageLoadSupervisor {
        let loader = ScriptedLoader::never();
        ImageLoadSupervisor::start(ViewToken(1), "a.jpg", &loader, &InertScheduler::default(), T)
    }

    #[test]
    fn test_success_then_error_stays_loaded() {
        let mut sup = supervisor();

        assert_eq!(
            sup.on_signal(ImageSignal::Loaded(handle("a.jpg"))),
            Some(Settlement::Loaded(handle("a.jpg")))
        );
        assert_eq!(sup.on_signal(ImageSignal::Failed("late".into())), None);
        assert_eq!(sup.on_signal(ImageSignal::TimedOut), None);
        assert_eq!(sup.state(), &ImageLoadState::Loaded(handle("a.jpg")));
    }

    #[test]
    fn test_timeout_then_late_load_stays_unavailable() {
        let mut sup = supervisor();

        assert_eq!(sup.on_signal(ImageSignal::TimedOut), Some(Settlement::Unavailable));
        assert_eq!(sup.on_signal(ImageSignal::Loaded(handle("a.jpg"))), None);
        assert_eq!(sup.state(), &ImageLoadState::Unavailable);
    }

    #[test]
    fn test_abort_settles_unavailable() {
        let mut sup = supervisor();
        assert_eq!(sup.on_signal(ImageSignal::Aborted), Some(Settlement::Unavailable));
        assert!(sup.is_settled());
    }

    #[test]
    fn test_resolve_url() {
        let base = Path::new("/srv/catalog");
        assert_eq!(resolve_url(base, "img/a.jpg"), PathBuf::from("/srv/catalog/img/a.jpg"));
        assert_eq!(resolve_url(base, "file:///tmp/b.jpg"), PathBuf::from("/tmp/b.jpg"));
        assert_eq!(resolve_url(base, "/abs/c.jpg"), PathBuf::from("/abs/c.jpg"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_load_wins_and_timer_is_cancelled() {
        let (scheduler, mut events) = TokioScheduler::channel(Handle::current());
        let loader = ScriptedLoader::loads_after(Duration::from_secs(2));
        let mut sup = ImageLoadSupervisor::start(ViewToken(5), "a.jpg", &loader, &scheduler, T);

        let Some(Event::Image { token, signal }) = events.recv().await else {
            panic!("expected an image event");
        };
        assert_eq!(token, ViewToken(5));
        assert!(matches!(sup.on_signal(signal), Some(Settlement::Loaded(_))));
        assert!(!sup.has_pending_work());

        // The timer was cancelled, nothing else arrives
        let rest = tokio::time::timeout(T * 2, events.recv()).await;
        assert!(rest.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_load_loses_to_timeout() {
        let (scheduler, mut events) = TokioScheduler::channel(Handle::current());
        let loader = ScriptedLoader::loads_after(Duration::from_secs(15));
        let mut sup = ImageLoadSupervisor::start(ViewToken(6), "a.jpg", &loader, &scheduler, T);

        let started = tokio::time::Instant::now();
        let Some(Event::Image { signal, .. }) = events.recv().await else {
            panic!("expected an image event");
        };
        assert_eq!(signal, ImageSignal::TimedOut);
        assert!(started.elapsed() >= T);
        assert!(started.elapsed() < Duration::from_secs(15));
        assert_eq!(sup.on_signal(signal), Some(Settlement::Unavailable));

        // The load listener was detached: the completion at 15s never shows up
        let rest = tokio::time::timeout(T, events.recv()).await;
        assert!(rest.is_err());
        assert_eq!(sup.state(), &ImageLoadState::Unavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_before_settlement_silences_both_racers() {
        let (scheduler, mut events) = TokioScheduler::channel(Handle::current());
        let loader = ScriptedLoader::loads_after(Duration::from_secs(3));
        let mut sup = ImageLoadSupervisor::start(ViewToken(8), "a.jpg", &loader, &scheduler, T);

        sup.teardown();
        assert!(!sup.has_pending_work());

        let rest = tokio::time::timeout(T * 2, events.recv()).await;
        assert!(rest.is_err());
    }
}
