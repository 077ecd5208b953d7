//! Shared fixtures for unit tests.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::FetchError;
use crate::runtime::{Job, Scheduler, TaskHandle};
use crate::source::{DataSource, FetchFuture};
use crate::state::data::{Item, ItemId};
use crate::view::preview::{ImageHandle, ImageLoader, ImageSignal, LoadFuture};

/// Scheduler that drops every job; tests feed signals by hand.
#[derive(Debug, Default)]
pub struct InertScheduler {
    spawned: AtomicUsize,
}

impl InertScheduler {
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }
}

impl Scheduler for InertScheduler {
    fn spawn(&self, _job: Job) -> TaskHandle {
        self.spawned.fetch_add(1, Ordering::SeqCst);
        TaskHandle::default()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Script {
    Never,
    LoadAfter(Duration),
    FailAfter(Duration),
}

/// Image loader whose outcome per URL is fixed up front
#[derive(Debug, Clone)]
pub struct ScriptedLoader {
    default: Script,
    per_url: HashMap<String, Script>,
}

impl ScriptedLoader {
    pub fn new(default: Script) -> Self {
        Self {
            default,
            per_url: HashMap::new(),
        }
    }

    pub fn never() -> Self {
        Self::new(Script::Never)
    }

    pub fn loads_after(delay: Duration) -> Self {
        Self::new(Script::LoadAfter(delay))
    }

    pub fn with(mut self, url: &str, script: Script) -> Self {
        self.per_url.insert(url.to_string(), script);
        self
    }
}

impl ImageLoader for ScriptedLoader {
    fn load(&self, url: &str) -> LoadFuture {
        let script = self.per_url.get(url).copied().unwrap_or(self.default);
        let source = PathBuf::from(url);

        Box::pin(async move {
            match script {
                Script::Never => std::future::pending().await,
                Script::LoadAfter(delay) => {
                    tokio::time::sleep(delay).await;
                    ImageSignal::Loaded(ImageHandle {
                        source,
                        width: 640,
                        height: 480,
                    })
                }
                Script::FailAfter(delay) => {
                    tokio::time::sleep(delay).await;
                    ImageSignal::Failed("scripted failure".into())
                }
            }
        })
    }
}

/// Data source answering with a fixed outcome after a delay
pub struct StaticSource {
    pub outcome: Result<Vec<Item>, FetchError>,
    pub delay: Duration,
}

impl DataSource for StaticSource {
    fn fetch(&self) -> FetchFuture {
        let outcome = self.outcome.clone();
        let delay = self.delay;
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            outcome
        })
    }
}

pub fn item(id: u64, price: u32) -> Item {
    Item {
        id: ItemId(id),
        name: format!("Hotel {id}"),
        star_rating: 3,
        distance_km: 1.2,
        price,
        rating_score: 7.9,
        amenities: BTreeSet::new(),
        photos: vec![format!("photos/{id}-1.jpg"), format!("photos/{id}-2.jpg")],
        preview_url: Some(format!("previews/{id}.jpg")),
    }
}

/// `count` items with ids 1..=count and prices in input order
pub fn items(count: u64) -> Vec<Arc<Item>> {
    (1..=count).map(|id| Arc::new(item(id, id as u32 * 10))).collect()
}
