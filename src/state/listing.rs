//! Listing store: the one owner of the listing's mutable state.
//!
//! Drives the filter engine, the render engine and the pagination
//! controller on the three things that change the listing: the batch
//! arriving, a filter being chosen, and a scroll asking for more.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CatalogConfig;
use crate::error::FetchError;
use crate::runtime::{Event, TaskHandle};
use crate::source::DataSource;
use crate::state::data::{Item, ItemId};
use crate::state::filter::{self, FilterId};
use crate::state::pagination::{MoreRequested, PaginationController, ScrollMetrics};
use crate::state::preference::{PreferenceStore, FILTER_KEY};
use crate::view::preview::ImageSignal;
use crate::view::item::{ItemView, Selection, ViewContext, ViewToken};
use crate::view::listener::Listener;
use crate::view::render::{RenderEngine, RenderMode, RenderReport};

/// Listing-level visual state
#[derive(Debug, Clone, Default)]
pub enum ListingStatus {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Batch fetch in flight
    Loading,
    Ready,
    /// The batch never arrived; nothing is rendered
    Failed(FetchError),
}

/// Listing data, created once the batch arrives
#[derive(Debug)]
pub struct ListingState {
    all_items: Arc<[Arc<Item>]>,
    filter_id: FilterId,
    page_index: usize,
    ordered: Vec<Arc<Item>>,
    favourites: HashSet<ItemId>,
}

impl ListingState {
    fn new(items: Vec<Item>) -> Self {
        let all_items: Arc<[Arc<Item>]> = items.into_iter().map(Arc::new).collect();
        Self {
            ordered: all_items.to_vec(),
            all_items,
            filter_id: FilterId::Default,
            page_index: 0,
            favourites: HashSet::new(),
        }
    }

    pub fn all_items(&self) -> &[Arc<Item>] {
        &self.all_items
    }

    pub fn filter_id(&self) -> FilterId {
        self.filter_id
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// The current filter's ordering of all items
    pub fn ordered(&self) -> &[Arc<Item>] {
        &self.ordered
    }
}

pub struct ListingStore {
    status: ListingStatus,
    state: Option<ListingState>,
    render: RenderEngine,
    pagination: PaginationController,
    preferences: Box<dyn PreferenceStore>,
    ctx: ViewContext,
    fetch: Option<TaskHandle>,
    fetch_timeout: Duration,
}

impl ListingStore {
    pub fn new(
        config: &CatalogConfig,
        ctx: ViewContext,
        preferences: Box<dyn PreferenceStore>,
    ) -> Self {
        Self {
            status: ListingStatus::Idle,
            state: None,
            render: RenderEngine::new(config.page_size),
            pagination: PaginationController::new(
                config.page_size,
                config.scroll_gap,
                config.scroll_debounce(),
            ),
            preferences,
            ctx,
            fetch: None,
            fetch_timeout: config.fetch_timeout(),
        }
    }

    pub fn status(&self) -> &ListingStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, ListingStatus::Loading)
    }

    pub fn load_failure(&self) -> Option<&FetchError> {
        match &self.status {
            ListingStatus::Failed(err) => Some(err),
            _ => None,
        }
    }

    pub fn state(&self) -> Option<&ListingState> {
        self.state.as_ref()
    }

    /// The filter control to mark as selected
    pub fn active_filter(&self) -> Option<FilterId> {
        self.state.as_ref().map(ListingState::filter_id)
    }

    pub fn page_index(&self) -> usize {
        self.state.as_ref().map_or(0, ListingState::page_index)
    }

    pub fn views(&self) -> &[ItemView] {
        self.render.views()
    }

    pub fn rendered_ids(&self) -> Vec<ItemId> {
        self.render.rendered_ids()
    }

    pub fn has_next_page(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| self.pagination.has_next_page(state.ordered.len(), state.page_index))
    }

    pub fn pagination(&self) -> &PaginationController {
        &self.pagination
    }

    pub fn preferences(&self) -> &dyn PreferenceStore {
        self.preferences.as_ref()
    }

    /// Start the one-shot batch fetch, bounded by the fetch timeout.
    pub fn begin_fetch(&mut self, source: Arc<dyn DataSource>) {
        if !matches!(self.status, ListingStatus::Idle) {
            log::warn!("batch fetch already started, ignoring");
            return;
        }

        let timeout = self.fetch_timeout;
        self.status = ListingStatus::Loading;
        self.fetch = Some(self.ctx.scheduler.spawn(Box::pin(async move {
            let outcome = match tokio::time::timeout(timeout, source.fetch()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(FetchError::Timeout(timeout)),
            };
            Event::BatchFetched(outcome)
        })));
    }

    /// Apply the terminal outcome of the fetch. Only the first outcome
    /// while loading counts.
    pub fn on_batch(&mut self, outcome: Result<Vec<Item>, FetchError>) {
        if !matches!(self.status, ListingStatus::Loading) {
            log::warn!("unexpected batch outcome while {:?}, ignoring", self.status);
            return;
        }
        self.fetch = None;

        match outcome {
            Ok(items) => {
                log::info!("catalog loaded with {} items", items.len());
                self.state = Some(ListingState::new(items));
                self.status = ListingStatus::Ready;

                let filter = self.remembered_filter();
                self.apply_filter(filter);
            }
            Err(err) => {
                log::error!("catalog failed to load: {err}");
                self.status = ListingStatus::Failed(err);
            }
        }
    }

    /// Choose a filter by id; unknown ids mean the default ordering.
    pub fn set_filter(&mut self, raw: &str) -> Option<RenderReport> {
        self.apply_filter(FilterId::resolve(raw))
    }

    /// Re-order the listing and render its first page from scratch.
    pub fn apply_filter(&mut self, filter: FilterId) -> Option<RenderReport> {
        let Some(state) = self.state.as_mut() else {
            log::debug!("no catalog yet, ignoring filter {filter}");
            return None;
        };

        state.ordered = filter::apply(&state.all_items, filter);
        state.filter_id = filter;
        state.page_index = 0;

        if let Err(err) = self.preferences.set(FILTER_KEY, filter.as_str()) {
            log::warn!("could not remember filter {filter}: {err}");
        }

        self.pagination.reset();
        Some(self.render.render(&state.ordered, 0, RenderMode::Replace, &self.ctx))
    }

    /// The user scrolled the listing
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) {
        if self.state.is_none() {
            return;
        }
        self.pagination.on_scroll(metrics, self.ctx.scheduler.as_ref());
    }

    /// A debounce timer expired. Returns the append report if a new page
    /// was rendered.
    pub fn on_scroll_settled(&mut self, generation: u64) -> Option<RenderReport> {
        let state = self.state.as_ref()?;
        let MoreRequested =
            self.pagination
                .on_timer(generation, state.ordered.len(), state.page_index)?;
        self.advance_page()
    }

    /// Render the next page after the current ones.
    pub fn advance_page(&mut self) -> Option<RenderReport> {
        let state = self.state.as_mut()?;
        if !self.pagination.has_next_page(state.ordered.len(), state.page_index) {
            return None;
        }

        state.page_index += 1;
        Some(self.render.render(
            &state.ordered,
            state.page_index,
            RenderMode::Append,
            &self.ctx,
        ))
    }

    pub fn on_image_signal(&mut self, token: ViewToken, signal: ImageSignal) -> bool {
        self.render.deliver_image_signal(token, signal)
    }

    /// Click on a card; yields the selection signal if the card allows it.
    pub fn select(&self, token: ViewToken) -> Option<Selection> {
        self.render.view(token)?.select()
    }

    /// Flip the favourite flag of a live card's item. Returns the new value.
    pub fn toggle_favourite(&mut self, token: ViewToken) -> Option<bool> {
        let view = self.render.view(token)?;
        if !view.listeners().is_attached(Listener::Favourite) {
            return None;
        }
        let id = view.id();
        let state = self.state.as_mut()?;

        let liked = if state.favourites.remove(&id) {
            false
        } else {
            state.favourites.insert(id);
            true
        };
        Some(liked)
    }

    pub fn is_favourite(&self, id: ItemId) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.favourites.contains(&id))
    }

    /// Cancel everything still in flight and tear the views down.
    pub fn shutdown(&mut self) {
        if let Some(mut fetch) = self.fetch.take() {
            fetch.cancel();
        }
        self.pagination.reset();
        self.render.clear();
    }

    fn remembered_filter(&self) -> FilterId {
        match self.preferences.get(FILTER_KEY) {
            Ok(Some(raw)) => FilterId::resolve(&raw),
            Ok(None) => FilterId::Default,
            Err(err) => {
                log::warn!("could not read remembered filter: {err}");
                FilterId::Default
            }
        }
    }
}

impl std::fmt::Debug for ListingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingStore")
            .field("status", &self.status)
            .field("state", &self.state)
            .field("views", &self.render.len())
            .finish_non_exhaustive()
    }
}
