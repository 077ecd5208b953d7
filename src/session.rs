//! A browsing session: the listing plus the gallery, fed from one event
//! stream.

use std::sync::Arc;

use crate::config::CatalogConfig;
use crate::runtime::Event;
use crate::source::DataSource;
use crate::state::gallery::{GalleryController, GalleryKey};
use crate::state::listing::ListingStore;
use crate::state::pagination::ScrollMetrics;
use crate::state::preference::PreferenceStore;
use crate::view::item::{ViewContext, ViewToken};

#[derive(Debug)]
pub struct Session {
    listing: ListingStore,
    gallery: GalleryController,
}

impl Session {
    pub fn new(
        config: &CatalogConfig,
        ctx: ViewContext,
        preferences: Box<dyn PreferenceStore>,
    ) -> Self {
        Self {
            listing: ListingStore::new(config, ctx, preferences),
            gallery: GalleryController::new(),
        }
    }

    pub fn listing(&self) -> &ListingStore {
        &self.listing
    }

    pub fn gallery(&self) -> &GalleryController {
        &self.gallery
    }

    pub fn start(&mut self, source: Arc<dyn DataSource>) {
        self.listing.begin_fetch(source);
    }

    /// Apply one asynchronous completion.
    pub fn handle(&mut self, event: Event) {
        match event {
            Event::BatchFetched(outcome) => self.listing.on_batch(outcome),
            Event::Image { token, signal } => {
                self.listing.on_image_signal(token, signal);
            }
            Event::ScrollSettled { generation } => {
                self.listing.on_scroll_settled(generation);
            }
        }
    }

    pub fn choose_filter(&mut self, raw: &str) {
        self.listing.set_filter(raw);
    }

    pub fn scrolled(&mut self, metrics: ScrollMetrics) {
        self.listing.on_scroll(metrics);
    }

    /// A card was clicked. Opens the gallery if the card raised a selection.
    pub fn card_clicked(&mut self, token: ViewToken) -> bool {
        if self.gallery.is_open() {
            // The overlay is modal
            return false;
        }
        match self.listing.select(token) {
            Some(selection) => self.gallery.open(selection),
            None => false,
        }
    }

    pub fn favourite_clicked(&mut self, token: ViewToken) -> Option<bool> {
        self.listing.toggle_favourite(token)
    }

    /// Keyboard input; only reaches the gallery while it listens.
    pub fn key_pressed(&mut self, key: GalleryKey) -> bool {
        self.gallery.on_key(key)
    }

    pub fn close_gallery(&mut self) -> bool {
        self.gallery.on_close_control()
    }

    pub fn shutdown(&mut self) {
        self.gallery.close();
        self.listing.shutdown();
    }
}
