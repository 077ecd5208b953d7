//! Modal photo gallery.
//!
//! `Closed --open--> Open(photos, 0)`, arrows move within the photos and
//! clamp at both ends, Escape or the close control return to `Closed`.
//! Keyboard input is only listened to while open.

use crate::view::item::Selection;
use crate::view::listener::{Listener, Listeners};

/// Keys the gallery understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryKey {
    Escape,
    Left,
    Right,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GalleryState {
    #[default]
    Closed,
    /// `current < photos.len()` always holds
    Open { photos: Vec<String>, current: usize },
}

#[derive(Debug, Default)]
pub struct GalleryController {
    state: GalleryState,
    listeners: Listeners,
}

impl GalleryController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GalleryState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, GalleryState::Open { .. })
    }

    /// Overlay visibility flag for the presentation layer
    pub fn is_hidden(&self) -> bool {
        !self.is_open()
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    pub fn listens_to_keyboard(&self) -> bool {
        self.listeners.is_attached(Listener::Keyboard)
    }

    pub fn current_index(&self) -> Option<usize> {
        match &self.state {
            GalleryState::Open { current, .. } => Some(*current),
            GalleryState::Closed => None,
        }
    }

    pub fn photo_count(&self) -> usize {
        match &self.state {
            GalleryState::Open { photos, .. } => photos.len(),
            GalleryState::Closed => 0,
        }
    }

    pub fn current_photo(&self) -> Option<&str> {
        match &self.state {
            GalleryState::Open { photos, current } => photos.get(*current).map(String::as_str),
            GalleryState::Closed => None,
        }
    }

    /// Show the gallery for a selected item, starting at its first photo.
    /// Returns `false` when there is nothing to show.
    pub fn open(&mut self, selection: Selection) -> bool {
        if selection.photos.is_empty() {
            log::debug!("{} has no photos, gallery stays closed", selection.item);
            return false;
        }

        log::debug!(
            "gallery opened for {} with {} photos",
            selection.item,
            selection.photos.len()
        );
        self.state = GalleryState::Open {
            photos: selection.photos,
            current: 0,
        };
        // Idempotent: re-opening never registers twice
        self.listeners.attach(Listener::Keyboard);
        self.listeners.attach(Listener::CloseControl);
        true
    }

    /// Route a key press. Returns `true` if the key was handled.
    pub fn on_key(&mut self, key: GalleryKey) -> bool {
        if !self.listens_to_keyboard() {
            return false;
        }

        match key {
            GalleryKey::Escape => self.close(),
            GalleryKey::Left => self.step(|current, _| current.saturating_sub(1)),
            GalleryKey::Right => self.step(|current, len| (current + 1).min(len - 1)),
            GalleryKey::Other => false,
        }
    }

    /// The overlay's close control was activated
    pub fn on_close_control(&mut self) -> bool {
        if !self.listeners.is_attached(Listener::CloseControl) {
            return false;
        }
        self.close()
    }

    /// Close the gallery. Listeners are removed before the state changes.
    pub fn close(&mut self) -> bool {
        if !self.is_open() {
            return false;
        }

        self.listeners.detach(Listener::Keyboard);
        self.listeners.detach(Listener::CloseControl);
        self.state = GalleryState::Closed;
        log::debug!("gallery closed");
        true
    }

    fn step(&mut self, next: impl FnOnce(usize, usize) -> usize) -> bool {
        match &mut self.state {
            GalleryState::Open { photos, current } => {
                *current = next(*current, photos.len());
                true
            }
            GalleryState::Closed => false,
        }
    }
}
