//! One rendered card.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::runtime::Scheduler;
use crate::state::data::{Item, ItemId};
use crate::view::preview::{
    ImageHandle, ImageLoadState, ImageLoadSupervisor, ImageLoader, ImageSignal, Settlement,
};
use crate::view::listener::{Listener, Listeners};

/// Identity of one item view instance.
///
/// Tokens are never reused: rendering the same item again yields a new
/// token, so late signals for a destroyed view cannot reach its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewToken(pub u64);

/// What the card currently shows behind its content
#[derive(Debug, Clone, PartialEq)]
pub enum Visual {
    /// Preview still loading
    Pending,
    Background(ImageHandle),
    /// The "no photo" state; the card stays visible but cannot open the gallery
    NoPhoto,
}

/// Raised when a card with a loaded preview is selected
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub item: ItemId,
    pub photos: Vec<String>,
}

/// Collaborators every item view needs to start its preview load
#[derive(Clone)]
pub struct ViewContext {
    pub loader: Arc<dyn ImageLoader>,
    pub scheduler: Arc<dyn Scheduler>,
    pub image_timeout: Duration,
}

impl fmt::Debug for ViewContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewContext")
            .field("image_timeout", &self.image_timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ItemView {
    token: ViewToken,
    item: Arc<Item>,
    image: Option<ImageLoadSupervisor>,
    visual: Visual,
    listeners: Listeners,
    attached: bool,
}

impl ItemView {
    /// Build the card and kick off its preview load, if it has one.
    ///
    /// The view is not part of the display tree until [`ItemView::attach`].
    pub fn new(token: ViewToken, item: Arc<Item>, ctx: &ViewContext) -> Self {
        let image = item.preview_url.as_deref().map(|url| {
            ImageLoadSupervisor::start(
                token,
                url,
                ctx.loader.as_ref(),
                ctx.scheduler.as_ref(),
                ctx.image_timeout,
            )
        });

        let visual = if image.is_some() {
            Visual::Pending
        } else {
            Visual::NoPhoto
        };

        let mut listeners = Listeners::new();
        listeners.attach(Listener::Click);
        listeners.attach(Listener::Favourite);

        Self {
            token,
            item,
            image,
            visual,
            listeners,
            attached: false,
        }
    }

    pub fn token(&self) -> ViewToken {
        self.token
    }

    pub fn id(&self) -> ItemId {
        self.item.id
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn visual(&self) -> &Visual {
        &self.visual
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn image_state(&self) -> Option<&ImageLoadState> {
        self.image.as_ref().map(ImageLoadSupervisor::state)
    }

    /// Whether a timer or load can still signal this view
    pub fn has_pending_work(&self) -> bool {
        self.image
            .as_ref()
            .is_some_and(ImageLoadSupervisor::has_pending_work)
    }

    pub fn photos(&self) -> &[String] {
        &self.item.photos
    }

    pub(crate) fn attach(&mut self) {
        self.attached = true;
    }

    /// Route an image signal to the supervisor and apply its settlement.
    /// Returns `true` if the visual changed.
    pub fn on_image_signal(&mut self, signal: ImageSignal) -> bool {
        let Some(image) = self.image.as_mut() else {
            return false;
        };

        match image.on_signal(signal) {
            Some(Settlement::Loaded(handle)) => {
                self.visual = Visual::Background(handle);
                true
            }
            Some(Settlement::Unavailable) => {
                self.visual = Visual::NoPhoto;
                true
            }
            None => false,
        }
    }

    /// Only a live card whose preview actually loaded can be selected
    pub fn is_selectable(&self) -> bool {
        self.attached
            && self.listeners.is_attached(Listener::Click)
            && matches!(self.image_state(), Some(ImageLoadState::Loaded(_)))
    }

    /// The click handler: raise the selection signal, if allowed.
    pub fn select(&self) -> Option<Selection> {
        if !self.is_selectable() {
            log::debug!("{} has no usable photo, ignoring selection", self.item.id);
            return None;
        }

        Some(Selection {
            item: self.item.id,
            photos: self.item.photos.clone(),
        })
    }

    /// Release everything the view owns: the preview race first, then the
    /// listeners, then the display tree slot.
    pub fn teardown(&mut self) {
        if let Some(image) = self.image.as_mut() {
            image.teardown();
        }
        self.listeners.detach_all();
        self.attached = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{item, InertScheduler, ScriptedLoader};
    use std::path::PathBuf;

    fn ctx() -> ViewContext {
        ViewContext {
            loader: Arc::new(ScriptedLoader::never()),
            scheduler: Arc::new(InertScheduler::default()),
            image_timeout: Duration::from_secs(10),
        }
    }

    fn loaded() -> ImageSignal {
        ImageSignal::Loaded(ImageHandle {
            source: PathBuf::from("previews/1.jpg"),
            width: 10,
            height: 10,
        })
    }

    fn live_view(item: Item) -> ItemView {
        let mut view = ItemView::new(ViewToken(1), Arc::new(item), &ctx());
        view.attach();
        view
    }

    #[test]
    fn test_loaded_card_raises_selection_with_photos() {
        let mut view = live_view(item(1, 100));
        assert_eq!(view.visual(), &Visual::Pending);
        assert!(view.select().is_none());

        assert!(view.on_image_signal(loaded()));
        let selection = view.select().unwrap();
        assert_eq!(selection.item, ItemId(1));
        assert_eq!(selection.photos, vec!["photos/1-1.jpg", "photos/1-2.jpg"]);
    }

    #[test]
    fn test_unavailable_card_is_not_selectable() {
        let mut view = live_view(item(1, 100));

        assert!(view.on_image_signal(ImageSignal::TimedOut));
        assert_eq!(view.visual(), &Visual::NoPhoto);
        assert!(view.select().is_none());

        // A late completion does not resurrect the card
        assert!(!view.on_image_signal(loaded()));
        assert_eq!(view.visual(), &Visual::NoPhoto);
        assert!(view.select().is_none());
    }

    #[test]
    fn test_card_without_preview_is_no_photo_from_the_start() {
        let mut bare = item(2, 0);
        bare.preview_url = None;

        let scheduler = Arc::new(InertScheduler::default());
        let ctx = ViewContext {
            scheduler: scheduler.clone(),
            ..ctx()
        };
        let mut view = ItemView::new(ViewToken(2), Arc::new(bare), &ctx);
        view.attach();

        assert_eq!(scheduler.spawned(), 0);
        assert_eq!(view.visual(), &Visual::NoPhoto);
        assert!(view.image_state().is_none());
        assert!(!view.on_image_signal(loaded()));
        assert!(view.select().is_none());
    }

    #[test]
    fn test_teardown_releases_listeners_and_detaches() {
        let mut view = live_view(item(3, 10));
        view.on_image_signal(loaded());
        assert!(view.is_selectable());

        view.teardown();
        assert!(!view.is_attached());
        assert_eq!(view.listeners().count(), 0);
        assert!(view.select().is_none());
    }
}
