//! Render engine: owns the live item views (the display tree of the
//! listing) and reconciles them on replace and append renders.

use std::collections::HashSet;
use std::sync::Arc;

use crate::state::data::{Item, ItemId};
use crate::state::pagination::window_for;
use crate::view::preview::ImageSignal;
use crate::view::item::{ItemView, ViewContext, ViewToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Tear everything down, then render the page
    Replace,
    /// Render the page after the existing views
    Append,
}

/// What a render call did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderReport {
    pub torn_down: usize,
    pub added: usize,
    /// Items of the page that were already live and therefore skipped
    pub skipped: usize,
}

#[derive(Debug)]
pub struct RenderEngine {
    page_size: usize,
    views: Vec<ItemView>,
    rendered: HashSet<ItemId>,
    next_token: u64,
}

impl RenderEngine {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            views: Vec::new(),
            rendered: HashSet::new(),
            next_token: 1,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Render page `page_index` of `ordered`.
    pub fn render(
        &mut self,
        ordered: &[Arc<Item>],
        page_index: usize,
        mode: RenderMode,
        ctx: &ViewContext,
    ) -> RenderReport {
        let mut report = RenderReport::default();

        if mode == RenderMode::Replace {
            // All previous views are gone before the first new one exists
            report.torn_down = self.clear();
        }

        let window = window_for(page_index, self.page_size);
        let start = window.start.min(ordered.len());
        let end = window.end.min(ordered.len());

        let mut batch = Vec::with_capacity(end - start);
        for item in &ordered[start..end] {
            if !self.rendered.insert(item.id) {
                log::warn!("{} is already rendered, skipping duplicate", item.id);
                report.skipped += 1;
                continue;
            }
            let token = self.issue_token();
            batch.push(ItemView::new(token, Arc::clone(item), ctx));
        }

        // The page joins the display tree as one batch
        for view in &mut batch {
            view.attach();
        }
        report.added = batch.len();
        self.views.append(&mut batch);

        log::debug!(
            "render {:?} page {}: {} torn down, {} added, {} live",
            mode,
            page_index,
            report.torn_down,
            report.added,
            self.views.len()
        );
        report
    }

    /// Tear down every live view in the order it was rendered.
    /// Returns how many views were torn down.
    pub fn clear(&mut self) -> usize {
        let count = self.views.len();
        for view in &mut self.views {
            view.teardown();
        }
        self.views.clear();
        self.rendered.clear();
        count
    }

    /// Ids of the live views, in display order
    pub fn rendered_ids(&self) -> Vec<ItemId> {
        self.views.iter().map(ItemView::id).collect()
    }

    pub fn views(&self) -> &[ItemView] {
        &self.views
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn view(&self, token: ViewToken) -> Option<&ItemView> {
        self.views.iter().find(|view| view.token() == token)
    }

    /// Deliver an image signal to the view it belongs to. Signals for views
    /// that no longer exist are dropped. Returns `true` if a card changed.
    pub fn deliver_image_signal(&mut self, token: ViewToken, signal: ImageSignal) -> bool {
        match self.views.iter_mut().find(|view| view.token() == token) {
            Some(view) => view.on_image_signal(signal),
            None => {
                log::trace!("{token:?} is gone, dropping {signal:?}");
                false
            }
        }
    }

    fn issue_token(&mut self) -> ViewToken {
        let token = ViewToken(self.next_token);
        self.next_token += 1;
        token
    }
}
