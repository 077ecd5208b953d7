//! Page windows and the scroll-driven "more requested" trigger.

use std::ops::Range;
use std::time::Duration;

use crate::runtime::{Event, Scheduler, TaskHandle};

/// Items per page
pub const PAGE_SIZE: usize = 9;

/// How close (in logical pixels) the end of the list must be to the
/// bottom of the viewport before the next page is requested
pub const SCROLL_GAP: f32 = 100.0;

/// Quiet period after the last scroll before proximity is checked
pub const SCROLL_DEBOUNCE: Duration = Duration::from_millis(100);

/// Item index range of page `page_index`
pub fn window_for(page_index: usize, page_size: usize) -> Range<usize> {
    let from = page_index.saturating_mul(page_size);
    from..from.saturating_add(page_size)
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Whether a page follows the last rendered page `page_index`
pub fn has_next_page(total: usize, page_index: usize, page_size: usize) -> bool {
    page_index + 1 < page_count(total, page_size)
}

/// Scroll geometry reported by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    /// Bottom edge of the rendered list, relative to the top of the viewport
    pub list_bottom: f32,
    pub viewport_height: f32,
}

impl ScrollMetrics {
    pub fn is_near_end(&self, gap: f32) -> bool {
        self.list_bottom - gap <= self.viewport_height
    }
}

/// Emitted when the next page should be rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoreRequested;

/// Single-slot cancellable timer. Restarting cancels the previous run.
#[derive(Debug, Default)]
struct DebounceSlot {
    generation: u64,
    pending: Option<TaskHandle>,
}

impl DebounceSlot {
    fn restart(&mut self, scheduler: &dyn Scheduler, delay: Duration) {
        if let Some(mut previous) = self.pending.take() {
            previous.cancel();
        }

        self.generation += 1;
        let generation = self.generation;
        self.pending = Some(scheduler.spawn(Box::pin(async move {
            tokio::time::sleep(delay).await;
            Event::ScrollSettled { generation }
        })));
    }

    /// Consume the expiry of `generation`. Only the most recent, still
    /// armed timer counts.
    fn fire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.pending.is_none() {
            return false;
        }
        self.pending = None;
        true
    }

    fn cancel(&mut self) {
        if let Some(mut pending) = self.pending.take() {
            pending.cancel();
        }
    }

    fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

#[derive(Debug)]
pub struct PaginationController {
    page_size: usize,
    gap: f32,
    debounce: Duration,
    slot: DebounceSlot,
    latest: Option<ScrollMetrics>,
    checks: u64,
}

impl PaginationController {
    pub fn new(page_size: usize, gap: f32, debounce: Duration) -> Self {
        Self {
            page_size,
            gap,
            debounce,
            slot: DebounceSlot::default(),
            latest: None,
            checks: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn window_for(&self, page_index: usize) -> Range<usize> {
        window_for(page_index, self.page_size)
    }

    pub fn has_next_page(&self, total: usize, page_index: usize) -> bool {
        has_next_page(total, page_index, self.page_size)
    }

    /// A scroll happened: remember where we are and (re)start the timer.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics, scheduler: &dyn Scheduler) {
        self.latest = Some(metrics);
        self.slot.restart(scheduler, self.debounce);
    }

    /// The debounce timer of `generation` expired. Runs the proximity check
    /// if it is the surviving timer.
    pub fn on_timer(
        &mut self,
        generation: u64,
        total: usize,
        page_index: usize,
    ) -> Option<MoreRequested> {
        if !self.slot.fire(generation) {
            log::trace!("stale scroll timer {generation}");
            return None;
        }

        self.checks += 1;
        let near_end = self.latest.is_some_and(|m| m.is_near_end(self.gap));
        if near_end && self.has_next_page(total, page_index) {
            log::debug!("scrolled near the end, requesting page {}", page_index + 1);
            Some(MoreRequested)
        } else {
            None
        }
    }

    /// Drop any pending check, e.g. when the listing is replaced.
    pub fn reset(&mut self) {
        self.slot.cancel();
        self.latest = None;
    }

    /// Number of proximity checks that actually ran
    pub fn checks(&self) -> u64 {
        self.checks
    }

    pub fn is_armed(&self) -> bool {
        self.slot.is_armed()
    }
}
