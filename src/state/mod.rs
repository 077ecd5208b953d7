/// State management module
///
/// This module owns all listing and gallery state:
/// - The item batch and its decoding (data.rs)
/// - Sort orders (filter.rs)
/// - Page windows and the scroll trigger (pagination.rs)
/// - The remembered filter (preference.rs)
/// - The listing orchestration (listing.rs)
/// - The photo gallery (gallery.rs)

pub mod data;
pub mod filter;
pub mod gallery;
pub mod listing;
pub mod pagination;
pub mod preference;
