/// Item views and how they get on screen
///
/// - Listener registrations (listener.rs)
/// - Lazy card previews (preview.rs)
/// - One card (item.rs)
/// - The replace/append reconciliation (render.rs)

pub mod item;
pub mod listener;
pub mod preview;
pub mod render;
