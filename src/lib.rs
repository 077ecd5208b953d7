//! Hotel catalog core: a paginated, filterable listing with lazily loaded
//! card previews and a keyboard driven photo gallery.
//!
//! Everything here is presentation agnostic. The binary renders the
//! [`session::Session`] with iced and feeds it user input and the
//! [`runtime::Event`] stream.

pub mod config;
pub mod error;
pub mod runtime;
pub mod session;
pub mod source;
pub mod state;
pub mod view;

#[cfg(test)]
mod testing;
