//! Pipeline handlers.
//!
//! Each handler is independent: [`extract`] consumes upload notifications,
//! the responders ([`download`], [`lookup`], [`summary`]) each turn one
//! request into one [`crate::envelope::ResponseEnvelope`].

pub mod download;
pub mod extract;
pub mod lookup;
pub mod summary;
