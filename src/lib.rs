//! Book catalog fed from the Gutendex API.
//!
//! [`app::App::register_book`] runs the pipeline: duplicate guard, search,
//! mapping, then an atomic write of the author (when new) and the book. The
//! rest of [`app::App`] answers read-only questions about what is stored.

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod guard;
pub mod gutendex;
pub mod mapper;
pub mod menu;
pub mod output;
pub mod store;
