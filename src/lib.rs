//! Browser-side glue for server-rendered (htmx) pages.
//!
//! Gestures on server-rendered markup (drag reordering, moving entries between folders, inline
//! edits, file selection) become named *intent* events. Every outgoing request is enriched with
//! the scope, `data-*` attributes and intent detail of the element that caused it.
//!
//! The pipeline is written against [`platform::Platform`] and [`dom::DomElement`]. In the
//! browser, [`web`] provides both over `web-sys`, htmx and SortableJS; everywhere else
//! [`platform::headless`] runs the same code against an in-memory tree.

pub mod bridge;
pub mod commands;
pub mod config;
pub mod debounce;
pub mod dom;
pub mod enrich;
pub mod error;
pub mod intent;
pub mod lifecycle;
pub mod logging;
pub mod platform;
pub mod translate;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use bridge::{Bridge, Context};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use intent::{Intent, IntentKind, Payload};
