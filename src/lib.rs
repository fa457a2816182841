//! portal-client
//!
//! Client-side core of the portal site: localized text with lazily fetched
//! translation bundles, a persisted login session, cookie consent, and typed
//! access to the blog, contribution and admin endpoints.
//!
//! Start from [`AppContext`], which wires everything from a
//! [`config::ClientSettings`].

pub mod api;
pub mod app;
pub mod config;
pub mod consent;
pub mod content;
pub mod i18n;
pub mod logging;
pub mod session;
pub mod storage;
pub mod types;

pub use app::{
    AppContext,
    AppError,
};
