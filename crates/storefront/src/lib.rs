//! FreshBasket Storefront library.
//!
//! Headless app shell around the core stores: configuration, the shared
//! [`state::AppState`], backend and geocoder adapters, checkout hand-off and
//! the JSON routes the view layer drives. Exposed as a library so the CLI
//! and the integration tests can reuse it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
