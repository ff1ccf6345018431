//! FreshBasket Core - domain types and client-side stores.
//!
//! This crate provides the state model shared by every FreshBasket component:
//! - `storefront` - Headless app shell the mobile view layer talks to
//! - `cli` - Operator tools for previewing orders and geocoding
//!
//! # Architecture
//!
//! The core crate contains only types and synchronous state machines - no I/O,
//! no async, no HTTP clients. Remote profile documents, identity events and
//! order hand-off live behind collaborator traits in the storefront crate.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, and statuses
//! - [`cart`] - The in-memory shopping cart
//! - [`profile`] - Signed-in user's profile and delivery addresses
//! - [`session`] - Authentication identity and readiness
//! - [`order`] - Placed orders as read back from the backend

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod order;
pub mod profile;
pub mod session;
pub mod types;

pub use cart::{CartCandidate, CartLineItem, CartStore, ImageRef, ProductRecord};
pub use order::{Order, OrderItem, history_for};
pub use profile::{
    Address, AddressIdGenerator, ProfileRecord, ProfileUpdate, UserProfile, UserProfileStore,
};
pub use session::{Identity, ProfileAction, SessionStore, greeting_name, initial};
pub use types::*;
