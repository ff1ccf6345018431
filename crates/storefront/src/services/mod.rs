//! Business logic services for storefront.
//!
//! # Services
//!
//! - `session` - Identity changes, profile hydration
//! - `profile` - Profile edits and delivery addresses
//! - `geocoder` - Reverse geocoding behind a cooldown
//! - `checkout` - WhatsApp order hand-off
//! - `orders` - Order history

pub mod checkout;
pub mod geocoder;
pub mod orders;
pub mod profile;
pub mod session;

pub use session::{Hydration, SessionService};
