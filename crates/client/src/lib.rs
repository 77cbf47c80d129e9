//! Verdant Client - Cart store and sync layer.
//!
//! Front ends hold one [`CartStore`] per shopper session and call its
//! mutation methods in response to UI events. The store updates its local
//! cart optimistically, pushes the change through a [`CartSync`]
//! implementation, and rolls back only the failed operation when the remote
//! call fails.
//!
//! # Example
//!
//! ```rust,ignore
//! use verdant_client::{CartStore, HttpCartSync};
//! use verdant_core::PricingPolicy;
//!
//! let sync = HttpCartSync::new("http://127.0.0.1:3000/".parse()?)?;
//! let store = CartStore::new(sync, PricingPolicy::default());
//!
//! store.add(&product, 2).await?;
//! let summary = store.summary();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod http;
pub mod store;
pub mod sync;

pub use error::SyncError;
pub use http::HttpCartSync;
pub use store::{CartStore, InFlightKey};
pub use sync::CartSync;
