//! Verdant Core - Shared types library.
//!
//! This crate provides the types used across all Verdant components:
//! - `storefront` - REST API for catalog, content, cart and checkout
//! - `client` - Cart store and sync layer used by front ends
//! - `cli` - Command-line tools for catalog and content checks
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used on both sides
//! of the cart API.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, products, carts and orders
//! - [`pricing`] - Pricing policy and the cart price calculator
//! - [`error`] - Cart error taxonomy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod pricing;
pub mod types;

pub use error::CartError;
pub use pricing::{PriceSummary, PricingPolicy, PricingPolicyError, summarize};
pub use types::*;
