//! Core types for Verdant.
//!
//! This module provides type-safe wrappers for catalog and cart concepts.

pub mod api;
pub mod cart;
pub mod id;
pub mod order;
pub mod price;
pub mod product;

pub use api::{AddItemRequest, CartView, UpdateQuantityRequest};
pub use cart::{Cart, LineItem, validate_quantity};
pub use id::*;
pub use order::OrderConfirmation;
pub use price::{CurrencyCode, Price, format_amount};
pub use product::{Category, Product, ProductSnapshot};
