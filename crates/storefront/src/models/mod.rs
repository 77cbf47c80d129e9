//! Types stored in the shopper session.

pub mod session;

pub use session::{forget_cart, session_cart_id, set_session_cart_id};
