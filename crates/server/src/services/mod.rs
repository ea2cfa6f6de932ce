//! Business logic services for the marketplace server.
//!
//! # Services
//!
//! - `auth` - Bearer token issuing and verification
//! - `cart` - Cart operations over the cart repository, user directory and catalog

pub mod auth;
pub mod cart;

pub use auth::{AuthError, TokenService};
pub use cart::{CartError, CartManager};
