//! Domain models for the marketplace server.
//!
//! These types represent validated domain objects, separate from the
//! database row types in [`crate::db`].

pub mod cart;
pub mod identity;
pub mod product;
pub mod user;

pub use cart::{Cart, CartItem, CartLine, CartView, ItemUpdate};
pub use identity::Identity;
pub use product::Product;
pub use user::User;
