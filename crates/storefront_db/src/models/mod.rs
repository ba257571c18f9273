//! Document schemas for the storefront collections.

mod cart;
mod order;
mod product;
mod review;
mod user;
mod wishlist;

pub use cart::{Cart, CartItem};
pub use order::{Order, OrderItem, OrderStatus, PaymentStatus};
pub use product::{ColorOption, Product};
pub use review::Review;
pub use user::{User, UserRole};
pub use wishlist::Wishlist;

/// Free-form JSON object (specs, social links, addresses).
pub type JsonObject = serde_json::Map<String, serde_json::Value>;
