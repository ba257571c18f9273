//! Storefront Document Layer
//!
//! Document schemas and store access shared by the storefront backend and
//! its tooling.
//!
//! # Architecture
//!
//! - **One collection per entity** - users, products, reviews, wishlists,
//!   carts and orders
//! - **Opaque document ids** - freshly generated, never derived from
//!   legacy relational keys
//! - **`DocumentStore` seam** - SurrealDB in production, an in-process
//!   store for dry runs and tests
//!
//! # Usage
//!
//! ```rust,ignore
//! use storefront_db::{SurrealConfig, SurrealStore};
//!
//! let store = SurrealStore::connect(&SurrealConfig::new("ws://localhost:8000")).await?;
//! ```

pub mod collection;
pub mod connection;
pub mod error;
pub mod id;
pub mod memory;
pub mod models;
pub mod queries;
pub mod store;

pub use collection::Collection;
pub use connection::{SurrealConfig, SurrealStore};
pub use error::{DbError, DbResult};
pub use id::DocumentId;
pub use memory::MemoryStore;
pub use store::DocumentStore;

// Re-export document types for convenience
pub use models::{
    Cart, CartItem, ColorOption, JsonObject, Order, OrderItem, OrderStatus, PaymentStatus,
    Product, Review, User, UserRole, Wishlist,
};
