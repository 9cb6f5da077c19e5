//! Storefront domain engines.
//!
//! This crate holds the core of the backend:
//! - Cart mutation (add / remove) and cart total aggregation
//! - Checkout and instant buy, committed as one versioned document update
//! - The two-slot address book
//! - Catalog and registration glue
//!
//! Engines are generic over `document_store::DocumentStore` and receive the
//! store at construction. Every store call is bounded by the configured
//! timeout and translated into `CommerceError`.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod ids;
pub mod settings;
pub mod store_call;
pub mod users;

#[cfg(test)]
mod test_support;

pub use address::AddressService;
pub use cart::{CartService, CartSummary, CartTotals};
pub use catalog::CatalogService;
pub use checkout::CheckoutService;
pub use error::{CommerceError, Result};
pub use ids::{parse_product_id, parse_user_id};
pub use settings::{EmptyCartPolicy, EngineSettings};
pub use store_call::StoreGateway;
pub use users::UserService;
