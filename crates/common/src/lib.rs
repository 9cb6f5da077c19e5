//! Shared identifiers and the persisted document model.
//!
//! Everything the store and the engines agree on lives here: typed ids,
//! the `Money` amount type, and the shapes embedded in a user document
//! (cart items, orders, the address book).

pub mod model;
pub mod types;

pub use model::{
    Address, AddressBook, AddressSlot, CartItem, NewProduct, Order, PaymentMethod, Product, User,
    UserProfile,
};
pub use types::{AddressId, Money, OrderId, ProductId, UserId};
