use chrono::{DateTime, Utc};
use common::{Address, AddressSlot, CartItem, Order, ProductId, User};

/// A single mutation of a user document.
///
/// A list of updates passed to `DocumentStore::update_user` is applied in
/// order to one document and committed atomically.
#[derive(Debug, Clone, PartialEq)]
pub enum UserUpdate {
    /// Append an item to the cart (`$push usercart`).
    PushCartItem(CartItem),

    /// Remove every cart item with this product id (`$pull usercart`).
    PullCartItems(ProductId),

    /// Replace the cart with an empty one.
    ClearCart,

    /// Append an order to the history (`$push orders`).
    PushOrder(Order),

    /// Overwrite one address slot.
    SetAddress(AddressSlot, Address),

    /// Empty both address slots.
    ClearAddresses,

    /// Set `updated_at`.
    Touch(DateTime<Utc>),
}

impl UserUpdate {
    /// Short name used in logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            UserUpdate::PushCartItem(_) => "push_cart_item",
            UserUpdate::PullCartItems(_) => "pull_cart_items",
            UserUpdate::ClearCart => "clear_cart",
            UserUpdate::PushOrder(_) => "push_order",
            UserUpdate::SetAddress(..) => "set_address",
            UserUpdate::ClearAddresses => "clear_addresses",
            UserUpdate::Touch(_) => "touch",
        }
    }

    /// Applies the update to a document in place.
    pub fn apply(&self, user: &mut User) {
        match self {
            UserUpdate::PushCartItem(item) => user.cart.push(item.clone()),
            UserUpdate::PullCartItems(product_id) => {
                user.cart.retain(|item| item.product_id != *product_id)
            }
            UserUpdate::ClearCart => user.cart.clear(),
            UserUpdate::PushOrder(order) => user.orders.push(order.clone()),
            UserUpdate::SetAddress(slot, address) => user.addresses.set(*slot, address.clone()),
            UserUpdate::ClearAddresses => user.addresses.clear(),
            UserUpdate::Touch(at) => user.updated_at = *at,
        }
    }
}

/// Applies a batch of updates in order.
pub fn apply_all(user: &mut User, updates: &[UserUpdate]) {
    for update in updates {
        update.apply(user);
    }
}

/// Error returned when an update batch cannot be applied.
#[derive(Debug, Clone)]
pub struct UpdateValidationError {
    pub message: String,
}

impl std::fmt::Display for UpdateValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Update validation error: {}", self.message)
    }
}

impl std::error::Error for UpdateValidationError {}

/// Validates an update batch before it reaches a backend.
pub fn validate_updates(updates: &[UserUpdate]) -> Result<(), UpdateValidationError> {
    if updates.is_empty() {
        return Err(UpdateValidationError {
            message: "Cannot apply an empty update list".to_string(),
        });
    }

    // A slot written twice in one batch is almost certainly a caller bug
    for slot in AddressSlot::ALL {
        let writes = updates
            .iter()
            .filter(|u| matches!(u, UserUpdate::SetAddress(s, _) if *s == slot))
            .count();
        if writes > 1 {
            return Err(UpdateValidationError {
                message: format!("Address slot {slot} set more than once"),
            });
        }
    }

    Ok(())
}
