//! Domain error types.

use common::{AddressSlot, ProductId, UserId};
use thiserror::Error;

/// Errors returned by the cart, checkout, address and catalog engines.
///
/// Store-level failures never cross the engine boundary as-is; they are
/// translated into one of these kinds first.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// The user id is not a well-formed identity.
    #[error("User ID is not valid: {0}")]
    UserInvalid(String),

    /// The product id is not a well-formed identity.
    #[error("Product ID is not valid: {0}")]
    ProductInvalid(String),

    /// Request data failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No user document with this id.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// No catalog product with this id.
    #[error("Unable to find the specified product: {0}")]
    ProductNotFound(ProductId),

    /// Email or phone already registered.
    #[error("User already exists: {0}")]
    DuplicateUser(String),

    /// Checkout of an empty cart under the `Reject` policy.
    #[error("Cart is empty")]
    EmptyCart,

    /// The user already has a home and a work address.
    #[error("Address limit reached: at most 2 addresses are allowed")]
    AddressLimitReached,

    /// The address slot to edit is empty.
    #[error("No {0} address to edit")]
    SlotNotFound(AddressSlot),

    /// The user document changed while the operation was in progress.
    #[error("User {0} was modified concurrently, nothing was written")]
    ConcurrentModification(UserId),

    /// A store result could not be parsed into the expected shape.
    #[error("Unable to decode stored data: {0}")]
    DecodeFailure(String),

    /// A write did not apply.
    #[error("Unable to update user information: {0}")]
    UpdateFailed(String),

    /// A read failed for reasons other than decoding.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store did not answer within the configured timeout.
    #[error("Store operation '{operation}' timed out")]
    StoreTimeout { operation: &'static str },
}

impl CommerceError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            CommerceError::UserInvalid(_) => "USER_INVALID",
            CommerceError::ProductInvalid(_) => "PRODUCT_INVALID",
            CommerceError::InvalidInput(_) => "INVALID_INPUT",
            CommerceError::UserNotFound(_) => "USER_NOT_FOUND",
            CommerceError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            CommerceError::DuplicateUser(_) => "DUPLICATE_USER",
            CommerceError::EmptyCart => "EMPTY_CART",
            CommerceError::AddressLimitReached => "ADDRESS_LIMIT_REACHED",
            CommerceError::SlotNotFound(_) => "SLOT_NOT_FOUND",
            CommerceError::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            CommerceError::DecodeFailure(_) => "DECODE_FAILURE",
            CommerceError::UpdateFailed(_) => "UPDATE_FAILED",
            CommerceError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            CommerceError::StoreTimeout { .. } => "STORE_TIMEOUT",
        }
    }

    /// True for failures that may succeed when retried unchanged.
    ///
    /// A timed-out checkout may still have committed, so callers must check
    /// the order history before retrying one.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CommerceError::StoreTimeout { .. }
                | CommerceError::StoreUnavailable(_)
                | CommerceError::ConcurrentModification(_)
        )
    }
}

/// Convenience type alias for engine results.
pub type Result<T> = std::result::Result<T, CommerceError>;
