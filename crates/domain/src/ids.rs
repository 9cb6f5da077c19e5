//! Parsing of caller-supplied identities.

use common::{ProductId, UserId};

use crate::error::{CommerceError, Result};

/// Resolves a raw user id, failing with `UserInvalid` when malformed.
pub fn parse_user_id(raw: &str) -> Result<UserId> {
    UserId::parse(raw).map_err(|e| CommerceError::UserInvalid(format!("'{raw}': {e}")))
}

/// Resolves a raw product id, failing with `ProductInvalid` when malformed.
pub fn parse_product_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|e| CommerceError::ProductInvalid(format!("'{raw}': {e}")))
}
