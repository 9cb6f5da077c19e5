//! Route handlers, grouped by engine.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod metrics;
pub mod users;

use std::collections::HashMap;

use crate::error::ApiError;

/// Raw query string parameters.
pub type Params = HashMap<String, String>;

/// Returns a required query parameter; absent and empty are both missing.
pub(crate) fn required<'a>(params: &'a Params, name: &'static str) -> Result<&'a str, ApiError> {
    params
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingParameter(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        let mut params = Params::new();
        params.insert("id".to_string(), "  ".to_string());
        assert!(matches!(
            required(&params, "id"),
            Err(ApiError::MissingParameter("id"))
        ));
        assert!(required(&params, "userID").is_err());

        params.insert("id".to_string(), " abc ".to_string());
        assert_eq!(required(&params, "id").unwrap(), "abc");
    }
}
