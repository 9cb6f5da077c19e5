//! Engine settings shared by every service.

use std::time::Duration;

use common::PaymentMethod;

use crate::error::CommerceError;

/// What checkout does with an empty cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyCartPolicy {
    /// Fail with `CommerceError::EmptyCart` and write nothing.
    #[default]
    Reject,
    /// Record an order with no line items and a zero total.
    AllowZeroTotal,
}

impl std::str::FromStr for EmptyCartPolicy {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(EmptyCartPolicy::Reject),
            "allow" | "allow_zero_total" => Ok(EmptyCartPolicy::AllowZeroTotal),
            other => Err(CommerceError::InvalidInput(format!(
                "unknown empty cart policy '{other}' (expected 'reject' or 'allow')"
            ))),
        }
    }
}

/// Settings injected into each engine at construction.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Upper bound for every individual store call.
    pub store_timeout: Duration,

    /// Checkout behaviour for empty carts.
    pub empty_cart_policy: EmptyCartPolicy,

    /// Payment method recorded on new orders.
    pub default_payment_method: PaymentMethod,
}

impl EngineSettings {
    /// Default store call timeout.
    pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_empty_cart_policy(mut self, policy: EmptyCartPolicy) -> Self {
        self.empty_cart_policy = policy;
        self
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            store_timeout: Self::DEFAULT_STORE_TIMEOUT,
            empty_cart_policy: EmptyCartPolicy::default(),
            default_payment_method: PaymentMethod::default(),
        }
    }
}
