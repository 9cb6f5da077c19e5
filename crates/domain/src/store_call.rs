//! Bounded, translated access to the document store.
//!
//! Engines never call the store directly. Every call goes through
//! `StoreGateway`, which applies the configured timeout and turns
//! `StoreError` into the matching `CommerceError`.

use std::future::Future;
use std::time::Duration;

use common::{Product, ProductId, User, UserId};
use document_store::{
    AggregateRow, DocumentStore, DocumentStoreExt, Pipeline, ProductFilter, StoreError,
    UpdateOptions, UserFilter, UserUpdate, Version, VersionedUser,
};

use crate::error::{CommerceError, Result};
use crate::settings::EngineSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

fn translate(err: StoreError, access: Access) -> CommerceError {
    if err.is_decode_failure() {
        return CommerceError::DecodeFailure(err.to_string());
    }
    match err {
        StoreError::UserNotFound(user_id) => CommerceError::UserNotFound(user_id),
        StoreError::ConcurrencyConflict { user_id, .. } => {
            CommerceError::ConcurrentModification(user_id)
        }
        StoreError::DuplicateKey(key) => CommerceError::DuplicateUser(key),
        other => match access {
            Access::Read => CommerceError::StoreUnavailable(other.to_string()),
            Access::Write => CommerceError::UpdateFailed(other.to_string()),
        },
    }
}

/// Store handle shared by the engines.
#[derive(Clone)]
pub struct StoreGateway<S> {
    store: S,
    timeout: Duration,
}

impl<S: DocumentStore> StoreGateway<S> {
    pub fn new(store: S, settings: &EngineSettings) -> Self {
        Self {
            store,
            timeout: settings.store_timeout,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    async fn call<T, F>(&self, operation: &'static str, access: Access, fut: F) -> Result<T>
    where
        F: Future<Output = document_store::Result<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|e| {
                let err = translate(e, access);
                tracing::debug!(operation, code = err.code(), error = %err, "store call failed");
                err
            }),
            Err(_) => {
                metrics::counter!("store_timeouts_total", "operation" => operation).increment(1);
                tracing::warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "store call timed out"
                );
                Err(CommerceError::StoreTimeout { operation })
            }
        }
    }

    /// Loads a user document with its version.
    pub async fn load_user(&self, user_id: UserId) -> Result<VersionedUser> {
        self.call("find_user", Access::Read, self.store.get_user(user_id))
            .await?
            .ok_or(CommerceError::UserNotFound(user_id))
    }

    /// Loads a catalog product.
    pub async fn load_product(&self, product_id: ProductId) -> Result<Product> {
        self.call(
            "find_product",
            Access::Read,
            self.store.get_product(product_id),
        )
        .await?
        .ok_or(CommerceError::ProductNotFound(product_id))
    }

    pub async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        self.call("list_products", Access::Read, self.store.list_products(filter))
            .await
    }

    pub async fn count_users(&self, filter: UserFilter) -> Result<u64> {
        self.call("count_users", Access::Read, self.store.count_users(filter))
            .await
    }

    pub async fn aggregate(&self, pipeline: Pipeline) -> Result<Vec<AggregateRow>> {
        self.call("aggregate", Access::Read, self.store.aggregate(pipeline))
            .await
    }

    pub async fn insert_user(&self, user: User) -> Result<Version> {
        self.call("insert_user", Access::Write, self.store.insert_user(user))
            .await
    }

    pub async fn insert_product(&self, product: Product) -> Result<()> {
        let insert = async {
            // A product id clash is not a duplicate *user*
            self.store
                .insert_product(product)
                .await
                .map_err(|e| match e {
                    StoreError::DuplicateKey(key) => StoreError::InvalidUpdate(key),
                    other => other,
                })
        };
        self.call("insert_product", Access::Write, insert).await
    }

    /// Applies an update batch to one user document.
    pub async fn commit(
        &self,
        user_id: UserId,
        updates: Vec<UserUpdate>,
        options: UpdateOptions,
    ) -> Result<Version> {
        self.call(
            "update_user",
            Access::Write,
            self.store.update_user(user_id, updates, options),
        )
        .await
    }
}
