use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{Product, User, UserId};
use tokio::sync::RwLock;

use crate::update::{apply_all, validate_updates};
use crate::{
    AggregateRow, DocumentStore, Pipeline, ProductFilter, Result, StoreError, UpdateOptions,
    UserFilter, UserUpdate, Version, VersionedUser,
};

#[derive(Debug, Default)]
struct Faults {
    failing_updates: AtomicUsize,
    latency_ms: AtomicU64,
}

/// In-memory document store.
///
/// Provides the same interface and the same per-document atomicity as the
/// PostgreSQL implementation. Used by tests and by the server when no
/// database is configured. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    users: Arc<RwLock<HashMap<UserId, VersionedUser>>>,
    products: Arc<RwLock<Vec<Product>>>,
    faults: Arc<Faults>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` calls to `update_user` fail with
    /// `StoreError::Unavailable` without touching any document.
    pub fn fail_next_updates(&self, count: usize) {
        self.faults.failing_updates.store(count, Ordering::SeqCst);
    }

    /// Delays every operation by `latency` before it runs.
    pub fn set_latency(&self, latency: Duration) {
        self.faults
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Returns the number of stored users.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Clears all documents.
    pub async fn clear(&self) {
        self.users.write().await.clear();
        self.products.write().await.clear();
    }

    async fn simulate_latency(&self) {
        let ms = self.faults.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn take_injected_failure(&self) -> bool {
        self.faults
            .failing_updates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert_user(&self, user: User) -> Result<Version> {
        self.simulate_latency().await;
        let mut users = self.users.write().await;

        if users.contains_key(&user.user_id) {
            return Err(StoreError::DuplicateKey(format!("user_id {}", user.user_id)));
        }
        if users.values().any(|u| u.user.email == user.email) {
            return Err(StoreError::DuplicateKey(format!("email {}", user.email)));
        }
        if users.values().any(|u| u.user.phone == user.phone) {
            return Err(StoreError::DuplicateKey(format!("phone {}", user.phone)));
        }

        let version = Version::first();
        users.insert(user.user_id, VersionedUser { user, version });
        Ok(version)
    }

    async fn find_user(&self, filter: UserFilter) -> Result<Option<VersionedUser>> {
        self.simulate_latency().await;
        let users = self.users.read().await;
        Ok(users.values().find(|u| filter.matches(&u.user)).cloned())
    }

    async fn count_users(&self, filter: UserFilter) -> Result<u64> {
        self.simulate_latency().await;
        let users = self.users.read().await;
        Ok(users.values().filter(|u| filter.matches(&u.user)).count() as u64)
    }

    async fn update_user(
        &self,
        user_id: UserId,
        updates: Vec<UserUpdate>,
        options: UpdateOptions,
    ) -> Result<Version> {
        validate_updates(&updates).map_err(|e| StoreError::InvalidUpdate(e.message))?;
        self.simulate_latency().await;

        if self.take_injected_failure() {
            return Err(StoreError::Unavailable(
                "injected update failure".to_string(),
            ));
        }

        let mut users = self.users.write().await;
        let entry = users
            .get_mut(&user_id)
            .ok_or(StoreError::UserNotFound(user_id))?;

        if let Some(expected) = options.expected_version
            && entry.version != expected
        {
            metrics::counter!("document_version_conflicts_total").increment(1);
            return Err(StoreError::ConcurrencyConflict {
                user_id,
                expected,
                actual: entry.version,
            });
        }

        // Apply to a copy so the stored document is replaced in one step
        let mut user = entry.user.clone();
        apply_all(&mut user, &updates);
        entry.user = user;
        entry.version = entry.version.next();

        Ok(entry.version)
    }

    async fn aggregate(&self, pipeline: Pipeline) -> Result<Vec<AggregateRow>> {
        self.simulate_latency().await;
        let users = self.users.read().await;
        pipeline.evaluate(users.values().map(|u| &u.user))
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        self.simulate_latency().await;
        let mut products = self.products.write().await;
        if products.iter().any(|p| p.product_id == product.product_id) {
            return Err(StoreError::DuplicateKey(format!(
                "product_id {}",
                product.product_id
            )));
        }
        products.push(product);
        Ok(())
    }

    async fn find_product(&self, filter: ProductFilter) -> Result<Option<Product>> {
        self.simulate_latency().await;
        let products = self.products.read().await;
        Ok(products.iter().find(|p| filter.matches(p)).cloned())
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        self.simulate_latency().await;
        let products = self.products.read().await;
        Ok(products.iter().filter(|p| filter.matches(p)).cloned().collect())
    }
}
