use async_trait::async_trait;
use common::{Product, ProductId, User, UserId};

use crate::{AggregateRow, Pipeline, ProductFilter, Result, UserFilter, UserUpdate, Version};

/// Options for updating a user document.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Expected version of the document for optimistic concurrency control.
    /// If None, the update applies to whatever version is current.
    pub expected_version: Option<Version>,
}

impl UpdateOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the document to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }
}

/// A user document together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedUser {
    pub user: User,
    pub version: Version,
}

/// Core trait for document store implementations.
///
/// Consistency is per document: a single `update_user` call is atomic, but
/// nothing spans more than one document. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new user document at `Version::first()`.
    ///
    /// Fails with `DuplicateKey` if the id, email or phone is taken.
    async fn insert_user(&self, user: User) -> Result<Version>;

    /// Returns the first user matching the filter.
    async fn find_user(&self, filter: UserFilter) -> Result<Option<VersionedUser>>;

    /// Counts users matching the filter.
    async fn count_users(&self, filter: UserFilter) -> Result<u64>;

    /// Applies the updates, in order, to one user document.
    ///
    /// Either every update is applied or none is. If
    /// `options.expected_version` is set, the operation fails with
    /// `ConcurrencyConflict` when the current version differs.
    ///
    /// Returns the new version of the document.
    async fn update_user(
        &self,
        user_id: UserId,
        updates: Vec<UserUpdate>,
        options: UpdateOptions,
    ) -> Result<Version>;

    /// Runs an aggregation pipeline.
    ///
    /// Unwinding an empty array produces no rows.
    async fn aggregate(&self, pipeline: Pipeline) -> Result<Vec<AggregateRow>>;

    /// Inserts a catalog product.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Returns the first product matching the filter.
    async fn find_product(&self, filter: ProductFilter) -> Result<Option<Product>>;

    /// Returns every product matching the filter, in insertion order.
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>>;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Loads a user by id.
    async fn get_user(&self, user_id: UserId) -> Result<Option<VersionedUser>> {
        self.find_user(UserFilter::by_id(user_id)).await
    }

    /// Loads a product by id.
    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        self.find_product(ProductFilter::by_id(product_id)).await
    }

    /// Applies a single update without a version check.
    async fn update_user_once(&self, user_id: UserId, update: UserUpdate) -> Result<Version> {
        self.update_user(user_id, vec![update], UpdateOptions::new())
            .await
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}
