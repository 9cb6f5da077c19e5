//! Document store client for the storefront's Users and Products collections.
//!
//! Filters, updates and aggregations are expressed as structured values
//! (`UserFilter`, `UserUpdate`, `Pipeline`) and evaluated by a backend.
//! Every update applies to exactly one user document atomically and bumps
//! its version, which callers can use for compare-and-swap.

pub mod aggregation;
pub mod error;
pub mod filter;
pub mod memory;
pub mod postgres;
pub mod store;
pub mod update;
pub mod version;

pub use aggregation::{Accumulator, AggregateRow, ArrayField, Pipeline};
pub use error::{Result, StoreError};
pub use filter::{ProductFilter, UserFilter};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use store::{DocumentStore, DocumentStoreExt, UpdateOptions, VersionedUser};
pub use update::UserUpdate;
pub use version::Version;
