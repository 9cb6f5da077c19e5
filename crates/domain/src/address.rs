//! Address book engine.
//!
//! A user has at most one home and one work address. Adding fills the first
//! free slot under a compare-and-swap on the document version, so two
//! concurrent adds can never produce a third address.

use chrono::Utc;
use common::{Address, AddressId, AddressSlot, UserId};
use document_store::{DocumentStore, UpdateOptions, UserUpdate, VersionedUser};

use crate::error::{CommerceError, Result};
use crate::settings::EngineSettings;
use crate::store_call::StoreGateway;

/// Number of read-check-write rounds `add_address` and `edit_slot` make
/// before reporting `ConcurrentModification`.
const MAX_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct AddressService<S> {
    gateway: StoreGateway<S>,
}

impl<S: DocumentStore + Clone> AddressService<S> {
    pub fn new(store: S, settings: &EngineSettings) -> Self {
        Self {
            gateway: StoreGateway::new(store, settings),
        }
    }

    /// Stores a new address in the first free slot, home first.
    ///
    /// The address gets a fresh id. Fails with `AddressLimitReached` when
    /// both slots are taken.
    #[tracing::instrument(skip(self, address))]
    pub async fn add_address(
        &self,
        user_id: UserId,
        address: Address,
    ) -> Result<(AddressSlot, Address)> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let VersionedUser { user, version } = self.gateway.load_user(user_id).await?;
            let Some(slot) = user.addresses.first_free_slot() else {
                return Err(CommerceError::AddressLimitReached);
            };

            let stored = Address {
                address_id: AddressId::new(),
                ..address.clone()
            };
            let result = self
                .gateway
                .commit(
                    user_id,
                    vec![
                        UserUpdate::SetAddress(slot, stored.clone()),
                        UserUpdate::Touch(Utc::now()),
                    ],
                    UpdateOptions::expect_version(version),
                )
                .await;

            match result {
                Ok(_) => {
                    tracing::info!(%user_id, %slot, address_id = %stored.address_id, "address added");
                    return Ok((slot, stored));
                }
                Err(CommerceError::ConcurrentModification(_)) if attempt < MAX_ATTEMPTS => {
                    tracing::debug!(%user_id, attempt, "address book changed, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Replaces the home address.
    pub async fn edit_home_address(&self, user_id: UserId, address: Address) -> Result<Address> {
        self.edit_slot(user_id, AddressSlot::Home, address).await
    }

    /// Replaces the work address.
    pub async fn edit_work_address(&self, user_id: UserId, address: Address) -> Result<Address> {
        self.edit_slot(user_id, AddressSlot::Work, address).await
    }

    /// Overwrites an occupied slot, keeping its address id.
    #[tracing::instrument(skip(self, address))]
    pub async fn edit_slot(
        &self,
        user_id: UserId,
        slot: AddressSlot,
        address: Address,
    ) -> Result<Address> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let VersionedUser { user, version } = self.gateway.load_user(user_id).await?;
            // Re-checked on every round so a concurrent delete is not undone
            let existing = user
                .addresses
                .get(slot)
                .ok_or(CommerceError::SlotNotFound(slot))?;

            let stored = Address {
                address_id: existing.address_id,
                ..address.clone()
            };
            let result = self
                .gateway
                .commit(
                    user_id,
                    vec![
                        UserUpdate::SetAddress(slot, stored.clone()),
                        UserUpdate::Touch(Utc::now()),
                    ],
                    UpdateOptions::expect_version(version),
                )
                .await;

            match result {
                Ok(_) => {
                    tracing::info!(%user_id, %slot, "address updated");
                    return Ok(stored);
                }
                Err(CommerceError::ConcurrentModification(_)) if attempt < MAX_ATTEMPTS => {
                    tracing::debug!(%user_id, attempt, "user changed during edit, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Empties both slots. The user document itself is kept.
    #[tracing::instrument(skip(self))]
    pub async fn delete_addresses(&self, user_id: UserId) -> Result<()> {
        self.gateway
            .commit(
                user_id,
                vec![UserUpdate::ClearAddresses, UserUpdate::Touch(Utc::now())],
                UpdateOptions::new(),
            )
            .await?;

        tracing::info!(%user_id, "addresses deleted");
        Ok(())
    }
}
