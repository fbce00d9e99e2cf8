//! Address plumbing: per-user delivery addresses.

use common::{AddressId, UserId};
use store::{Address, AddressStore};

use crate::error::DomainError;

/// Fields for a new delivery address.
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub street: String,
    pub building_name: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

pub struct AddressService<S> {
    store: S,
}

impl<S: AddressStore> AddressService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, new))]
    pub async fn create_address(
        &self,
        user_id: UserId,
        new: NewAddress,
    ) -> Result<Address, DomainError> {
        let address = Address {
            id: AddressId::new(),
            user_id,
            street: new.street,
            building_name: new.building_name,
            city: new.city,
            state: new.state,
            country: new.country,
            zip_code: new.zip_code,
        };
        self.store.create_address(&address).await?;
        Ok(address)
    }

    pub async fn get_address(
        &self,
        address_id: AddressId,
        user_id: UserId,
    ) -> Result<Address, DomainError> {
        self.store
            .find_address(address_id, user_id)
            .await?
            .ok_or(DomainError::AddressNotFound { address_id })
    }

    pub async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>, DomainError> {
        Ok(self.store.list_addresses(user_id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_address(
        &self,
        address_id: AddressId,
        user_id: UserId,
    ) -> Result<(), DomainError> {
        if self.store.delete_address(address_id, user_id).await? {
            Ok(())
        } else {
            Err(DomainError::AddressNotFound { address_id })
        }
    }
}
