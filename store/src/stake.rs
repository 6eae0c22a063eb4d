use crate::StoreError;
use tally_types::AccountId;

/// Store trait for persisting stake registry state to durable storage.
///
/// Uses opaque `Vec<u8>` so the store doesn't depend on the `tally-staking`
/// crate (which would create a circular dependency). The registry
/// serializes/deserializes its own record type.
pub trait StakeStore {
    fn get_stake_record(&self, account: &AccountId) -> Result<Option<Vec<u8>>, StoreError>;
    fn put_stake_record(&self, account: &AccountId, record: &[u8]) -> Result<(), StoreError>;
    fn delete_stake_record(&self, account: &AccountId) -> Result<(), StoreError>;
    fn iter_stake_records(&self) -> Result<Vec<(AccountId, Vec<u8>)>, StoreError>;

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
}
