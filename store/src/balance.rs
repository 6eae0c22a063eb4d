use crate::StoreError;
use tally_types::AccountId;

/// Store trait for persisting ledger balances and allowances.
///
/// Amounts are stored as raw `u128` units. Metadata (total supply and the
/// like) goes through the opaque `meta` keyspace.
pub trait BalanceStore {
    fn put_balance(&self, account: &AccountId, amount: u128) -> Result<(), StoreError>;
    fn iter_balances(&self) -> Result<Vec<(AccountId, u128)>, StoreError>;

    fn put_allowance(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: u128,
    ) -> Result<(), StoreError>;
    fn iter_allowances(&self) -> Result<Vec<(AccountId, AccountId, u128)>, StoreError>;

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
}
