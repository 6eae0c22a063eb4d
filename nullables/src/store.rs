//! Nullable store: thread-safe in-memory storage for testing.

use std::collections::HashMap;
use std::sync::Mutex;
use tally_store::{BalanceStore, StakeStore, StoreError};
use tally_types::AccountId;

/// An in-memory balance + stake store for testing.
///
/// The two metadata keyspaces are kept apart so a ledger and a registry can
/// share one store without clobbering each other.
#[derive(Default)]
pub struct NullStore {
    balances: Mutex<HashMap<AccountId, u128>>,
    allowances: Mutex<HashMap<(AccountId, AccountId), u128>>,
    balance_meta: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    stake_records: Mutex<HashMap<AccountId, Vec<u8>>>,
    stake_meta: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stake records currently persisted.
    pub fn stake_record_count(&self) -> usize {
        self.stake_records.lock().unwrap().len()
    }
}

impl BalanceStore for NullStore {
    fn put_balance(&self, account: &AccountId, amount: u128) -> Result<(), StoreError> {
        self.balances.lock().unwrap().insert(*account, amount);
        Ok(())
    }

    fn iter_balances(&self) -> Result<Vec<(AccountId, u128)>, StoreError> {
        Ok(self
            .balances
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (*k, *v))
            .collect())
    }

    fn put_allowance(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: u128,
    ) -> Result<(), StoreError> {
        self.allowances
            .lock()
            .unwrap()
            .insert((*owner, *spender), amount);
        Ok(())
    }

    fn iter_allowances(&self) -> Result<Vec<(AccountId, AccountId, u128)>, StoreError> {
        Ok(self
            .allowances
            .lock()
            .unwrap()
            .iter()
            .map(|((owner, spender), amount)| (*owner, *spender, *amount))
            .collect())
    }

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.balance_meta.lock().unwrap().get(key).cloned())
    }

    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.balance_meta
            .lock()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}

impl StakeStore for NullStore {
    fn get_stake_record(&self, account: &AccountId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.stake_records.lock().unwrap().get(account).cloned())
    }

    fn put_stake_record(&self, account: &AccountId, record: &[u8]) -> Result<(), StoreError> {
        self.stake_records
            .lock()
            .unwrap()
            .insert(*account, record.to_vec());
        Ok(())
    }

    fn delete_stake_record(&self, account: &AccountId) -> Result<(), StoreError> {
        self.stake_records.lock().unwrap().remove(account);
        Ok(())
    }

    fn iter_stake_records(&self) -> Result<Vec<(AccountId, Vec<u8>)>, StoreError> {
        Ok(self
            .stake_records
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect())
    }

    fn get_meta(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.stake_meta.lock().unwrap().get(key).cloned())
    }

    fn put_meta(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.stake_meta
            .lock()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}
