//! In-memory ledger with allowances and store persistence.

use crate::authority::{MintAuthority, MinterSet};
use crate::error::LedgerError;
use crate::ledger::Ledger;
use std::collections::HashMap;
use tally_store::{BalanceStore, StoreError};
use tally_types::{AccountId, TokenEvent};

const TOTAL_SUPPLY_KEY: &[u8] = b"total_supply";

/// A debit/credit pair validated against current balances but not yet applied.
struct PreparedTransfer {
    from_after: u128,
    to_after: u128,
}

/// The reference `Ledger` implementation.
///
/// Zero balances are kept as explicit entries once an account has been
/// touched, so persisting the ledger overwrites stale values in the store.
pub struct MemoryLedger<A = MinterSet> {
    balances: HashMap<AccountId, u128>,
    allowances: HashMap<(AccountId, AccountId), u128>,
    total_supply: u128,
    authority: A,
}

impl<A: MintAuthority> MemoryLedger<A> {
    pub fn new(authority: A) -> Self {
        Self {
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: 0,
            authority,
        }
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    pub fn authority_mut(&mut self) -> &mut A {
        &mut self.authority
    }

    /// Remaining amount `spender` may move out of `owner`'s balance.
    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Set (not add to) the allowance of `spender` over `owner`'s balance.
    ///
    /// A zero amount clears the allowance.
    pub fn approve(&mut self, owner: &AccountId, spender: &AccountId, amount: u128) -> TokenEvent {
        self.allowances.insert((*owner, *spender), amount);
        tracing::debug!(%owner, %spender, amount, "allowance set");
        TokenEvent::Approval {
            owner: *owner,
            spender: *spender,
            amount,
        }
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming allowance.
    pub fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<TokenEvent, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                needed: amount,
                available: allowed,
            });
        }
        let prepared = self.prepare_transfer(from, to, amount)?;
        self.allowances.insert((*from, *spender), allowed - amount);
        Ok(self.commit_transfer(from, to, amount, prepared))
    }

    /// Sum of every balance. Equal to `total_supply` whenever the ledger is consistent.
    pub fn balance_sum(&self) -> Option<u128> {
        self.balances
            .values()
            .try_fold(0u128, |acc, &b| acc.checked_add(b))
    }

    /// Accounts with a non-zero balance.
    pub fn holders(&self) -> impl Iterator<Item = (&AccountId, &u128)> {
        self.balances.iter().filter(|&(_, &b)| b > 0)
    }

    fn prepare_transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<PreparedTransfer, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        let from_after = available - amount;
        let to_after = if from == to {
            available
        } else {
            self.balance_of(to)
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?
        };
        Ok(PreparedTransfer {
            from_after,
            to_after,
        })
    }

    fn commit_transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
        prepared: PreparedTransfer,
    ) -> TokenEvent {
        if from != to {
            self.balances.insert(*from, prepared.from_after);
            self.balances.insert(*to, prepared.to_after);
        }
        tracing::debug!(%from, %to, amount, "transfer applied");
        TokenEvent::Transfer {
            from: Some(*from),
            to: *to,
            amount,
        }
    }
}

impl<A: MintAuthority> Ledger for MemoryLedger<A> {
    fn balance_of(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn total_supply(&self) -> u128 {
        self.total_supply
    }

    fn is_authorized_minter(&self, account: &AccountId) -> bool {
        self.authority.is_authorized_minter(account)
    }

    fn mint(
        &mut self,
        minter: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<TokenEvent, LedgerError> {
        if !self.authority.is_authorized_minter(minter) {
            tracing::warn!(%minter, amount, "mint rejected: unauthorized minter");
            return Err(LedgerError::Unauthorized(*minter));
        }
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        let supply_after = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance_after = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.total_supply = supply_after;
        self.balances.insert(*to, balance_after);
        tracing::debug!(%minter, %to, amount, supply = supply_after, "minted");
        Ok(TokenEvent::Transfer {
            from: None,
            to: *to,
            amount,
        })
    }

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<TokenEvent, LedgerError> {
        let prepared = self.prepare_transfer(from, to, amount)?;
        Ok(self.commit_transfer(from, to, amount, prepared))
    }
}

impl<A: MintAuthority> MemoryLedger<A> {
    /// Persist balances, allowances and total supply to a balance store.
    pub fn save_to_store(&self, store: &dyn BalanceStore) -> Result<(), LedgerError> {
        store.put_meta(TOTAL_SUPPLY_KEY, &self.total_supply.to_be_bytes())?;
        for (account, amount) in &self.balances {
            store.put_balance(account, *amount)?;
        }
        for ((owner, spender), amount) in &self.allowances {
            store.put_allowance(owner, spender, *amount)?;
        }
        Ok(())
    }

    /// Restore a ledger from a balance store.
    ///
    /// Fails with [`StoreError::Corruption`] if the stored balances do not sum
    /// to the stored total supply.
    pub fn load_from_store(store: &dyn BalanceStore, authority: A) -> Result<Self, LedgerError> {
        let total_supply = match store.get_meta(TOTAL_SUPPLY_KEY)? {
            Some(bytes) => {
                let raw: [u8; 16] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Corruption(format!("total supply has {} bytes", bytes.len()))
                })?;
                u128::from_be_bytes(raw)
            }
            None => 0,
        };

        let balances: HashMap<AccountId, u128> = store.iter_balances()?.into_iter().collect();
        let allowances = store
            .iter_allowances()?
            .into_iter()
            .map(|(owner, spender, amount)| ((owner, spender), amount))
            .collect();

        let ledger = Self {
            balances,
            allowances,
            total_supply,
            authority,
        };
        if ledger.balance_sum() != Some(total_supply) {
            return Err(StoreError::Corruption(format!(
                "balances do not sum to total supply {total_supply}"
            ))
            .into());
        }
        Ok(ledger)
    }
}
