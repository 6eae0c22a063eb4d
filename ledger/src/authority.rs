//! Mint authorization.

use std::collections::HashSet;
use tally_types::AccountId;

/// Decides which accounts may increase supply.
pub trait MintAuthority {
    fn is_authorized_minter(&self, account: &AccountId) -> bool;
}

/// A fixed allow-list of minters.
#[derive(Clone, Debug, Default)]
pub struct MinterSet {
    minters: HashSet<AccountId>,
}

impl MinterSet {
    pub fn new(minters: impl IntoIterator<Item = AccountId>) -> Self {
        Self {
            minters: minters.into_iter().collect(),
        }
    }

    /// Returns `true` if the account was not already a minter.
    pub fn grant(&mut self, account: AccountId) -> bool {
        self.minters.insert(account)
    }

    /// Returns `true` if the account was a minter.
    pub fn revoke(&mut self, account: &AccountId) -> bool {
        self.minters.remove(account)
    }

    /// Current minters, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &AccountId> {
        self.minters.iter()
    }
}

impl MintAuthority for MinterSet {
    fn is_authorized_minter(&self, account: &AccountId) -> bool {
        self.minters.contains(account)
    }
}
