//! Stake registry: stake, unstake, claim and reward settlement.

use crate::accrual::RewardRate;
use crate::error::StakingError;
use crate::record::StakeRecord;
use std::collections::HashMap;
use tally_ledger::{Ledger, LedgerError};
use tally_store::{StakeStore, StoreError};
use tally_types::{AccountId, Timestamp, TokenEvent};

const TOTAL_STAKED_KEY: &[u8] = b"total_staked";

/// What a successful operation did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Reward minted to the caller by this operation (zero if none).
    pub reward: u128,
    /// Events in the order they happened.
    pub events: Vec<TokenEvent>,
}

impl Receipt {
    pub fn single(event: TokenEvent) -> Self {
        Self {
            reward: 0,
            events: vec![event],
        }
    }
}

/// Per-account staking state layered over a [`Ledger`].
///
/// Principal lives in the ledger under the `custody` account; the registry
/// tracks who owns how much of it. The custody account is also the minter of
/// rewards, so it must be authorized by the ledger's mint authority.
///
/// Every operation validates all of its preconditions before touching the
/// ledger. The reward mint is the first mutation; the principal transfer
/// that follows is covered by the checks already made, so a failed call
/// leaves the ledger and the registry exactly as they were.
pub struct StakeRegistry {
    custody: AccountId,
    rate: RewardRate,
    records: HashMap<AccountId, StakeRecord>,
    total_staked: u128,
}

impl StakeRegistry {
    pub fn new(custody: AccountId, rate: RewardRate) -> Self {
        Self {
            custody,
            rate,
            records: HashMap::new(),
            total_staked: 0,
        }
    }

    pub fn custody(&self) -> &AccountId {
        &self.custody
    }

    pub fn rate(&self) -> RewardRate {
        self.rate
    }

    /// Principal `account` has in custody; zero if it never staked.
    pub fn staked_amount(&self, account: &AccountId) -> u128 {
        self.records
            .get(account)
            .map(|r| r.staked_amount)
            .unwrap_or(0)
    }

    pub fn record(&self, account: &AccountId) -> Option<&StakeRecord> {
        self.records.get(account)
    }

    /// Sum of every account's principal.
    pub fn total_staked(&self) -> u128 {
        self.total_staked
    }

    pub fn stakers(&self) -> impl Iterator<Item = (&AccountId, &StakeRecord)> {
        self.records.iter()
    }

    /// Reward `account` would receive if it settled at `now`.
    pub fn pending_reward(&self, account: &AccountId, now: Timestamp) -> Result<u128, StakingError> {
        match self.records.get(account) {
            Some(record) => record
                .pending_reward(&self.rate, now)
                .ok_or(StakingError::Overflow),
            None => Ok(0),
        }
    }

    /// Whether the custody balance matches the principal the registry owes.
    pub fn custody_balanced<L: Ledger>(&self, ledger: &L) -> bool {
        ledger.balance_of(&self.custody) == self.total_staked
    }

    /// Lock `amount` of the caller's balance into custody.
    ///
    /// Any reward pending on the existing principal is paid first, so the new
    /// deposit never earns for time it was not staked.
    pub fn stake<L: Ledger>(
        &mut self,
        ledger: &mut L,
        caller: &AccountId,
        amount: u128,
        now: Timestamp,
    ) -> Result<Receipt, StakingError> {
        if *caller == self.custody {
            return Err(StakingError::ReservedAccount);
        }
        if amount == 0 {
            return Err(StakingError::InvalidAmount);
        }
        let available = ledger.balance_of(caller);
        if available < amount {
            return Err(StakingError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        let reward = self.plan_settlement(ledger, caller, now)?;
        let staked_after = self
            .staked_amount(caller)
            .checked_add(amount)
            .ok_or(StakingError::Overflow)?;
        let total_after = self
            .total_staked
            .checked_add(amount)
            .ok_or(StakingError::Overflow)?;

        let mut events = Vec::with_capacity(3);
        self.pay_reward(ledger, caller, reward, &mut events)?;
        events.push(ledger.transfer(caller, &self.custody, amount)?);

        let checkpoint = self.settled_checkpoint(caller, now);
        self.records
            .insert(*caller, StakeRecord::new(staked_after, checkpoint));
        self.total_staked = total_after;

        tracing::debug!(account = %caller, amount, reward, staked = staked_after, "stake");
        events.push(TokenEvent::Stake {
            account: *caller,
            reward,
            amount,
        });
        Ok(Receipt { reward, events })
    }

    /// Return `amount` of principal to the caller together with the reward
    /// accrued on the full principal since the last settlement.
    pub fn unstake<L: Ledger>(
        &mut self,
        ledger: &mut L,
        caller: &AccountId,
        amount: u128,
        now: Timestamp,
    ) -> Result<Receipt, StakingError> {
        if amount == 0 {
            return Err(StakingError::InvalidAmount);
        }
        let staked = self.staked_amount(caller);
        if amount > staked {
            return Err(StakingError::InsufficientStake {
                requested: amount,
                staked,
            });
        }
        let reward = self.plan_settlement(ledger, caller, now)?;
        let held = ledger.balance_of(&self.custody);
        if held < amount {
            tracing::error!(%held, required = amount, "custody balance below staked principal");
            return Err(StakingError::CustodyShortfall {
                required: amount,
                held,
            });
        }
        let staked_after = staked - amount;

        let mut events = Vec::with_capacity(3);
        self.pay_reward(ledger, caller, reward, &mut events)?;
        events.push(ledger.transfer(&self.custody, caller, amount)?);

        let checkpoint = self.settled_checkpoint(caller, now);
        if staked_after == 0 {
            self.records.remove(caller);
        } else {
            self.records
                .insert(*caller, StakeRecord::new(staked_after, checkpoint));
        }
        self.total_staked -= amount;

        tracing::debug!(account = %caller, amount, reward, staked = staked_after, "unstake");
        events.push(TokenEvent::Unstake {
            account: *caller,
            reward,
            amount,
        });
        Ok(Receipt { reward, events })
    }

    /// Pay the caller's pending reward without touching principal.
    pub fn claim<L: Ledger>(
        &mut self,
        ledger: &mut L,
        caller: &AccountId,
        now: Timestamp,
    ) -> Result<Receipt, StakingError> {
        let staked = self.staked_amount(caller);
        if staked == 0 {
            return Err(StakingError::NoStake);
        }
        let reward = self.plan_settlement(ledger, caller, now)?;

        let mut events = Vec::with_capacity(2);
        self.pay_reward(ledger, caller, reward, &mut events)?;

        let checkpoint = self.settled_checkpoint(caller, now);
        self.records
            .insert(*caller, StakeRecord::new(staked, checkpoint));

        tracing::debug!(account = %caller, reward, "claim");
        events.push(TokenEvent::Claim {
            account: *caller,
            reward,
            timestamp: now,
        });
        Ok(Receipt { reward, events })
    }

    /// Compute the reward to settle at `now` and check the ledger can mint it.
    fn plan_settlement<L: Ledger>(
        &self,
        ledger: &L,
        account: &AccountId,
        now: Timestamp,
    ) -> Result<u128, StakingError> {
        let reward = self.pending_reward(account, now)?;
        if reward == 0 {
            return Ok(0);
        }
        if !ledger.is_authorized_minter(&self.custody) {
            tracing::warn!(custody = %self.custody, "custody account cannot mint rewards");
            return Err(LedgerError::Unauthorized(self.custody).into());
        }
        if !ledger.can_absorb_mint(reward) {
            return Err(StakingError::Overflow);
        }
        Ok(reward)
    }

    fn pay_reward<L: Ledger>(
        &self,
        ledger: &mut L,
        account: &AccountId,
        reward: u128,
        events: &mut Vec<TokenEvent>,
    ) -> Result<(), StakingError> {
        if reward > 0 {
            events.push(ledger.mint(&self.custody, account, reward)?);
        }
        Ok(())
    }

    fn settled_checkpoint(&self, account: &AccountId, now: Timestamp) -> Timestamp {
        self.records
            .get(account)
            .map(|r| r.settled_checkpoint(now))
            .unwrap_or(now)
    }
}

impl StakeRegistry {
    /// Persist all stake records to a stake store, dropping records that no
    /// longer exist in memory.
    pub fn save_to_store(&self, store: &dyn StakeStore) -> Result<(), StakingError> {
        for (account, _) in store.iter_stake_records()? {
            if !self.records.contains_key(&account) {
                store.delete_stake_record(&account)?;
            }
        }
        for (account, record) in &self.records {
            let bytes = bincode::serialize(record)
                .map_err(|e| StakingError::Serialization(e.to_string()))?;
            store.put_stake_record(account, &bytes)?;
        }
        store.put_meta(TOTAL_STAKED_KEY, &self.total_staked.to_be_bytes())?;
        Ok(())
    }

    /// Restore a registry from a stake store.
    pub fn load_from_store(
        store: &dyn StakeStore,
        custody: AccountId,
        rate: RewardRate,
    ) -> Result<Self, StakingError> {
        let mut records = HashMap::new();
        let mut total_staked: u128 = 0;
        for (account, bytes) in store.iter_stake_records()? {
            let record: StakeRecord = bincode::deserialize(&bytes)
                .map_err(|e| StakingError::Serialization(e.to_string()))?;
            if record.is_empty() {
                continue;
            }
            total_staked = total_staked
                .checked_add(record.staked_amount)
                .ok_or(StakingError::Overflow)?;
            records.insert(account, record);
        }

        if let Some(bytes) = store.get_meta(TOTAL_STAKED_KEY)? {
            let raw: [u8; 16] = bytes.as_slice().try_into().map_err(|_| {
                StoreError::Corruption(format!("total staked has {} bytes", bytes.len()))
            })?;
            let stored = u128::from_be_bytes(raw);
            if stored != total_staked {
                return Err(StoreError::Corruption(format!(
                    "stake records sum to {total_staked}, metadata says {stored}"
                ))
                .into());
            }
        }

        Ok(Self {
            custody,
            rate,
            records,
            total_staked,
        })
    }
}
