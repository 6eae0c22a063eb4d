//! The token facade: one ledger, one stake registry, one clock.
//!
//! Every public operation reads the clock once, runs to completion, and
//! either applies all of its effects or none. Successful operations publish
//! their events to subscribers and to the append-only history.

use crate::accrual::RewardRate;
use crate::bus::EventBus;
use crate::error::StakingError;
use crate::registry::{Receipt, StakeRegistry};
use tally_ledger::{Ledger, LedgerError, MemoryLedger, MinterSet};
use tally_store::{BalanceStore, StakeStore, StoreError};
use tally_types::{AccountId, Clock, TokenEvent, TokenParams};

const MINTERS_KEY: &[u8] = b"minters";

pub struct StakeToken<C> {
    params: TokenParams,
    owner: AccountId,
    ledger: MemoryLedger,
    registry: StakeRegistry,
    clock: C,
    bus: EventBus,
    history: Vec<TokenEvent>,
}

impl<C: Clock> StakeToken<C> {
    /// Deploy a token whose minters are `owner` and the custody account.
    pub fn new(params: TokenParams, owner: AccountId, custody: AccountId, clock: C) -> Self {
        Self::with_minters(params, owner, custody, [], clock)
    }

    /// Deploy a token with additional authorized minters.
    pub fn with_minters(
        params: TokenParams,
        owner: AccountId,
        custody: AccountId,
        extra_minters: impl IntoIterator<Item = AccountId>,
        clock: C,
    ) -> Self {
        let mut minters = MinterSet::new([owner, custody]);
        for minter in extra_minters {
            minters.grant(minter);
        }
        let rate = RewardRate::from_apr_bps(params.reward_apr_bps);
        tracing::info!(
            name = %params.name,
            symbol = %params.symbol,
            %owner,
            %custody,
            apr_bps = params.reward_apr_bps,
            "token deployed"
        );
        Self {
            params,
            owner,
            ledger: MemoryLedger::new(minters),
            registry: StakeRegistry::new(custody, rate),
            clock,
            bus: EventBus::new(),
            history: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.params.name
    }

    pub fn symbol(&self) -> &str {
        &self.params.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.params.decimals
    }

    pub fn params(&self) -> &TokenParams {
        &self.params
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn custody(&self) -> &AccountId {
        self.registry.custody()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    pub fn registry(&self) -> &StakeRegistry {
        &self.registry
    }

    // ── Views ──────────────────────────────────────────────────────────

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.ledger.balance_of(account)
    }

    pub fn total_supply(&self) -> u128 {
        self.ledger.total_supply()
    }

    pub fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.ledger.allowance(owner, spender)
    }

    pub fn staked_amount(&self, account: &AccountId) -> u128 {
        self.registry.staked_amount(account)
    }

    pub fn total_staked(&self) -> u128 {
        self.registry.total_staked()
    }

    /// Reward `account` would receive if it claimed now.
    pub fn pending_reward(&self, account: &AccountId) -> Result<u128, StakingError> {
        self.registry.pending_reward(account, self.clock.now())
    }

    /// Every event published so far, oldest first.
    pub fn events(&self) -> &[TokenEvent] {
        &self.history
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&TokenEvent) + Send + Sync>) {
        self.bus.subscribe(listener);
    }

    // ── Ledger operations ──────────────────────────────────────────────

    /// Mint `amount` to `to`. Only authorized minters may call this.
    pub fn mint(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<Receipt, StakingError> {
        self.guard_custody(to)?;
        let event = self.ledger.mint(caller, to, amount)?;
        Ok(self.publish(Receipt::single(event)))
    }

    pub fn transfer(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<Receipt, StakingError> {
        self.guard_custody(caller)?;
        self.guard_custody(to)?;
        let event = self.ledger.transfer(caller, to, amount)?;
        Ok(self.publish(Receipt::single(event)))
    }

    pub fn approve(
        &mut self,
        caller: &AccountId,
        spender: &AccountId,
        amount: u128,
    ) -> Result<Receipt, StakingError> {
        self.guard_custody(caller)?;
        let event = self.ledger.approve(caller, spender, amount);
        Ok(self.publish(Receipt::single(event)))
    }

    pub fn transfer_from(
        &mut self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<Receipt, StakingError> {
        self.guard_custody(from)?;
        self.guard_custody(to)?;
        let event = self.ledger.transfer_from(caller, from, to, amount)?;
        Ok(self.publish(Receipt::single(event)))
    }

    // ── Minter management ──────────────────────────────────────────────

    /// Authorize `account` to mint. Only the owner may call this.
    ///
    /// Returns `false` if the account was already a minter.
    pub fn grant_minter(
        &mut self,
        caller: &AccountId,
        account: AccountId,
    ) -> Result<bool, StakingError> {
        self.guard_owner(caller)?;
        let granted = self.ledger.authority_mut().grant(account);
        tracing::info!(%account, granted, "minter granted");
        Ok(granted)
    }

    /// Withdraw mint authority from `account`. Only the owner may call this,
    /// and the custody account keeps its authority to pay rewards.
    ///
    /// Returns `false` if the account was not a minter.
    pub fn revoke_minter(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
    ) -> Result<bool, StakingError> {
        self.guard_owner(caller)?;
        self.guard_custody(account)?;
        let revoked = self.ledger.authority_mut().revoke(account);
        tracing::info!(%account, revoked, "minter revoked");
        Ok(revoked)
    }

    pub fn is_minter(&self, account: &AccountId) -> bool {
        self.ledger.is_authorized_minter(account)
    }

    // ── Staking operations ─────────────────────────────────────────────

    pub fn stake(&mut self, caller: &AccountId, amount: u128) -> Result<Receipt, StakingError> {
        let now = self.clock.now();
        let receipt = self.registry.stake(&mut self.ledger, caller, amount, now)?;
        Ok(self.publish(receipt))
    }

    pub fn unstake(&mut self, caller: &AccountId, amount: u128) -> Result<Receipt, StakingError> {
        let now = self.clock.now();
        let receipt = self.registry.unstake(&mut self.ledger, caller, amount, now)?;
        Ok(self.publish(receipt))
    }

    pub fn claim(&mut self, caller: &AccountId) -> Result<Receipt, StakingError> {
        let now = self.clock.now();
        let receipt = self.registry.claim(&mut self.ledger, caller, now)?;
        Ok(self.publish(receipt))
    }

    /// Whether supply and custody both reconcile with the records.
    pub fn is_consistent(&self) -> bool {
        self.ledger.balance_sum() == Some(self.ledger.total_supply())
            && self.registry.custody_balanced(&self.ledger)
    }

    fn guard_owner(&self, caller: &AccountId) -> Result<(), StakingError> {
        if *caller != self.owner {
            tracing::warn!(%caller, "owner-only operation rejected");
            return Err(LedgerError::Unauthorized(*caller).into());
        }
        Ok(())
    }

    /// Custody balance only moves through stake and unstake.
    fn guard_custody(&self, account: &AccountId) -> Result<(), StakingError> {
        if account == self.registry.custody() {
            return Err(StakingError::ReservedAccount);
        }
        Ok(())
    }

    fn publish(&mut self, receipt: Receipt) -> Receipt {
        for event in &receipt.events {
            tracing::trace!(kind = event.kind(), "event");
            self.bus.emit(event);
        }
        self.history.extend(receipt.events.iter().cloned());
        receipt
    }
}

impl<C: Clock> StakeToken<C> {
    /// Persist ledger, minter set and registry state.
    pub fn save_to_store(
        &self,
        balances: &dyn BalanceStore,
        stakes: &dyn StakeStore,
    ) -> Result<(), StakingError> {
        self.ledger.save_to_store(balances)?;
        let mut minters: Vec<AccountId> = self.ledger.authority().iter().copied().collect();
        minters.sort_by_key(|account| account.to_string());
        let bytes =
            bincode::serialize(&minters).map_err(|e| StakingError::Serialization(e.to_string()))?;
        balances.put_meta(MINTERS_KEY, &bytes)?;
        self.registry.save_to_store(stakes)?;
        Ok(())
    }

    /// Restore a token from stores written by [`StakeToken::save_to_store`].
    ///
    /// The event history starts empty; events are notifications, not state.
    /// Without a stored minter set, the owner and custody are the minters.
    pub fn load_from_store(
        params: TokenParams,
        owner: AccountId,
        custody: AccountId,
        clock: C,
        balances: &dyn BalanceStore,
        stakes: &dyn StakeStore,
    ) -> Result<Self, StakingError> {
        let minters = match balances.get_meta(MINTERS_KEY)? {
            Some(bytes) => {
                let stored: Vec<AccountId> = bincode::deserialize(&bytes)
                    .map_err(|e| StakingError::Serialization(e.to_string()))?;
                let mut set = MinterSet::new(stored);
                set.grant(custody);
                set
            }
            None => MinterSet::new([owner, custody]),
        };
        let ledger = MemoryLedger::load_from_store(balances, minters)?;
        let rate = RewardRate::from_apr_bps(params.reward_apr_bps);
        let registry = StakeRegistry::load_from_store(stakes, custody, rate)?;
        let token = Self {
            params,
            owner,
            ledger,
            registry,
            clock,
            bus: EventBus::new(),
            history: Vec::new(),
        };
        if !token.registry.custody_balanced(&token.ledger) {
            return Err(StoreError::Corruption(
                "custody balance does not match staked principal".into(),
            )
            .into());
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tally_nullables::{NullClock, NullStore};

    fn account(n: u64) -> AccountId {
        AccountId::from_low_u64(n)
    }

    fn owner() -> AccountId {
        account(1)
    }

    fn custody() -> AccountId {
        account(0xC0FFEE)
    }

    fn deploy() -> (StakeToken<Arc<NullClock>>, Arc<NullClock>) {
        let clock = Arc::new(NullClock::new(1_000));
        let token = StakeToken::new(TokenParams::default(), owner(), custody(), Arc::clone(&clock));
        (token, clock)
    }

    #[test]
    fn metadata_comes_from_params() {
        let (token, _) = deploy();
        assert_eq!(token.name(), "Tally");
        assert_eq!(token.symbol(), "TLY");
        assert_eq!(token.decimals(), 18);
        assert_eq!(token.owner(), &owner());
        assert_eq!(token.custody(), &custody());
    }

    #[test]
    fn only_minters_can_mint() {
        let (mut token, _) = deploy();
        token.mint(&owner(), &account(2), 50).unwrap();
        let err = token.mint(&account(2), &account(2), 50).unwrap_err();
        assert!(matches!(
            err,
            StakingError::Ledger(LedgerError::Unauthorized(_))
        ));
        assert_eq!(token.total_supply(), 50);
    }

    #[test]
    fn extra_minters_are_authorized() {
        let clock = NullClock::new(0);
        let mut token = StakeToken::with_minters(
            TokenParams::default(),
            owner(),
            custody(),
            [account(9)],
            clock,
        );
        token.mint(&account(9), &account(2), 5).unwrap();
        assert_eq!(token.balance_of(&account(2)), 5);
    }

    #[test]
    fn custody_is_reserved_for_staking() {
        let (mut token, _) = deploy();
        token.mint(&owner(), &account(2), 100).unwrap();
        assert!(matches!(
            token.transfer(&account(2), &custody(), 10),
            Err(StakingError::ReservedAccount)
        ));
        assert!(matches!(
            token.mint(&owner(), &custody(), 10),
            Err(StakingError::ReservedAccount)
        ));
        assert!(token.is_consistent());
    }

    #[test]
    fn allowance_flow() {
        let (mut token, _) = deploy();
        token.mint(&owner(), &account(2), 100).unwrap();
        token.approve(&account(2), &account(3), 60).unwrap();
        token
            .transfer_from(&account(3), &account(2), &account(4), 60)
            .unwrap();
        assert_eq!(token.balance_of(&account(4)), 60);
        assert_eq!(token.allowance(&account(2), &account(3)), 0);
    }

    #[test]
    fn stake_claim_unstake_uses_clock() {
        let (mut token, clock) = deploy();
        token.mint(&owner(), &account(2), 31_536_000_000).unwrap();
        token.stake(&account(2), 31_536_000_000).unwrap();

        clock.advance(10);
        assert_eq!(token.pending_reward(&account(2)).unwrap(), 1_000);
        let claim = token.claim(&account(2)).unwrap();
        assert_eq!(claim.reward, 1_000);

        clock.advance(5);
        let unstake = token.unstake(&account(2), 31_536_000_000).unwrap();
        assert_eq!(unstake.reward, 500);
        assert_eq!(token.balance_of(&account(2)), 31_536_001_500);
        assert_eq!(token.total_staked(), 0);
        assert!(token.is_consistent());
    }

    #[test]
    fn subscribers_and_history_see_every_event() {
        let (mut token, clock) = deploy();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        token.subscribe(Box::new(move |event| {
            sink.lock().unwrap().push(event.kind());
        }));

        token.mint(&owner(), &account(2), 31_536_000_000).unwrap();
        token.stake(&account(2), 31_536_000_000).unwrap();
        clock.advance(1);
        token.claim(&account(2)).unwrap();

        let kinds = seen.lock().unwrap().clone();
        assert_eq!(kinds, vec!["transfer", "transfer", "stake", "transfer", "claim"]);
        assert_eq!(token.events().len(), 5);
    }

    #[test]
    fn failed_operation_publishes_nothing() {
        let (mut token, _) = deploy();
        assert!(token.stake(&account(2), 1).is_err());
        assert!(token.claim(&account(2)).is_err());
        assert!(token.events().is_empty());
    }

    #[test]
    fn owner_manages_minters() {
        let (mut token, _) = deploy();
        assert!(token.grant_minter(&owner(), account(9)).unwrap());
        assert!(!token.grant_minter(&owner(), account(9)).unwrap());
        token.mint(&account(9), &account(2), 5).unwrap();

        assert!(token.revoke_minter(&owner(), &account(9)).unwrap());
        assert!(!token.is_minter(&account(9)));
        assert!(matches!(
            token.mint(&account(9), &account(2), 5),
            Err(StakingError::Ledger(LedgerError::Unauthorized(_)))
        ));
    }

    #[test]
    fn only_owner_manages_minters() {
        let (mut token, _) = deploy();
        assert!(matches!(
            token.grant_minter(&account(2), account(2)),
            Err(StakingError::Ledger(LedgerError::Unauthorized(_)))
        ));
        assert!(matches!(
            token.revoke_minter(&account(2), &owner()),
            Err(StakingError::Ledger(LedgerError::Unauthorized(_)))
        ));
        assert!(!token.is_minter(&account(2)));
        assert!(token.is_minter(&owner()));
    }

    #[test]
    fn custody_keeps_mint_authority() {
        let (mut token, _) = deploy();
        assert!(matches!(
            token.revoke_minter(&owner(), &custody()),
            Err(StakingError::ReservedAccount)
        ));
        assert!(token.is_minter(&custody()));
    }

    #[test]
    fn store_round_trip() {
        let store = NullStore::new();
        let clock = Arc::new(NullClock::new(1_000));
        let mut token = StakeToken::with_minters(
            TokenParams::default(),
            owner(),
            custody(),
            [account(9)],
            Arc::clone(&clock),
        );
        token.mint(&owner(), &account(2), 1_000).unwrap();
        token.stake(&account(2), 400).unwrap();
        token.save_to_store(&store, &store).unwrap();

        let mut restored = StakeToken::load_from_store(
            TokenParams::default(),
            owner(),
            custody(),
            Arc::clone(&clock),
            &store,
            &store,
        )
        .unwrap();
        assert_eq!(restored.balance_of(&account(2)), 600);
        assert_eq!(restored.staked_amount(&account(2)), 400);
        assert_eq!(restored.balance_of(&custody()), 400);
        assert!(restored.events().is_empty());
        assert!(restored.is_consistent());

        restored.mint(&account(9), &account(3), 7).unwrap();
        assert_eq!(restored.balance_of(&account(3)), 7);
    }

    #[test]
    fn revoked_minter_stays_revoked_after_reload() {
        let store = NullStore::new();
        let (mut token, clock) = deploy();
        token.grant_minter(&owner(), account(9)).unwrap();
        token.revoke_minter(&owner(), &owner()).unwrap();
        token.save_to_store(&store, &store).unwrap();

        let restored = StakeToken::load_from_store(
            TokenParams::default(),
            owner(),
            custody(),
            Arc::clone(&clock),
            &store,
            &store,
        )
        .unwrap();
        assert!(!restored.is_minter(&owner()));
        assert!(restored.is_minter(&account(9)));
        assert!(restored.is_minter(&custody()));
    }
}
