use proptest::prelude::*;

use tally_ledger::{Ledger, MemoryLedger, MinterSet};
use tally_staking::{RewardRate, StakeRegistry, StakingError};
use tally_types::{AccountId, Timestamp};

fn owner() -> AccountId {
    AccountId::from_low_u64(1)
}

fn custody() -> AccountId {
    AccountId::from_low_u64(0xC0FFEE)
}

fn staker(n: u8) -> AccountId {
    AccountId::from_low_u64(100 + n as u64)
}

fn setup(apr_bps: u32, funded: &[u128]) -> (MemoryLedger, StakeRegistry) {
    let mut ledger = MemoryLedger::new(MinterSet::new([owner(), custody()]));
    for (i, amount) in funded.iter().enumerate() {
        if *amount > 0 {
            ledger.mint(&owner(), &staker(i as u8), *amount).unwrap();
        }
    }
    (ledger, StakeRegistry::new(custody(), RewardRate::from_apr_bps(apr_bps)))
}

fn assert_conserved(ledger: &MemoryLedger, registry: &StakeRegistry) -> Result<(), TestCaseError> {
    prop_assert_eq!(ledger.balance_sum(), Some(ledger.total_supply()));
    let principal: u128 = registry.stakers().map(|(_, r)| r.staked_amount).sum();
    prop_assert_eq!(ledger.balance_of(&custody()), principal);
    prop_assert_eq!(registry.total_staked(), principal);
    Ok(())
}

#[derive(Clone, Debug)]
enum Op {
    Stake(u8, u128),
    Unstake(u8, u128),
    Claim(u8),
    Advance(u64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..3, 0u128..2_000_000).prop_map(|(who, amt)| Op::Stake(who, amt)),
        (0u8..3, 0u128..2_000_000).prop_map(|(who, amt)| Op::Unstake(who, amt)),
        (0u8..3).prop_map(Op::Claim),
        (0u64..1_000_000).prop_map(Op::Advance),
    ]
}

proptest! {
    /// Any sequence of operations, successful or not, keeps supply and
    /// custody reconciled.
    #[test]
    fn conservation_holds_for_any_sequence(
        apr_bps in 0u32..50_000,
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let (mut ledger, mut registry) = setup(apr_bps, &[1_000_000, 2_000_000, 500_000]);
        let mut now = Timestamp::new(0);
        for op in ops {
            let _ = match op {
                Op::Stake(who, amt) => registry.stake(&mut ledger, &staker(who), amt, now).map(|_| ()),
                Op::Unstake(who, amt) => registry.unstake(&mut ledger, &staker(who), amt, now).map(|_| ()),
                Op::Claim(who) => registry.claim(&mut ledger, &staker(who), now).map(|_| ()),
                Op::Advance(secs) => {
                    now = Timestamp::new(now.as_secs() + secs);
                    Ok(())
                }
            };
            assert_conserved(&ledger, &registry)?;
        }
    }

    /// stake(a) raises staked amount by exactly a and lowers balance by exactly a
    /// when no reward is pending.
    #[test]
    fn stake_is_exact(funded in 1u128..u64::MAX as u128, frac_pct in 1u128..=100) {
        let (mut ledger, mut registry) = setup(1_000, &[funded]);
        let amount = (funded * frac_pct / 100).max(1);
        let before = ledger.balance_of(&staker(0));
        registry.stake(&mut ledger, &staker(0), amount, Timestamp::new(7)).unwrap();
        prop_assert_eq!(registry.staked_amount(&staker(0)), amount);
        prop_assert_eq!(before - ledger.balance_of(&staker(0)), amount);
    }

    /// Stake then unstake of the same amount returns principal plus a
    /// non-negative reward and empties custody.
    #[test]
    fn stake_unstake_round_trip(
        funded in 1u128..u64::MAX as u128,
        held_secs in 0u64..10_000_000,
        apr_bps in 0u32..10_000,
    ) {
        let (mut ledger, mut registry) = setup(apr_bps, &[funded]);
        registry.stake(&mut ledger, &staker(0), funded, Timestamp::new(0)).unwrap();
        let receipt = registry
            .unstake(&mut ledger, &staker(0), funded, Timestamp::new(held_secs))
            .unwrap();
        prop_assert_eq!(registry.staked_amount(&staker(0)), 0);
        prop_assert_eq!(ledger.balance_of(&custody()), 0);
        prop_assert_eq!(ledger.balance_of(&staker(0)), funded + receipt.reward);
    }

    /// A positive gap at a positive rate earns a positive reward once the
    /// stake is large enough to register one unit per second.
    #[test]
    fn reward_positive_over_time(gap in 1u64..1_000_000, apr_bps in 1u32..10_000) {
        let stake = 10_000u128 * 31_536_000;
        let (mut ledger, mut registry) = setup(apr_bps, &[stake]);
        registry.stake(&mut ledger, &staker(0), stake, Timestamp::new(0)).unwrap();
        let zero = registry.claim(&mut ledger, &staker(0), Timestamp::new(0)).unwrap();
        prop_assert_eq!(zero.reward, 0);
        let later = registry.claim(&mut ledger, &staker(0), Timestamp::new(gap)).unwrap();
        prop_assert!(later.reward > 0);
    }

    /// Accrual is monotone in both stake and elapsed time.
    #[test]
    fn accrual_monotonic(
        apr_bps in 0u32..100_000,
        staked in 0u128..u64::MAX as u128,
        extra_stake in 0u128..1_000_000,
        elapsed in 0u64..100_000_000,
        extra_time in 0u64..1_000_000,
    ) {
        let rate = RewardRate::from_apr_bps(apr_bps);
        let base = rate.accrued_checked(staked, elapsed).unwrap();
        prop_assert!(rate.accrued_checked(staked + extra_stake, elapsed).unwrap() >= base);
        prop_assert!(rate.accrued_checked(staked, elapsed + extra_time).unwrap() >= base);
    }

    /// Wherever the direct product fits, accrual agrees with it exactly.
    #[test]
    fn accrual_matches_direct_formula(
        apr_bps in 0u32..100_000,
        staked in 0u128..u64::MAX as u128,
        elapsed in 0u64..1_000_000_000,
    ) {
        let rate = RewardRate::from_apr_bps(apr_bps);
        let direct = staked * apr_bps as u128 * elapsed as u128 / (10_000 * 31_536_000);
        prop_assert_eq!(rate.accrued_checked(staked, elapsed), Some(direct));
    }

    /// Zero-amount stake and unstake are always rejected and change nothing.
    #[test]
    fn zero_amount_rejected(funded in 0u128..1_000_000, staked_pct in 0u128..=100) {
        let (mut ledger, mut registry) = setup(1_000, &[funded]);
        let staked = funded * staked_pct / 100;
        if staked > 0 {
            registry.stake(&mut ledger, &staker(0), staked, Timestamp::new(0)).unwrap();
        }
        let balance = ledger.balance_of(&staker(0));
        let supply = ledger.total_supply();

        let stake_err = registry.stake(&mut ledger, &staker(0), 0, Timestamp::new(50));
        let unstake_err = registry.unstake(&mut ledger, &staker(0), 0, Timestamp::new(50));
        prop_assert!(matches!(stake_err, Err(StakingError::InvalidAmount)));
        prop_assert!(matches!(unstake_err, Err(StakingError::InvalidAmount)));
        prop_assert_eq!(ledger.balance_of(&staker(0)), balance);
        prop_assert_eq!(ledger.total_supply(), supply);
        prop_assert_eq!(registry.staked_amount(&staker(0)), staked);
    }

    /// Unstaking more than staked always fails, however large the spendable balance.
    #[test]
    fn over_unstake_rejected(
        funded in 1u128..u64::MAX as u128,
        staked_pct in 0u128..=100,
        excess in 1u128..1_000_000,
    ) {
        let (mut ledger, mut registry) = setup(1_000, &[funded]);
        let staked = funded * staked_pct / 100;
        if staked > 0 {
            registry.stake(&mut ledger, &staker(0), staked, Timestamp::new(0)).unwrap();
        }
        let result = registry.unstake(&mut ledger, &staker(0), staked + excess, Timestamp::new(10));
        let is_insufficient_stake = matches!(result, Err(StakingError::InsufficientStake { .. }));
        prop_assert!(is_insufficient_stake);
        prop_assert_eq!(registry.staked_amount(&staker(0)), staked);
    }
}
