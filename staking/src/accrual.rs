//! The reward accrual rule.
//!
//! `reward = staked × apr_bps × elapsed / (10_000 × SECONDS_PER_YEAR)`
//!
//! Linear in elapsed time for a fixed stake, zero at zero elapsed time, and
//! rounded down so rounding never mints more than was earned.

use serde::{Deserialize, Serialize};
use tally_types::params::{BPS_DENOMINATOR, SECONDS_PER_YEAR};
use tally_types::Timestamp;

/// A fixed yearly reward rate, quoted in basis points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRate {
    apr_bps: u32,
}

impl RewardRate {
    pub fn from_apr_bps(apr_bps: u32) -> Self {
        Self { apr_bps }
    }

    pub fn apr_bps(&self) -> u32 {
        self.apr_bps
    }

    pub fn is_zero(&self) -> bool {
        self.apr_bps == 0
    }

    /// Reward earned by `staked` over `elapsed_secs`, or `None` when the
    /// reward itself does not fit in a `u128`.
    pub fn accrued_checked(&self, staked: u128, elapsed_secs: u64) -> Option<u128> {
        if staked == 0 || elapsed_secs == 0 || self.apr_bps == 0 {
            return Some(0);
        }
        // Fits: u32 × u64 < 2^96.
        let factor = self.apr_bps as u128 * elapsed_secs as u128;
        mul_div_floor(staked, factor, BPS_DENOMINATOR * SECONDS_PER_YEAR)
    }

    /// Reward earned between `since` and `now`. A clock that runs backwards
    /// accrues nothing.
    pub fn accrued_between(&self, staked: u128, since: Timestamp, now: Timestamp) -> Option<u128> {
        self.accrued_checked(staked, since.elapsed_since(now))
    }
}

/// `floor(a × b / d)` without forming the full product.
///
/// With `a = qa·d + ra` and `b = qb·d + rb`:
/// `a·b / d = qa·b + ra·qb + floor(ra·rb / d)`.
/// Only `qa·b` can exceed `u128`, and when it does so does the result.
fn mul_div_floor(a: u128, b: u128, d: u128) -> Option<u128> {
    let (qa, ra) = (a / d, a % d);
    let (qb, rb) = (b / d, b % d);
    // ra, rb < d < 2^40 and ra·qb < b.
    qa.checked_mul(b)?
        .checked_add(ra * qb)?
        .checked_add(ra * rb / d)
}

impl Default for RewardRate {
    fn default() -> Self {
        Self::from_apr_bps(tally_types::TokenParams::default().reward_apr_bps)
    }
}
