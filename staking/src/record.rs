//! Per-account stake state.

use crate::accrual::RewardRate;
use serde::{Deserialize, Serialize};
use tally_types::Timestamp;

/// Principal held in custody for one account, and when its reward was last settled.
///
/// A record with zero principal is equivalent to no record at all; the
/// registry drops records when they reach zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub staked_amount: u128,
    pub checkpoint: Timestamp,
}

impl StakeRecord {
    pub fn new(staked_amount: u128, checkpoint: Timestamp) -> Self {
        Self {
            staked_amount,
            checkpoint,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.staked_amount == 0
    }

    /// Reward accrued since the checkpoint, or `None` on overflow.
    pub fn pending_reward(&self, rate: &RewardRate, now: Timestamp) -> Option<u128> {
        rate.accrued_between(self.staked_amount, self.checkpoint, now)
    }

    /// The checkpoint after settling at `now`.
    ///
    /// Never moves backwards, so a clock regression cannot re-open an
    /// interval that was already paid.
    pub fn settled_checkpoint(&self, now: Timestamp) -> Timestamp {
        self.checkpoint.max(now)
    }
}
