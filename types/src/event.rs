//! Append-only notifications emitted by ledger and staking operations.

use crate::{AccountId, Timestamp};
use serde::{Deserialize, Serialize};

/// An event produced by a successful token operation.
///
/// Events are notifications, not state: replaying them is never required to
/// rebuild balances or stake records.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TokenEvent {
    /// Value moved between accounts. `from` is `None` for a mint.
    Transfer {
        from: Option<AccountId>,
        to: AccountId,
        amount: u128,
    },
    /// `owner` allowed `spender` to move up to `amount` on its behalf.
    Approval {
        owner: AccountId,
        spender: AccountId,
        amount: u128,
    },
    /// `amount` was locked into custody; `reward` was settled beforehand.
    Stake {
        account: AccountId,
        reward: u128,
        amount: u128,
    },
    /// `amount` of principal was returned together with `reward`.
    Unstake {
        account: AccountId,
        reward: u128,
        amount: u128,
    },
    /// `reward` was paid out at `timestamp`; principal untouched.
    Claim {
        account: AccountId,
        reward: u128,
        timestamp: Timestamp,
    },
}

impl TokenEvent {
    /// Short name of the event kind, used for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenEvent::Transfer { .. } => "transfer",
            TokenEvent::Approval { .. } => "approval",
            TokenEvent::Stake { .. } => "stake",
            TokenEvent::Unstake { .. } => "unstake",
            TokenEvent::Claim { .. } => "claim",
        }
    }
}
