//! Scripted replay of token operations.
//!
//! A script is a JSON document with a list of steps, each naming the calling
//! account. Steps run in order against a freshly deployed token whose clock
//! only moves on `advance` steps:
//!
//! ```json
//! { "steps": [
//!     { "mint":    { "caller": "0x…01", "to": "0x…02", "amount": 1000 } },
//!     { "stake":   { "caller": "0x…02", "amount": 1000 } },
//!     { "advance": { "secs": 86400 } },
//!     { "claim":   { "caller": "0x…02" } }
//! ] }
//! ```

use crate::config::CliConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tally_nullables::NullClock;
use tally_staking::{Receipt, StakeToken, StakingError};
use tally_types::{AccountId, Clock, SystemClock};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Mint {
        caller: AccountId,
        to: AccountId,
        amount: u128,
    },
    Transfer {
        caller: AccountId,
        to: AccountId,
        amount: u128,
    },
    Approve {
        caller: AccountId,
        spender: AccountId,
        amount: u128,
    },
    TransferFrom {
        caller: AccountId,
        from: AccountId,
        to: AccountId,
        amount: u128,
    },
    Stake {
        caller: AccountId,
        amount: u128,
    },
    Unstake {
        caller: AccountId,
        amount: u128,
    },
    Claim {
        caller: AccountId,
    },
    GrantMinter {
        caller: AccountId,
        account: AccountId,
    },
    RevokeMinter {
        caller: AccountId,
        account: AccountId,
    },
    /// Move the clock forward.
    Advance {
        secs: u64,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Mint { .. } => "mint",
            Step::Transfer { .. } => "transfer",
            Step::Approve { .. } => "approve",
            Step::TransferFrom { .. } => "transfer_from",
            Step::Stake { .. } => "stake",
            Step::Unstake { .. } => "unstake",
            Step::Claim { .. } => "claim",
            Step::GrantMinter { .. } => "grant_minter",
            Step::RevokeMinter { .. } => "revoke_minter",
            Step::Advance { .. } => "advance",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

/// A step that was rejected.
#[derive(Debug, Serialize)]
struct StepFailure<'a> {
    step: usize,
    op: &'a str,
    error: String,
}

/// Final state of the token after a replay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub name: String,
    pub symbol: String,
    pub clock: u64,
    pub total_supply: u128,
    pub total_staked: u128,
    pub failed_steps: usize,
    pub balances: BTreeMap<String, u128>,
    pub stakes: BTreeMap<String, u128>,
}

/// Replay `script` against a fresh token, writing each event (and each
/// rejected step) to `out` as one JSON line.
///
/// The replay clock starts at the configured start time, or at the system
/// time when none is set. With `strict`, the first rejected step aborts the
/// replay with its error.
pub fn run_script(
    config: &CliConfig,
    script: &Script,
    strict: bool,
    out: &mut dyn Write,
) -> anyhow::Result<Summary> {
    let start = config
        .start_time
        .unwrap_or_else(|| SystemClock.now().as_secs());
    let clock = Arc::new(NullClock::new(start));
    let mut token = StakeToken::with_minters(
        config.token.clone(),
        config.owner,
        config.custody,
        config.minters.iter().copied(),
        Arc::clone(&clock),
    );

    let mut failed_steps = 0;
    for (index, step) in script.steps.iter().enumerate() {
        match apply(&mut token, &clock, step) {
            Ok(Some(receipt)) => {
                for event in &receipt.events {
                    writeln!(out, "{}", serde_json::to_string(event)?)?;
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::info!(step = index, op = step.name(), error = %e, "step rejected");
                if strict {
                    anyhow::bail!("step {index} ({}) failed: {e}", step.name());
                }
                failed_steps += 1;
                let failure = StepFailure {
                    step: index,
                    op: step.name(),
                    error: e.to_string(),
                };
                writeln!(out, "{}", serde_json::to_string(&failure)?)?;
            }
        }
    }

    Ok(Summary {
        name: token.name().to_string(),
        symbol: token.symbol().to_string(),
        clock: clock.now().as_secs(),
        total_supply: token.total_supply(),
        total_staked: token.total_staked(),
        failed_steps,
        balances: token
            .ledger()
            .holders()
            .map(|(account, amount)| (account.to_string(), *amount))
            .collect(),
        stakes: token
            .registry()
            .stakers()
            .map(|(account, record)| (account.to_string(), record.staked_amount))
            .collect(),
    })
}

fn apply(
    token: &mut StakeToken<Arc<NullClock>>,
    clock: &NullClock,
    step: &Step,
) -> Result<Option<Receipt>, StakingError> {
    let receipt = match step {
        Step::Mint { caller, to, amount } => token.mint(caller, to, *amount)?,
        Step::Transfer { caller, to, amount } => token.transfer(caller, to, *amount)?,
        Step::Approve {
            caller,
            spender,
            amount,
        } => token.approve(caller, spender, *amount)?,
        Step::TransferFrom {
            caller,
            from,
            to,
            amount,
        } => token.transfer_from(caller, from, to, *amount)?,
        Step::Stake { caller, amount } => token.stake(caller, *amount)?,
        Step::Unstake { caller, amount } => token.unstake(caller, *amount)?,
        Step::Claim { caller } => token.claim(caller)?,
        Step::GrantMinter { caller, account } => {
            token.grant_minter(caller, *account)?;
            return Ok(None);
        }
        Step::RevokeMinter { caller, account } => {
            token.revoke_minter(caller, account)?;
            return Ok(None);
        }
        Step::Advance { secs } => {
            clock.advance(*secs);
            return Ok(None);
        }
    };
    Ok(Some(receipt))
}
