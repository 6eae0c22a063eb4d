//! Token parameters: metadata and the reward rate.

use serde::{Deserialize, Serialize};

/// Basis-point denominator (100% = 10_000 bps).
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Seconds in a 365-day year, the period the reward APR is quoted over.
pub const SECONDS_PER_YEAR: u128 = 31_536_000;

/// Static parameters of a token deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenParams {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Display decimals. Balances are always raw integer units.
    #[serde(default = "default_decimals")]
    pub decimals: u8,

    /// Yearly reward on staked principal, in basis points.
    /// Default: 1000 bps = 10% per year, paid per second.
    #[serde(default = "default_reward_apr_bps")]
    pub reward_apr_bps: u32,
}

fn default_name() -> String {
    "Tally".to_string()
}

fn default_symbol() -> String {
    "TLY".to_string()
}

fn default_decimals() -> u8 {
    18
}

fn default_reward_apr_bps() -> u32 {
    1_000
}

impl Default for TokenParams {
    fn default() -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            decimals: default_decimals(),
            reward_apr_bps: default_reward_apr_bps(),
        }
    }
}
