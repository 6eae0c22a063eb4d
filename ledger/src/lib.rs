//! The balance ledger: the single authority over spendable balances.
//!
//! Every movement of value funnels through two primitives, [`Ledger::mint`]
//! and [`Ledger::transfer`], so the conservation invariant
//! (`total_supply == Σ balances`) is enforced in one place.

pub mod authority;
pub mod error;
pub mod ledger;
pub mod memory;

pub use authority::{MintAuthority, MinterSet};
pub use error::LedgerError;
pub use ledger::Ledger;
pub use memory::MemoryLedger;
