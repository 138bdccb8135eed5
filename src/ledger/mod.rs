//! Ledger module containing chart of accounts and account management

pub mod account;
pub mod allocation;
pub mod bootstrap;
pub mod chart;
pub mod core;
pub mod lifecycle;

pub use account::*;
pub use allocation::RootAccounts;
pub use chart::*;
pub use self::core::*;
pub use lifecycle::{CoaTransition, TransitionOptions, TransitionOutcome};
