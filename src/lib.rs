//! # Accounting CoA
//!
//! The chart of accounts core of a double-entry accounting library: the
//! hierarchical tree of accounts used to classify every transaction of an
//! accounting entity.
//!
//! ## Features
//!
//! - **Structural bootstrap**: every chart gets one CoA root and six group roots
//!   (Assets, Liabilities, Capital, Income, COGS, Expenses), exactly once
//! - **Role-based allocation**: new accounts are placed under the group root matching their role
//! - **Lifecycle**: active/inactive and default transitions, validated before commit
//! - **Access scoping**: charts visible to an entity's admin and managers
//! - **Storage abstraction**: record and tree storage behind traits, with an in-memory backend
//!
//! ## Quick Start
//!
//! ```rust
//! use accounting_coa::{AccountRole, Ledger, NewAccount, TransitionOptions};
//! use accounting_coa::utils::MemoryStorage;
//! use uuid::Uuid;
//!
//! # tokio_test_block(async {
//! let mut ledger = Ledger::new(MemoryStorage::new());
//! let mut entity = ledger
//!     .create_entity("acme".to_string(), "Acme".to_string(), Uuid::new_v4())
//!     .await?;
//! let mut coa = ledger.create_chart(&entity, None, None).await?;
//!
//! let rent = ledger
//!     .create_account(&coa, NewAccount::new("6100", "Rent", AccountRole::Expense), None)
//!     .await?;
//! ledger
//!     .mark_as_default(&mut coa, &mut entity, TransitionOptions::default().committed())
//!     .await?;
//! # Ok::<(), accounting_coa::LedgerError>(())
//! # });
//! # fn tokio_test_block<F: std::future::Future>(_f: F) {}
//! ```

pub mod access;
pub mod config;
pub mod ledger;
pub mod roles;
pub mod routes;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use access::{ChartSet, EntityRef, ScopedChart};
pub use config::CoaConfig;
pub use ledger::{
    AccountManager, AccountTreeNode, ChartIntegrityReport, ChartManager, CoaTransition, Ledger,
    NewAccount, RootAccounts, TransitionOptions, TransitionOutcome,
};
pub use roles::{AccountRole, RoleGroup, RootMeta};
pub use routes::CoaAction;
pub use traits::*;
pub use types::*;
