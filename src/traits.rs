//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::*;

/// Record storage for entities, charts of accounts and accounts
///
/// This trait allows the chart of accounts core to work with any storage
/// backend (PostgreSQL, SQLite, in-memory, etc.). Implementations enforce
/// uniqueness of entity slugs, chart ids and (entity, chart slug) pairs.
#[async_trait]
pub trait CoaStorage: Send + Sync {
    /// Save a new entity
    async fn save_entity(&mut self, entity: &Entity) -> LedgerResult<()>;

    /// Get an entity by ID
    async fn get_entity(&self, entity_id: Uuid) -> LedgerResult<Option<Entity>>;

    /// Get an entity by slug, ignoring case
    async fn get_entity_by_slug(&self, slug: &str) -> LedgerResult<Option<Entity>>;

    /// List all entities
    async fn list_entities(&self) -> LedgerResult<Vec<Entity>>;

    /// Update an existing entity
    async fn update_entity(&mut self, entity: &Entity) -> LedgerResult<()>;

    /// Delete an entity together with its charts and their accounts
    async fn delete_entity(&mut self, entity_id: Uuid) -> LedgerResult<()>;

    /// Save a new chart of accounts
    async fn save_chart(&mut self, coa: &ChartOfAccounts) -> LedgerResult<()>;

    /// Get a chart of accounts by ID
    async fn get_chart(&self, coa_id: Uuid) -> LedgerResult<Option<ChartOfAccounts>>;

    /// List charts of accounts, optionally for one entity
    async fn list_charts(&self, entity_id: Option<Uuid>) -> LedgerResult<Vec<ChartOfAccounts>>;

    /// Update an existing chart of accounts
    async fn update_chart(&mut self, coa: &ChartOfAccounts) -> LedgerResult<()>;

    /// Get an account by ID
    async fn get_account(&self, account_id: Uuid) -> LedgerResult<Option<Account>>;

    /// List the accounts of a chart in tree order
    async fn list_chart_accounts(&self, coa_id: Uuid) -> LedgerResult<Vec<Account>>;

    /// Update an existing account without moving it in the tree
    async fn update_account(&mut self, account: &Account) -> LedgerResult<()>;
}

/// Hierarchical placement of accounts
///
/// Insertion persists the account together with its tree position; the
/// adapter is the sole authority on sibling ordering.
#[async_trait]
pub trait TreeStorage: Send + Sync {
    /// Persist an account as the root of a new tree
    async fn insert_root(&mut self, account: &Account) -> LedgerResult<TreePosition>;

    /// Persist an account as the last child of `parent_id`
    async fn insert_child(&mut self, parent_id: Uuid, account: &Account)
        -> LedgerResult<TreePosition>;

    /// Direct children of an account in tree order
    async fn children_of(&self, account_id: Uuid) -> LedgerResult<Vec<Account>>;

    /// All descendants of an account in tree order, with their positions
    async fn descendants_of(&self, account_id: Uuid)
        -> LedgerResult<Vec<(Account, TreePosition)>>;

    /// Parent of an account, `None` for a tree root
    async fn parent_of(&self, account_id: Uuid) -> LedgerResult<Option<Account>>;

    /// Whether the account is the root of its tree
    async fn is_root(&self, account_id: Uuid) -> LedgerResult<bool>;

    /// Tree position of an account, if placed
    async fn position_of(&self, account_id: Uuid) -> LedgerResult<Option<TreePosition>>;
}

/// Storage backends usable by the ledger: records plus tree placement
pub trait LedgerStorage: CoaStorage + TreeStorage {}

impl<T: CoaStorage + TreeStorage> LedgerStorage for T {}

/// Trait for implementing custom account validation rules
pub trait AccountValidator: Send + Sync {
    /// Validate an account before it is allocated
    fn validate_account(&self, account: &Account) -> LedgerResult<()>;
}

/// Default account validator with basic rules
pub struct DefaultAccountValidator;

impl AccountValidator for DefaultAccountValidator {
    fn validate_account(&self, account: &Account) -> LedgerResult<()> {
        if account.code.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Account code cannot be empty".to_string(),
            ));
        }

        if account.name.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Account name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
