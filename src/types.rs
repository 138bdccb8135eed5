//! Core types and data structures for the chart of accounts

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::roles::{AccountRole, RootMeta};

/// Balance side of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceType {
    /// Increases Assets, COGS and Expenses
    Debit,
    /// Increases Liabilities, Capital and Income
    Credit,
}

/// A single classified account within a chart of accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier, generated at creation
    pub id: Uuid,
    /// Short structural code, unique within a chart of accounts
    pub code: String,
    /// Human-readable account name
    pub name: String,
    /// Accounting classification
    pub role: AccountRole,
    /// Normal balance side
    pub balance_type: BalanceType,
    /// Whether the account can be used in new journal entries
    pub active: bool,
    /// Locked accounts cannot receive postings
    pub locked: bool,
    /// True for the structural accounts created at bootstrap
    pub role_default: bool,
    /// Owning chart of accounts, set on allocation
    pub coa_id: Option<Uuid>,
    /// When the account was created
    pub created_at: NaiveDateTime,
    /// When the account was last updated
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Create a new unallocated account
    pub fn new(
        code: String,
        name: String,
        role: AccountRole,
        balance_type: BalanceType,
        active: bool,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            code,
            name,
            role,
            balance_type,
            active,
            locked: false,
            role_default: false,
            coa_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build a structural root account for a chart of accounts.
    ///
    /// Structural accounts are always locked, inactive and role-default.
    pub fn structural(meta: &RootMeta, coa_id: Uuid) -> Self {
        let mut account = Self::new(
            meta.code.to_string(),
            meta.title.to_string(),
            meta.role,
            meta.balance_type,
            false,
        );
        account.locked = true;
        account.role_default = true;
        account.coa_id = Some(coa_id);
        account
    }

    /// Whether this is one of the structural root accounts
    pub fn is_root_account(&self) -> bool {
        self.role.is_root()
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().naive_utc();
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.name)
    }
}

/// Position of an account in its tree, owned by the tree storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreePosition {
    /// Materialized path; a node's path prefixes all of its descendants
    pub path: String,
    /// 1 for a tree root
    pub depth: u32,
    /// Parent account, `None` for a tree root
    pub parent_id: Option<Uuid>,
}

/// Accounting entity owning one or more charts of accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier
    pub id: Uuid,
    /// Unique human-readable handle
    pub slug: String,
    /// Display name
    pub name: String,
    /// User administering the entity
    pub admin_id: Uuid,
    /// Users allowed to manage the entity
    pub managers: Vec<Uuid>,
    default_coa_id: Option<Uuid>,
    /// When the entity was created
    pub created_at: NaiveDateTime,
    /// When the entity was last updated
    pub updated_at: NaiveDateTime,
}

impl Entity {
    /// Create a new entity with no default chart of accounts
    pub fn new(slug: String, name: String, admin_id: Uuid) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            slug,
            name,
            admin_id,
            managers: Vec::new(),
            default_coa_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a manager to the entity
    pub fn with_manager(mut self, user_id: Uuid) -> Self {
        if !self.managers.contains(&user_id) {
            self.managers.push(user_id);
        }
        self
    }

    /// The chart of accounts used when none is specified
    pub fn default_coa_id(&self) -> Option<Uuid> {
        self.default_coa_id
    }

    /// Only the lifecycle transitions move the default pointer.
    pub(crate) fn set_default_coa(&mut self, coa_id: Uuid) {
        self.default_coa_id = Some(coa_id);
        self.updated_at = chrono::Utc::now().naive_utc();
    }

    /// Whether the user administers or manages this entity
    pub fn is_accessible_by(&self, user_id: Uuid) -> bool {
        self.admin_id == user_id || self.managers.contains(&user_id)
    }
}

/// A chart of accounts belonging to one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOfAccounts {
    /// Unique identifier
    pub id: Uuid,
    /// Owning entity
    pub entity_id: Uuid,
    /// Entity-scoped handle, generated on configuration if absent
    pub slug: Option<String>,
    /// Optional display name
    pub name: Option<String>,
    /// Optional description
    pub description: Option<String>,
    /// Inactive charts do not accept new accounts
    pub active: bool,
    /// When the chart was created
    pub created_at: NaiveDateTime,
    /// When the chart was last updated
    pub updated_at: NaiveDateTime,
}

impl ChartOfAccounts {
    /// Create a new, active and unconfigured chart for an entity
    pub fn new(entity_id: Uuid, name: Option<String>, description: Option<String>) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            entity_id,
            slug: None,
            name,
            description,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this chart is the entity's default
    pub fn is_default(&self, entity: &Entity) -> bool {
        entity.id == self.entity_id && entity.default_coa_id == Some(self.id)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn can_activate(&self) -> bool {
        !self.active
    }

    /// A default chart can never be deactivated
    pub fn can_deactivate(&self, entity: &Entity) -> bool {
        self.is_active() && !self.is_default(entity)
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().naive_utc();
    }
}

impl fmt::Display for ChartOfAccounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = self.slug.as_deref().unwrap_or_default();
        match &self.name {
            Some(name) => write!(f, "{} ({})", name, slug),
            None => f.write_str(slug),
        }
    }
}

/// Errors that can occur in the chart of accounts
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),
    #[error("Chart of accounts not found: {0}")]
    ChartNotFound(String),
    #[error("Entity not found: {0}")]
    EntityNotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Whether this is a domain rejection rather than a lookup or storage failure
    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }
}

/// Result type for chart of accounts operations
pub type LedgerResult<T> = Result<T, LedgerError>;
