//! Main ledger orchestrator that coordinates charts and accounts

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::access::{ChartSet, EntityRef, ScopedChart};
use crate::config::CoaConfig;
use crate::ledger::lifecycle::{TransitionOptions, TransitionOutcome};
use crate::ledger::{AccountManager, AccountTreeNode, ChartManager, NewAccount, RootAccounts};
use crate::roles::LEVEL_2_ROOTS;
use crate::routes::CoaAction;
use crate::traits::*;
use crate::types::*;

/// Main ledger system that orchestrates all chart of accounts operations
pub struct Ledger<S: LedgerStorage> {
    account_manager: AccountManager<S>,
    chart_manager: ChartManager<S>,
}

impl<S: LedgerStorage + Clone> Ledger<S> {
    /// Create a new ledger with the given storage backend
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, CoaConfig::default())
    }

    /// Create a new ledger with custom configuration
    pub fn with_config(storage: S, config: CoaConfig) -> Self {
        Self {
            account_manager: AccountManager::new(storage.clone()),
            chart_manager: ChartManager::with_config(storage, config),
        }
    }

    /// Create a new ledger with a custom account validator
    pub fn with_validator(
        storage: S,
        config: CoaConfig,
        account_validator: Box<dyn AccountValidator>,
    ) -> Self {
        Self {
            account_manager: AccountManager::with_validator(storage.clone(), account_validator),
            chart_manager: ChartManager::with_config(storage, config),
        }
    }

    pub fn config(&self) -> &CoaConfig {
        self.chart_manager.config()
    }

    // Entity operations
    /// Register a new accounting entity
    pub async fn create_entity(
        &mut self,
        slug: String,
        name: String,
        admin_id: Uuid,
    ) -> LedgerResult<Entity> {
        let entity = Entity::new(slug, name, admin_id);
        self.chart_manager.storage.save_entity(&entity).await?;
        Ok(entity)
    }

    /// Get an entity by ID or slug
    pub async fn get_entity(&self, entity: &EntityRef) -> LedgerResult<Option<Entity>> {
        let storage = &self.chart_manager.storage;
        match entity {
            EntityRef::Id(id) => storage.get_entity(*id).await,
            EntityRef::Slug(slug) => storage.get_entity_by_slug(slug).await,
        }
    }

    /// Add a manager to an entity
    pub async fn add_manager(&mut self, entity: &mut Entity, user_id: Uuid) -> LedgerResult<()> {
        let updated = entity.clone().with_manager(user_id);
        self.chart_manager.storage.update_entity(&updated).await?;
        *entity = updated;
        Ok(())
    }

    /// Delete an entity with all of its charts and accounts
    #[instrument(skip(self))]
    pub async fn delete_entity(&mut self, entity_id: Uuid) -> LedgerResult<()> {
        self.chart_manager.storage.delete_entity(entity_id).await?;
        info!(entity = %entity_id, "entity deleted");
        Ok(())
    }

    // Chart operations
    /// Create and configure a new chart of accounts
    pub async fn create_chart(
        &mut self,
        entity: &Entity,
        name: Option<String>,
        description: Option<String>,
    ) -> LedgerResult<ChartOfAccounts> {
        self.chart_manager
            .create_chart(entity, name, description)
            .await
    }

    /// Persist a chart without configuring it
    pub async fn save_chart(&mut self, coa: &ChartOfAccounts) -> LedgerResult<()> {
        self.chart_manager.storage.save_chart(coa).await
    }

    /// Insert the structural roots of a chart
    pub async fn configure(
        &mut self,
        coa: &mut ChartOfAccounts,
        entity: &Entity,
        raise_exception: bool,
    ) -> LedgerResult<Option<Vec<Account>>> {
        self.chart_manager
            .configure(coa, entity, raise_exception)
            .await
    }

    /// Get a chart by ID
    pub async fn get_chart(&self, coa_id: Uuid) -> LedgerResult<Option<ChartOfAccounts>> {
        self.chart_manager.get_chart(coa_id).await
    }

    pub async fn mark_as_default(
        &mut self,
        coa: &mut ChartOfAccounts,
        entity: &mut Entity,
        options: TransitionOptions,
    ) -> LedgerResult<TransitionOutcome> {
        self.chart_manager
            .mark_as_default(coa, entity, options)
            .await
    }

    pub async fn mark_as_active(
        &mut self,
        coa: &mut ChartOfAccounts,
        entity: &mut Entity,
        options: TransitionOptions,
    ) -> LedgerResult<TransitionOutcome> {
        self.chart_manager
            .mark_as_active(coa, entity, options)
            .await
    }

    pub async fn mark_as_inactive(
        &mut self,
        coa: &mut ChartOfAccounts,
        entity: &mut Entity,
        options: TransitionOptions,
    ) -> LedgerResult<TransitionOutcome> {
        self.chart_manager
            .mark_as_inactive(coa, entity, options)
            .await
    }

    // Scoping
    pub async fn charts_for_user(&self, user_id: Uuid) -> LedgerResult<ChartSet> {
        self.chart_manager.charts_for_user(user_id).await
    }

    pub async fn charts_for_entity(
        &self,
        entity: &EntityRef,
        user_id: Uuid,
    ) -> LedgerResult<ChartSet> {
        self.chart_manager.charts_for_entity(entity, user_id).await
    }

    pub async fn chart_for_user(
        &self,
        entity: &EntityRef,
        coa_slug: &str,
        user_id: Uuid,
    ) -> LedgerResult<ScopedChart> {
        self.chart_manager
            .chart_for_user(entity, coa_slug, user_id)
            .await
    }

    /// Location of a view or action for the chart
    pub fn location(
        &self,
        entity: &Entity,
        coa: &ChartOfAccounts,
        action: CoaAction,
    ) -> LedgerResult<String> {
        self.chart_manager.location(entity, coa, action)
    }

    // Account operations
    /// Create a new account in a chart
    pub async fn create_account(
        &mut self,
        coa: &ChartOfAccounts,
        params: NewAccount,
        roots: Option<&RootAccounts>,
    ) -> LedgerResult<Account> {
        self.account_manager
            .create_account(coa, params, roots)
            .await
    }

    /// Allocate an existing account into a chart
    pub async fn allocate_account(
        &mut self,
        coa: &ChartOfAccounts,
        account: Account,
        roots: Option<&RootAccounts>,
    ) -> LedgerResult<Account> {
        self.account_manager
            .allocate_account(coa, account, roots)
            .await
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: Uuid) -> LedgerResult<Option<Account>> {
        self.account_manager.get_account(account_id).await
    }

    /// List all accounts of a chart
    pub async fn list_accounts(&self, coa_id: Uuid) -> LedgerResult<Vec<Account>> {
        self.account_manager.list_accounts(coa_id).await
    }

    pub async fn root_accounts(&self, coa_id: Uuid) -> LedgerResult<RootAccounts> {
        self.account_manager.root_accounts(coa_id).await
    }

    pub async fn coa_root_account(&self, coa: &ChartOfAccounts) -> LedgerResult<Account> {
        self.account_manager.coa_root_account(coa).await
    }

    pub async fn level_2_root(
        &self,
        coa: &ChartOfAccounts,
        account: &Account,
        roots: Option<&RootAccounts>,
    ) -> LedgerResult<Account> {
        self.account_manager.level_2_root(coa, account, roots).await
    }

    pub async fn non_root_accounts(&self, coa_id: Uuid) -> LedgerResult<Vec<Account>> {
        self.account_manager.non_root_accounts(coa_id).await
    }

    pub async fn account_tree(&self, coa: &ChartOfAccounts) -> LedgerResult<Vec<AccountTreeNode>> {
        self.account_manager.account_tree(coa).await
    }

    pub async fn account_parent(&self, account_id: Uuid) -> LedgerResult<Option<Account>> {
        self.account_manager.parent(account_id).await
    }

    pub async fn account_path(&self, account_id: Uuid) -> LedgerResult<Vec<Account>> {
        self.account_manager.account_path(account_id).await
    }

    pub async fn lock_all_accounts(&mut self, coa_id: Uuid) -> LedgerResult<Vec<Account>> {
        self.account_manager.lock_all_accounts(coa_id).await
    }

    pub async fn unlock_all_accounts(&mut self, coa_id: Uuid) -> LedgerResult<Vec<Account>> {
        self.account_manager.unlock_all_accounts(coa_id).await
    }

    /// Check the structural integrity of a chart
    pub async fn validate_integrity(
        &self,
        coa: &ChartOfAccounts,
    ) -> LedgerResult<ChartIntegrityReport> {
        let accounts = self.list_accounts(coa.id).await?;
        let roots = self.root_accounts(coa.id).await?;
        let mut issues = Vec::new();

        let root_count = roots.accounts().len();
        if root_count != LEVEL_2_ROOTS.len() + 1 || roots.roles().len() != root_count {
            issues.push(format!(
                "Expected 7 distinct structural accounts, found {} with {} roles",
                root_count,
                roots.roles().len()
            ));
        }

        for root in roots.accounts() {
            if !(root.locked && !root.active && root.role_default) {
                issues.push(format!(
                    "Structural account {} must be locked, inactive and role default",
                    root
                ));
            }
        }

        for account in accounts.iter().filter(|a| !a.is_root_account()) {
            let parent = self.account_parent(account.id).await?;
            let expected = account.role.group().map(|group| group.root_role());
            if parent.map(|p| p.role) != expected {
                issues.push(format!(
                    "Account {} is not placed under its {} root",
                    account,
                    expected.map(|r| r.to_string()).unwrap_or_default()
                ));
            }
        }

        Ok(ChartIntegrityReport {
            coa_id: coa.id,
            is_valid: issues.is_empty(),
            issues,
            structural_accounts: root_count,
            allocated_accounts: accounts.len() - root_count,
        })
    }
}

/// Report on chart of accounts integrity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartIntegrityReport {
    pub coa_id: Uuid,
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub structural_accounts: usize,
    pub allocated_accounts: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::AccountRole;
    use crate::utils::memory_storage::MemoryStorage;

    #[tokio::test]
    async fn test_ledger_basic_operations() {
        let storage = MemoryStorage::new();
        let mut ledger = Ledger::new(storage);
        let admin = Uuid::new_v4();

        let mut entity = ledger
            .create_entity("acme".to_string(), "Acme".to_string(), admin)
            .await
            .unwrap();
        let mut coa = ledger
            .create_chart(&entity, Some("Main".to_string()), None)
            .await
            .unwrap();

        let rent = ledger
            .create_account(&coa, NewAccount::new("6100", "Rent", AccountRole::Expense), None)
            .await
            .unwrap();
        let parent = ledger.account_parent(rent.id).await.unwrap().unwrap();
        assert_eq!(parent.role, AccountRole::RootExpenses);

        ledger
            .mark_as_default(&mut coa, &mut entity, TransitionOptions::default().committed())
            .await
            .unwrap();

        let report = ledger.validate_integrity(&coa).await.unwrap();
        assert!(report.is_valid, "{:?}", report.issues);
        assert_eq!(report.structural_accounts, 7);
        assert_eq!(report.allocated_accounts, 1);
    }
}
