//! Account management functionality

use tracing::{info, instrument};
use uuid::Uuid;

use crate::ledger::allocation::{self, RootAccounts};
use crate::roles::AccountRole;
use crate::traits::*;
use crate::types::*;

/// Parameters for creating an account in a chart
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub role: AccountRole,
    pub balance_type: BalanceType,
    pub active: bool,
}

impl NewAccount {
    /// Active account using the role's normal balance side
    pub fn new(code: impl Into<String>, name: impl Into<String>, role: AccountRole) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            role,
            balance_type: role.default_balance_type(),
            active: true,
        }
    }

    pub fn with_balance_type(mut self, balance_type: BalanceType) -> Self {
        self.balance_type = balance_type;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// An account with its depth below the chart's root
#[derive(Debug, Clone, PartialEq)]
pub struct AccountTreeNode {
    pub account: Account,
    /// 0 for the CoA root
    pub depth: u32,
}

/// Account manager for handling chart of accounts operations
pub struct AccountManager<S: LedgerStorage> {
    pub(crate) storage: S,
    validator: Box<dyn AccountValidator>,
}

impl<S: LedgerStorage> AccountManager<S> {
    /// Create a new account manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultAccountValidator),
        }
    }

    /// Create a new account manager with custom validator
    pub fn with_validator(storage: S, validator: Box<dyn AccountValidator>) -> Self {
        Self { storage, validator }
    }

    /// Create an account and allocate it into the chart
    #[instrument(skip(self, coa, roots), fields(coa = %coa.id))]
    pub async fn create_account(
        &mut self,
        coa: &ChartOfAccounts,
        params: NewAccount,
        roots: Option<&RootAccounts>,
    ) -> LedgerResult<Account> {
        if !coa.is_active() {
            return Err(LedgerError::Validation(format!(
                "CoA {} is inactive and cannot accept new accounts",
                coa
            )));
        }

        let account = Account::new(
            params.code,
            params.name,
            params.role,
            params.balance_type,
            params.active,
        );
        self.validator.validate_account(&account)?;

        self.allocate_account(coa, account, roots).await
    }

    /// Allocate an existing account under the root matching its role
    pub async fn allocate_account(
        &mut self,
        coa: &ChartOfAccounts,
        account: Account,
        roots: Option<&RootAccounts>,
    ) -> LedgerResult<Account> {
        allocation::allocate(&mut self.storage, coa, account, roots).await
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: Uuid) -> LedgerResult<Option<Account>> {
        self.storage.get_account(account_id).await
    }

    /// Get an account by ID, returning an error if not found
    pub async fn get_account_required(&self, account_id: Uuid) -> LedgerResult<Account> {
        self.storage
            .get_account(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    /// List all accounts of a chart in tree order
    pub async fn list_accounts(&self, coa_id: Uuid) -> LedgerResult<Vec<Account>> {
        self.storage.list_chart_accounts(coa_id).await
    }

    /// The structural root accounts of a chart
    pub async fn root_accounts(&self, coa_id: Uuid) -> LedgerResult<RootAccounts> {
        allocation::fetch_root_accounts(&self.storage, coa_id).await
    }

    /// The top-level root of a configured chart
    pub async fn coa_root_account(&self, coa: &ChartOfAccounts) -> LedgerResult<Account> {
        self.root_accounts(coa.id)
            .await?
            .coa_root()
            .cloned()
            .ok_or_else(|| {
                LedgerError::Validation(format!("CoA {} has not been configured", coa))
            })
    }

    /// The second-level root an account belongs under
    pub async fn level_2_root(
        &self,
        coa: &ChartOfAccounts,
        account: &Account,
        roots: Option<&RootAccounts>,
    ) -> LedgerResult<Account> {
        let roots = match roots {
            Some(roots) => {
                allocation::validate_root_accounts(coa, roots)?;
                roots.clone()
            }
            None => self.root_accounts(coa.id).await?,
        };
        allocation::resolve_level_2_root(account, &roots).cloned()
    }

    /// All accounts of a chart except the structural roots
    pub async fn non_root_accounts(&self, coa_id: Uuid) -> LedgerResult<Vec<Account>> {
        Ok(self
            .list_accounts(coa_id)
            .await?
            .into_iter()
            .filter(|account| !account.is_root_account())
            .collect())
    }

    /// The full tree of a chart, root first, in tree order
    pub async fn account_tree(&self, coa: &ChartOfAccounts) -> LedgerResult<Vec<AccountTreeNode>> {
        let root = self.coa_root_account(coa).await?;
        let root_depth = self
            .storage
            .position_of(root.id)
            .await?
            .map(|position| position.depth)
            .ok_or(LedgerError::AccountNotFound(root.id))?;

        let mut tree = vec![AccountTreeNode {
            account: root.clone(),
            depth: 0,
        }];
        for (account, position) in self.storage.descendants_of(root.id).await? {
            tree.push(AccountTreeNode {
                account,
                depth: position.depth - root_depth,
            });
        }
        Ok(tree)
    }

    /// Direct children of an account
    pub async fn children(&self, account_id: Uuid) -> LedgerResult<Vec<Account>> {
        self.storage.children_of(account_id).await
    }

    /// Parent of an account, `None` for a tree root
    pub async fn parent(&self, account_id: Uuid) -> LedgerResult<Option<Account>> {
        self.storage.parent_of(account_id).await
    }

    /// The path from the tree root down to an account
    pub async fn account_path(&self, account_id: Uuid) -> LedgerResult<Vec<Account>> {
        let mut path = vec![self.get_account_required(account_id).await?];

        while let Some(parent) = self.storage.parent_of(path[0].id).await? {
            path.insert(0, parent);
        }

        Ok(path)
    }

    /// Lock every non-root account of a chart
    pub async fn lock_all_accounts(&mut self, coa_id: Uuid) -> LedgerResult<Vec<Account>> {
        self.set_locked(coa_id, true).await
    }

    /// Unlock every non-root account of a chart
    pub async fn unlock_all_accounts(&mut self, coa_id: Uuid) -> LedgerResult<Vec<Account>> {
        self.set_locked(coa_id, false).await
    }

    async fn set_locked(&mut self, coa_id: Uuid, locked: bool) -> LedgerResult<Vec<Account>> {
        let mut accounts = self.non_root_accounts(coa_id).await?;
        for account in accounts.iter_mut() {
            account.locked = locked;
            account.touch();
            self.storage.update_account(account).await?;
        }
        info!(coa = %coa_id, locked, count = accounts.len(), "updated account locks");
        Ok(accounts)
    }
}
