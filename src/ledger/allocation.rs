//! Placement of accounts under the structural root matching their role

use tracing::{debug, info};
use uuid::Uuid;

use crate::roles::AccountRole;
use crate::traits::*;
use crate::types::*;

/// The structural root accounts of one chart of accounts
///
/// Fetch once with [`fetch_root_accounts`] and pass to repeated
/// allocations to avoid re-querying the roots each time.
#[derive(Debug, Clone, PartialEq)]
pub struct RootAccounts {
    coa_id: Uuid,
    accounts: Vec<Account>,
}

impl RootAccounts {
    /// Wrap a caller-supplied root set; checked against the chart on use
    pub fn new(coa_id: Uuid, accounts: Vec<Account>) -> Self {
        Self { coa_id, accounts }
    }

    pub fn coa_id(&self) -> Uuid {
        self.coa_id
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// The root account holding the given structural role
    pub fn by_role(&self, role: AccountRole) -> Option<&Account> {
        self.accounts.iter().find(|account| account.role == role)
    }

    /// The top-level root of the chart
    pub fn coa_root(&self) -> Option<&Account> {
        self.by_role(AccountRole::RootCoa)
    }

    /// Distinct structural roles present in the set
    pub fn roles(&self) -> Vec<AccountRole> {
        let mut roles: Vec<AccountRole> = Vec::new();
        for account in &self.accounts {
            if !roles.contains(&account.role) {
                roles.push(account.role);
            }
        }
        roles
    }
}

/// Fetch the structural root accounts of a chart
pub async fn fetch_root_accounts<S: CoaStorage + ?Sized>(
    storage: &S,
    coa_id: Uuid,
) -> LedgerResult<RootAccounts> {
    let accounts = storage
        .list_chart_accounts(coa_id)
        .await?
        .into_iter()
        .filter(Account::is_root_account)
        .collect();
    Ok(RootAccounts::new(coa_id, accounts))
}

/// Check that a caller-supplied root set belongs to the chart
pub fn validate_root_accounts(coa: &ChartOfAccounts, roots: &RootAccounts) -> LedgerResult<()> {
    if roots.coa_id != coa.id {
        return Err(LedgerError::Validation(format!(
            "Invalid root account set for CoA {}",
            coa
        )));
    }

    for account in &roots.accounts {
        if account.coa_id != Some(coa.id) {
            return Err(LedgerError::Validation(format!(
                "Invalid root account set for CoA {}",
                coa
            )));
        }
        if !account.is_root_account() {
            return Err(LedgerError::Validation(format!(
                "Root account set for CoA {} contains non-root account {}",
                coa, account
            )));
        }
    }

    Ok(())
}

/// Resolve the second-level root an account must be placed under
pub fn resolve_level_2_root<'a>(
    account: &Account,
    roots: &'a RootAccounts,
) -> LedgerResult<&'a Account> {
    let group = account.role.group().ok_or_else(|| {
        LedgerError::Validation(format!(
            "Unable to locate balance sheet root node for account code: {}",
            account
        ))
    })?;

    roots.by_role(group.root_role()).ok_or_else(|| {
        LedgerError::Validation(format!(
            "CoA {} has no {} root node",
            roots.coa_id,
            group.root_role()
        ))
    })
}

/// Allocate an account into a chart under the root matching its role.
///
/// Returns the account as re-read from the chart's non-root accounts.
pub async fn allocate<S: LedgerStorage + ?Sized>(
    storage: &mut S,
    coa: &ChartOfAccounts,
    mut account: Account,
    roots: Option<&RootAccounts>,
) -> LedgerResult<Account> {
    if let Some(owner) = account.coa_id {
        if owner != coa.id {
            return Err(LedgerError::Validation(format!(
                "Invalid account {} for CoA {}",
                account, coa
            )));
        }
    }

    let fetched;
    // An empty set counts as not supplied.
    let roots = match roots.filter(|roots| !roots.is_empty()) {
        Some(roots) => {
            validate_root_accounts(coa, roots)?;
            roots
        }
        None => {
            fetched = fetch_root_accounts(&*storage, coa.id).await?;
            &fetched
        }
    };

    let parent_id = resolve_level_2_root(&account, roots)?.id;
    debug!(account = %account, parent = %parent_id, "resolved level 2 root");

    account.coa_id = Some(coa.id);
    account.touch();
    storage.insert_child(parent_id, &account).await?;

    let allocated = storage
        .list_chart_accounts(coa.id)
        .await?
        .into_iter()
        .filter(|a| !a.is_root_account())
        .find(|a| a.id == account.id)
        .ok_or(LedgerError::AccountNotFound(account.id))?;

    info!(coa = %coa.id, account = %allocated, role = %allocated.role, "account allocated");
    Ok(allocated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::{LEVEL_2_ROOTS, ROOT_COA_META};

    fn roots_for(coa_id: Uuid) -> RootAccounts {
        let mut accounts = vec![Account::structural(&ROOT_COA_META, coa_id)];
        accounts.extend(LEVEL_2_ROOTS.iter().map(|m| Account::structural(m, coa_id)));
        RootAccounts::new(coa_id, accounts)
    }

    fn account(role: AccountRole) -> Account {
        Account::new(
            "9000".to_string(),
            "Test".to_string(),
            role,
            role.default_balance_type(),
            true,
        )
    }

    #[test]
    fn test_resolves_each_group_root() {
        let coa_id = Uuid::new_v4();
        let roots = roots_for(coa_id);

        for role in AccountRole::ALL.into_iter().filter(|r| !r.is_root()) {
            let parent = resolve_level_2_root(&account(role), &roots).unwrap();
            assert_eq!(Some(parent.role), role.group().map(|g| g.root_role()));
            assert_eq!(parent.code, role.group().unwrap().meta().code);
        }
    }

    #[test]
    fn test_structural_roles_are_unresolvable() {
        let roots = roots_for(Uuid::new_v4());
        let err = resolve_level_2_root(&account(AccountRole::RootAssets), &roots).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("9000 Test"));
    }

    #[test]
    fn test_root_set_from_other_chart_rejected() {
        let coa = ChartOfAccounts::new(Uuid::new_v4(), None, None);
        let foreign = roots_for(Uuid::new_v4());
        assert!(validate_root_accounts(&coa, &foreign).is_err());

        let mut mixed = roots_for(coa.id);
        mixed.accounts[3].coa_id = Some(Uuid::new_v4());
        assert!(validate_root_accounts(&coa, &mixed).is_err());

        assert!(validate_root_accounts(&coa, &roots_for(coa.id)).is_ok());
    }

    #[test]
    fn test_root_set_with_leaf_rejected() {
        let coa = ChartOfAccounts::new(Uuid::new_v4(), None, None);
        let mut roots = roots_for(coa.id);
        let mut leaf = account(AccountRole::Asset);
        leaf.coa_id = Some(coa.id);
        roots.accounts.push(leaf);
        assert!(validate_root_accounts(&coa, &roots).is_err());
    }

    #[test]
    fn test_roles_are_distinct() {
        let roots = roots_for(Uuid::new_v4());
        assert_eq!(roots.roles().len(), 7);
        assert!(roots.coa_root().is_some());
    }
}
