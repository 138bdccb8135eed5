//! Account roles and the fixed table of structural root accounts
//!
//! Every account role belongs to at most one of six second-level groups.
//! The structural roots themselves (the CoA root and the six group roots)
//! belong to no group and are never allocated under another account.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{BalanceType, LedgerError};

/// Accounting classification of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    /// What the entity owns
    Asset,
    /// What the entity owes
    Liability,
    /// Owner's interest in the entity
    Capital,
    /// Revenue earned
    Income,
    /// Direct cost of goods sold
    Cogs,
    /// Operating and other expenses
    Expense,
    /// Top-level root of a chart of accounts
    RootCoa,
    /// Second-level root for assets
    RootAssets,
    /// Second-level root for liabilities
    RootLiabilities,
    /// Second-level root for capital
    RootCapital,
    /// Second-level root for income
    RootIncome,
    /// Second-level root for cost of goods sold
    RootCogs,
    /// Second-level root for expenses
    RootExpenses,
}

impl AccountRole {
    /// Every role, structural roots last
    pub const ALL: [AccountRole; 13] = [
        AccountRole::Asset,
        AccountRole::Liability,
        AccountRole::Capital,
        AccountRole::Income,
        AccountRole::Cogs,
        AccountRole::Expense,
        AccountRole::RootCoa,
        AccountRole::RootAssets,
        AccountRole::RootLiabilities,
        AccountRole::RootCapital,
        AccountRole::RootIncome,
        AccountRole::RootCogs,
        AccountRole::RootExpenses,
    ];

    /// The second-level group a transactable account is allocated under.
    ///
    /// Returns `None` for the structural roles, which cannot be allocated.
    pub fn group(self) -> Option<RoleGroup> {
        match self {
            AccountRole::Asset => Some(RoleGroup::Assets),
            AccountRole::Liability => Some(RoleGroup::Liabilities),
            AccountRole::Capital => Some(RoleGroup::Capital),
            AccountRole::Income => Some(RoleGroup::Income),
            AccountRole::Cogs => Some(RoleGroup::Cogs),
            AccountRole::Expense => Some(RoleGroup::Expenses),
            _ => None,
        }
    }

    /// Whether this role marks a structural root account
    pub fn is_root(self) -> bool {
        root_meta(self).is_some()
    }

    /// Normal balance side for accounts of this role
    pub fn default_balance_type(self) -> BalanceType {
        match self {
            AccountRole::Asset | AccountRole::Cogs | AccountRole::Expense => BalanceType::Debit,
            AccountRole::Liability | AccountRole::Capital | AccountRole::Income => {
                BalanceType::Credit
            }
            root => root_meta(root)
                .map(|meta| meta.balance_type)
                .unwrap_or(BalanceType::Debit),
        }
    }

    /// Snake-case code used in storage and on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            AccountRole::Asset => "asset",
            AccountRole::Liability => "liability",
            AccountRole::Capital => "capital",
            AccountRole::Income => "income",
            AccountRole::Cogs => "cogs",
            AccountRole::Expense => "expense",
            AccountRole::RootCoa => "root_coa",
            AccountRole::RootAssets => "root_assets",
            AccountRole::RootLiabilities => "root_liabilities",
            AccountRole::RootCapital => "root_capital",
            AccountRole::RootIncome => "root_income",
            AccountRole::RootCogs => "root_cogs",
            AccountRole::RootExpenses => "root_expenses",
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountRole {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| LedgerError::Validation(format!("Unknown account role '{}'", s)))
    }
}

/// Second-level grouping of the chart of accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleGroup {
    Assets,
    Liabilities,
    Capital,
    Income,
    Cogs,
    Expenses,
}

impl RoleGroup {
    /// The structural role of this group's root account
    pub fn root_role(self) -> AccountRole {
        match self {
            RoleGroup::Assets => AccountRole::RootAssets,
            RoleGroup::Liabilities => AccountRole::RootLiabilities,
            RoleGroup::Capital => AccountRole::RootCapital,
            RoleGroup::Income => AccountRole::RootIncome,
            RoleGroup::Cogs => AccountRole::RootCogs,
            RoleGroup::Expenses => AccountRole::RootExpenses,
        }
    }

    /// Code, title and balance type of this group's root account
    pub fn meta(self) -> &'static RootMeta {
        // Every group root is listed in LEVEL_2_ROOTS in group order.
        &LEVEL_2_ROOTS[self as usize]
    }
}

/// Static description of a structural root account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootMeta {
    pub role: AccountRole,
    pub code: &'static str,
    pub title: &'static str,
    pub balance_type: BalanceType,
}

/// The single top-level root of every chart of accounts
pub const ROOT_COA_META: RootMeta = RootMeta {
    role: AccountRole::RootCoa,
    code: "00000",
    title: "CoA Root Node",
    balance_type: BalanceType::Debit,
};

/// Second-level roots, inserted as direct children of the CoA root
pub const LEVEL_2_ROOTS: [RootMeta; 6] = [
    RootMeta {
        role: AccountRole::RootAssets,
        code: "01000",
        title: "Asset Accounts Root Node",
        balance_type: BalanceType::Debit,
    },
    RootMeta {
        role: AccountRole::RootLiabilities,
        code: "02000",
        title: "Liability Accounts Root Node",
        balance_type: BalanceType::Credit,
    },
    RootMeta {
        role: AccountRole::RootCapital,
        code: "03000",
        title: "Capital Accounts Root Node",
        balance_type: BalanceType::Credit,
    },
    RootMeta {
        role: AccountRole::RootIncome,
        code: "04000",
        title: "Income Accounts Root Node",
        balance_type: BalanceType::Credit,
    },
    RootMeta {
        role: AccountRole::RootCogs,
        code: "05000",
        title: "COGS Accounts Root Node",
        balance_type: BalanceType::Debit,
    },
    RootMeta {
        role: AccountRole::RootExpenses,
        code: "06000",
        title: "Expense Accounts Root Node",
        balance_type: BalanceType::Debit,
    },
];

/// Look up the structural metadata for a root role
pub fn root_meta(role: AccountRole) -> Option<&'static RootMeta> {
    if role == AccountRole::RootCoa {
        return Some(&ROOT_COA_META);
    }
    LEVEL_2_ROOTS.iter().find(|meta| meta.role == role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_transactable_role_maps_to_its_group_root() {
        let expected = [
            (AccountRole::Asset, AccountRole::RootAssets),
            (AccountRole::Liability, AccountRole::RootLiabilities),
            (AccountRole::Capital, AccountRole::RootCapital),
            (AccountRole::Income, AccountRole::RootIncome),
            (AccountRole::Cogs, AccountRole::RootCogs),
            (AccountRole::Expense, AccountRole::RootExpenses),
        ];

        for (role, root) in expected {
            let group = role.group().unwrap();
            assert_eq!(group.root_role(), root);
            assert_eq!(group.meta().role, root);
            assert!(!role.is_root());
        }
    }

    #[test]
    fn test_structural_roles_have_no_group() {
        for role in AccountRole::ALL.into_iter().filter(|r| r.is_root()) {
            assert_eq!(role.group(), None);
        }
        assert_eq!(AccountRole::ALL.iter().filter(|r| r.is_root()).count(), 7);
    }

    #[test]
    fn test_role_codes_round_trip_through_from_str() {
        assert_eq!("expense".parse::<AccountRole>().unwrap(), AccountRole::Expense);
        assert_eq!(
            "root_coa".parse::<AccountRole>().unwrap(),
            AccountRole::RootCoa
        );
        assert!("equity".parse::<AccountRole>().unwrap_err().is_validation());
    }

    #[test]
    fn test_root_balance_types() {
        assert_eq!(
            AccountRole::RootLiabilities.default_balance_type(),
            BalanceType::Credit
        );
        assert_eq!(
            AccountRole::RootExpenses.default_balance_type(),
            BalanceType::Debit
        );
        assert_eq!(AccountRole::Income.default_balance_type(), BalanceType::Credit);
    }

    #[test]
    fn test_serde_uses_snake_case_codes() {
        let json = serde_json::to_string(&AccountRole::RootCogs).unwrap();
        assert_eq!(json, "\"root_cogs\"");
    }
}
