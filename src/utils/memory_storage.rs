//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

const STEP_LEN: usize = 4;
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Default)]
struct Tables {
    entities: HashMap<Uuid, Entity>,
    charts: HashMap<Uuid, ChartOfAccounts>,
    accounts: HashMap<Uuid, Account>,
    positions: HashMap<Uuid, TreePosition>,
}

impl Tables {
    fn check_account_unique(&self, account: &Account) -> LedgerResult<()> {
        if self.accounts.contains_key(&account.id) {
            return Err(LedgerError::Conflict(format!(
                "Account {} already exists",
                account.id
            )));
        }

        let Some(coa_id) = account.coa_id else {
            return Ok(());
        };

        for other in self.accounts.values().filter(|a| a.coa_id == Some(coa_id)) {
            if other.code == account.code {
                return Err(LedgerError::Conflict(format!(
                    "Account code {} already used in CoA {}",
                    account.code, coa_id
                )));
            }
            if account.role.is_root() && other.role == account.role {
                return Err(LedgerError::Conflict(format!(
                    "Root role {} already present in CoA {}",
                    account.role, coa_id
                )));
            }
        }

        Ok(())
    }

    fn insert_positioned(&mut self, account: &Account, position: TreePosition) {
        self.positions.insert(account.id, position);
        self.accounts.insert(account.id, account.clone());
    }

    fn next_step<'a>(&self, siblings: impl Iterator<Item = &'a TreePosition>) -> LedgerResult<u32> {
        let mut last = 0;
        for position in siblings {
            let step = decode_step(&position.path[position.path.len() - STEP_LEN..])?;
            last = last.max(step);
        }
        Ok(last + 1)
    }

    fn sorted_by_path(&self, mut ids: Vec<(String, Uuid)>) -> Vec<Account> {
        ids.sort();
        ids.into_iter()
            .filter_map(|(_, id)| self.accounts.get(&id).cloned())
            .collect()
    }

    fn chart_slug_taken(&self, coa: &ChartOfAccounts) -> bool {
        let Some(slug) = coa.slug.as_deref() else {
            return false;
        };
        self.charts.values().any(|other| {
            other.id != coa.id
                && other.entity_id == coa.entity_id
                && other
                    .slug
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case(slug))
        })
    }
}

fn encode_step(step: u32) -> LedgerResult<String> {
    let base = ALPHABET.len() as u32;
    if step >= base.pow(STEP_LEN as u32) {
        return Err(LedgerError::Storage(format!(
            "Tree path step {} exceeds capacity",
            step
        )));
    }

    let mut digits = [b'0'; STEP_LEN];
    let mut rest = step;
    for digit in digits.iter_mut().rev() {
        *digit = ALPHABET[(rest % base) as usize];
        rest /= base;
    }
    Ok(digits.iter().map(|&b| b as char).collect())
}

fn decode_step(step: &str) -> LedgerResult<u32> {
    u32::from_str_radix(step, ALPHABET.len() as u32)
        .map_err(|_| LedgerError::Storage(format!("Malformed tree path step '{}'", step)))
}

/// In-memory storage implementation for testing and development
///
/// Accounts are placed in materialized-path trees: each level adds a
/// four character base-36 step to the parent's path.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> LedgerResult<()> {
        *self.write()? = Tables::default();
        Ok(())
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| LedgerError::Storage("Memory storage lock poisoned".to_string()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| LedgerError::Storage("Memory storage lock poisoned".to_string()))
    }
}

#[async_trait]
impl CoaStorage for MemoryStorage {
    async fn save_entity(&mut self, entity: &Entity) -> LedgerResult<()> {
        let mut tables = self.write()?;
        if tables.entities.contains_key(&entity.id) {
            return Err(LedgerError::Conflict(format!(
                "Entity {} already exists",
                entity.id
            )));
        }
        if tables
            .entities
            .values()
            .any(|other| other.slug.eq_ignore_ascii_case(&entity.slug))
        {
            return Err(LedgerError::Conflict(format!(
                "Entity slug '{}' already taken",
                entity.slug
            )));
        }
        tables.entities.insert(entity.id, entity.clone());
        Ok(())
    }

    async fn get_entity(&self, entity_id: Uuid) -> LedgerResult<Option<Entity>> {
        Ok(self.read()?.entities.get(&entity_id).cloned())
    }

    async fn get_entity_by_slug(&self, slug: &str) -> LedgerResult<Option<Entity>> {
        Ok(self
            .read()?
            .entities
            .values()
            .find(|entity| entity.slug.eq_ignore_ascii_case(slug))
            .cloned())
    }

    async fn list_entities(&self) -> LedgerResult<Vec<Entity>> {
        Ok(self.read()?.entities.values().cloned().collect())
    }

    async fn update_entity(&mut self, entity: &Entity) -> LedgerResult<()> {
        let mut tables = self.write()?;
        match tables.entities.get_mut(&entity.id) {
            Some(existing) => {
                *existing = entity.clone();
                Ok(())
            }
            None => Err(LedgerError::EntityNotFound(entity.id.to_string())),
        }
    }

    async fn delete_entity(&mut self, entity_id: Uuid) -> LedgerResult<()> {
        let mut tables = self.write()?;
        if tables.entities.remove(&entity_id).is_none() {
            return Err(LedgerError::EntityNotFound(entity_id.to_string()));
        }

        let chart_ids: Vec<Uuid> = tables
            .charts
            .values()
            .filter(|coa| coa.entity_id == entity_id)
            .map(|coa| coa.id)
            .collect();
        let account_ids: Vec<Uuid> = tables
            .accounts
            .values()
            .filter(|account| account.coa_id.is_some_and(|id| chart_ids.contains(&id)))
            .map(|account| account.id)
            .collect();

        for id in &chart_ids {
            tables.charts.remove(id);
        }
        for id in &account_ids {
            tables.accounts.remove(id);
            tables.positions.remove(id);
        }
        Ok(())
    }

    async fn save_chart(&mut self, coa: &ChartOfAccounts) -> LedgerResult<()> {
        let mut tables = self.write()?;
        if tables.charts.contains_key(&coa.id) {
            return Err(LedgerError::Conflict(format!(
                "Chart of accounts {} already exists",
                coa.id
            )));
        }
        if tables.chart_slug_taken(coa) {
            return Err(LedgerError::Conflict(format!(
                "Chart of accounts slug '{}' already taken",
                coa.slug.as_deref().unwrap_or_default()
            )));
        }
        tables.charts.insert(coa.id, coa.clone());
        Ok(())
    }

    async fn get_chart(&self, coa_id: Uuid) -> LedgerResult<Option<ChartOfAccounts>> {
        Ok(self.read()?.charts.get(&coa_id).cloned())
    }

    async fn list_charts(&self, entity_id: Option<Uuid>) -> LedgerResult<Vec<ChartOfAccounts>> {
        let tables = self.read()?;
        let mut charts: Vec<ChartOfAccounts> = tables
            .charts
            .values()
            .filter(|coa| entity_id.is_none_or(|id| coa.entity_id == id))
            .cloned()
            .collect();
        charts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(charts)
    }

    async fn update_chart(&mut self, coa: &ChartOfAccounts) -> LedgerResult<()> {
        let mut tables = self.write()?;
        if !tables.charts.contains_key(&coa.id) {
            return Err(LedgerError::ChartNotFound(coa.id.to_string()));
        }
        if tables.chart_slug_taken(coa) {
            return Err(LedgerError::Conflict(format!(
                "Chart of accounts slug '{}' already taken",
                coa.slug.as_deref().unwrap_or_default()
            )));
        }
        tables.charts.insert(coa.id, coa.clone());
        Ok(())
    }

    async fn get_account(&self, account_id: Uuid) -> LedgerResult<Option<Account>> {
        Ok(self.read()?.accounts.get(&account_id).cloned())
    }

    async fn list_chart_accounts(&self, coa_id: Uuid) -> LedgerResult<Vec<Account>> {
        let tables = self.read()?;
        let mut accounts: Vec<(Option<String>, Account)> = tables
            .accounts
            .values()
            .filter(|account| account.coa_id == Some(coa_id))
            .map(|account| {
                let path = tables.positions.get(&account.id).map(|p| p.path.clone());
                (path, account.clone())
            })
            .collect();
        // Unplaced accounts go last.
        accounts.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        Ok(accounts.into_iter().map(|(_, account)| account).collect())
    }

    async fn update_account(&mut self, account: &Account) -> LedgerResult<()> {
        let mut tables = self.write()?;
        match tables.accounts.get_mut(&account.id) {
            Some(existing) => {
                *existing = account.clone();
                Ok(())
            }
            None => Err(LedgerError::AccountNotFound(account.id)),
        }
    }
}

#[async_trait]
impl TreeStorage for MemoryStorage {
    async fn insert_root(&mut self, account: &Account) -> LedgerResult<TreePosition> {
        let mut tables = self.write()?;
        tables.check_account_unique(account)?;

        let step = tables.next_step(tables.positions.values().filter(|p| p.depth == 1))?;
        let position = TreePosition {
            path: encode_step(step)?,
            depth: 1,
            parent_id: None,
        };
        tables.insert_positioned(account, position.clone());
        Ok(position)
    }

    async fn insert_child(
        &mut self,
        parent_id: Uuid,
        account: &Account,
    ) -> LedgerResult<TreePosition> {
        let mut tables = self.write()?;
        let parent = tables
            .positions
            .get(&parent_id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(parent_id))?;
        tables.check_account_unique(account)?;

        let step = tables.next_step(
            tables
                .positions
                .values()
                .filter(|p| p.parent_id == Some(parent_id)),
        )?;
        let position = TreePosition {
            path: format!("{}{}", parent.path, encode_step(step)?),
            depth: parent.depth + 1,
            parent_id: Some(parent_id),
        };
        tables.insert_positioned(account, position.clone());
        Ok(position)
    }

    async fn children_of(&self, account_id: Uuid) -> LedgerResult<Vec<Account>> {
        let tables = self.read()?;
        let ids = tables
            .positions
            .iter()
            .filter(|(_, p)| p.parent_id == Some(account_id))
            .map(|(id, p)| (p.path.clone(), *id))
            .collect();
        Ok(tables.sorted_by_path(ids))
    }

    async fn descendants_of(
        &self,
        account_id: Uuid,
    ) -> LedgerResult<Vec<(Account, TreePosition)>> {
        let tables = self.read()?;
        let anchor = tables
            .positions
            .get(&account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        let mut nodes: Vec<(Account, TreePosition)> = tables
            .positions
            .iter()
            .filter(|(_, p)| p.depth > anchor.depth && p.path.starts_with(&anchor.path))
            .filter_map(|(id, p)| tables.accounts.get(id).map(|a| (a.clone(), p.clone())))
            .collect();
        nodes.sort_by(|(_, a), (_, b)| a.path.cmp(&b.path));
        Ok(nodes)
    }

    async fn parent_of(&self, account_id: Uuid) -> LedgerResult<Option<Account>> {
        let tables = self.read()?;
        let position = tables
            .positions
            .get(&account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        Ok(position
            .parent_id
            .and_then(|parent_id| tables.accounts.get(&parent_id).cloned()))
    }

    async fn is_root(&self, account_id: Uuid) -> LedgerResult<bool> {
        self.read()?
            .positions
            .get(&account_id)
            .map(|p| p.depth == 1)
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    async fn position_of(&self, account_id: Uuid) -> LedgerResult<Option<TreePosition>> {
        Ok(self.read()?.positions.get(&account_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::{AccountRole, LEVEL_2_ROOTS, ROOT_COA_META};

    fn leaf(code: &str, coa_id: Uuid) -> Account {
        let mut account = Account::new(
            code.to_string(),
            format!("Account {}", code),
            AccountRole::Asset,
            BalanceType::Debit,
            true,
        );
        account.coa_id = Some(coa_id);
        account
    }

    #[test]
    fn test_step_encoding() {
        assert_eq!(encode_step(1).unwrap(), "0001");
        assert_eq!(encode_step(36).unwrap(), "0010");
        assert_eq!(decode_step("00AZ").unwrap(), 10 * 36 + 35);
        assert!(encode_step(36u32.pow(4)).is_err());
    }

    #[tokio::test]
    async fn test_children_are_ordered_by_insertion() {
        let mut storage = MemoryStorage::new();
        let coa_id = Uuid::new_v4();
        let root = Account::structural(&ROOT_COA_META, coa_id);
        let root_position = storage.insert_root(&root).await.unwrap();
        assert_eq!(root_position.path, "0001");

        let first = leaf("1010", coa_id);
        let second = leaf("1020", coa_id);
        storage.insert_child(root.id, &first).await.unwrap();
        let position = storage.insert_child(root.id, &second).await.unwrap();

        assert_eq!(position.path, "00010002");
        assert_eq!(position.depth, 2);

        let children = storage.children_of(root.id).await.unwrap();
        let codes: Vec<&str> = children.iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes, vec!["1010", "1020"]);
        assert!(storage.is_root(root.id).await.unwrap());
        assert!(!storage.is_root(first.id).await.unwrap());
        assert_eq!(
            storage.parent_of(second.id).await.unwrap().unwrap().id,
            root.id
        );
    }

    #[tokio::test]
    async fn test_roots_of_separate_charts_get_separate_trees() {
        let mut storage = MemoryStorage::new();
        let a = Account::structural(&ROOT_COA_META, Uuid::new_v4());
        let b = Account::structural(&ROOT_COA_META, Uuid::new_v4());

        storage.insert_root(&a).await.unwrap();
        storage.insert_root(&b).await.unwrap();

        let child = leaf("1000", b.coa_id.unwrap());
        storage.insert_child(b.id, &child).await.unwrap();

        assert!(storage.descendants_of(a.id).await.unwrap().is_empty());
        assert_eq!(storage.descendants_of(b.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_root_role_in_chart_conflicts() {
        let mut storage = MemoryStorage::new();
        let coa_id = Uuid::new_v4();
        let root = Account::structural(&ROOT_COA_META, coa_id);
        storage.insert_root(&root).await.unwrap();

        let assets = Account::structural(&LEVEL_2_ROOTS[0], coa_id);
        storage.insert_child(root.id, &assets).await.unwrap();

        let mut duplicate = Account::structural(&LEVEL_2_ROOTS[0], coa_id);
        duplicate.code = "01001".to_string();
        let err = storage.insert_child(root.id, &duplicate).await.unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_duplicate_code_in_chart_conflicts() {
        let mut storage = MemoryStorage::new();
        let coa_id = Uuid::new_v4();
        let root = Account::structural(&ROOT_COA_META, coa_id);
        storage.insert_root(&root).await.unwrap();
        storage.insert_child(root.id, &leaf("1000", coa_id)).await.unwrap();

        let err = storage
            .insert_child(root.id, &leaf("1000", coa_id))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_insert_under_unknown_parent_fails() {
        let mut storage = MemoryStorage::new();
        let err = storage
            .insert_child(Uuid::new_v4(), &leaf("1000", Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(_)));
        storage.clear().unwrap();
    }

    #[tokio::test]
    async fn test_delete_entity_cascades() {
        let mut storage = MemoryStorage::new();
        let entity = Entity::new("acme".to_string(), "Acme".to_string(), Uuid::new_v4());
        storage.save_entity(&entity).await.unwrap();

        let coa = ChartOfAccounts::new(entity.id, None, None);
        storage.save_chart(&coa).await.unwrap();
        let root = Account::structural(&ROOT_COA_META, coa.id);
        storage.insert_root(&root).await.unwrap();

        storage.delete_entity(entity.id).await.unwrap();

        assert!(storage.get_chart(coa.id).await.unwrap().is_none());
        assert!(storage.get_account(root.id).await.unwrap().is_none());
        assert!(storage.position_of(root.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_chart_slug_unique_per_entity_ignoring_case() {
        let mut storage = MemoryStorage::new();
        let entity_id = Uuid::new_v4();

        let mut first = ChartOfAccounts::new(entity_id, None, None);
        first.slug = Some("coa-main".to_string());
        storage.save_chart(&first).await.unwrap();

        let mut second = ChartOfAccounts::new(entity_id, None, None);
        second.slug = Some("COA-MAIN".to_string());
        assert!(matches!(
            storage.save_chart(&second).await.unwrap_err(),
            LedgerError::Conflict(_)
        ));

        let mut elsewhere = ChartOfAccounts::new(Uuid::new_v4(), None, None);
        elsewhere.slug = Some("coa-main".to_string());
        storage.save_chart(&elsewhere).await.unwrap();
    }
}
