//! One-time construction of a chart's structural root accounts

use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::CoaConfig;
use crate::ledger::allocation::fetch_root_accounts;
use crate::roles::{LEVEL_2_ROOTS, ROOT_COA_META};
use crate::traits::*;
use crate::types::*;

const SLUG_SUFFIX: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a slug for a chart that has none.
///
/// The slug embeds the tail of the entity slug plus a random lowercase
/// alphanumeric suffix. Returns whether a slug was generated.
pub fn generate_slug(
    coa: &mut ChartOfAccounts,
    entity: &Entity,
    config: &CoaConfig,
    raise_exception: bool,
) -> LedgerResult<bool> {
    if coa.slug.is_some() {
        if raise_exception {
            return Err(LedgerError::Validation(format!(
                "CoA {} already has a slug",
                coa.id
            )));
        }
        return Ok(false);
    }

    let skip = entity
        .slug
        .chars()
        .count()
        .saturating_sub(config.entity_slug_tail);
    let tail: String = entity.slug.chars().skip(skip).collect();

    let mut rng = rand::thread_rng();
    let suffix: String = (0..config.slug_suffix_len)
        .map(|_| SLUG_SUFFIX[rng.gen_range(0..SLUG_SUFFIX.len())] as char)
        .collect();

    coa.slug = Some(format!("{}-{}-{}", config.slug_prefix, tail, suffix));
    coa.touch();
    Ok(true)
}

/// Insert the CoA root and the six second-level roots into a chart.
///
/// The chart must already be persisted. Fails if any root account already
/// exists, unless `raise_exception` is false, in which case `Ok(None)` is
/// returned and nothing changes. All checks run before the first write.
pub async fn configure<S: LedgerStorage + ?Sized>(
    storage: &mut S,
    coa: &mut ChartOfAccounts,
    entity: &Entity,
    config: &CoaConfig,
    raise_exception: bool,
) -> LedgerResult<Option<Vec<Account>>> {
    if coa.entity_id != entity.id {
        return Err(LedgerError::Validation(format!(
            "CoA {} does not belong to entity {}",
            coa.id, entity.slug
        )));
    }

    if storage.get_chart(coa.id).await?.is_none() {
        return Err(LedgerError::ChartNotFound(coa.id.to_string()));
    }

    let existing = fetch_root_accounts(&*storage, coa.id).await?;
    if !existing.is_empty() {
        if raise_exception {
            warn!(coa = %coa.id, roles = ?existing.roles(), "root nodes already exist");
            return Err(LedgerError::Validation(format!(
                "Root nodes already exist in CoA {}",
                coa.id
            )));
        }
        debug!(coa = %coa.id, "chart already configured, skipping");
        return Ok(None);
    }

    if generate_slug(coa, entity, config, false)? {
        storage.update_chart(coa).await?;
    }

    let root = Account::structural(&ROOT_COA_META, coa.id);
    storage.insert_root(&root).await?;

    let mut created = Vec::with_capacity(LEVEL_2_ROOTS.len() + 1);
    for meta in &LEVEL_2_ROOTS {
        let account = Account::structural(meta, coa.id);
        storage.insert_child(root.id, &account).await?;
        created.push(account);
    }
    created.insert(0, root);

    info!(coa = %coa.id, slug = ?coa.slug, roots = created.len(), "chart of accounts configured");
    Ok(Some(created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;
    use uuid::Uuid;

    fn entity(slug: &str) -> Entity {
        Entity::new(slug.to_string(), "Acme".to_string(), Uuid::new_v4())
    }

    #[test]
    fn test_generated_slug_shape() {
        let entity = entity("acme-holdings");
        let mut coa = ChartOfAccounts::new(entity.id, None, None);

        assert!(generate_slug(&mut coa, &entity, &CoaConfig::default(), true).unwrap());

        let slug = coa.slug.clone().unwrap();
        let suffix = slug.strip_prefix("coa-dings-").unwrap();
        assert_eq!(suffix.len(), 15);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_short_entity_slug_is_used_whole() {
        let entity = entity("ab");
        let mut coa = ChartOfAccounts::new(entity.id, None, None);
        generate_slug(&mut coa, &entity, &CoaConfig::default(), false).unwrap();
        assert!(coa.slug.unwrap().starts_with("coa-ab-"));
    }

    #[test]
    fn test_existing_slug_kept_or_rejected() {
        let entity = entity("acme");
        let mut coa = ChartOfAccounts::new(entity.id, None, None);
        coa.slug = Some("custom".to_string());

        assert!(!generate_slug(&mut coa, &entity, &CoaConfig::default(), false).unwrap());
        assert_eq!(coa.slug.as_deref(), Some("custom"));

        let err = generate_slug(&mut coa, &entity, &CoaConfig::default(), true).unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_configure_requires_saved_chart() {
        let mut storage = MemoryStorage::new();
        let entity = entity("acme");
        storage.save_entity(&entity).await.unwrap();
        let mut coa = ChartOfAccounts::new(entity.id, None, None);
        coa.slug = Some("coa-x".to_string());

        let err = configure(&mut storage, &mut coa, &entity, &CoaConfig::default(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ChartNotFound(_)));
        assert!(storage.list_chart_accounts(coa.id).await.unwrap().is_empty());
    }
}
