//! Navigable locations for chart of accounts views and actions

use crate::config::CoaConfig;
use crate::types::*;

/// A view or action exposed for a chart of accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoaAction {
    List,
    Detail,
    MarkAsDefault,
    MarkAsActive,
    MarkAsInactive,
    AccountList,
    AccountCreate,
}

/// Build the location of an action for a chart of accounts.
///
/// Every action except `List` needs the chart's slug.
pub fn coa_location(
    config: &CoaConfig,
    entity: &Entity,
    coa: &ChartOfAccounts,
    action: CoaAction,
) -> LedgerResult<String> {
    if coa.entity_id != entity.id {
        return Err(LedgerError::Validation(format!(
            "CoA {} does not belong to entity {}",
            coa.id, entity.slug
        )));
    }

    let prefix = config.url_prefix.trim_end_matches('/');
    let entity_slug = &entity.slug;

    let coa_slug = || {
        coa.slug.as_deref().ok_or_else(|| {
            LedgerError::Validation(format!("CoA {} has no slug yet", coa.id))
        })
    };

    let location = match action {
        CoaAction::List => format!("{}/chart-of-accounts/{}/list/", prefix, entity_slug),
        CoaAction::Detail => format!(
            "{}/chart-of-accounts/{}/detail/{}/",
            prefix,
            entity_slug,
            coa_slug()?
        ),
        CoaAction::MarkAsDefault => format!(
            "{}/chart-of-accounts/{}/action/{}/mark-as-default/",
            prefix,
            entity_slug,
            coa_slug()?
        ),
        CoaAction::MarkAsActive => format!(
            "{}/chart-of-accounts/{}/action/{}/mark-as-active/",
            prefix,
            entity_slug,
            coa_slug()?
        ),
        CoaAction::MarkAsInactive => format!(
            "{}/chart-of-accounts/{}/action/{}/mark-as-inactive/",
            prefix,
            entity_slug,
            coa_slug()?
        ),
        CoaAction::AccountList => {
            format!("{}/account/{}/coa/{}/", prefix, entity_slug, coa_slug()?)
        }
        CoaAction::AccountCreate => format!(
            "{}/account/{}/coa/{}/create/",
            prefix,
            entity_slug,
            coa_slug()?
        ),
    };
    Ok(location)
}
