//! Default and active state transitions of a chart of accounts
//!
//! Every transition is proposed on copies of the chart and its entity,
//! validated, and only then handed back for commit. A rejected transition
//! leaves the caller's values untouched.

use crate::types::*;
use crate::utils::validation::validate_slug;

/// A lifecycle change requested on a chart of accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoaTransition {
    /// Point the owning entity's default at this chart
    MarkDefault,
    MarkActive,
    MarkInactive,
}

impl CoaTransition {
    fn already_applied(self, coa: &ChartOfAccounts, entity: &Entity) -> bool {
        match self {
            CoaTransition::MarkDefault => coa.is_default(entity),
            CoaTransition::MarkActive => coa.is_active(),
            CoaTransition::MarkInactive => !coa.is_active(),
        }
    }

    fn already_applied_message(self, coa: &ChartOfAccounts) -> String {
        match self {
            CoaTransition::MarkDefault => format!(
                "The Chart of Accounts {} is already default",
                coa.slug.as_deref().unwrap_or_default()
            ),
            CoaTransition::MarkActive => "The Chart of Accounts is currently active.".to_string(),
            CoaTransition::MarkInactive => {
                "The Chart of Accounts is currently not active.".to_string()
            }
        }
    }

    fn apply(self, coa: &mut ChartOfAccounts, entity: &mut Entity) {
        match self {
            CoaTransition::MarkDefault => entity.set_default_coa(coa.id),
            CoaTransition::MarkActive => {
                coa.active = true;
                coa.touch();
            }
            CoaTransition::MarkInactive => {
                coa.active = false;
                coa.touch();
            }
        }
    }
}

/// How a transition is carried out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionOptions {
    /// Persist the change instead of leaving it to the caller's transaction
    pub commit: bool,
    /// Fail instead of doing nothing when the chart is already in the target state
    pub raise_exception: bool,
}

impl TransitionOptions {
    pub fn committed(mut self) -> Self {
        self.commit = true;
        self
    }

    pub fn strict(mut self) -> Self {
        self.raise_exception = true;
        self
    }
}

/// Result of a transition that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    Unchanged,
}

/// The chart and entity as they would be after a transition
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub transition: CoaTransition,
    pub coa: ChartOfAccounts,
    pub entity: Entity,
}

/// Check the invariants of a chart against its owning entity
pub fn validate_chart_state(coa: &ChartOfAccounts, entity: &Entity) -> LedgerResult<()> {
    if coa.entity_id != entity.id {
        return Err(LedgerError::Validation(format!(
            "CoA {} does not belong to entity {}",
            coa.id, entity.slug
        )));
    }

    if let Some(slug) = coa.slug.as_deref() {
        validate_slug(slug)?;
    }

    if coa.is_default(entity) && !coa.active {
        return Err(LedgerError::Validation(
            "Default Chart of Accounts cannot be deactivated.".to_string(),
        ));
    }

    Ok(())
}

/// Propose a transition; `Ok(None)` means the chart is already in the target state.
pub fn propose(
    coa: &ChartOfAccounts,
    entity: &Entity,
    transition: CoaTransition,
    raise_exception: bool,
) -> LedgerResult<Option<Proposal>> {
    if coa.entity_id != entity.id {
        return Err(LedgerError::Validation(format!(
            "CoA {} does not belong to entity {}",
            coa.id, entity.slug
        )));
    }

    if transition.already_applied(coa, entity) {
        if raise_exception {
            return Err(LedgerError::Validation(
                transition.already_applied_message(coa),
            ));
        }
        return Ok(None);
    }

    let mut next_coa = coa.clone();
    let mut next_entity = entity.clone();
    transition.apply(&mut next_coa, &mut next_entity);
    validate_chart_state(&next_coa, &next_entity)?;

    Ok(Some(Proposal {
        transition,
        coa: next_coa,
        entity: next_entity,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn setup() -> (ChartOfAccounts, Entity) {
        let entity = Entity::new("acme".to_string(), "Acme".to_string(), Uuid::new_v4());
        let mut coa = ChartOfAccounts::new(entity.id, None, None);
        coa.slug = Some("coa-acme-abc".to_string());
        (coa, entity)
    }

    #[test]
    fn test_default_on_inactive_chart_rejected() {
        let (mut coa, entity) = setup();
        coa.active = false;

        let err = propose(&coa, &entity, CoaTransition::MarkDefault, false).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(entity.default_coa_id(), None);
    }

    #[test]
    fn test_activate_then_default() {
        let (mut coa, mut entity) = setup();
        coa.active = false;

        let proposal = propose(&coa, &entity, CoaTransition::MarkActive, true)
            .unwrap()
            .unwrap();
        coa = proposal.coa;

        let proposal = propose(&coa, &entity, CoaTransition::MarkDefault, true)
            .unwrap()
            .unwrap();
        entity = proposal.entity;

        assert!(coa.is_default(&entity));
        assert!(coa.is_active());
    }

    #[test]
    fn test_default_chart_cannot_be_deactivated() {
        let (coa, entity) = setup();
        let entity = propose(&coa, &entity, CoaTransition::MarkDefault, false)
            .unwrap()
            .unwrap()
            .entity;

        assert!(!coa.can_deactivate(&entity));
        let err = propose(&coa, &entity, CoaTransition::MarkInactive, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: Default Chart of Accounts cannot be deactivated."
        );
    }

    #[test]
    fn test_already_in_target_state() {
        let (coa, entity) = setup();

        assert_eq!(
            propose(&coa, &entity, CoaTransition::MarkActive, false).unwrap(),
            None
        );
        let err = propose(&coa, &entity, CoaTransition::MarkActive, true).unwrap_err();
        assert!(err.to_string().contains("currently active"));
    }

    #[test]
    fn test_already_inactive() {
        let (mut coa, entity) = setup();
        coa.active = false;

        assert_eq!(
            propose(&coa, &entity, CoaTransition::MarkInactive, false).unwrap(),
            None
        );
        let err = propose(&coa, &entity, CoaTransition::MarkInactive, true).unwrap_err();
        assert!(err.to_string().contains("currently not active"));
    }

    #[test]
    fn test_invalid_state_detected_without_transition() {
        let (mut coa, entity) = setup();
        let mut entity = propose(&coa, &entity, CoaTransition::MarkDefault, false)
            .unwrap()
            .unwrap()
            .entity;
        coa.active = false;
        assert!(validate_chart_state(&coa, &entity).is_err());

        entity.slug = "other".to_string();
        coa.active = true;
        assert!(validate_chart_state(&coa, &entity).is_ok());
    }

    #[test]
    fn test_foreign_entity_rejected() {
        let (coa, _) = setup();
        let stranger = Entity::new("other".to_string(), "Other".to_string(), Uuid::new_v4());
        assert!(propose(&coa, &stranger, CoaTransition::MarkActive, false).is_err());
    }
}
