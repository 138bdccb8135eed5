//! Chart of accounts management: creation, bootstrap, lifecycle and scoping

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::access::{ChartSet, EntityRef, ScopedChart};
use crate::config::CoaConfig;
use crate::ledger::bootstrap;
use crate::ledger::lifecycle::{
    self, CoaTransition, Proposal, TransitionOptions, TransitionOutcome,
};
use crate::routes::{self, CoaAction};
use crate::traits::*;
use crate::types::*;

/// Chart manager for handling chart of accounts operations
pub struct ChartManager<S: LedgerStorage> {
    pub(crate) storage: S,
    config: CoaConfig,
}

impl<S: LedgerStorage> ChartManager<S> {
    /// Create a new chart manager with default configuration
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, CoaConfig::default())
    }

    pub fn with_config(storage: S, config: CoaConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &CoaConfig {
        &self.config
    }

    /// Create, persist and configure a new chart for an entity
    #[instrument(skip(self, entity, description), fields(entity = %entity.slug))]
    pub async fn create_chart(
        &mut self,
        entity: &Entity,
        name: Option<String>,
        description: Option<String>,
    ) -> LedgerResult<ChartOfAccounts> {
        if self.storage.get_entity(entity.id).await?.is_none() {
            return Err(LedgerError::EntityNotFound(entity.slug.clone()));
        }

        let mut coa = ChartOfAccounts::new(entity.id, name, description);
        bootstrap::generate_slug(&mut coa, entity, &self.config, true)?;
        lifecycle::validate_chart_state(&coa, entity)?;
        self.storage.save_chart(&coa).await?;

        bootstrap::configure(&mut self.storage, &mut coa, entity, &self.config, true).await?;
        Ok(coa)
    }

    /// Generate a slug for a chart that has none
    pub fn generate_slug(
        &self,
        coa: &mut ChartOfAccounts,
        entity: &Entity,
        raise_exception: bool,
    ) -> LedgerResult<bool> {
        bootstrap::generate_slug(coa, entity, &self.config, raise_exception)
    }

    /// Insert the structural root accounts of a persisted chart
    #[instrument(skip(self, coa, entity), fields(coa = %coa.id))]
    pub async fn configure(
        &mut self,
        coa: &mut ChartOfAccounts,
        entity: &Entity,
        raise_exception: bool,
    ) -> LedgerResult<Option<Vec<Account>>> {
        bootstrap::configure(&mut self.storage, coa, entity, &self.config, raise_exception).await
    }

    /// Get a chart by ID
    pub async fn get_chart(&self, coa_id: Uuid) -> LedgerResult<Option<ChartOfAccounts>> {
        self.storage.get_chart(coa_id).await
    }

    /// Get a chart by ID, returning an error if not found
    pub async fn get_chart_required(&self, coa_id: Uuid) -> LedgerResult<ChartOfAccounts> {
        self.storage
            .get_chart(coa_id)
            .await?
            .ok_or_else(|| LedgerError::ChartNotFound(coa_id.to_string()))
    }

    /// Apply a lifecycle transition.
    ///
    /// `coa` and `entity` are updated only when the transition is valid.
    /// With `commit`, the proposal is also checked against storage and the
    /// changed record is persisted: the entity for `MarkDefault`, the chart
    /// otherwise.
    #[instrument(skip(self, coa, entity), fields(coa = %coa.id))]
    pub async fn transition(
        &mut self,
        coa: &mut ChartOfAccounts,
        entity: &mut Entity,
        transition: CoaTransition,
        options: TransitionOptions,
    ) -> LedgerResult<TransitionOutcome> {
        let proposal = match lifecycle::propose(coa, entity, transition, options.raise_exception) {
            Ok(Some(proposal)) => proposal,
            Ok(None) => {
                debug!(?transition, "chart already in target state");
                return Ok(TransitionOutcome::Unchanged);
            }
            Err(err) => {
                warn!(?transition, error = %err, "transition rejected");
                return Err(err);
            }
        };

        if options.commit {
            if let Err(err) = self.check_against_stored(&proposal).await {
                warn!(?transition, error = %err, "transition conflicts with stored state");
                return Err(err);
            }
            match transition {
                CoaTransition::MarkDefault => self.storage.update_entity(&proposal.entity).await?,
                CoaTransition::MarkActive | CoaTransition::MarkInactive => {
                    self.storage.update_chart(&proposal.coa).await?
                }
            }
        }

        *coa = proposal.coa;
        *entity = proposal.entity;
        info!(?transition, commit = options.commit, "chart transition applied");
        Ok(TransitionOutcome::Applied)
    }

    /// Validate a proposal against the stored counterpart of the record it
    /// does not write: the stored chart for `MarkDefault`, the stored entity
    /// otherwise.
    async fn check_against_stored(&self, proposal: &Proposal) -> LedgerResult<()> {
        match proposal.transition {
            CoaTransition::MarkDefault => {
                let stored = self.get_chart_required(proposal.coa.id).await?;
                lifecycle::validate_chart_state(&stored, &proposal.entity)
            }
            CoaTransition::MarkActive | CoaTransition::MarkInactive => {
                let stored = self
                    .storage
                    .get_entity(proposal.entity.id)
                    .await?
                    .ok_or_else(|| LedgerError::EntityNotFound(proposal.entity.slug.clone()))?;
                lifecycle::validate_chart_state(&proposal.coa, &stored)
            }
        }
    }

    /// Make the chart its entity's default; the chart must already be active
    pub async fn mark_as_default(
        &mut self,
        coa: &mut ChartOfAccounts,
        entity: &mut Entity,
        options: TransitionOptions,
    ) -> LedgerResult<TransitionOutcome> {
        self.transition(coa, entity, CoaTransition::MarkDefault, options)
            .await
    }

    pub async fn mark_as_active(
        &mut self,
        coa: &mut ChartOfAccounts,
        entity: &mut Entity,
        options: TransitionOptions,
    ) -> LedgerResult<TransitionOutcome> {
        self.transition(coa, entity, CoaTransition::MarkActive, options)
            .await
    }

    pub async fn mark_as_inactive(
        &mut self,
        coa: &mut ChartOfAccounts,
        entity: &mut Entity,
        options: TransitionOptions,
    ) -> LedgerResult<TransitionOutcome> {
        self.transition(coa, entity, CoaTransition::MarkInactive, options)
            .await
    }

    /// Charts of every entity the user administers or manages, newest first
    pub async fn charts_for_user(&self, user_id: Uuid) -> LedgerResult<ChartSet> {
        let entities = self.storage.list_entities().await?;
        let charts = self.storage.list_charts(None).await?;
        Ok(ChartSet::for_user(charts, &entities, user_id))
    }

    /// Charts of one entity visible to the user
    pub async fn charts_for_entity(
        &self,
        entity: &EntityRef,
        user_id: Uuid,
    ) -> LedgerResult<ChartSet> {
        Ok(self.charts_for_user(user_id).await?.for_entity(entity))
    }

    /// Look up one chart by entity and chart slug for the user
    pub async fn chart_for_user(
        &self,
        entity: &EntityRef,
        coa_slug: &str,
        user_id: Uuid,
    ) -> LedgerResult<ScopedChart> {
        self.charts_for_entity(entity, user_id)
            .await?
            .find_by_slug(coa_slug)
            .cloned()
            .ok_or_else(|| LedgerError::ChartNotFound(coa_slug.to_string()))
    }

    /// Location of a view or action for the chart
    pub fn location(
        &self,
        entity: &Entity,
        coa: &ChartOfAccounts,
        action: CoaAction,
    ) -> LedgerResult<String> {
        routes::coa_location(&self.config, entity, coa, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;

    async fn setup() -> (ChartManager<MemoryStorage>, Entity) {
        let mut storage = MemoryStorage::new();
        let entity = Entity::new("acme-corp".to_string(), "Acme".to_string(), Uuid::new_v4());
        storage.save_entity(&entity).await.unwrap();
        (ChartManager::new(storage), entity)
    }

    #[tokio::test]
    async fn test_create_chart_is_slugged_and_configured() {
        let (mut manager, entity) = setup().await;
        let coa = manager
            .create_chart(&entity, Some("Main".to_string()), None)
            .await
            .unwrap();

        assert!(coa.slug.as_deref().unwrap().starts_with("coa--corp-"));
        assert!(manager.get_chart(coa.id).await.unwrap().is_some());

        let mut again = coa.clone();
        let err = manager.configure(&mut again, &entity, true).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(manager.configure(&mut again, &entity, false).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_uncommitted_default_is_not_persisted() {
        let (mut manager, mut entity) = setup().await;
        let mut coa = manager.create_chart(&entity, None, None).await.unwrap();

        let outcome = manager
            .mark_as_default(&mut coa, &mut entity, TransitionOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::Applied);
        assert!(coa.is_default(&entity));

        let stored = manager.storage.get_entity(entity.id).await.unwrap().unwrap();
        assert_eq!(stored.default_coa_id(), None);
    }

    #[tokio::test]
    async fn test_rejected_transition_leaves_values_untouched() {
        let (mut manager, mut entity) = setup().await;
        let mut coa = manager.create_chart(&entity, None, None).await.unwrap();
        manager
            .mark_as_inactive(&mut coa, &mut entity, TransitionOptions::default().committed())
            .await
            .unwrap();

        let err = manager
            .mark_as_default(&mut coa, &mut entity, TransitionOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(entity.default_coa_id(), None);
        assert!(!coa.is_active());

        let stored = manager.get_chart_required(coa.id).await.unwrap();
        assert!(!stored.active);
    }

    #[tokio::test]
    async fn test_committed_default_checks_stored_chart() {
        let (mut manager, mut entity) = setup().await;
        let mut coa = manager.create_chart(&entity, None, None).await.unwrap();
        let mut outdated = coa.clone();
        manager
            .mark_as_inactive(&mut coa, &mut entity, TransitionOptions::default().committed())
            .await
            .unwrap();

        let err = manager
            .mark_as_default(&mut outdated, &mut entity, TransitionOptions::default().committed())
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(entity.default_coa_id(), None);

        let stored = manager.storage.get_entity(entity.id).await.unwrap().unwrap();
        assert_eq!(stored.default_coa_id(), None);
    }

    #[tokio::test]
    async fn test_create_chart_for_unknown_entity() {
        let (mut manager, _) = setup().await;
        let stranger = Entity::new("ghost".to_string(), "Ghost".to_string(), Uuid::new_v4());
        let err = manager.create_chart(&stranger, None, None).await.unwrap_err();
        assert!(matches!(err, LedgerError::EntityNotFound(_)));
    }
}
