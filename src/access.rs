//! Scoping of charts of accounts to the users allowed to see them

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::types::*;

/// Reference to an entity by identifier or by slug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityRef {
    Id(Uuid),
    /// Matched case-insensitively
    Slug(String),
}

impl EntityRef {
    pub fn matches(&self, entity: &Entity) -> bool {
        match self {
            EntityRef::Id(id) => entity.id == *id,
            EntityRef::Slug(slug) => entity.slug.to_lowercase() == slug.to_lowercase(),
        }
    }
}

impl From<Uuid> for EntityRef {
    fn from(id: Uuid) -> Self {
        EntityRef::Id(id)
    }
}

impl From<&str> for EntityRef {
    fn from(slug: &str) -> Self {
        EntityRef::Slug(slug.to_string())
    }
}

impl From<&Entity> for EntityRef {
    fn from(entity: &Entity) -> Self {
        EntityRef::Id(entity.id)
    }
}

/// A chart of accounts together with its owning entity
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedChart {
    pub coa: ChartOfAccounts,
    pub entity: Entity,
}

impl ScopedChart {
    pub fn is_default(&self) -> bool {
        self.coa.is_default(&self.entity)
    }
}

/// Charts visible to one user, narrowed step by step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSet {
    charts: Vec<ScopedChart>,
}

impl ChartSet {
    /// Keep the charts whose entity lists the user as admin or manager.
    ///
    /// Chart order is preserved; charts without a known entity are dropped.
    pub fn for_user(charts: Vec<ChartOfAccounts>, entities: &[Entity], user_id: Uuid) -> Self {
        let visible: HashMap<Uuid, &Entity> = entities
            .iter()
            .filter(|entity| entity.is_accessible_by(user_id))
            .map(|entity| (entity.id, entity))
            .collect();

        let charts = charts
            .into_iter()
            .filter_map(|coa| {
                visible.get(&coa.entity_id).map(|entity| ScopedChart {
                    coa,
                    entity: (*entity).clone(),
                })
            })
            .collect();
        Self { charts }
    }

    /// Narrow to the charts of one entity
    pub fn for_entity(self, entity: &EntityRef) -> Self {
        Self {
            charts: self
                .charts
                .into_iter()
                .filter(|scoped| entity.matches(&scoped.entity))
                .collect(),
        }
    }

    /// Narrow to active charts
    pub fn active(self) -> Self {
        Self {
            charts: self
                .charts
                .into_iter()
                .filter(|scoped| scoped.coa.is_active())
                .collect(),
        }
    }

    /// Find a chart by slug, ignoring case
    pub fn find_by_slug(&self, coa_slug: &str) -> Option<&ScopedChart> {
        self.charts.iter().find(|scoped| {
            scoped
                .coa
                .slug
                .as_deref()
                .is_some_and(|slug| slug.eq_ignore_ascii_case(coa_slug))
        })
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScopedChart> {
        self.charts.iter()
    }

    pub fn into_vec(self) -> Vec<ScopedChart> {
        self.charts
    }
}
