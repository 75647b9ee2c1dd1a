//! Connection aggregation view: what belongs to a location, team or member
//!
//! Counts come from the `connected_to` columns only. Links are a different
//! relationship and never contribute here.

use chrono::{DateTime, Utc};
use dailyops_db::entities::{record, EntityType};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::GraphError;
use crate::records;
use crate::registry::EntityRef;

/// Default number of detail rows per category
pub const DEFAULT_DETAIL_LIMIT: u64 = 25;

/// Entity types a rollup can be computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollupParent {
    Location,
    Team,
    Member,
}

impl RollupParent {
    fn column(self) -> record::Column {
        match self {
            RollupParent::Location => record::Column::LocationId,
            RollupParent::Team => record::Column::TeamId,
            RollupParent::Member => record::Column::MemberId,
        }
    }

    pub fn entity_type(self) -> EntityType {
        match self {
            RollupParent::Location => EntityType::Location,
            RollupParent::Team => EntityType::Team,
            RollupParent::Member => EntityType::Member,
        }
    }

    /// Whether records of `child` can hang off this parent at all
    fn counts(self, child: EntityType) -> bool {
        match (self, child) {
            (_, EntityType::Note | EntityType::Todo | EntityType::Decision | EntityType::Channel) => {
                true
            }
            (RollupParent::Location, EntityType::Team | EntityType::Member) => true,
            (RollupParent::Team, EntityType::Member) => true,
            _ => false,
        }
    }
}

impl TryFrom<EntityType> for RollupParent {
    type Error = GraphError;

    fn try_from(entity_type: EntityType) -> Result<Self, Self::Error> {
        match entity_type {
            EntityType::Location => Ok(RollupParent::Location),
            EntityType::Team => Ok(RollupParent::Team),
            EntityType::Member => Ok(RollupParent::Member),
            other => Err(GraphError::InvalidRollupParent(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupCounts {
    pub teams: u64,
    pub members: u64,
    pub notes: u64,
    pub todos: u64,
    pub decisions: u64,
    pub channels: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupItem {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub id: Uuid,
    pub display: String,
    pub slug: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<record::Model> for RollupItem {
    fn from(model: record::Model) -> Self {
        Self {
            entity_type: model.entity_type,
            id: model.id,
            display: model.title,
            slug: model.slug,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollupDetails {
    pub teams: Vec<RollupItem>,
    pub members: Vec<RollupItem>,
    pub notes: Vec<RollupItem>,
    pub todos: Vec<RollupItem>,
    pub decisions: Vec<RollupItem>,
    pub channels: Vec<RollupItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionsRollup {
    pub parent: EntityRef,
    pub counts: RollupCounts,
    pub details: RollupDetails,
}

#[derive(Clone)]
pub struct RollupService {
    db: DatabaseConnection,
    detail_limit: u64,
}

impl RollupService {
    pub fn new(db: DatabaseConnection, detail_limit: u64) -> Self {
        Self { db, detail_limit }
    }

    /// Counts and newest-first details of everything connected to the parent
    pub async fn get_connections_rollup(
        &self,
        parent_type: EntityType,
        parent_id: Uuid,
    ) -> Result<ConnectionsRollup, GraphError> {
        let parent = RollupParent::try_from(parent_type)?;
        let parent_ref = EntityRef::new(parent_type, parent_id);

        if records::find_typed(&self.db, parent_ref).await?.is_none() {
            return Err(GraphError::EntityNotFound(parent_ref));
        }

        debug!("Computing rollup for {}", parent_ref);

        let (teams, members, notes, todos, decisions, channels) = futures::try_join!(
            self.section(parent, parent_id, EntityType::Team),
            self.section(parent, parent_id, EntityType::Member),
            self.section(parent, parent_id, EntityType::Note),
            self.section(parent, parent_id, EntityType::Todo),
            self.section(parent, parent_id, EntityType::Decision),
            self.section(parent, parent_id, EntityType::Channel),
        )?;

        Ok(ConnectionsRollup {
            parent: parent_ref,
            counts: RollupCounts {
                teams: teams.0,
                members: members.0,
                notes: notes.0,
                todos: todos.0,
                decisions: decisions.0,
                channels: channels.0,
            },
            details: RollupDetails {
                teams: teams.1,
                members: members.1,
                notes: notes.1,
                todos: todos.1,
                decisions: decisions.1,
                channels: channels.1,
            },
        })
    }

    async fn section(
        &self,
        parent: RollupParent,
        parent_id: Uuid,
        child: EntityType,
    ) -> Result<(u64, Vec<RollupItem>), DbErr> {
        if !parent.counts(child) {
            return Ok((0, Vec::new()));
        }

        let scoped = record::Entity::find()
            .filter(record::Column::EntityType.eq(child))
            .filter(parent.column().eq(parent_id));

        let count = scoped.clone().count(&self.db).await?;
        let items = scoped
            .order_by_desc(record::Column::CreatedAt)
            .order_by_desc(record::Column::Id)
            .limit(self.detail_limit)
            .all(&self.db)
            .await?;

        Ok((count, items.into_iter().map(RollupItem::from).collect()))
    }
}
