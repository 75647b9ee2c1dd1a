//! Record store: the generic CRUD surface the graph links between
//!
//! Each record carries its `connected_to` parent context directly. Parent
//! references are validated against [`registry::allowed_parents`] on write.

use async_trait::async_trait;
use chrono::Utc;
use dailyops_db::entities::{record, EntityType};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::GraphError;
use crate::link_store;
use crate::registry::{self, CandidateSource, EntityOption, EntityRef};

/// Single-valued parent context of a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedTo {
    pub location_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub member_id: Option<Uuid>,
}

impl ConnectedTo {
    pub fn location(id: Uuid) -> Self {
        Self {
            location_id: Some(id),
            ..Self::default()
        }
    }

    pub fn team(id: Uuid) -> Self {
        Self {
            team_id: Some(id),
            ..Self::default()
        }
    }

    pub fn member(id: Uuid) -> Self {
        Self {
            member_id: Some(id),
            ..Self::default()
        }
    }

    pub fn of(model: &record::Model) -> Self {
        Self {
            location_id: model.location_id,
            team_id: model.team_id,
            member_id: model.member_id,
        }
    }

    /// Set references paired with the type they must point at
    fn references(&self) -> impl Iterator<Item = EntityRef> + '_ {
        [
            self.location_id.map(|id| EntityRef::new(EntityType::Location, id)),
            self.team_id.map(|id| EntityRef::new(EntityType::Team, id)),
            self.member_id.map(|id| EntityRef::new(EntityType::Member, id)),
        ]
        .into_iter()
        .flatten()
    }
}

/// Input for creating a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub entity_type: EntityType,
    /// Title or name, depending on the type
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub connected_to: ConnectedTo,
}

/// What a delete removed besides the record itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSummary {
    pub links_removed: u64,
    pub children_detached: u64,
}

fn parent_missing(child: EntityType, parent: EntityRef) -> GraphError {
    GraphError::InvalidParent {
        child,
        reason: format!("parent {} does not exist", parent),
    }
}

/// Load a record, requiring its stored type to match the reference
pub(crate) async fn find_typed<C: ConnectionTrait>(
    conn: &C,
    entity: EntityRef,
) -> Result<Option<record::Model>, DbErr> {
    record::Entity::find_by_id(entity.id)
        .filter(record::Column::EntityType.eq(entity.entity_type))
        .one(conn)
        .await
}

#[derive(Clone)]
pub struct RecordStore {
    db: DatabaseConnection,
}

impl RecordStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewRecord) -> Result<record::Model, GraphError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(GraphError::Validation(format!(
                "{} must not be empty",
                match registry::display_field(new.entity_type) {
                    registry::DisplayField::Title => "title",
                    registry::DisplayField::Name => "name",
                }
            )));
        }

        let allowed = registry::allowed_parents(new.entity_type);
        for parent in new.connected_to.references() {
            if !allowed.contains(&parent.entity_type) {
                return Err(GraphError::InvalidParent {
                    child: new.entity_type,
                    reason: format!("cannot be connected to a {}", parent.entity_type),
                });
            }
        }

        let slug = new
            .slug
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let now = Utc::now();

        let txn = self.db.begin().await?;

        for parent in new.connected_to.references() {
            if find_typed(&txn, parent).await?.is_none() {
                return Err(parent_missing(new.entity_type, parent));
            }
        }

        let model = record::ActiveModel {
            id: Set(Uuid::new_v4()),
            entity_type: Set(new.entity_type),
            title: Set(title.to_string()),
            slug: Set(slug),
            location_id: Set(new.connected_to.location_id),
            team_id: Set(new.connected_to.team_id),
            member_id: Set(new.connected_to.member_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            // The parent went away between the check and the insert
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => GraphError::InvalidParent {
                child: new.entity_type,
                reason: "parent no longer exists".to_string(),
            },
            _ => GraphError::Database(e),
        })?;

        txn.commit().await?;

        info!("Created {} {}", model.entity_type, model.id);
        Ok(model)
    }

    /// Fetch one record, failing with `EntityNotFound`
    pub async fn get(&self, entity: EntityRef) -> Result<record::Model, GraphError> {
        find_typed(&self.db, entity)
            .await?
            .ok_or(GraphError::EntityNotFound(entity))
    }

    /// All records of a type, ordered by display text
    pub async fn list(&self, entity_type: EntityType) -> Result<Vec<record::Model>, GraphError> {
        Ok(record::Entity::find()
            .filter(record::Column::EntityType.eq(entity_type))
            .order_by_asc(record::Column::Title)
            .order_by_asc(record::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Load many records by id in one query
    pub async fn resolve_many(
        &self,
        ids: impl IntoIterator<Item = Uuid>,
    ) -> Result<HashMap<Uuid, record::Model>, GraphError> {
        let ids: Vec<Uuid> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let found = record::Entity::find()
            .filter(record::Column::Id.is_in(ids))
            .all(&self.db)
            .await?;

        Ok(found.into_iter().map(|model| (model.id, model)).collect())
    }

    /// Delete a record together with its links
    ///
    /// Children whose `connected_to` points at the record are detached rather
    /// than deleted. Everything happens in one transaction.
    pub async fn delete(&self, entity: EntityRef) -> Result<DeleteSummary, GraphError> {
        let txn = self.db.begin().await?;

        if find_typed(&txn, entity).await?.is_none() {
            return Err(GraphError::EntityNotFound(entity));
        }

        let links_removed = link_store::remove_all_for(&txn, entity).await?;

        let parent_column = match entity.entity_type {
            EntityType::Location => Some(record::Column::LocationId),
            EntityType::Team => Some(record::Column::TeamId),
            EntityType::Member => Some(record::Column::MemberId),
            EntityType::Note
            | EntityType::Todo
            | EntityType::Channel
            | EntityType::Event
            | EntityType::Decision => None,
        };

        let children_detached = match parent_column {
            Some(column) => {
                record::Entity::update_many()
                    .col_expr(column, Expr::value(Option::<Uuid>::None))
                    .col_expr(record::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(column.eq(entity.id))
                    .exec(&txn)
                    .await?
                    .rows_affected
            }
            None => 0,
        };

        record::Entity::delete_by_id(entity.id).exec(&txn).await?;
        txn.commit().await?;

        info!(
            "Deleted {} ({} links removed, {} children detached)",
            entity, links_removed, children_detached
        );

        Ok(DeleteSummary {
            links_removed,
            children_detached,
        })
    }
}

#[async_trait]
impl CandidateSource for RecordStore {
    async fn list_options(&self, entity_type: EntityType) -> Result<Vec<EntityOption>, GraphError> {
        debug!("Listing {} candidates", entity_type);

        Ok(self
            .list(entity_type)
            .await?
            .into_iter()
            .map(|model| EntityOption {
                entity_type: model.entity_type,
                id: model.id,
                label: model.title,
                slug: model.slug,
            })
            .collect())
    }
}
