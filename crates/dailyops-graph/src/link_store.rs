//! Link store: durable many-to-many links between records
//!
//! A link is stored as a single `entity_links` row keyed by the canonically
//! ordered pair, and every read matches either side of the row. Both
//! participants see the link as soon as the insert commits; there is no second
//! write to keep in step.

use chrono::{DateTime, Utc};
use dailyops_db::entities::{entity_link, EntityType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::GraphError;
use crate::page::{Page, PageRequest};
use crate::records;
use crate::registry::EntityRef;

/// One link as seen from one of its participants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityLink {
    pub id: Uuid,
    pub source_type: EntityType,
    pub source_id: Uuid,
    pub target_type: EntityType,
    pub target_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl EntityLink {
    /// Project a stored row from the point of view of `from`
    ///
    /// `from` must be one of the row's participants.
    fn seen_from(row: &entity_link::Model, from: EntityRef) -> Self {
        let (source, target) = if row.a_type == from.entity_type && row.a_id == from.id {
            (side_a(row), side_b(row))
        } else {
            (side_b(row), side_a(row))
        };

        Self {
            id: row.id,
            source_type: source.entity_type,
            source_id: source.id,
            target_type: target.entity_type,
            target_id: target.id,
            created_at: row.created_at,
        }
    }

    pub fn source(&self) -> EntityRef {
        EntityRef::new(self.source_type, self.source_id)
    }

    pub fn target(&self) -> EntityRef {
        EntityRef::new(self.target_type, self.target_id)
    }
}

/// Result of a successful create: the link from each participant's side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPair {
    pub link_a: EntityLink,
    pub link_b: EntityLink,
}

/// Restricts a listing to links whose other side has one of these types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkFilter {
    pub target_types: Option<Vec<EntityType>>,
}

impl LinkFilter {
    pub fn targets(types: impl Into<Vec<EntityType>>) -> Self {
        Self {
            target_types: Some(types.into()),
        }
    }
}

fn side_a(row: &entity_link::Model) -> EntityRef {
    EntityRef::new(row.a_type, row.a_id)
}

fn side_b(row: &entity_link::Model) -> EntityRef {
    EntityRef::new(row.b_type, row.b_id)
}

/// Order two refs the way rows are keyed
pub fn canonical_pair(a: EntityRef, b: EntityRef) -> (EntityRef, EntityRef) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn pair_condition(a: EntityRef, b: EntityRef) -> Condition {
    let (low, high) = canonical_pair(a, b);
    Condition::all()
        .add(entity_link::Column::AType.eq(low.entity_type))
        .add(entity_link::Column::AId.eq(low.id))
        .add(entity_link::Column::BType.eq(high.entity_type))
        .add(entity_link::Column::BId.eq(high.id))
}

/// Rows where `entity` is either participant, optionally narrowed by the type
/// of the other participant
fn involving(entity: EntityRef, target_types: Option<&[EntityType]>) -> Condition {
    let mut as_a = Condition::all()
        .add(entity_link::Column::AType.eq(entity.entity_type))
        .add(entity_link::Column::AId.eq(entity.id));
    let mut as_b = Condition::all()
        .add(entity_link::Column::BType.eq(entity.entity_type))
        .add(entity_link::Column::BId.eq(entity.id));

    if let Some(types) = target_types {
        as_a = as_a.add(entity_link::Column::BType.is_in(types.iter().copied()));
        as_b = as_b.add(entity_link::Column::AType.is_in(types.iter().copied()));
    }

    Condition::any().add(as_a).add(as_b)
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Delete every link touching `entity`
///
/// Runs on whatever connection the caller passes so a record delete can
/// remove its links inside the same transaction.
pub async fn remove_all_for<C: ConnectionTrait>(conn: &C, entity: EntityRef) -> Result<u64, DbErr> {
    let result = entity_link::Entity::delete_many()
        .filter(involving(entity, None))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

/// Link persistence with invariant enforcement
#[derive(Clone)]
pub struct LinkStore {
    db: DatabaseConnection,
}

impl LinkStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Link `a` and `b`
    ///
    /// # Errors
    /// - `SelfLinkNotAllowed` when `a == b`
    /// - `EntityNotFound` when either participant does not exist
    /// - `LinkAlreadyExists` when the pair is already linked, including when a
    ///   concurrent create wins the race for the unique index
    pub async fn create_link(&self, a: EntityRef, b: EntityRef) -> Result<LinkPair, GraphError> {
        if a == b {
            return Err(GraphError::SelfLinkNotAllowed(a));
        }

        let (low, high) = canonical_pair(a, b);
        let txn = self.db.begin().await?;

        for participant in [a, b] {
            if records::find_typed(&txn, participant).await?.is_none() {
                return Err(GraphError::EntityNotFound(participant));
            }
        }

        let existing = entity_link::Entity::find()
            .filter(pair_condition(a, b))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(GraphError::LinkAlreadyExists(a, b));
        }

        let row = entity_link::ActiveModel {
            id: Set(Uuid::new_v4()),
            a_type: Set(low.entity_type),
            a_id: Set(low.id),
            b_type: Set(high.entity_type),
            b_id: Set(high.id),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                GraphError::LinkAlreadyExists(a, b)
            } else {
                GraphError::Database(e)
            }
        })?;

        txn.commit().await.map_err(|e| {
            if is_unique_violation(&e) {
                GraphError::LinkAlreadyExists(a, b)
            } else {
                GraphError::Database(e)
            }
        })?;

        info!("Linked {} <-> {}", a, b);

        Ok(LinkPair {
            link_a: EntityLink::seen_from(&row, a),
            link_b: EntityLink::seen_from(&row, b),
        })
    }

    /// Unlink `a` and `b`, in either argument order
    ///
    /// Fails with `LinkNotFound` when the pair is not linked.
    pub async fn remove_link(&self, a: EntityRef, b: EntityRef) -> Result<(), GraphError> {
        let result = entity_link::Entity::delete_many()
            .filter(pair_condition(a, b))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(GraphError::LinkNotFound(a, b));
        }

        info!("Unlinked {} <-> {}", a, b);
        Ok(())
    }

    /// Whether `a` and `b` are linked
    pub async fn is_linked(&self, a: EntityRef, b: EntityRef) -> Result<bool, GraphError> {
        let count = entity_link::Entity::find()
            .filter(pair_condition(a, b))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Links of `entity`, newest first, each projected with `entity` as source
    pub async fn list_links(
        &self,
        entity: EntityRef,
        filter: &LinkFilter,
        page: PageRequest,
    ) -> Result<Page<EntityLink>, GraphError> {
        debug!("Listing links for {} with {:?}", entity, filter);

        let condition = involving(entity, filter.target_types.as_deref());

        let total = entity_link::Entity::find()
            .filter(condition.clone())
            .count(&self.db)
            .await?;

        let rows = entity_link::Entity::find()
            .filter(condition)
            .order_by_desc(entity_link::Column::CreatedAt)
            .order_by_desc(entity_link::Column::Id)
            .offset(page.skip)
            .limit(page.limit)
            .all(&self.db)
            .await?;

        Ok(Page {
            items: rows
                .iter()
                .map(|row| EntityLink::seen_from(row, entity))
                .collect(),
            total,
            skip: page.skip,
            limit: page.limit,
        })
    }

    /// Number of links of `entity` per type of the other participant
    pub async fn count_by_type(
        &self,
        entity: EntityRef,
    ) -> Result<BTreeMap<EntityType, u64>, GraphError> {
        let rows = entity_link::Entity::find()
            .filter(involving(entity, None))
            .all(&self.db)
            .await?;

        let mut counts = BTreeMap::new();
        for row in &rows {
            let other = EntityLink::seen_from(row, entity).target_type;
            *counts.entry(other).or_insert(0) += 1;
        }

        Ok(counts)
    }
}
