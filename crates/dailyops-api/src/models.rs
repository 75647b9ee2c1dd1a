use chrono::{DateTime, Utc};
use dailyops_graph::registry::{self, DisplayField};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Note,
    Todo,
    Channel,
    Event,
    Decision,
    Member,
    Team,
    Location,
}

impl From<dailyops_graph::EntityType> for EntityType {
    fn from(entity_type: dailyops_graph::EntityType) -> Self {
        use dailyops_graph::EntityType as Db;
        match entity_type {
            Db::Note => EntityType::Note,
            Db::Todo => EntityType::Todo,
            Db::Channel => EntityType::Channel,
            Db::Event => EntityType::Event,
            Db::Decision => EntityType::Decision,
            Db::Member => EntityType::Member,
            Db::Team => EntityType::Team,
            Db::Location => EntityType::Location,
        }
    }
}

impl From<EntityType> for dailyops_graph::EntityType {
    fn from(entity_type: EntityType) -> Self {
        use dailyops_graph::EntityType as Db;
        match entity_type {
            EntityType::Note => Db::Note,
            EntityType::Todo => Db::Todo,
            EntityType::Channel => Db::Channel,
            EntityType::Event => Db::Event,
            EntityType::Decision => Db::Decision,
            EntityType::Member => Db::Member,
            EntityType::Team => Db::Team,
            EntityType::Location => Db::Location,
        }
    }
}

/// Split display text into `title` or `name` depending on the entity type
fn title_or_name(
    entity_type: dailyops_graph::EntityType,
    display: String,
) -> (Option<String>, Option<String>) {
    match registry::display_field(entity_type) {
        DisplayField::Title => (Some(display), None),
        DisplayField::Name => (None, Some(display)),
    }
}

/// Registry entry for one entity type
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntityTypeInfo {
    /// Entity type
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Human label
    pub label: String,
    /// Collection name used in URLs
    pub plural: String,
    /// Field carrying display text ("title" or "name")
    pub display_field: String,
    /// Types this entity may be connected to as a parent
    pub allowed_parents: Vec<EntityType>,
    /// Types offered for linking by default
    pub default_link_targets: Vec<EntityType>,
}

/// Entity type registry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EntityTypeList {
    /// Types
    pub types: Vec<EntityTypeInfo>,
}

/// Display row for a linked or candidate entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LinkedEntity {
    /// Entity type
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Entity ID
    pub id: Uuid,
    /// Title (notes, todos, events, decisions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Name (channels, members, teams, locations)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// URL-friendly slug
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl From<dailyops_graph::LinkedEntityDisplay> for LinkedEntity {
    fn from(display: dailyops_graph::LinkedEntityDisplay) -> Self {
        let (title, name) = title_or_name(display.entity_type, display.display);
        Self {
            entity_type: display.entity_type.into(),
            id: display.id,
            title,
            name,
            slug: display.slug,
        }
    }
}

impl From<dailyops_graph::EntityOption> for LinkedEntity {
    fn from(option: dailyops_graph::EntityOption) -> Self {
        let (title, name) = title_or_name(option.entity_type, option.label);
        Self {
            entity_type: option.entity_type.into(),
            id: option.id,
            title,
            name,
            slug: option.slug,
        }
    }
}

/// Query parameters for listing linked entities
#[derive(Debug, Clone, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConnectionsQuery {
    /// Type of the entity whose links are listed
    pub entity_type: String,
    /// ID of the entity whose links are listed
    pub entity_id: Uuid,
    /// Pagination offset (default: 0)
    #[serde(default)]
    pub skip: Option<u64>,
    /// Pagination limit (default: 50, max: 200)
    #[serde(default)]
    pub limit: Option<u64>,
    /// Include per-type link counts
    #[serde(default)]
    pub include_counts: Option<bool>,
    /// Comma-separated types to keep (e.g. "note,channel")
    #[serde(default)]
    pub target_types: Option<String>,
}

/// Linked entities with pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LinkedEntitiesResponse {
    /// Linked entities, newest link first
    pub entities: Vec<LinkedEntity>,
    /// Total matching links
    pub total: u64,
    /// Pagination offset
    pub skip: u64,
    /// Page size limit
    pub limit: u64,
    /// Links on this page whose target no longer resolves
    pub dropped: u64,
    /// Link counts per entity type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<BTreeMap<String, u64>>,
}

/// Request to link two entities
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateConnectionRequest {
    /// Source entity type
    pub source_type: String,
    /// Source entity ID
    pub source_id: Uuid,
    /// Target entity type
    pub target_type: String,
    /// Target entity ID
    pub target_id: Uuid,
}

/// One link as seen from one participant
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Link {
    /// Link ID (shared by both directions)
    pub id: Uuid,
    /// Source entity type
    pub source_type: EntityType,
    /// Source entity ID
    pub source_id: Uuid,
    /// Target entity type
    pub target_type: EntityType,
    /// Target entity ID
    pub target_id: Uuid,
    /// When the link was created
    pub created_at: DateTime<Utc>,
}

impl From<dailyops_graph::EntityLink> for Link {
    fn from(link: dailyops_graph::EntityLink) -> Self {
        Self {
            id: link.id,
            source_type: link.source_type.into(),
            source_id: link.source_id,
            target_type: link.target_type.into(),
            target_id: link.target_id,
            created_at: link.created_at,
        }
    }
}

/// Response when linking two entities
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateConnectionResponse {
    /// Link from the source's side
    pub link_a: Link,
    /// Link from the target's side
    pub link_b: Link,
    /// Source's linked entities after the write
    pub linked: Vec<LinkedEntity>,
}

/// Query parameters for removing a link
#[derive(Debug, Clone, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteConnectionQuery {
    /// Source entity type
    pub source_type: String,
    /// Source entity ID
    pub source_id: Uuid,
    /// Target entity type
    pub target_type: String,
}

/// Parent context of a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConnectedTo {
    /// Parent location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<Uuid>,
    /// Parent team
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<Uuid>,
    /// Parent member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<Uuid>,
}

impl From<ConnectedTo> for dailyops_graph::ConnectedTo {
    fn from(c: ConnectedTo) -> Self {
        Self {
            location_id: c.location_id,
            team_id: c.team_id,
            member_id: c.member_id,
        }
    }
}

impl From<dailyops_graph::ConnectedTo> for ConnectedTo {
    fn from(c: dailyops_graph::ConnectedTo) -> Self {
        Self {
            location_id: c.location_id,
            team_id: c.team_id,
            member_id: c.member_id,
        }
    }
}

/// Request to create a record
///
/// Send `title` for notes, todos, events and decisions, `name` for the rest.
/// Either key is accepted for any type.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateRecordRequest {
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// URL-friendly slug
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Parent context
    #[serde(default)]
    pub connected_to: ConnectedTo,
}

/// Stored record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Record {
    /// Entity type
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Record ID
    pub id: Uuid,
    /// Title (notes, todos, events, decisions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Name (channels, members, teams, locations)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// URL-friendly slug
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Parent context
    pub connected_to: ConnectedTo,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

impl From<dailyops_db::entities::record::Model> for Record {
    fn from(model: dailyops_db::entities::record::Model) -> Self {
        let connected_to = dailyops_graph::ConnectedTo::of(&model).into();
        let (title, name) = title_or_name(model.entity_type, model.title);
        Self {
            entity_type: model.entity_type.into(),
            id: model.id,
            title,
            name,
            slug: model.slug,
            connected_to,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Query parameters for searching link candidates
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CandidateQuery {
    /// Case-insensitive match on title/name or slug
    #[serde(default)]
    pub q: Option<String>,
    /// Pagination offset (default: 0)
    #[serde(default)]
    pub skip: Option<u64>,
    /// Pagination limit (default: 50, max: 200)
    #[serde(default)]
    pub limit: Option<u64>,
    /// Comma-separated IDs to leave out (already linked)
    #[serde(default)]
    pub exclude: Option<String>,
}

/// Link candidates with pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CandidateList {
    /// Matching entities
    pub candidates: Vec<LinkedEntity>,
    /// Total matches
    pub total: u64,
    /// Pagination offset
    pub skip: u64,
    /// Page size limit
    pub limit: u64,
}

/// Result of deleting a record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteRecordResponse {
    /// Links removed with the record
    pub links_removed: u64,
    /// Records whose parent reference was cleared
    pub children_detached: u64,
}

/// Rollup counts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct RollupCounts {
    pub teams: u64,
    pub members: u64,
    pub notes: u64,
    pub todos: u64,
    pub decisions: u64,
    pub channels: u64,
}

impl From<dailyops_graph::RollupCounts> for RollupCounts {
    fn from(c: dailyops_graph::RollupCounts) -> Self {
        Self {
            teams: c.teams,
            members: c.members,
            notes: c.notes,
            todos: c.todos,
            decisions: c.decisions,
            channels: c.channels,
        }
    }
}

/// One connected record in a rollup
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RollupItem {
    /// Entity type
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Record ID
    pub id: Uuid,
    /// Title (notes, todos, decisions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Name (channels, members, teams)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// URL-friendly slug
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl From<dailyops_graph::RollupItem> for RollupItem {
    fn from(item: dailyops_graph::RollupItem) -> Self {
        let (title, name) = title_or_name(item.entity_type, item.display);
        Self {
            entity_type: item.entity_type.into(),
            id: item.id,
            title,
            name,
            slug: item.slug,
            created_at: item.created_at,
        }
    }
}

/// Newest connected records per category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RollupDetails {
    pub teams: Vec<RollupItem>,
    pub members: Vec<RollupItem>,
    pub notes: Vec<RollupItem>,
    pub todos: Vec<RollupItem>,
    pub decisions: Vec<RollupItem>,
    pub channels: Vec<RollupItem>,
}

impl From<dailyops_graph::RollupDetails> for RollupDetails {
    fn from(d: dailyops_graph::RollupDetails) -> Self {
        fn convert(items: Vec<dailyops_graph::RollupItem>) -> Vec<RollupItem> {
            items.into_iter().map(RollupItem::from).collect()
        }

        Self {
            teams: convert(d.teams),
            members: convert(d.members),
            notes: convert(d.notes),
            todos: convert(d.todos),
            decisions: convert(d.decisions),
            channels: convert(d.channels),
        }
    }
}

/// Typed reference to one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EntityRef {
    /// Entity type
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Entity ID
    pub id: Uuid,
}

impl From<dailyops_graph::EntityRef> for EntityRef {
    fn from(entity: dailyops_graph::EntityRef) -> Self {
        Self {
            entity_type: entity.entity_type.into(),
            id: entity.id,
        }
    }
}

/// Everything connected to a location, team or member
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConnectionsRollup {
    /// Parent the rollup was computed for
    pub parent: EntityRef,
    /// Counts per category
    pub counts: RollupCounts,
    /// Capped detail lists per category
    pub details: RollupDetails,
}

impl From<dailyops_graph::ConnectionsRollup> for ConnectionsRollup {
    fn from(rollup: dailyops_graph::ConnectionsRollup) -> Self {
        Self {
            parent: rollup.parent.into(),
            counts: rollup.counts.into(),
            details: rollup.details.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
