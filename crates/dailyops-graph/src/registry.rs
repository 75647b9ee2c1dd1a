//! Entity registry: labels, display metadata and candidate lookup per type
//!
//! Every per-type decision lives in an exhaustive `match` here, so adding a
//! variant to [`EntityType`] fails to compile until each table below is filled
//! in.

use async_trait::async_trait;
use dailyops_db::entities::EntityType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use crate::error::GraphError;
use crate::page::{Page, PageRequest};

/// Every entity type, in the order the UI lists them
pub const ALL: [EntityType; 8] = [
    EntityType::Note,
    EntityType::Todo,
    EntityType::Channel,
    EntityType::Event,
    EntityType::Decision,
    EntityType::Member,
    EntityType::Team,
    EntityType::Location,
];

/// Reference to one entity instance
///
/// Field order matters: the derived `Ord` compares type first, then id, which
/// is the canonical order used to store link pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub id: Uuid,
}

impl EntityRef {
    pub fn new(entity_type: EntityType, id: Uuid) -> Self {
        Self { entity_type, id }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type, self.id)
    }
}

/// Which field name a type uses for its display text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayField {
    Title,
    Name,
}

/// Human label for a type
pub fn label_for(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Note => "Note",
        EntityType::Todo => "Todo",
        EntityType::Channel => "Channel",
        EntityType::Event => "Event",
        EntityType::Decision => "Decision",
        EntityType::Member => "Member",
        EntityType::Team => "Team",
        EntityType::Location => "Location",
    }
}

/// Human label for a type given by name
pub fn label_for_name(name: &str) -> Result<&'static str, GraphError> {
    Ok(label_for(parse_entity_type(name)?))
}

/// Parse a wire type name
pub fn parse_entity_type(name: &str) -> Result<EntityType, GraphError> {
    Ok(name.parse::<EntityType>()?)
}

/// Parse a comma-separated list of type names, ignoring blanks
pub fn parse_entity_types(list: &str) -> Result<Vec<EntityType>, GraphError> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(parse_entity_type)
        .collect()
}

/// Collection name used in URLs
pub fn plural(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::Note => "notes",
        EntityType::Todo => "todos",
        EntityType::Channel => "channels",
        EntityType::Event => "events",
        EntityType::Decision => "decisions",
        EntityType::Member => "members",
        EntityType::Team => "teams",
        EntityType::Location => "locations",
    }
}

pub fn display_field(entity_type: EntityType) -> DisplayField {
    match entity_type {
        EntityType::Note | EntityType::Todo | EntityType::Event | EntityType::Decision => {
            DisplayField::Title
        }
        EntityType::Channel | EntityType::Member | EntityType::Team | EntityType::Location => {
            DisplayField::Name
        }
    }
}

/// Parent kinds a record of this type may be `connected_to`
pub fn allowed_parents(entity_type: EntityType) -> &'static [EntityType] {
    match entity_type {
        EntityType::Location => &[],
        EntityType::Team => &[EntityType::Location],
        EntityType::Member => &[EntityType::Location, EntityType::Team],
        EntityType::Note
        | EntityType::Todo
        | EntityType::Channel
        | EntityType::Event
        | EntityType::Decision => &[EntityType::Location, EntityType::Team, EntityType::Member],
    }
}

/// Types offered for linking from a given form when the caller does not say
pub fn default_link_targets(entity_type: EntityType) -> &'static [EntityType] {
    match entity_type {
        EntityType::Todo => &[
            EntityType::Note,
            EntityType::Channel,
            EntityType::Event,
            EntityType::Decision,
        ],
        EntityType::Note => &[
            EntityType::Todo,
            EntityType::Channel,
            EntityType::Event,
            EntityType::Decision,
            EntityType::Note,
        ],
        EntityType::Decision => &[
            EntityType::Note,
            EntityType::Todo,
            EntityType::Channel,
            EntityType::Event,
        ],
        EntityType::Event => &[
            EntityType::Note,
            EntityType::Todo,
            EntityType::Decision,
            EntityType::Channel,
        ],
        EntityType::Channel => &[
            EntityType::Note,
            EntityType::Todo,
            EntityType::Decision,
            EntityType::Event,
        ],
        EntityType::Member | EntityType::Team | EntityType::Location => &ALL,
    }
}

/// A record offered in a link picker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityOption {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub id: Uuid,
    /// Title or name, depending on [`display_field`]
    pub label: String,
    pub slug: Option<String>,
}

impl EntityOption {
    fn matches(&self, needle: &str) -> bool {
        self.label.to_lowercase().contains(needle)
            || self
                .slug
                .as_deref()
                .is_some_and(|slug| slug.to_lowercase().contains(needle))
    }
}

/// Listing collaborator that owns the records of each type
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Every record of `entity_type`, in display order
    async fn list_options(&self, entity_type: EntityType) -> Result<Vec<EntityOption>, GraphError>;
}

/// Find records of `entity_type` that can still be linked
///
/// Matches `query` case-insensitively against title/name and slug, skips every
/// id in `exclude` and then applies the page window. A blank query matches
/// everything.
pub async fn fetch_candidates(
    source: &dyn CandidateSource,
    entity_type: EntityType,
    query: &str,
    page: PageRequest,
    exclude: &HashSet<Uuid>,
) -> Result<Page<EntityOption>, GraphError> {
    let needle = query.trim().to_lowercase();

    let matching: Vec<EntityOption> = source
        .list_options(entity_type)
        .await?
        .into_iter()
        .filter(|option| !exclude.contains(&option.id))
        .filter(|option| needle.is_empty() || option.matches(&needle))
        .collect();

    Ok(Page::from_vec(matching, page))
}
