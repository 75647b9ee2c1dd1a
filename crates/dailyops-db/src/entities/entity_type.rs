//! Closed set of entity kinds stored in the hub

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of a Daily Ops entity
///
/// Variants are declared in lexical order of their stored value so the derived
/// `Ord` agrees with string ordering.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    #[sea_orm(string_value = "channel")]
    Channel,

    #[sea_orm(string_value = "decision")]
    Decision,

    #[sea_orm(string_value = "event")]
    Event,

    #[sea_orm(string_value = "location")]
    Location,

    #[sea_orm(string_value = "member")]
    Member,

    #[sea_orm(string_value = "note")]
    Note,

    #[sea_orm(string_value = "team")]
    Team,

    #[sea_orm(string_value = "todo")]
    Todo,
}

impl EntityType {
    /// Stored (and wire) representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Channel => "channel",
            EntityType::Decision => "decision",
            EntityType::Event => "event",
            EntityType::Location => "location",
            EntityType::Member => "member",
            EntityType::Note => "note",
            EntityType::Team => "team",
            EntityType::Todo => "todo",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known entity type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown entity type: {0}")]
pub struct UnknownEntityType(pub String);

impl std::str::FromStr for EntityType {
    type Err = UnknownEntityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "channel" => Ok(EntityType::Channel),
            "decision" => Ok(EntityType::Decision),
            "event" => Ok(EntityType::Event),
            "location" => Ok(EntityType::Location),
            "member" => Ok(EntityType::Member),
            "note" => Ok(EntityType::Note),
            "team" => Ok(EntityType::Team),
            "todo" => Ok(EntityType::Todo),
            _ => Err(UnknownEntityType(s.to_string())),
        }
    }
}
