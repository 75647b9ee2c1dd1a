//! Record entity: one row per note, todo, channel, event, decision, member,
//! team or location

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::entity_type::EntityType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "records")]
pub struct Model {
    /// Record UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Kind of entity this record holds
    pub entity_type: EntityType,

    /// Title for notes, todos, decisions and events; name for everything else
    pub title: String,

    /// URL-friendly slug
    pub slug: Option<String>,

    /// Parent location (connected_to.location_id)
    pub location_id: Option<Uuid>,

    /// Parent team (connected_to.team_id)
    pub team_id: Option<Uuid>,

    /// Parent member (connected_to.member_id)
    pub member_id: Option<Uuid>,

    /// When the record was created
    pub created_at: ChronoDateTimeUtc,

    /// When the record was last updated
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Links where this record sorts first in the canonical pair
    #[sea_orm(has_many = "super::entity_link::Entity")]
    Links,
}

impl Related<super::entity_link::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Links.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
