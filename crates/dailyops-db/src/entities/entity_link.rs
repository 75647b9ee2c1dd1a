//! EntityLink entity: one undirected link between two records
//!
//! The pair is stored in canonical order, `(a_type, a_id) < (b_type, b_id)`,
//! so a unique index over the four columns rejects duplicates regardless of
//! which side created the link.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::entity_type::EntityType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entity_links")]
pub struct Model {
    /// Link UUID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Type of the lower participant
    pub a_type: EntityType,

    /// ID of the lower participant
    pub a_id: Uuid,

    /// Type of the higher participant
    pub b_type: EntityType,

    /// ID of the higher participant
    pub b_id: Uuid,

    /// When the link was created
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::record::Entity",
        from = "Column::AId",
        to = "super::record::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    SideA,

    #[sea_orm(
        belongs_to = "super::record::Entity",
        from = "Column::BId",
        to = "super::record::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    SideB,
}

impl Related<super::record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SideA.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
