//! Database entities

pub mod entity_link;
pub mod entity_type;
pub mod record;

pub use entity_link::Entity as EntityLink;
pub use entity_type::{EntityType, UnknownEntityType};
pub use record::Entity as Record;

pub mod prelude {
    pub use super::entity_link::Entity as EntityLink;
    pub use super::entity_type::EntityType;
    pub use super::record::Entity as Record;
}
