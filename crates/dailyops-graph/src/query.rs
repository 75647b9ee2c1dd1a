//! Link query service: links resolved into display rows

use dailyops_db::entities::{record, EntityType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::GraphError;
use crate::link_store::{LinkFilter, LinkStore};
use crate::page::PageRequest;
use crate::records::RecordStore;
use crate::registry::{self, DisplayField, EntityRef};

/// Read-model of one linked record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedEntityDisplay {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub id: Uuid,
    /// Title or name; see [`LinkedEntityDisplay::field`]
    pub display: String,
    pub slug: Option<String>,
}

impl LinkedEntityDisplay {
    pub fn from_record(model: &record::Model) -> Self {
        Self {
            entity_type: model.entity_type,
            id: model.id,
            display: model.title.clone(),
            slug: model.slug.clone(),
        }
    }

    pub fn field(&self) -> DisplayField {
        registry::display_field(self.entity_type)
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.entity_type, self.id)
    }
}

/// Page of linked records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedEntities {
    pub entities: Vec<LinkedEntityDisplay>,
    /// Matching links, including any dropped from this page
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
    /// Links on this page whose other side no longer resolves
    pub dropped: u64,
    pub counts: Option<BTreeMap<EntityType, u64>>,
}

#[derive(Clone)]
pub struct LinkQueryService {
    links: LinkStore,
    records: RecordStore,
}

impl LinkQueryService {
    pub fn new(links: LinkStore, records: RecordStore) -> Self {
        Self { links, records }
    }

    /// Records linked to `entity`, newest link first
    ///
    /// `allowed_target_types` narrows the result to the types the caller's
    /// context offers. Links whose target cannot be loaded are skipped and
    /// counted in `dropped`.
    pub async fn get_linked_entities(
        &self,
        entity: EntityRef,
        allowed_target_types: Option<&[EntityType]>,
        page: PageRequest,
        include_counts: bool,
    ) -> Result<LinkedEntities, GraphError> {
        let filter = LinkFilter {
            target_types: allowed_target_types.map(<[EntityType]>::to_vec),
        };
        let links = self.links.list_links(entity, &filter, page).await?;

        let resolved = self
            .records
            .resolve_many(links.items.iter().map(|link| link.target_id))
            .await?;

        let mut entities = Vec::with_capacity(links.items.len());
        let mut dropped = 0;
        for link in &links.items {
            match resolved
                .get(&link.target_id)
                .filter(|model| model.entity_type == link.target_type)
            {
                Some(model) => entities.push(LinkedEntityDisplay::from_record(model)),
                None => {
                    let err = GraphError::TargetResolutionFailed(link.target());
                    debug!("Dropping link {} from {}: {}", link.id, entity, err);
                    dropped += 1;
                }
            }
        }

        let counts = if include_counts {
            Some(self.links.count_by_type(entity).await?)
        } else {
            None
        };

        Ok(LinkedEntities {
            entities,
            total: links.total,
            skip: links.skip,
            limit: links.limit,
            dropped,
            counts,
        })
    }
}
