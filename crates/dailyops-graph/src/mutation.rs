//! Link mutation façade used by the API boundary
//!
//! Each call writes through the [`LinkStore`] and hands back the source's
//! refreshed linked list so the caller can reconcile optimistic state.

use tracing::info;

use crate::error::GraphError;
use crate::link_store::{LinkPair, LinkStore};
use crate::page::PageRequest;
use crate::query::{LinkQueryService, LinkedEntityDisplay};
use crate::registry::EntityRef;

/// Outcome of a successful link
#[derive(Debug, Clone, PartialEq)]
pub struct LinkOutcome {
    pub pair: LinkPair,
    /// First page of the source's links after the write
    pub linked: Vec<LinkedEntityDisplay>,
}

#[derive(Clone)]
pub struct LinkMutations {
    store: LinkStore,
    query: LinkQueryService,
}

impl LinkMutations {
    pub fn new(store: LinkStore, query: LinkQueryService) -> Self {
        Self { store, query }
    }

    pub async fn link(&self, source: EntityRef, target: EntityRef) -> Result<LinkOutcome, GraphError> {
        let pair = self.store.create_link(source, target).await?;
        let linked = self.refreshed(source).await?;

        Ok(LinkOutcome { pair, linked })
    }

    pub async fn unlink(
        &self,
        source: EntityRef,
        target: EntityRef,
    ) -> Result<Vec<LinkedEntityDisplay>, GraphError> {
        self.store.remove_link(source, target).await?;
        info!("{} detached from {}", target, source);

        self.refreshed(source).await
    }

    async fn refreshed(&self, source: EntityRef) -> Result<Vec<LinkedEntityDisplay>, GraphError> {
        Ok(self
            .query
            .get_linked_entities(source, None, PageRequest::default(), false)
            .await?
            .entities)
    }
}
