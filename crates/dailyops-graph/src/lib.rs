//! Entity connection graph for Daily Ops
//!
//! Two relationships are modelled here and they must not be confused:
//! - **links**: explicit many-to-many associations between any two records
//!   ([`link_store`], [`query`], [`mutation`])
//! - **connected_to**: the single parent context (location, team, member) a
//!   record lives under, used for read scoping and rollups ([`records`],
//!   [`rollup`])

pub mod error;
pub mod link_store;
pub mod mutation;
pub mod optimistic;
pub mod page;
pub mod query;
pub mod records;
pub mod registry;
pub mod rollup;

pub use dailyops_db::entities::EntityType;
pub use error::GraphError;
pub use link_store::{EntityLink, LinkFilter, LinkPair, LinkStore};
pub use mutation::{LinkMutations, LinkOutcome};
pub use optimistic::{
    LinkSelection, MutationFailure, MutationKind, MutationPhase, MutationTicket, SelectionError,
};
pub use page::{Page, PageRequest};
pub use query::{LinkQueryService, LinkedEntities, LinkedEntityDisplay};
pub use records::{ConnectedTo, DeleteSummary, NewRecord, RecordStore};
pub use registry::{CandidateSource, DisplayField, EntityOption, EntityRef};
pub use rollup::{
    ConnectionsRollup, RollupCounts, RollupDetails, RollupItem, RollupParent, RollupService,
};
