//! Errors raised by the connection graph

use dailyops_db::entities::{EntityType, UnknownEntityType};
use sea_orm::DbErr;
use thiserror::Error;

use crate::registry::EntityRef;

/// Errors that can occur in link, record and rollup operations
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Cannot link {0} to itself")]
    SelfLinkNotAllowed(EntityRef),

    #[error("Link between {0} and {1} already exists")]
    LinkAlreadyExists(EntityRef, EntityRef),

    #[error("No link between {0} and {1}")]
    LinkNotFound(EntityRef, EntityRef),

    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    /// Soft failure: the other side of a link no longer resolves. Query
    /// results drop these instead of returning them.
    #[error("Linked entity {0} could not be resolved")]
    TargetResolutionFailed(EntityRef),

    #[error("Entity {0} not found")]
    EntityNotFound(EntityRef),

    #[error("Invalid parent for {child}: {reason}")]
    InvalidParent { child: EntityType, reason: String },

    #[error("Rollups are only available for locations, teams and members, not {0}")]
    InvalidRollupParent(EntityType),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl GraphError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::SelfLinkNotAllowed(_) => "SELF_LINK_NOT_ALLOWED",
            GraphError::LinkAlreadyExists(..) => "LINK_ALREADY_EXISTS",
            GraphError::LinkNotFound(..) => "LINK_NOT_FOUND",
            GraphError::UnknownEntityType(_) => "UNKNOWN_ENTITY_TYPE",
            GraphError::TargetResolutionFailed(_) => "TARGET_RESOLUTION_FAILED",
            GraphError::EntityNotFound(_) => "ENTITY_NOT_FOUND",
            GraphError::InvalidParent { .. } => "INVALID_PARENT",
            GraphError::InvalidRollupParent(_) => "INVALID_ROLLUP_PARENT",
            GraphError::Validation(_) => "VALIDATION_FAILED",
            GraphError::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl From<UnknownEntityType> for GraphError {
    fn from(err: UnknownEntityType) -> Self {
        GraphError::UnknownEntityType(err.0)
    }
}
