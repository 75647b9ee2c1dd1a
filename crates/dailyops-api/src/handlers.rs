use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use dailyops_graph::{registry, EntityRef, GraphError, NewRecord, PageRequest};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::models::*;
use crate::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a graph failure onto its HTTP status and error body
fn graph_error(err: GraphError) -> ApiError {
    let status = match &err {
        GraphError::SelfLinkNotAllowed(_)
        | GraphError::UnknownEntityType(_)
        | GraphError::InvalidParent { .. }
        | GraphError::InvalidRollupParent(_)
        | GraphError::Validation(_) => StatusCode::BAD_REQUEST,
        GraphError::EntityNotFound(_)
        | GraphError::LinkNotFound(..)
        | GraphError::TargetResolutionFailed(_) => StatusCode::NOT_FOUND,
        GraphError::LinkAlreadyExists(..) => StatusCode::CONFLICT,
        GraphError::Database(db_err) => {
            error!("Database error: {}", db_err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: Some(err.code().to_string()),
        }),
    )
}

fn entity_ref(entity_type: &str, id: Uuid) -> Result<EntityRef, ApiError> {
    let entity_type = registry::parse_entity_type(entity_type).map_err(graph_error)?;
    Ok(EntityRef::new(entity_type, id))
}

fn parse_id_list(list: &str) -> Result<HashSet<Uuid>, ApiError> {
    list.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            Uuid::parse_str(part).map_err(|_| {
                graph_error(GraphError::Validation(format!("'{}' is not a valid id", part)))
            })
        })
        .collect()
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List the entity type registry
#[utoipa::path(
    get,
    path = "/api/entity-types",
    responses(
        (status = 200, description = "Known entity types", body = EntityTypeList)
    ),
    tag = "system"
)]
pub async fn list_entity_types() -> Json<EntityTypeList> {
    let types = registry::ALL
        .iter()
        .map(|&entity_type| EntityTypeInfo {
            entity_type: entity_type.into(),
            label: registry::label_for(entity_type).to_string(),
            plural: registry::plural(entity_type).to_string(),
            display_field: match registry::display_field(entity_type) {
                registry::DisplayField::Title => "title".to_string(),
                registry::DisplayField::Name => "name".to_string(),
            },
            allowed_parents: registry::allowed_parents(entity_type)
                .iter()
                .map(|&t| t.into())
                .collect(),
            default_link_targets: registry::default_link_targets(entity_type)
                .iter()
                .map(|&t| t.into())
                .collect(),
        })
        .collect();

    Json(EntityTypeList { types })
}

/// List entities linked to an entity
#[utoipa::path(
    get,
    path = "/api/connections",
    params(ConnectionsQuery),
    responses(
        (status = 200, description = "Linked entities, newest link first", body = LinkedEntitiesResponse),
        (status = 400, description = "Unknown entity type", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "connections"
)]
pub async fn list_connections(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectionsQuery>,
) -> Result<Json<LinkedEntitiesResponse>, ApiError> {
    let entity = entity_ref(&query.entity_type, query.entity_id)?;
    debug!("Listing connections for {}", entity);

    let target_types = query
        .target_types
        .as_deref()
        .filter(|list| !list.trim().is_empty())
        .map(registry::parse_entity_types)
        .transpose()
        .map_err(graph_error)?;

    let linked = state
        .query
        .get_linked_entities(
            entity,
            target_types.as_deref(),
            PageRequest::new(query.skip, query.limit),
            query.include_counts.unwrap_or(false),
        )
        .await
        .map_err(graph_error)?;

    Ok(Json(LinkedEntitiesResponse {
        entities: linked.entities.into_iter().map(LinkedEntity::from).collect(),
        total: linked.total,
        skip: linked.skip,
        limit: linked.limit,
        dropped: linked.dropped,
        counts: linked.counts.map(|counts| {
            counts
                .into_iter()
                .map(|(entity_type, count)| (entity_type.to_string(), count))
                .collect()
        }),
    }))
}

/// Link two entities
#[utoipa::path(
    post,
    path = "/api/connections",
    request_body = CreateConnectionRequest,
    responses(
        (status = 201, description = "Link created", body = CreateConnectionResponse),
        (status = 400, description = "Self link or unknown entity type", body = ErrorResponse),
        (status = 404, description = "Entity not found", body = ErrorResponse),
        (status = 409, description = "Link already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "connections"
)]
pub async fn create_connection(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateConnectionRequest>,
) -> Result<(StatusCode, Json<CreateConnectionResponse>), ApiError> {
    let source = entity_ref(&req.source_type, req.source_id)?;
    let target = entity_ref(&req.target_type, req.target_id)?;

    info!("Linking {} -> {}", source, target);

    let outcome = state
        .mutations
        .link(source, target)
        .await
        .map_err(graph_error)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateConnectionResponse {
            link_a: outcome.pair.link_a.into(),
            link_b: outcome.pair.link_b.into(),
            linked: outcome.linked.into_iter().map(LinkedEntity::from).collect(),
        }),
    ))
}

/// Remove the link between two entities
#[utoipa::path(
    delete,
    path = "/api/connections/{target_id}",
    params(
        ("target_id" = Uuid, Path, description = "Target entity ID"),
        DeleteConnectionQuery
    ),
    responses(
        (status = 204, description = "Link removed"),
        (status = 400, description = "Unknown entity type", body = ErrorResponse),
        (status = 404, description = "Link not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "connections"
)]
pub async fn delete_connection(
    State(state): State<Arc<AppState>>,
    Path(target_id): Path<Uuid>,
    Query(query): Query<DeleteConnectionQuery>,
) -> Result<StatusCode, ApiError> {
    let source = entity_ref(&query.source_type, query.source_id)?;
    let target = entity_ref(&query.target_type, target_id)?;

    info!("Unlinking {} -> {}", source, target);

    state
        .mutations
        .unlink(source, target)
        .await
        .map_err(graph_error)?;

    Ok(StatusCode::NO_CONTENT)
}

async fn rollup_for(
    state: &AppState,
    parent_type: dailyops_graph::EntityType,
    id: Uuid,
) -> Result<Json<ConnectionsRollup>, ApiError> {
    debug!("Getting rollup for {}:{}", parent_type, id);

    let rollup = state
        .rollups
        .get_connections_rollup(parent_type, id)
        .await
        .map_err(graph_error)?;

    Ok(Json(rollup.into()))
}

/// Everything connected to a location
#[utoipa::path(
    get,
    path = "/api/locations/{id}/connections",
    params(
        ("id" = Uuid, Path, description = "Location ID")
    ),
    responses(
        (status = 200, description = "Location rollup", body = ConnectionsRollup),
        (status = 404, description = "Location not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "rollups"
)]
pub async fn location_connections(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConnectionsRollup>, ApiError> {
    rollup_for(&state, dailyops_graph::EntityType::Location, id).await
}

/// Everything connected to a team
#[utoipa::path(
    get,
    path = "/api/teams/{id}/connections",
    params(
        ("id" = Uuid, Path, description = "Team ID")
    ),
    responses(
        (status = 200, description = "Team rollup", body = ConnectionsRollup),
        (status = 404, description = "Team not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "rollups"
)]
pub async fn team_connections(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConnectionsRollup>, ApiError> {
    rollup_for(&state, dailyops_graph::EntityType::Team, id).await
}

/// Everything connected to a member
#[utoipa::path(
    get,
    path = "/api/members/{id}/connections",
    params(
        ("id" = Uuid, Path, description = "Member ID")
    ),
    responses(
        (status = 200, description = "Member rollup", body = ConnectionsRollup),
        (status = 404, description = "Member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "rollups"
)]
pub async fn member_connections(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConnectionsRollup>, ApiError> {
    rollup_for(&state, dailyops_graph::EntityType::Member, id).await
}

/// Create a record
#[utoipa::path(
    post,
    path = "/api/entities/{entity_type}",
    params(
        ("entity_type" = String, Path, description = "Entity type (note, todo, channel, ...)")
    ),
    request_body = CreateRecordRequest,
    responses(
        (status = 201, description = "Record created", body = Record),
        (status = 400, description = "Invalid type, parent or title", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "entities"
)]
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    Path(entity_type): Path<String>,
    Json(req): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let entity_type = registry::parse_entity_type(&entity_type).map_err(graph_error)?;

    let model = state
        .records
        .create(NewRecord {
            entity_type,
            title: req.title.or(req.name).unwrap_or_default(),
            slug: req.slug,
            connected_to: req.connected_to.into(),
        })
        .await
        .map_err(graph_error)?;

    Ok((StatusCode::CREATED, Json(model.into())))
}

/// Search records of a type that can be linked
#[utoipa::path(
    get,
    path = "/api/entities/{entity_type}",
    params(
        ("entity_type" = String, Path, description = "Entity type (note, todo, channel, ...)"),
        CandidateQuery
    ),
    responses(
        (status = 200, description = "Matching records", body = CandidateList),
        (status = 400, description = "Unknown entity type or bad exclude list", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "entities"
)]
pub async fn list_candidates(
    State(state): State<Arc<AppState>>,
    Path(entity_type): Path<String>,
    Query(query): Query<CandidateQuery>,
) -> Result<Json<CandidateList>, ApiError> {
    let entity_type = registry::parse_entity_type(&entity_type).map_err(graph_error)?;
    let exclude = match query.exclude.as_deref() {
        Some(list) => parse_id_list(list)?,
        None => HashSet::new(),
    };

    debug!(
        "Searching {} candidates (q={:?}, {} excluded)",
        entity_type,
        query.q,
        exclude.len()
    );

    let page = registry::fetch_candidates(
        &state.records,
        entity_type,
        query.q.as_deref().unwrap_or(""),
        PageRequest::new(query.skip, query.limit),
        &exclude,
    )
    .await
    .map_err(graph_error)?;

    Ok(Json(CandidateList {
        candidates: page.items.into_iter().map(LinkedEntity::from).collect(),
        total: page.total,
        skip: page.skip,
        limit: page.limit,
    }))
}

/// Get a record
#[utoipa::path(
    get,
    path = "/api/entities/{entity_type}/{id}",
    params(
        ("entity_type" = String, Path, description = "Entity type"),
        ("id" = Uuid, Path, description = "Record ID")
    ),
    responses(
        (status = 200, description = "Record", body = Record),
        (status = 400, description = "Unknown entity type", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "entities"
)]
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path((entity_type, id)): Path<(String, Uuid)>,
) -> Result<Json<Record>, ApiError> {
    let entity = entity_ref(&entity_type, id)?;
    debug!("Getting record {}", entity);

    let model = state.records.get(entity).await.map_err(graph_error)?;

    Ok(Json(model.into()))
}

/// Delete a record together with its links
#[utoipa::path(
    delete,
    path = "/api/entities/{entity_type}/{id}",
    params(
        ("entity_type" = String, Path, description = "Entity type"),
        ("id" = Uuid, Path, description = "Record ID")
    ),
    responses(
        (status = 200, description = "Record deleted", body = DeleteRecordResponse),
        (status = 400, description = "Unknown entity type", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "entities"
)]
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path((entity_type, id)): Path<(String, Uuid)>,
) -> Result<Json<DeleteRecordResponse>, ApiError> {
    let entity = entity_ref(&entity_type, id)?;
    info!("Deleting record {}", entity);

    let summary = state.records.delete(entity).await.map_err(graph_error)?;

    Ok(Json(DeleteRecordResponse {
        links_removed: summary.links_removed,
        children_detached: summary.children_detached,
    }))
}
