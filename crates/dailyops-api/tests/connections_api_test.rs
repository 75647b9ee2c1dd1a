//! Integration tests for connection, rollup and record endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use dailyops_api::{models::*, ApiServer, ApiServerConfig};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt; // For `oneshot` method
use uuid::Uuid;

/// Helper to create an in-memory database with migrations applied
async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    dailyops_db::migrator::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

async fn create_test_app() -> Router {
    let db = create_test_db().await;
    let config = ApiServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        enable_cors: false,
        cors_origins: None,
        rollup_detail_limit: 2,
    };

    ApiServer::new(config, db).build_router()
}

async fn allowed_origin(app: &Router, origin: &str) -> Option<String> {
    let request = Request::builder()
        .uri("/api/health")
        .header("origin", origin)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    response
        .headers()
        .get("access-control-allow-origin")
        .map(|value| value.to_str().unwrap().to_string())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().uri(uri).method(method);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&value).unwrap())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, bytes.to_vec())
}

fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).unwrap()
}

async fn create_record(app: &Router, entity_type: &str, body: Value) -> Record {
    let (status, bytes) = send(app, "POST", &format!("/api/entities/{}", entity_type), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", String::from_utf8_lossy(&bytes));
    parse(&bytes)
}

async fn link(app: &Router, source: &Record, target: &Record) -> (StatusCode, Vec<u8>) {
    send(
        app,
        "POST",
        "/api/connections",
        Some(json!({
            "source_type": type_name(source),
            "source_id": source.id,
            "target_type": type_name(target),
            "target_id": target.id,
        })),
    )
    .await
}

fn type_name(record: &Record) -> String {
    serde_json::to_value(record.entity_type)
        .unwrap()
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;

    let (status, bytes) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let health: HealthResponse = parse(&bytes);
    assert_eq!(health.status, "healthy");
}

#[tokio::test]
async fn test_entity_types_registry() {
    let app = create_test_app().await;

    let (status, bytes) = send(&app, "GET", "/api/entity-types", None).await;
    assert_eq!(status, StatusCode::OK);

    let list: EntityTypeList = parse(&bytes);
    assert_eq!(list.types.len(), 8);

    let channel = list
        .types
        .iter()
        .find(|t| t.entity_type == EntityType::Channel)
        .unwrap();
    assert_eq!(channel.label, "Channel");
    assert_eq!(channel.plural, "channels");
    assert_eq!(channel.display_field, "name");
}

#[tokio::test]
async fn test_link_note_and_todo_visible_from_both_sides() {
    let app = create_test_app().await;
    let note = create_record(&app, "note", json!({ "title": "Walk-in cooler temp" })).await;
    let todo = create_record(&app, "todo", json!({ "title": "Call repair tech" })).await;

    let (status, bytes) = link(&app, &note, &todo).await;
    assert_eq!(status, StatusCode::CREATED);

    let created: CreateConnectionResponse = parse(&bytes);
    assert_eq!(created.link_a.source_id, note.id);
    assert_eq!(created.link_a.target_id, todo.id);
    assert_eq!(created.link_b.source_id, todo.id);
    assert_eq!(created.link_b.target_id, note.id);
    assert_eq!(created.link_a.id, created.link_b.id);
    assert_eq!(created.linked.len(), 1);
    assert_eq!(created.linked[0].title.as_deref(), Some("Call repair tech"));

    let uri = format!("/api/connections?entity_type=todo&entity_id={}", todo.id);
    let (status, bytes) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let listed: LinkedEntitiesResponse = parse(&bytes);
    assert_eq!(listed.total, 1);
    assert_eq!(listed.entities[0].id, note.id);
    assert_eq!(listed.entities[0].entity_type, EntityType::Note);
    assert_eq!(listed.entities[0].title.as_deref(), Some("Walk-in cooler temp"));
}

#[tokio::test]
async fn test_self_link_rejected() {
    let app = create_test_app().await;
    let note = create_record(&app, "note", json!({ "title": "Solo" })).await;

    let (status, bytes) = link(&app, &note, &note).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let error: ErrorResponse = parse(&bytes);
    assert_eq!(error.code.as_deref(), Some("SELF_LINK_NOT_ALLOWED"));
}

#[tokio::test]
async fn test_duplicate_link_conflict() {
    let app = create_test_app().await;
    let note = create_record(&app, "note", json!({ "title": "Menu change" })).await;
    let channel = create_record(&app, "channel", json!({ "name": "kitchen" })).await;

    let (status, _) = link(&app, &note, &channel).await;
    assert_eq!(status, StatusCode::CREATED);

    // Same pair from the other side
    let (status, bytes) = link(&app, &channel, &note).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let error: ErrorResponse = parse(&bytes);
    assert_eq!(error.code.as_deref(), Some("LINK_ALREADY_EXISTS"));
}

#[tokio::test]
async fn test_unknown_entity_type() {
    let app = create_test_app().await;

    let uri = format!("/api/connections?entity_type=widget&entity_id={}", Uuid::new_v4());
    let (status, bytes) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let error: ErrorResponse = parse(&bytes);
    assert_eq!(error.code.as_deref(), Some("UNKNOWN_ENTITY_TYPE"));
}

#[tokio::test]
async fn test_link_to_missing_entity() {
    let app = create_test_app().await;
    let note = create_record(&app, "note", json!({ "title": "Orphan" })).await;

    let (status, bytes) = send(
        &app,
        "POST",
        "/api/connections",
        Some(json!({
            "source_type": "note",
            "source_id": note.id,
            "target_type": "todo",
            "target_id": Uuid::new_v4(),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let error: ErrorResponse = parse(&bytes);
    assert_eq!(error.code.as_deref(), Some("ENTITY_NOT_FOUND"));
}

#[tokio::test]
async fn test_delete_connection() {
    let app = create_test_app().await;
    let note = create_record(&app, "note", json!({ "title": "Inventory" })).await;
    let event = create_record(&app, "event", json!({ "title": "Stock take" })).await;

    let (status, _) = link(&app, &note, &event).await;
    assert_eq!(status, StatusCode::CREATED);

    // Removal issued from the event's side also clears the note's view
    let uri = format!(
        "/api/connections/{}?source_type=event&source_id={}&target_type=note",
        note.id, event.id
    );
    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let list_uri = format!("/api/connections?entity_type=note&entity_id={}", note.id);
    let (_, bytes) = send(&app, "GET", &list_uri, None).await;
    let listed: LinkedEntitiesResponse = parse(&bytes);
    assert_eq!(listed.total, 0);

    let (status, bytes) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let error: ErrorResponse = parse(&bytes);
    assert_eq!(error.code.as_deref(), Some("LINK_NOT_FOUND"));
}

#[tokio::test]
async fn test_list_connections_filtered_with_counts() {
    let app = create_test_app().await;
    let todo = create_record(&app, "todo", json!({ "title": "Deep clean fryer" })).await;
    let note = create_record(&app, "note", json!({ "title": "Oil supplier" })).await;
    let channel = create_record(&app, "channel", json!({ "name": "maintenance" })).await;
    let decision = create_record(&app, "decision", json!({ "title": "Weekly schedule" })).await;

    for target in [&note, &channel, &decision] {
        let (status, _) = link(&app, &todo, target).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let uri = format!(
        "/api/connections?entity_type=todo&entity_id={}&target_types=note,channel&include_counts=true",
        todo.id
    );
    let (status, bytes) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let listed: LinkedEntitiesResponse = parse(&bytes);
    assert_eq!(listed.total, 2);
    assert!(listed
        .entities
        .iter()
        .all(|e| matches!(e.entity_type, EntityType::Note | EntityType::Channel)));

    let channel_row = listed
        .entities
        .iter()
        .find(|e| e.id == channel.id)
        .unwrap();
    assert_eq!(channel_row.name.as_deref(), Some("maintenance"));
    assert!(channel_row.title.is_none());

    let counts = listed.counts.unwrap();
    assert_eq!(counts.get("note"), Some(&1));
    assert_eq!(counts.get("channel"), Some(&1));
    assert_eq!(counts.get("decision"), Some(&1));
}

#[tokio::test]
async fn test_team_rollup_ignores_links() {
    let app = create_test_app().await;
    let location = create_record(&app, "location", json!({ "name": "Downtown" })).await;
    let team = create_record(
        &app,
        "team",
        json!({ "name": "Kitchen", "connected_to": { "location_id": location.id } }),
    )
    .await;

    for title in ["Prep list", "Knife sharpening", "Walk-in audit"] {
        create_record(
            &app,
            "todo",
            json!({ "title": title, "connected_to": { "team_id": team.id } }),
        )
        .await;
    }

    // Linked to the team but not connected to it
    let stray = create_record(&app, "note", json!({ "title": "Linked only" })).await;
    let (status, _) = link(&app, &team, &stray).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, bytes) = send(&app, "GET", &format!("/api/teams/{}/connections", team.id), None).await;
    assert_eq!(status, StatusCode::OK);

    let rollup: ConnectionsRollup = parse(&bytes);
    assert_eq!(rollup.parent.entity_type, EntityType::Team);
    assert_eq!(rollup.parent.id, team.id);
    assert_eq!(rollup.counts.todos, 3);
    assert_eq!(rollup.counts.notes, 0);
    assert_eq!(rollup.counts.teams, 0);
    // Details are capped by the configured limit
    assert_eq!(rollup.details.todos.len(), 2);

    let (status, bytes) = send(
        &app,
        "GET",
        &format!("/api/locations/{}/connections", location.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let rollup: ConnectionsRollup = parse(&bytes);
    assert_eq!(rollup.counts.teams, 1);
    assert_eq!(rollup.counts.todos, 0);
    assert_eq!(rollup.details.teams[0].name.as_deref(), Some("Kitchen"));
}

#[tokio::test]
async fn test_rollup_missing_parent() {
    let app = create_test_app().await;

    let uri = format!("/api/members/{}/connections", Uuid::new_v4());
    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_record_invalid_parent() {
    let app = create_test_app().await;
    let team = create_record(&app, "team", json!({ "name": "Bar" })).await;

    // Teams hang off locations only
    let (status, bytes) = send(
        &app,
        "POST",
        "/api/entities/team",
        Some(json!({ "name": "Sub team", "connected_to": { "team_id": team.id } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let error: ErrorResponse = parse(&bytes);
    assert_eq!(error.code.as_deref(), Some("INVALID_PARENT"));

    let (status, bytes) = send(&app, "POST", "/api/entities/note", Some(json!({ "title": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let error: ErrorResponse = parse(&bytes);
    assert_eq!(error.code.as_deref(), Some("VALIDATION_FAILED"));
}

#[tokio::test]
async fn test_candidates_search_and_exclude() {
    let app = create_test_app().await;
    let kitchen = create_record(&app, "channel", json!({ "name": "Kitchen", "slug": "kitchen" })).await;
    let bar = create_record(&app, "channel", json!({ "name": "Bar", "slug": "bar-staff" })).await;
    create_record(&app, "channel", json!({ "name": "Front of house", "slug": "foh" })).await;

    let (status, bytes) = send(&app, "GET", "/api/entities/channel?q=KIT", None).await;
    assert_eq!(status, StatusCode::OK);

    let list: CandidateList = parse(&bytes);
    assert_eq!(list.total, 1);
    assert_eq!(list.candidates[0].id, kitchen.id);

    let uri = format!("/api/entities/channel?exclude={},{}", kitchen.id, bar.id);
    let (status, bytes) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let list: CandidateList = parse(&bytes);
    assert_eq!(list.total, 1);
    assert_eq!(list.candidates[0].name.as_deref(), Some("Front of house"));

    let (status, _) = send(&app, "GET", "/api/entities/channel?exclude=nope", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_record_cascades_links() {
    let app = create_test_app().await;
    let note = create_record(&app, "note", json!({ "title": "Temporary" })).await;
    let todo = create_record(&app, "todo", json!({ "title": "Follow up" })).await;

    let (status, _) = link(&app, &note, &todo).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, bytes) = send(&app, "DELETE", &format!("/api/entities/note/{}", note.id), None).await;
    assert_eq!(status, StatusCode::OK);

    let summary: DeleteRecordResponse = parse(&bytes);
    assert_eq!(summary.links_removed, 1);

    let (status, _) = send(&app, "GET", &format!("/api/entities/note/{}", note.id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/api/connections?entity_type=todo&entity_id={}", todo.id);
    let (_, bytes) = send(&app, "GET", &uri, None).await;
    let listed: LinkedEntitiesResponse = parse(&bytes);
    assert_eq!(listed.total, 0);
    assert_eq!(listed.dropped, 0);
}

#[tokio::test]
async fn test_openapi_json_served() {
    let app = create_test_app().await;

    let (status, bytes) = send(&app, "GET", "/api/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);

    let doc: Value = parse(&bytes);
    assert_eq!(doc["info"]["title"], "Daily Ops API");
}

#[tokio::test]
async fn test_huge_skip_returns_empty_page() {
    let app = create_test_app().await;
    let note = create_record(&app, "note", json!({ "title": "Paging" })).await;
    let todo = create_record(&app, "todo", json!({ "title": "Target" })).await;
    let (status, _) = link(&app, &note, &todo).await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!(
        "/api/connections?entity_type=note&entity_id={}&skip={}",
        note.id,
        u64::MAX
    );
    let (status, bytes) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);

    let listed: LinkedEntitiesResponse = parse(&bytes);
    assert!(listed.entities.is_empty());
    assert_eq!(listed.total, 1);
}

#[tokio::test]
async fn test_cors_localhost_by_default() {
    let db = create_test_db().await;
    let app = ApiServer::new(ApiServerConfig::default(), db).build_router();

    assert_eq!(
        allowed_origin(&app, "http://localhost:5173").await.as_deref(),
        Some("http://localhost:5173")
    );
    assert_eq!(allowed_origin(&app, "https://ops.example.com").await, None);
}

#[tokio::test]
async fn test_cors_configured_origins() {
    let db = create_test_db().await;
    let config = ApiServerConfig {
        cors_origins: Some(vec![
            "https://ops.example.com".to_string(),
            "not a header\n".to_string(),
        ]),
        ..ApiServerConfig::default()
    };
    let app = ApiServer::new(config, db).build_router();

    assert_eq!(
        allowed_origin(&app, "https://ops.example.com").await.as_deref(),
        Some("https://ops.example.com")
    );
    assert_eq!(allowed_origin(&app, "http://localhost:5173").await, None);
}
