//! Integration tests for dailyops-db
//!
//! Tests schema and entity mappings with a real SQLite in-memory database

use chrono::Utc;
use dailyops_db::{
    connect,
    entities::{entity_link, record, EntityType},
    migrate,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use uuid::Uuid;

/// Helper to create a test database
async fn setup_test_db() -> sea_orm::DatabaseConnection {
    let db = connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    migrate(&db).await.expect("Failed to run migrations");

    db
}

fn new_record(entity_type: EntityType, title: &str) -> record::ActiveModel {
    record::ActiveModel {
        id: Set(Uuid::new_v4()),
        entity_type: Set(entity_type),
        title: Set(title.to_string()),
        slug: Set(None),
        location_id: Set(None),
        team_id: Set(None),
        member_id: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
}

#[tokio::test]
async fn test_database_connection() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let backend = db.get_database_backend();
    assert!(matches!(backend, sea_orm::DatabaseBackend::Sqlite));
}

#[tokio::test]
async fn test_migrations_run_successfully() {
    let db = connect("sqlite::memory:").await.expect("Failed to connect");

    let result = migrate(&db).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_create_and_read_record() {
    let db = setup_test_db().await;

    let mut note = new_record(EntityType::Note, "Closing checklist");
    note.slug = Set(Some("closing-checklist".to_string()));
    let inserted = note.insert(&db).await.expect("Failed to insert");

    let found = record::Entity::find_by_id(inserted.id)
        .one(&db)
        .await
        .expect("Failed to query")
        .expect("Record not found");

    assert_eq!(found.entity_type, EntityType::Note);
    assert_eq!(found.title, "Closing checklist");
    assert_eq!(found.slug.as_deref(), Some("closing-checklist"));
    assert!(found.location_id.is_none());
}

#[tokio::test]
async fn test_entity_type_round_trips_as_string() {
    let db = setup_test_db().await;

    for entity_type in [
        EntityType::Channel,
        EntityType::Decision,
        EntityType::Event,
        EntityType::Location,
        EntityType::Member,
        EntityType::Note,
        EntityType::Team,
        EntityType::Todo,
    ] {
        new_record(entity_type, entity_type.as_str())
            .insert(&db)
            .await
            .expect("Failed to insert");
    }

    let todos = record::Entity::find()
        .filter(record::Column::EntityType.eq(EntityType::Todo))
        .all(&db)
        .await
        .expect("Failed to query");

    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].title, "todo");
}

#[tokio::test]
async fn test_query_by_connected_location() {
    let db = setup_test_db().await;

    let location = new_record(EntityType::Location, "Harbour Street")
        .insert(&db)
        .await
        .unwrap();

    for i in 0..3 {
        let mut note = new_record(EntityType::Note, &format!("Note {}", i));
        note.location_id = Set(Some(location.id));
        note.insert(&db).await.unwrap();
    }
    new_record(EntityType::Note, "Unscoped").insert(&db).await.unwrap();

    let scoped = record::Entity::find()
        .filter(record::Column::LocationId.eq(location.id))
        .count(&db)
        .await
        .unwrap();

    assert_eq!(scoped, 3);
}

#[tokio::test]
async fn test_link_pair_is_unique() {
    let db = setup_test_db().await;

    let note = new_record(EntityType::Note, "N1").insert(&db).await.unwrap();
    let todo = new_record(EntityType::Todo, "T1").insert(&db).await.unwrap();

    let link = || entity_link::ActiveModel {
        id: Set(Uuid::new_v4()),
        a_type: Set(EntityType::Note),
        a_id: Set(note.id),
        b_type: Set(EntityType::Todo),
        b_id: Set(todo.id),
        created_at: Set(Utc::now()),
    };

    link().insert(&db).await.expect("First link should insert");

    let duplicate = link().insert(&db).await;
    assert!(duplicate.is_err(), "Unique index must reject a second row");

    let count = entity_link::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_delete_link() {
    let db = setup_test_db().await;

    let note = new_record(EntityType::Note, "N1").insert(&db).await.unwrap();
    let channel = new_record(EntityType::Channel, "front-of-house")
        .insert(&db)
        .await
        .unwrap();

    let link = entity_link::ActiveModel {
        id: Set(Uuid::new_v4()),
        a_type: Set(EntityType::Channel),
        a_id: Set(channel.id),
        b_type: Set(EntityType::Note),
        b_id: Set(note.id),
        created_at: Set(Utc::now()),
    }
    .insert(&db)
    .await
    .unwrap();

    let result = entity_link::Entity::delete_by_id(link.id)
        .exec(&db)
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 1);

    let remaining = entity_link::Entity::find().count(&db).await.unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_parent_reference_must_exist() {
    let db = setup_test_db().await;

    let mut orphan = new_record(EntityType::Note, "Orphan");
    orphan.team_id = Set(Some(Uuid::new_v4()));

    let err = orphan.insert(&db).await.unwrap_err();
    assert!(matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(_))
    ));
}

#[tokio::test]
async fn test_deleting_parent_clears_reference() {
    let db = setup_test_db().await;

    let team = new_record(EntityType::Team, "Bar").insert(&db).await.unwrap();
    let mut member = new_record(EntityType::Member, "Alex");
    member.team_id = Set(Some(team.id));
    let member = member.insert(&db).await.unwrap();

    record::Entity::delete_by_id(team.id).exec(&db).await.unwrap();

    let reloaded = record::Entity::find_by_id(member.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.team_id, None);
}
