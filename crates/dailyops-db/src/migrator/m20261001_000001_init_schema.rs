//! Initial schema: records and the entity link table

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Create records table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Record::Table)
                    .if_not_exists()
                    .col(uuid(Record::Id).primary_key())
                    .col(string_len(Record::EntityType, 32).not_null())
                    .col(string_len(Record::Title, 512).not_null())
                    .col(string_len_null(Record::Slug, 255))
                    .col(uuid_null(Record::LocationId))
                    .col(uuid_null(Record::TeamId))
                    .col(uuid_null(Record::MemberId))
                    .col(
                        timestamp_with_time_zone(Record::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Record::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // Parent context never dangles: deleting a parent clears it
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_records_location_id")
                            .from(Record::Table, Record::LocationId)
                            .to(Record::Table, Record::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_records_team_id")
                            .from(Record::Table, Record::TeamId)
                            .to(Record::Table, Record::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_records_member_id")
                            .from(Record::Table, Record::MemberId)
                            .to(Record::Table, Record::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_records_entity_type", Record::EntityType),
            ("idx_records_location_id", Record::LocationId),
            ("idx_records_team_id", Record::TeamId),
            ("idx_records_member_id", Record::MemberId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(Record::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        // ============================================================
        // 2. Create entity_links table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(EntityLink::Table)
                    .if_not_exists()
                    .col(uuid(EntityLink::Id).primary_key())
                    .col(string_len(EntityLink::AType, 32).not_null())
                    .col(uuid(EntityLink::AId).not_null())
                    .col(string_len(EntityLink::BType, 32).not_null())
                    .col(uuid(EntityLink::BId).not_null())
                    .col(
                        timestamp_with_time_zone(EntityLink::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entity_links_a_id")
                            .from(EntityLink::Table, EntityLink::AId)
                            .to(Record::Table, Record::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entity_links_b_id")
                            .from(EntityLink::Table, EntityLink::BId)
                            .to(Record::Table, Record::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per unordered pair
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_entity_links_pair")
                    .table(EntityLink::Table)
                    .col(EntityLink::AType)
                    .col(EntityLink::AId)
                    .col(EntityLink::BType)
                    .col(EntityLink::BId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_entity_links_b")
                    .table(EntityLink::Table)
                    .col(EntityLink::BType)
                    .col(EntityLink::BId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_entity_links_created_at")
                    .table(EntityLink::Table)
                    .col(EntityLink::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EntityLink::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Record::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Record {
    #[sea_orm(iden = "records")]
    Table,
    Id,
    EntityType,
    Title,
    Slug,
    LocationId,
    TeamId,
    MemberId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EntityLink {
    #[sea_orm(iden = "entity_links")]
    Table,
    Id,
    AType,
    AId,
    BType,
    BId,
    CreatedAt,
}
