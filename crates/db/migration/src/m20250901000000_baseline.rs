use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Shipments::Table)
                    .col(pk_id_col(manager, Shipments::Id))
                    .col(uuid_col(Shipments::Uuid))
                    .col(
                        ColumnDef::new(Shipments::TrackingNumber)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Shipments::Origin).string().not_null())
                    .col(ColumnDef::new(Shipments::Destination).string().not_null())
                    .col(
                        ColumnDef::new(Shipments::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("pending")),
                    )
                    .col(
                        ColumnDef::new(Shipments::Progress)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(ColumnDef::new(Shipments::Eta).date())
                    .col(timestamp_col(Shipments::CreatedAt))
                    .col(timestamp_col(Shipments::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_shipments_uuid")
                    .table(Shipments::Table)
                    .col(Shipments::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_shipments_tracking_number")
                    .table(Shipments::Table)
                    .col(Shipments::TrackingNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(TrackingEvents::Table)
                    .col(pk_id_col(manager, TrackingEvents::Id))
                    .col(uuid_col(TrackingEvents::Uuid))
                    .col(fk_id_col(manager, TrackingEvents::ShipmentId))
                    .col(
                        ColumnDef::new(TrackingEvents::EventType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TrackingEvents::Location).string().not_null())
                    .col(
                        ColumnDef::new(TrackingEvents::Timestamp)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TrackingEvents::Description)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TrackingEvents::Icon).string())
                    .col(timestamp_col(TrackingEvents::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tracking_events_shipment_id")
                            .from(TrackingEvents::Table, TrackingEvents::ShipmentId)
                            .to(Shipments::Table, Shipments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tracking_events_uuid")
                    .table(TrackingEvents::Table)
                    .col(TrackingEvents::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tracking_events_shipment_id")
                    .table(TrackingEvents::Table)
                    .col(TrackingEvents::ShipmentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(EventOutbox::Table)
                    .col(pk_id_col(manager, EventOutbox::Id))
                    .col(uuid_col(EventOutbox::Uuid))
                    .col(
                        ColumnDef::new(EventOutbox::EventType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventOutbox::EntityType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(uuid_col(EventOutbox::EntityUuid))
                    .col(ColumnDef::new(EventOutbox::Payload).json().not_null())
                    .col(timestamp_col(EventOutbox::CreatedAt))
                    .col(ColumnDef::new(EventOutbox::PublishedAt).timestamp())
                    .col(
                        ColumnDef::new(EventOutbox::Attempts)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(ColumnDef::new(EventOutbox::LastError).text())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_event_outbox_uuid")
                    .table(EventOutbox::Table)
                    .col(EventOutbox::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_event_outbox_published_at")
                    .table(EventOutbox::Table)
                    .col(EventOutbox::PublishedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_event_outbox_entity_uuid")
                    .table(EventOutbox::Table)
                    .col(EventOutbox::EntityUuid)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventOutbox::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TrackingEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Shipments::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden + 'static>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn fk_id_col<T: Iden + 'static>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().to_owned()
}

fn uuid_col<T: Iden + 'static>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn timestamp_col<T: Iden + 'static>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum Shipments {
    Table,
    Id,
    Uuid,
    TrackingNumber,
    Origin,
    Destination,
    Status,
    Progress,
    Eta,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TrackingEvents {
    Table,
    Id,
    Uuid,
    ShipmentId,
    EventType,
    Location,
    Timestamp,
    Description,
    Icon,
    CreatedAt,
}

#[derive(Iden)]
enum EventOutbox {
    Table,
    Id,
    Uuid,
    EventType,
    EntityType,
    EntityUuid,
    Payload,
    CreatedAt,
    PublishedAt,
    Attempts,
    LastError,
}
