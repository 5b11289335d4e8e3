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
                    .table(SupportTickets::Table)
                    .col(pk_id_col(manager, SupportTickets::Id))
                    .col(uuid_col(SupportTickets::Uuid))
                    .col(ColumnDef::new(SupportTickets::Subject).string().not_null())
                    .col(ColumnDef::new(SupportTickets::Body).text().not_null())
                    .col(
                        ColumnDef::new(SupportTickets::RequesterEmail)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SupportTickets::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("open")),
                    )
                    .col(timestamp_col(SupportTickets::CreatedAt))
                    .col(timestamp_col(SupportTickets::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_support_tickets_uuid")
                    .table(SupportTickets::Table)
                    .col(SupportTickets::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_support_tickets_status")
                    .table(SupportTickets::Table)
                    .col(SupportTickets::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SupportTickets::Table).to_owned())
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
enum SupportTickets {
    Table,
    Id,
    Uuid,
    Subject,
    Body,
    RequesterEmail,
    Status,
    CreatedAt,
    UpdatedAt,
}
