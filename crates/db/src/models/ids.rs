use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::{shipment, support_ticket, tracking_event};

pub async fn shipment_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    shipment::Entity::find()
        .select_only()
        .column(shipment::Column::Id)
        .filter(shipment::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn shipment_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    shipment::Entity::find()
        .select_only()
        .column(shipment::Column::Uuid)
        .filter(shipment::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn tracking_event_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    tracking_event::Entity::find()
        .select_only()
        .column(tracking_event::Column::Id)
        .filter(tracking_event::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn tracking_event_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    tracking_event::Entity::find()
        .select_only()
        .column(tracking_event::Column::Uuid)
        .filter(tracking_event::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn support_ticket_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    support_ticket::Entity::find()
        .select_only()
        .column(support_ticket::Column::Id)
        .filter(support_ticket::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn support_ticket_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    support_ticket::Entity::find()
        .select_only()
        .column(support_ticket::Column::Uuid)
        .filter(support_ticket::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}
