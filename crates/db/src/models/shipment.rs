use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

pub use crate::types::ShipmentStatus;

use crate::{
    entities::shipment,
    events::{
        EVENT_SHIPMENT_CREATED, EVENT_SHIPMENT_DELETED, EVENT_SHIPMENT_UPDATED,
        ShipmentEventPayload,
    },
    models::event_outbox::EventOutbox,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Shipment {
    pub id: Uuid,
    pub tracking_number: String,
    pub origin: String,
    pub destination: String,
    pub status: ShipmentStatus,
    pub progress: i32,
    pub eta: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateShipment {
    pub tracking_number: String,
    pub origin: String,
    pub destination: String,
    pub status: Option<ShipmentStatus>,
    pub progress: Option<i32>,
    pub eta: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct UpdateShipment {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub status: Option<ShipmentStatus>,
    pub progress: Option<i32>,
    pub eta: Option<NaiveDate>,
}

impl Shipment {
    fn from_model(model: shipment::Model) -> Self {
        Self {
            id: model.uuid,
            tracking_number: model.tracking_number,
            origin: model.origin,
            destination: model.destination,
            status: model.status,
            progress: model.progress,
            eta: model.eta,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let models = shipment::Entity::find()
            .order_by_desc(shipment::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = shipment::Entity::find()
            .filter(shipment::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_tracking_number<C: ConnectionTrait>(
        db: &C,
        tracking_number: &str,
    ) -> Result<Option<Self>, DbErr> {
        let record = shipment::Entity::find()
            .filter(shipment::Column::TrackingNumber.eq(tracking_number))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateShipment,
        shipment_id: Uuid,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = shipment::ActiveModel {
            uuid: Set(shipment_id),
            tracking_number: Set(data.tracking_number.clone()),
            origin: Set(data.origin.clone()),
            destination: Set(data.destination.clone()),
            status: Set(data.status.clone().unwrap_or_default()),
            progress: Set(data.progress.unwrap_or(0).clamp(0, 100)),
            eta: Set(data.eta),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        let payload = serde_json::to_value(ShipmentEventPayload { shipment_id })
            .map_err(|err| DbErr::Custom(err.to_string()))?;
        EventOutbox::enqueue(db, EVENT_SHIPMENT_CREATED, "shipment", shipment_id, payload)
            .await?;
        Ok(Self::from_model(model))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateShipment,
    ) -> Result<Self, DbErr> {
        let record = shipment::Entity::find()
            .filter(shipment::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Shipment not found".to_string()))?;

        let mut active: shipment::ActiveModel = record.into();
        if let Some(origin) = &data.origin {
            active.origin = Set(origin.clone());
        }
        if let Some(destination) = &data.destination {
            active.destination = Set(destination.clone());
        }
        if let Some(status) = &data.status {
            active.status = Set(status.clone());
        }
        if let Some(progress) = data.progress {
            active.progress = Set(progress.clamp(0, 100));
        }
        if let Some(eta) = data.eta {
            active.eta = Set(Some(eta));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(db).await?;
        let payload = serde_json::to_value(ShipmentEventPayload { shipment_id: id })
            .map_err(|err| DbErr::Custom(err.to_string()))?;
        EventOutbox::enqueue(db, EVENT_SHIPMENT_UPDATED, "shipment", id, payload).await?;
        Ok(Self::from_model(updated))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), DbErr> {
        let record = shipment::Entity::find()
            .filter(shipment::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Shipment not found".to_string()))?;

        record.delete(db).await?;
        let payload = serde_json::to_value(ShipmentEventPayload { shipment_id: id })
            .map_err(|err| DbErr::Custom(err.to_string()))?;
        EventOutbox::enqueue(db, EVENT_SHIPMENT_DELETED, "shipment", id, payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn create_data(tracking_number: &str) -> CreateShipment {
        CreateShipment {
            tracking_number: tracking_number.to_string(),
            origin: "Berlin, Germany".to_string(),
            destination: "Madrid, Spain".to_string(),
            status: None,
            progress: None,
            eta: None,
        }
    }

    #[tokio::test]
    async fn create_find_update_delete_roundtrip() {
        let db = setup_db().await;
        let id = Uuid::new_v4();

        let shipment = Shipment::create(&db, &create_data("FLIP000042"), id)
            .await
            .unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Pending);
        assert_eq!(shipment.progress, 0);

        let found = Shipment::find_by_id(&db, id).await.unwrap().unwrap();
        assert_eq!(found.tracking_number, "FLIP000042");

        let by_number = Shipment::find_by_tracking_number(&db, "FLIP000042")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_number.id, id);
        assert!(
            Shipment::find_by_tracking_number(&db, "FLIP999999")
                .await
                .unwrap()
                .is_none()
        );

        let updated = Shipment::update(
            &db,
            id,
            &UpdateShipment {
                origin: None,
                destination: None,
                status: Some(ShipmentStatus::Delivered),
                progress: Some(250),
                eta: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, ShipmentStatus::Delivered);
        assert_eq!(updated.progress, 100);
        assert_eq!(updated.origin, "Berlin, Germany");

        Shipment::delete(&db, id).await.unwrap();
        assert!(Shipment::find_by_id(&db, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_all_lists_newest_first() {
        let db = setup_db().await;
        for n in 0..3 {
            Shipment::create(&db, &create_data(&format!("FLIP00000{n}")), Uuid::new_v4())
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let all = Shipment::find_all(&db).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].created_at >= all[1].created_at);
        assert!(all[1].created_at >= all[2].created_at);
    }
}
