use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracking::{EventKind, GeneratedEvent, JourneyEvent};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::tracking_event,
    events::{
        EVENT_TRACKING_EVENT_CREATED, EVENT_TRACKING_EVENT_DELETED, EVENT_TRACKING_EVENT_UPDATED,
        TrackingEventEventPayload,
    },
    models::{event_outbox::EventOutbox, ids},
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TrackingEvent {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub event_type: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTrackingEvent {
    pub shipment_id: Uuid,
    pub event_type: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub icon: Option<String>,
}

impl From<GeneratedEvent> for CreateTrackingEvent {
    fn from(event: GeneratedEvent) -> Self {
        Self {
            shipment_id: event.shipment_id,
            event_type: event.event_type.to_string(),
            location: event.location,
            timestamp: event.timestamp,
            description: event.description,
            icon: Some(event.icon),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct UpdateTrackingEvent {
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl TrackingEvent {
    async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: tracking_event::Model,
    ) -> Result<Self, DbErr> {
        let shipment_id = ids::shipment_uuid_by_id(db, model.shipment_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Shipment not found".to_string()))?;
        Ok(Self {
            id: model.uuid,
            shipment_id,
            event_type: model.event_type,
            location: model.location,
            timestamp: model.timestamp,
            description: model.description,
            icon: model.icon,
            created_at: model.created_at,
        })
    }

    /// View consumed by the journey builder.
    pub fn to_journey_event(&self) -> JourneyEvent {
        JourneyEvent {
            id: Some(self.id),
            event_type: self.event_type.clone(),
            location: self.location.clone(),
            timestamp: self.timestamp,
            description: self.description.clone(),
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = tracking_event::Entity::find()
            .filter(tracking_event::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let models = tracking_event::Entity::find()
            .order_by_desc(tracking_event::Column::Timestamp)
            .all(db)
            .await?;
        let mut events = Vec::with_capacity(models.len());
        for model in models {
            events.push(Self::from_model(db, model).await?);
        }
        Ok(events)
    }

    /// Newest first; the journey builder re-sorts ascending itself.
    pub async fn find_by_shipment_id<C: ConnectionTrait>(
        db: &C,
        shipment_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let shipment_row_id = ids::shipment_id_by_uuid(db, shipment_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Shipment not found".to_string()))?;

        let models = tracking_event::Entity::find()
            .filter(tracking_event::Column::ShipmentId.eq(shipment_row_id))
            .order_by_desc(tracking_event::Column::Timestamp)
            .all(db)
            .await?;

        let mut events = Vec::with_capacity(models.len());
        for model in models {
            events.push(Self::from_model(db, model).await?);
        }
        Ok(events)
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTrackingEvent,
        event_id: Uuid,
    ) -> Result<Self, DbErr> {
        let shipment_row_id = ids::shipment_id_by_uuid(db, data.shipment_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Shipment not found".to_string()))?;

        let icon = data.icon.clone().or_else(|| {
            data.event_type
                .parse::<EventKind>()
                .ok()
                .map(|kind| kind.default_icon().to_string())
        });

        let active = tracking_event::ActiveModel {
            uuid: Set(event_id),
            shipment_id: Set(shipment_row_id),
            event_type: Set(data.event_type.clone()),
            location: Set(data.location.clone()),
            timestamp: Set(data.timestamp),
            description: Set(data.description.clone()),
            icon: Set(icon),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        let payload = serde_json::to_value(TrackingEventEventPayload {
            event_id,
            shipment_id: data.shipment_id,
        })
        .map_err(|err| DbErr::Custom(err.to_string()))?;
        EventOutbox::enqueue(
            db,
            EVENT_TRACKING_EVENT_CREATED,
            "tracking_event",
            event_id,
            payload,
        )
        .await?;
        Self::from_model(db, model).await
    }

    /// Bulk insert for the generator output. Row failures are logged and
    /// skipped; the shipment stays valid with a sparse event set.
    pub async fn create_many<C: ConnectionTrait>(
        db: &C,
        data: Vec<CreateTrackingEvent>,
    ) -> Result<usize, DbErr> {
        let mut inserted = 0;
        for event in data {
            match Self::create(db, &event, Uuid::new_v4()).await {
                Ok(_) => inserted += 1,
                Err(err) => {
                    tracing::warn!(
                        "Failed to insert tracking event at {} for shipment {}: {}",
                        event.location,
                        event.shipment_id,
                        err
                    );
                }
            }
        }
        Ok(inserted)
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateTrackingEvent,
    ) -> Result<Self, DbErr> {
        let record = tracking_event::Entity::find()
            .filter(tracking_event::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Tracking event not found".to_string()))?;

        let shipment_id = ids::shipment_uuid_by_id(db, record.shipment_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Shipment not found".to_string()))?;

        let mut active: tracking_event::ActiveModel = record.into();
        if let Some(event_type) = &data.event_type {
            active.event_type = Set(event_type.clone());
        }
        if let Some(location) = &data.location {
            active.location = Set(location.clone());
        }
        if let Some(timestamp) = data.timestamp {
            active.timestamp = Set(timestamp);
        }
        if let Some(description) = &data.description {
            active.description = Set(description.clone());
        }
        if let Some(icon) = &data.icon {
            active.icon = Set(Some(icon.clone()));
        }

        let updated = active.update(db).await?;
        let payload = serde_json::to_value(TrackingEventEventPayload {
            event_id: id,
            shipment_id,
        })
        .map_err(|err| DbErr::Custom(err.to_string()))?;
        EventOutbox::enqueue(
            db,
            EVENT_TRACKING_EVENT_UPDATED,
            "tracking_event",
            id,
            payload,
        )
        .await?;
        Self::from_model(db, updated).await
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), DbErr> {
        let record = tracking_event::Entity::find()
            .filter(tracking_event::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Tracking event not found".to_string()))?;

        let shipment_id = ids::shipment_uuid_by_id(db, record.shipment_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Shipment not found".to_string()))?;

        record.delete(db).await?;
        let payload = serde_json::to_value(TrackingEventEventPayload {
            event_id: id,
            shipment_id,
        })
        .map_err(|err| DbErr::Custom(err.to_string()))?;
        EventOutbox::enqueue(
            db,
            EVENT_TRACKING_EVENT_DELETED,
            "tracking_event",
            id,
            payload,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::shipment::{CreateShipment, Shipment};

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn create_shipment(db: &sea_orm::DatabaseConnection) -> Uuid {
        let id = Uuid::new_v4();
        Shipment::create(
            db,
            &CreateShipment {
                tracking_number: format!("FLIP{:06}", Uuid::new_v4().as_u128() % 1_000_000),
                origin: "Berlin, Germany".to_string(),
                destination: "Madrid, Spain".to_string(),
                status: None,
                progress: None,
                eta: None,
            },
            id,
        )
        .await
        .unwrap();
        id
    }

    fn event_data(shipment_id: Uuid, location: &str, hour: u32) -> CreateTrackingEvent {
        CreateTrackingEvent {
            shipment_id,
            event_type: "in_transit".to_string(),
            location: location.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 7, 15, hour, 0, 0).unwrap(),
            description: format!("Passed through {location}"),
            icon: None,
        }
    }

    #[tokio::test]
    async fn create_applies_default_icon_for_known_types() {
        let db = setup_db().await;
        let shipment_id = create_shipment(&db).await;

        let event = TrackingEvent::create(
            &db,
            &event_data(shipment_id, "Berlin Border", 10),
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        assert_eq!(event.icon.as_deref(), Some("🚚"));

        let mut unknown = event_data(shipment_id, "Customs", 11);
        unknown.event_type = "customs_hold".to_string();
        let event = TrackingEvent::create(&db, &unknown, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(event.icon, None);
    }

    #[tokio::test]
    async fn find_by_shipment_id_returns_newest_first() {
        let db = setup_db().await;
        let shipment_id = create_shipment(&db).await;

        for hour in [8, 12, 10] {
            TrackingEvent::create(
                &db,
                &event_data(shipment_id, &format!("Stop {hour}"), hour),
                Uuid::new_v4(),
            )
            .await
            .unwrap();
        }

        let events = TrackingEvent::find_by_shipment_id(&db, shipment_id)
            .await
            .unwrap();
        assert_eq!(events.len(), 3);
        assert!(events[0].timestamp >= events[1].timestamp);
        assert!(events[1].timestamp >= events[2].timestamp);
        assert!(events.iter().all(|e| e.shipment_id == shipment_id));
    }

    #[tokio::test]
    async fn create_many_skips_rows_for_missing_shipments() {
        let db = setup_db().await;
        let shipment_id = create_shipment(&db).await;

        let batch = vec![
            event_data(shipment_id, "Berlin Border", 8),
            event_data(Uuid::new_v4(), "Nowhere", 9),
            event_data(shipment_id, "Madrid Region", 10),
        ];
        let inserted = TrackingEvent::create_many(&db, batch).await.unwrap();
        assert_eq!(inserted, 2);

        let events = TrackingEvent::find_by_shipment_id(&db, shipment_id)
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn update_and_delete_roundtrip() {
        let db = setup_db().await;
        let shipment_id = create_shipment(&db).await;
        let event_id = Uuid::new_v4();
        TrackingEvent::create(&db, &event_data(shipment_id, "Berlin Border", 8), event_id)
            .await
            .unwrap();

        let updated = TrackingEvent::update(
            &db,
            event_id,
            &UpdateTrackingEvent {
                event_type: Some("at_port".to_string()),
                location: None,
                timestamp: None,
                description: None,
                icon: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.event_type, "at_port");
        assert_eq!(updated.location, "Berlin Border");

        TrackingEvent::delete(&db, event_id).await.unwrap();
        assert!(
            TrackingEvent::find_by_id(&db, event_id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn deleting_a_shipment_cascades_to_its_events() {
        let db = setup_db().await;
        let shipment_id = create_shipment(&db).await;
        TrackingEvent::create(
            &db,
            &event_data(shipment_id, "Berlin Border", 8),
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        Shipment::delete(&db, shipment_id).await.unwrap();
        assert!(TrackingEvent::find_all(&db).await.unwrap().is_empty());
    }
}
