use sea_orm::{ConnectionTrait, DbErr};
use tracking::{Journey, JourneyEvent, build_journey};
use uuid::Uuid;

use db::models::{shipment::Shipment, tracking_event::TrackingEvent};

/// Rebuilds the journey view from stored state. Called on every read of the
/// journey endpoint and on every storage change notification; there is no
/// caching or debouncing, one notification means one full rebuild.
pub async fn load_journey<C: ConnectionTrait>(
    db: &C,
    shipment: &Shipment,
) -> Result<Journey, DbErr> {
    let events = TrackingEvent::find_by_shipment_id(db, shipment.id).await?;
    let journey_events: Vec<JourneyEvent> = events
        .iter()
        .map(TrackingEvent::to_journey_event)
        .collect();

    Ok(build_journey(
        &shipment.origin,
        &shipment.destination,
        &journey_events,
        &shipment.status.to_string(),
        Some(shipment.progress),
    ))
}

pub async fn load_journey_by_id<C: ConnectionTrait>(
    db: &C,
    shipment_id: Uuid,
) -> Result<Option<Journey>, DbErr> {
    let Some(shipment) = Shipment::find_by_id(db, shipment_id).await? else {
        return Ok(None);
    };
    Ok(Some(load_journey(db, &shipment).await?))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;
    use tracking::{StepKind, StepStatus};

    use super::*;
    use db::models::{
        shipment::{CreateShipment, ShipmentStatus, UpdateShipment},
        tracking_event::CreateTrackingEvent,
    };

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn seed_shipment(db: &sea_orm::DatabaseConnection) -> Shipment {
        Shipment::create(
            db,
            &CreateShipment {
                tracking_number: "FLIP000777".to_string(),
                origin: "Berlin, Germany".to_string(),
                destination: "Madrid, Spain".to_string(),
                status: Some(ShipmentStatus::AtPort),
                progress: Some(85),
                eta: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap()
    }

    fn event(shipment_id: Uuid, event_type: &str, location: &str, hour: u32) -> CreateTrackingEvent {
        CreateTrackingEvent {
            shipment_id,
            event_type: event_type.to_string(),
            location: location.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 7, 15, hour, 0, 0).unwrap(),
            description: format!("{event_type} at {location}"),
            icon: None,
        }
    }

    #[tokio::test]
    async fn journey_is_rebuilt_from_stored_events() {
        let db = setup_db().await;
        let shipment = seed_shipment(&db).await;

        TrackingEvent::create_many(
            &db,
            vec![
                event(shipment.id, "pickup", "Berlin, Germany", 8),
                event(shipment.id, "in_transit", "Berlin Port", 10),
                event(shipment.id, "at_port", "Madrid Port", 20),
            ],
        )
        .await
        .unwrap();

        let journey = load_journey(&db, &shipment).await.unwrap();
        assert_eq!(journey.steps.len(), 4);
        assert_eq!(journey.progress, 85);
        assert_eq!(journey.steps[0].kind, StepKind::Origin);
        assert_eq!(journey.steps[2].status, StepStatus::Current);
        assert_eq!(journey.steps[3].status, StepStatus::Upcoming);
    }

    #[tokio::test]
    async fn status_change_recolors_the_journey() {
        let db = setup_db().await;
        let shipment = seed_shipment(&db).await;
        TrackingEvent::create_many(
            &db,
            vec![
                event(shipment.id, "pickup", "Berlin, Germany", 8),
                event(shipment.id, "at_port", "Madrid Port", 20),
            ],
        )
        .await
        .unwrap();

        Shipment::update(
            &db,
            shipment.id,
            &UpdateShipment {
                origin: None,
                destination: None,
                status: Some(ShipmentStatus::Delivered),
                progress: Some(100),
                eta: None,
            },
        )
        .await
        .unwrap();

        let journey = load_journey_by_id(&db, shipment.id)
            .await
            .unwrap()
            .expect("journey");
        assert!(
            journey
                .steps
                .iter()
                .all(|s| s.status == StepStatus::Completed)
        );
        assert_eq!(journey.steps.last().unwrap().milestone, "Delivered");
    }

    #[tokio::test]
    async fn missing_shipment_yields_none() {
        let db = setup_db().await;
        assert!(
            load_journey_by_id(&db, Uuid::new_v4())
                .await
                .unwrap()
                .is_none()
        );
    }
}
