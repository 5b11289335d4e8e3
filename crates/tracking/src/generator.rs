use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

pub const TRACKING_NUMBER_PREFIX: &str = "FLIP";

const ETA_DAYS_INTERNATIONAL: i64 = 20;
const ETA_DAYS_DOMESTIC: i64 = 14;

const PROCESSING_OFFSET_HOURS: i64 = 2;
const LEG_HOURS_INTERNATIONAL: i64 = 12;
const LEG_HOURS_DOMESTIC: i64 = 6;
const ARRIVAL_HOURS_INTERNATIONAL: i64 = 24;
const ARRIVAL_HOURS_DOMESTIC: i64 = 12;
const STUCK_FOLLOW_UP_DAYS: i64 = 2;
const STUCK_FOLLOW_UPS: usize = 3;

/// The event vocabulary the rest of the system understands. Storage keeps
/// the tag as a free string, so unknown values are possible on the read path.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, TS, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Pickup,
    InTransit,
    AtPort,
    OutForDelivery,
    Delivered,
    Failed,
}

impl EventKind {
    pub fn default_icon(&self) -> &'static str {
        match self {
            EventKind::Pickup => "📦",
            EventKind::InTransit => "🚚",
            EventKind::AtPort => "⚠️",
            EventKind::OutForDelivery => "🚚",
            EventKind::Delivered => "✅",
            EventKind::Failed => "🚨",
        }
    }
}

/// Inputs for one generation run.
#[derive(Debug, Clone)]
pub struct RouteInfo {
    pub origin: String,
    pub destination: String,
    pub shipment_id: Uuid,
    pub start_date: DateTime<Utc>,
}

/// How an international route crosses the distance. Picked from the injected
/// RNG so tests can pin the exact output of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum TransportProfile {
    Ocean,
    Air,
}

impl TransportProfile {
    fn sample<R: Rng>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            TransportProfile::Ocean
        } else {
            TransportProfile::Air
        }
    }

    fn leg_icon(&self) -> &'static str {
        match self {
            TransportProfile::Ocean => "🚢",
            TransportProfile::Air => "✈️",
        }
    }
}

/// One synthesized milestone, ready for a bulk insert. Row id and created_at
/// are assigned by storage.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct GeneratedEvent {
    pub shipment_id: Uuid,
    pub event_type: EventKind,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub icon: String,
}

/// A route is treated as international when either endpoint carries a
/// ", Country" qualifier and the endpoints differ. String heuristic, not
/// geodata; the original system works the same way.
pub fn is_international_route(origin: &str, destination: &str) -> bool {
    origin != destination && (origin.contains(',') || destination.contains(','))
}

fn city_of(place: &str) -> &str {
    place.split(',').next().unwrap_or(place).trim()
}

/// Synthesizes the full pickup → transit → stuck-at-port event sequence for
/// a new shipment. Timestamps are strictly increasing from `start_date`; the
/// sequence never contains a `delivered` event — the scenario deliberately
/// parks the shipment at the destination port.
pub fn generate_tracking_events<R: Rng>(route: &RouteInfo, rng: &mut R) -> Vec<GeneratedEvent> {
    let origin_city = city_of(&route.origin);
    let destination_city = city_of(&route.destination);
    let international = is_international_route(&route.origin, &route.destination);

    let mut events = Vec::with_capacity(9);
    let mut cursor = route.start_date;

    events.push(GeneratedEvent {
        shipment_id: route.shipment_id,
        event_type: EventKind::Pickup,
        location: route.origin.clone(),
        timestamp: cursor,
        description: format!("Shipment picked up from {origin_city}"),
        icon: "📦".to_string(),
    });

    cursor += Duration::hours(PROCESSING_OFFSET_HOURS);
    events.push(GeneratedEvent {
        shipment_id: route.shipment_id,
        event_type: EventKind::InTransit,
        location: format!("{origin_city} Distribution Center"),
        timestamp: cursor,
        description: "Package processed and loaded for transport".to_string(),
        icon: "📦".to_string(),
    });

    let (legs, leg_icon) = if international {
        let profile = TransportProfile::sample(rng);
        let legs = match profile {
            TransportProfile::Ocean => vec![
                format!("{origin_city} Port"),
                "In Transit - Ocean".to_string(),
                "Approaching Destination".to_string(),
            ],
            TransportProfile::Air => vec![
                format!("{origin_city} International Airport"),
                "In Flight".to_string(),
                format!("{destination_city} International Airport"),
            ],
        };
        (legs, profile.leg_icon())
    } else {
        (
            vec![
                format!("{origin_city} Border"),
                format!("{destination_city} Region"),
            ],
            "🚚",
        )
    };

    let leg_hours = if international {
        LEG_HOURS_INTERNATIONAL
    } else {
        LEG_HOURS_DOMESTIC
    };
    for location in legs {
        cursor += Duration::hours(leg_hours);
        events.push(GeneratedEvent {
            shipment_id: route.shipment_id,
            event_type: EventKind::InTransit,
            description: format!("En route - Passed through {location}"),
            location,
            timestamp: cursor,
            icon: leg_icon.to_string(),
        });
    }

    let arrival_port = if international {
        format!("{destination_city} Port")
    } else {
        format!("{destination_city} Distribution Center")
    };
    cursor += Duration::hours(if international {
        ARRIVAL_HOURS_INTERNATIONAL
    } else {
        ARRIVAL_HOURS_DOMESTIC
    });
    events.push(GeneratedEvent {
        shipment_id: route.shipment_id,
        event_type: EventKind::AtPort,
        location: arrival_port.clone(),
        timestamp: cursor,
        description: format!(
            "Arrived at {arrival_port} - Container held at facility. \
             Contact Fliproute for local delivery arrangements"
        ),
        icon: "⚠️".to_string(),
    });

    let held_at = arrival_port.to_lowercase();
    let follow_ups = [
        format!(
            "Container still held at {held_at} - Awaiting local delivery coordination. \
             Please contact Fliproute for assistance"
        ),
        format!(
            "Container remains at {held_at} - Action required: Contact Fliproute \
             immediately for local delivery and customs clearance"
        ),
        "Container awaiting local delivery coordination - Please contact Fliproute \
         customer service for assistance"
            .to_string(),
    ];
    for (i, description) in follow_ups.into_iter().enumerate() {
        cursor += Duration::days(STUCK_FOLLOW_UP_DAYS);
        events.push(GeneratedEvent {
            shipment_id: route.shipment_id,
            event_type: EventKind::AtPort,
            location: arrival_port.clone(),
            timestamp: cursor,
            description,
            icon: if i == STUCK_FOLLOW_UPS - 1 { "🚨" } else { "⏸️" }.to_string(),
        });
    }

    events
}

/// Canonical tracking number: `FLIP` + six zero-padded digits. Uniqueness is
/// the storage layer's concern (unique index, regenerate on conflict).
pub fn generate_tracking_number<R: Rng>(rng: &mut R) -> String {
    format!(
        "{TRACKING_NUMBER_PREFIX}{:06}",
        rng.gen_range(0..1_000_000u32)
    )
}

/// Estimated delivery date: start + 20 days for international routes,
/// start + 14 days otherwise.
pub fn calculate_eta(start_date: DateTime<Utc>, origin: &str, destination: &str) -> NaiveDate {
    let days = if is_international_route(origin, destination) {
        ETA_DAYS_INTERNATIONAL
    } else {
        ETA_DAYS_DOMESTIC
    };
    (start_date + Duration::days(days)).date_naive()
}
