use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::generator::EventKind;

/// Storage-agnostic view of a tracking event. `event_type` stays a free
/// string here: rows written out of band may carry tags outside the known
/// vocabulary and the builder must render them anyway.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct JourneyEvent {
    pub id: Option<Uuid>,
    pub event_type: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Origin,
    Intermediate,
    Destination,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Current,
    Upcoming,
}

/// Which pictogram a step renders with. The consumer maps these to actual
/// assets; the builder only picks the semantic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum StepGlyph {
    Pin,
    Ship,
    Truck,
    Warehouse,
    Check,
    Navigation,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct JourneyStep {
    pub kind: StepKind,
    pub location: String,
    pub milestone: String,
    pub status: StepStatus,
    pub glyph: StepGlyph,
    pub description: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub event_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Journey {
    pub steps: Vec<JourneyStep>,
    /// Stored percentage carried through verbatim, not derived from steps.
    pub progress: i32,
    pub completed_steps: usize,
}

fn is_kind(event: &JourneyEvent, kind: EventKind) -> bool {
    event.event_type.parse::<EventKind>().ok() == Some(kind)
}

fn intermediate_milestone(event: &JourneyEvent) -> (String, StepGlyph) {
    let location = event.location.to_lowercase();
    match event.event_type.parse::<EventKind>() {
        Ok(EventKind::InTransit) => {
            if location.contains("port") || location.contains("harbor") {
                ("At Port".to_string(), StepGlyph::Ship)
            } else if location.contains("ocean") || location.contains("sea") {
                ("Ocean Transit".to_string(), StepGlyph::Ship)
            } else {
                ("In Transit".to_string(), StepGlyph::Truck)
            }
        }
        Ok(EventKind::AtPort) => ("At Port".to_string(), StepGlyph::Warehouse),
        Ok(EventKind::OutForDelivery) => {
            ("Out for Delivery".to_string(), StepGlyph::Truck)
        }
        // Unknown tags still get a step, never an error.
        _ => ("In Transit".to_string(), StepGlyph::Navigation),
    }
}

/// Builds the ordered origin → intermediates → destination view from an
/// unordered event set. Events are sorted ascending by timestamp on a working
/// copy (stable, so equal timestamps keep their input order); the caller's
/// slice is untouched.
pub fn build_journey(
    origin: &str,
    destination: &str,
    events: &[JourneyEvent],
    current_status: &str,
    progress: Option<i32>,
) -> Journey {
    let mut sorted: Vec<&JourneyEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.timestamp);

    let delivered = current_status == "delivered";
    let pickup = sorted.iter().find(|e| is_kind(e, EventKind::Pickup));
    let first_delivered = sorted.iter().find(|e| is_kind(e, EventKind::Delivered));

    let intermediates: Vec<&&JourneyEvent> = sorted
        .iter()
        .filter(|e| !is_kind(e, EventKind::Pickup) && !is_kind(e, EventKind::Delivered))
        .collect();

    let mut steps = Vec::with_capacity(intermediates.len() + 2);

    steps.push(JourneyStep {
        kind: StepKind::Origin,
        location: origin.to_string(),
        milestone: "Origin".to_string(),
        status: StepStatus::Completed,
        glyph: StepGlyph::Pin,
        description: pickup.map(|e| e.description.clone()),
        timestamp: pickup.map(|e| e.timestamp),
        event_id: pickup.and_then(|e| e.id),
    });

    let last_index = intermediates.len().checked_sub(1);
    for (i, event) in intermediates.iter().enumerate() {
        let (milestone, glyph) = intermediate_milestone(event);
        let status = if delivered || Some(i) != last_index {
            StepStatus::Completed
        } else {
            StepStatus::Current
        };
        steps.push(JourneyStep {
            kind: StepKind::Intermediate,
            location: event.location.clone(),
            milestone,
            status,
            glyph,
            description: Some(event.description.clone()),
            timestamp: Some(event.timestamp),
            event_id: event.id,
        });
    }

    steps.push(JourneyStep {
        kind: StepKind::Destination,
        location: destination.to_string(),
        milestone: if delivered { "Delivered" } else { "Destination" }.to_string(),
        status: if delivered {
            StepStatus::Completed
        } else {
            StepStatus::Upcoming
        },
        glyph: if delivered {
            StepGlyph::Check
        } else {
            StepGlyph::Pin
        },
        description: Some(
            first_delivered
                .map(|e| e.description.clone())
                .unwrap_or_else(|| "Final destination".to_string()),
        ),
        timestamp: first_delivered.map(|e| e.timestamp),
        event_id: first_delivered.and_then(|e| e.id),
    });

    let completed_steps = steps
        .iter()
        .filter(|s| s.status == StepStatus::Completed)
        .count();

    Journey {
        steps,
        progress: progress.unwrap_or(0).clamp(0, 100),
        completed_steps,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn event(event_type: &str, location: &str, hours: i64) -> JourneyEvent {
        JourneyEvent {
            id: Some(Uuid::new_v4()),
            event_type: event_type.to_string(),
            location: location.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 7, 15, 8, 0, 0).unwrap()
                + Duration::hours(hours),
            description: format!("{event_type} at {location}"),
        }
    }

    fn current_count(journey: &Journey) -> usize {
        journey
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Current)
            .count()
    }

    #[test]
    fn empty_events_yield_origin_and_destination_only() {
        let journey = build_journey("Berlin", "Madrid", &[], "pending", None);
        assert_eq!(journey.steps.len(), 2);
        assert_eq!(journey.steps[0].kind, StepKind::Origin);
        assert_eq!(journey.steps[0].status, StepStatus::Completed);
        assert_eq!(journey.steps[1].kind, StepKind::Destination);
        assert_eq!(journey.steps[1].status, StepStatus::Upcoming);
        assert_eq!(
            journey.steps[1].description.as_deref(),
            Some("Final destination")
        );
        assert_eq!(current_count(&journey), 0);
        assert_eq!(journey.progress, 0);
    }

    #[test]
    fn step_count_is_surviving_events_plus_two() {
        let events = vec![
            event("pickup", "Berlin", 0),
            event("in_transit", "Berlin Distribution Center", 2),
            event("in_transit", "In Transit - Ocean", 14),
            event("at_port", "Madrid Port", 38),
        ];
        let journey = build_journey("Berlin", "Madrid", &events, "at_port", Some(85));
        // pickup folds into the origin step.
        assert_eq!(journey.steps.len(), 3 + 2);
        assert_eq!(journey.progress, 85);
    }

    #[test]
    fn events_are_ordered_regardless_of_input_order() {
        let events = vec![
            event("at_port", "Madrid Port", 38),
            event("pickup", "Berlin", 0),
            event("in_transit", "Berlin Distribution Center", 2),
        ];
        let journey = build_journey("Berlin", "Madrid", &events, "at_port", None);
        assert_eq!(journey.steps[1].location, "Berlin Distribution Center");
        assert_eq!(journey.steps[1].status, StepStatus::Completed);
        assert_eq!(journey.steps[2].location, "Madrid Port");
        assert_eq!(journey.steps[2].status, StepStatus::Current);
        assert_eq!(current_count(&journey), 1);
        // Origin takes the pickup's timestamp.
        assert_eq!(journey.steps[0].timestamp, Some(events[1].timestamp));
    }

    #[test]
    fn at_most_one_current_step() {
        let events = vec![
            event("pickup", "Berlin", 0),
            event("in_transit", "A", 1),
            event("in_transit", "B", 2),
            event("in_transit", "C", 3),
            event("at_port", "Madrid Port", 4),
        ];
        let journey = build_journey("Berlin", "Madrid", &events, "at_port", None);
        assert_eq!(current_count(&journey), 1);
        let current = journey
            .steps
            .iter()
            .position(|s| s.status == StepStatus::Current);
        assert_eq!(current, Some(journey.steps.len() - 2));
    }

    #[test]
    fn delivered_status_collapses_everything_to_completed() {
        let events = vec![
            event("pickup", "Berlin", 0),
            event("in_transit", "A", 1),
            event("at_port", "Madrid Port", 2),
            event("delivered", "Madrid", 3),
        ];
        let journey = build_journey("Berlin", "Madrid", &events, "delivered", Some(100));
        assert_eq!(current_count(&journey), 0);
        assert!(
            journey
                .steps
                .iter()
                .all(|s| s.status == StepStatus::Completed)
        );
        let destination = journey.steps.last().unwrap();
        assert_eq!(destination.milestone, "Delivered");
        assert_eq!(destination.glyph, StepGlyph::Check);
        assert_eq!(destination.description.as_deref(), Some("delivered at Madrid"));
        assert_eq!(journey.completed_steps, journey.steps.len());
    }

    #[test]
    fn multiple_delivered_events_feed_destination_from_the_first() {
        let events = vec![
            event("delivered", "Madrid Again", 5),
            event("delivered", "Madrid", 3),
            event("pickup", "Berlin", 0),
        ];
        let journey = build_journey("Berlin", "Madrid", &events, "delivered", None);
        // Neither delivered event becomes an intermediate.
        assert_eq!(journey.steps.len(), 2);
        assert_eq!(
            journey.steps[1].description.as_deref(),
            Some("delivered at Madrid")
        );
        assert_eq!(journey.steps[1].timestamp, Some(events[1].timestamp));
    }

    #[test]
    fn milestone_heuristics_follow_location_keywords() {
        let cases = [
            ("in_transit", "Hamburg Port", "At Port", StepGlyph::Ship),
            ("in_transit", "Pearl Harbor", "At Port", StepGlyph::Ship),
            ("in_transit", "In Transit - Ocean", "Ocean Transit", StepGlyph::Ship),
            ("in_transit", "North Sea", "Ocean Transit", StepGlyph::Ship),
            ("in_transit", "Autobahn 9", "In Transit", StepGlyph::Truck),
            ("at_port", "Madrid Port", "At Port", StepGlyph::Warehouse),
            (
                "out_for_delivery",
                "Madrid",
                "Out for Delivery",
                StepGlyph::Truck,
            ),
        ];
        for (event_type, location, milestone, glyph) in cases {
            let events = vec![event(event_type, location, 1)];
            let journey = build_journey("Berlin", "Madrid", &events, "in_transit", None);
            let step = &journey.steps[1];
            assert_eq!(step.milestone, milestone, "{event_type} @ {location}");
            assert_eq!(step.glyph, glyph, "{event_type} @ {location}");
        }
    }

    #[test]
    fn unknown_event_type_gets_the_fallback_step() {
        let events = vec![event("customs_hold", "Madrid Customs", 1)];
        let journey = build_journey("Berlin", "Madrid", &events, "in_transit", None);
        assert_eq!(journey.steps.len(), 3);
        let step = &journey.steps[1];
        assert_eq!(step.milestone, "In Transit");
        assert_eq!(step.glyph, StepGlyph::Navigation);
        assert_eq!(step.status, StepStatus::Current);
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let events = vec![
            event("in_transit", "First", 1),
            event("in_transit", "Second", 1),
        ];
        let journey = build_journey("Berlin", "Madrid", &events, "in_transit", None);
        assert_eq!(journey.steps[1].location, "First");
        assert_eq!(journey.steps[2].location, "Second");
        assert_eq!(journey.steps[2].status, StepStatus::Current);
    }

    #[test]
    fn progress_is_clamped_and_independent_of_steps() {
        let journey = build_journey("Berlin", "Madrid", &[], "pending", Some(250));
        assert_eq!(journey.progress, 100);
        let journey = build_journey("Berlin", "Madrid", &[], "pending", Some(-5));
        assert_eq!(journey.progress, 0);
        assert_eq!(journey.completed_steps, 1);
    }
}
