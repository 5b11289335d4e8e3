use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const EVENT_SHIPMENT_CREATED: &str = "shipment.created";
pub const EVENT_SHIPMENT_UPDATED: &str = "shipment.updated";
pub const EVENT_SHIPMENT_DELETED: &str = "shipment.deleted";

pub const EVENT_TRACKING_EVENT_CREATED: &str = "tracking_event.created";
pub const EVENT_TRACKING_EVENT_UPDATED: &str = "tracking_event.updated";
pub const EVENT_TRACKING_EVENT_DELETED: &str = "tracking_event.deleted";

pub const EVENT_SUPPORT_TICKET_CREATED: &str = "support_ticket.created";
pub const EVENT_SUPPORT_TICKET_UPDATED: &str = "support_ticket.updated";
pub const EVENT_SUPPORT_TICKET_DELETED: &str = "support_ticket.deleted";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentEventPayload {
    pub shipment_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEventEventPayload {
    pub event_id: Uuid,
    pub shipment_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportTicketEventPayload {
    pub ticket_id: Uuid,
}
