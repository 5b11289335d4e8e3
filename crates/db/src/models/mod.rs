pub mod event_outbox;
pub mod ids;
pub mod shipment;
pub mod support_ticket;
pub mod tracking_event;
