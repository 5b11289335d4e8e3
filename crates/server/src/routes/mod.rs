pub mod events;
pub mod health;
pub mod shipments;
pub mod support_tickets;
pub mod track;
pub mod tracking_events;
