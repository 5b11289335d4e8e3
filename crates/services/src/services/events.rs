use std::{sync::Arc, time::Duration};

use db::{
    DBService,
    events::{
        EVENT_SHIPMENT_CREATED, EVENT_SHIPMENT_DELETED, EVENT_SHIPMENT_UPDATED,
        EVENT_SUPPORT_TICKET_CREATED, EVENT_SUPPORT_TICKET_DELETED, EVENT_SUPPORT_TICKET_UPDATED,
        EVENT_TRACKING_EVENT_CREATED, EVENT_TRACKING_EVENT_DELETED, EVENT_TRACKING_EVENT_UPDATED,
        ShipmentEventPayload, SupportTicketEventPayload, TrackingEventEventPayload,
    },
    models::{event_outbox::EventOutbox, shipment::Shipment, support_ticket::SupportTicket},
};
use utils::msg_store::MsgStore;
use uuid::Uuid;

use super::journey;

#[path = "events/patches.rs"]
pub mod patches;
#[path = "events/types.rs"]
pub mod types;

pub use patches::{journey_patch, shipment_patch, ticket_patch};
pub use types::EventError;

const OUTBOX_POLL_INTERVAL: Duration = Duration::from_millis(250);
const OUTBOX_BATCH_LIMIT: u64 = 100;

/// Drains the event outbox and fans row changes out as JSON patches.
/// Every tracking-event change triggers a full journey rebuild for the
/// owning shipment.
#[derive(Clone)]
pub struct EventService {
    msg_store: Arc<MsgStore>,
    db: DBService,
}

enum PatchKind {
    Add,
    Replace,
    Remove,
}

impl EventService {
    pub fn new(db: DBService, msg_store: Arc<MsgStore>) -> Self {
        let service = Self { msg_store, db };
        service.spawn_outbox_worker();
        service
    }

    fn spawn_outbox_worker(&self) {
        let service = self.clone();
        tokio::spawn(async move {
            service.run_outbox_loop().await;
        });
    }

    async fn run_outbox_loop(&self) {
        loop {
            if let Err(err) = self.flush_pending().await {
                tracing::error!(error = %err, "event outbox flush failed");
            }
            tokio::time::sleep(OUTBOX_POLL_INTERVAL).await;
        }
    }

    async fn flush_pending(&self) -> Result<(), EventError> {
        let entries = EventOutbox::fetch_unpublished(&self.db.pool, OUTBOX_BATCH_LIMIT).await?;
        if entries.is_empty() {
            return Ok(());
        }

        for entry in entries {
            match self.dispatch_entry(&entry).await {
                Ok(()) => {
                    EventOutbox::mark_published(&self.db.pool, entry.id).await?;
                }
                Err(err) => {
                    let err_msg = err.to_string();
                    tracing::warn!(event_id = entry.uuid.to_string(), error = %err_msg, "event dispatch failed");
                    EventOutbox::mark_failed(&self.db.pool, entry.id, &err_msg).await?;
                }
            }
        }

        Ok(())
    }

    async fn dispatch_entry(
        &self,
        entry: &db::entities::event_outbox::Model,
    ) -> Result<(), EventError> {
        match entry.event_type.as_str() {
            EVENT_SHIPMENT_CREATED => {
                let payload: ShipmentEventPayload = serde_json::from_value(entry.payload.clone())?;
                self.emit_shipment_patch(payload.shipment_id, PatchKind::Add)
                    .await?;
            }
            EVENT_SHIPMENT_UPDATED => {
                let payload: ShipmentEventPayload = serde_json::from_value(entry.payload.clone())?;
                self.emit_shipment_patch(payload.shipment_id, PatchKind::Replace)
                    .await?;
            }
            EVENT_SHIPMENT_DELETED => {
                let payload: ShipmentEventPayload = serde_json::from_value(entry.payload.clone())?;
                self.emit_shipment_patch(payload.shipment_id, PatchKind::Remove)
                    .await?;
            }
            EVENT_TRACKING_EVENT_CREATED | EVENT_TRACKING_EVENT_UPDATED
            | EVENT_TRACKING_EVENT_DELETED => {
                let payload: TrackingEventEventPayload =
                    serde_json::from_value(entry.payload.clone())?;
                self.emit_journey_rebuild(payload.shipment_id).await?;
            }
            EVENT_SUPPORT_TICKET_CREATED => {
                let payload: SupportTicketEventPayload =
                    serde_json::from_value(entry.payload.clone())?;
                self.emit_ticket_patch(payload.ticket_id, PatchKind::Add)
                    .await?;
            }
            EVENT_SUPPORT_TICKET_UPDATED => {
                let payload: SupportTicketEventPayload =
                    serde_json::from_value(entry.payload.clone())?;
                self.emit_ticket_patch(payload.ticket_id, PatchKind::Replace)
                    .await?;
            }
            EVENT_SUPPORT_TICKET_DELETED => {
                let payload: SupportTicketEventPayload =
                    serde_json::from_value(entry.payload.clone())?;
                self.emit_ticket_patch(payload.ticket_id, PatchKind::Remove)
                    .await?;
            }
            _ => {
                tracing::debug!(event_type = entry.event_type.as_str(), "unknown event type");
            }
        }

        Ok(())
    }

    /// Shipment patches also carry a journey rebuild: a status change
    /// retroactively recolors the steps.
    async fn emit_shipment_patch(
        &self,
        shipment_id: Uuid,
        kind: PatchKind,
    ) -> Result<(), EventError> {
        if matches!(kind, PatchKind::Remove) {
            self.msg_store.push_patch(shipment_patch::remove(shipment_id));
            self.msg_store.push_patch(journey_patch::remove(shipment_id));
            return Ok(());
        }

        let shipment = Shipment::find_by_id(&self.db.pool, shipment_id).await?;
        if let Some(shipment) = shipment {
            let patch = match kind {
                PatchKind::Add => shipment_patch::add(&shipment),
                PatchKind::Replace => shipment_patch::replace(&shipment),
                PatchKind::Remove => shipment_patch::remove(shipment_id),
            };
            self.msg_store.push_patch(patch);

            let journey = journey::load_journey(&self.db.pool, &shipment).await?;
            self.msg_store
                .push_patch(journey_patch::replace(shipment_id, &journey));
        }

        Ok(())
    }

    async fn emit_journey_rebuild(&self, shipment_id: Uuid) -> Result<(), EventError> {
        let Some(journey) = journey::load_journey_by_id(&self.db.pool, shipment_id).await? else {
            // Shipment already gone; the cascade delete patch covers it.
            return Ok(());
        };
        self.msg_store
            .push_patch(journey_patch::replace(shipment_id, &journey));
        Ok(())
    }

    async fn emit_ticket_patch(
        &self,
        ticket_id: Uuid,
        kind: PatchKind,
    ) -> Result<(), EventError> {
        if matches!(kind, PatchKind::Remove) {
            self.msg_store.push_patch(ticket_patch::remove(ticket_id));
            return Ok(());
        }

        let ticket = SupportTicket::find_by_id(&self.db.pool, ticket_id).await?;
        if let Some(ticket) = ticket {
            let patch = match kind {
                PatchKind::Add => ticket_patch::add(&ticket),
                PatchKind::Replace => ticket_patch::replace(&ticket),
                PatchKind::Remove => ticket_patch::remove(ticket_id),
            };
            self.msg_store.push_patch(patch);
        }

        Ok(())
    }

    pub fn msg_store(&self) -> &Arc<MsgStore> {
        &self.msg_store
    }
}
