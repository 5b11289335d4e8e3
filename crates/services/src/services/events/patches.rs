use json_patch::Patch;
use serde::Serialize;
use serde_json::{Value, from_value, json, to_value};
use uuid::Uuid;

use db::models::{shipment::Shipment, support_ticket::SupportTicket};
use tracking::Journey;

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum PatchOp {
    Add,
    Replace,
    Remove,
}

#[derive(Serialize)]
struct PatchEntry {
    op: PatchOp,
    path: String,
    value: Value,
}

pub fn escape_json_pointer_segment(s: &str) -> String {
    s.replace('~', "~0").replace('/', "~1")
}

fn value_entry(op: PatchOp, path: String, value: Value) -> Patch {
    let patch_entry = PatchEntry { op, path, value };
    from_value(json!([patch_entry])).unwrap()
}

fn remove_entry(path: String) -> Patch {
    from_value(json!([{
        "op": PatchOp::Remove,
        "path": path,
    }]))
    .unwrap()
}

fn shipment_path(shipment_id: Uuid) -> String {
    format!(
        "/shipments/{}",
        escape_json_pointer_segment(&shipment_id.to_string())
    )
}

fn journey_path(shipment_id: Uuid) -> String {
    format!(
        "/journeys/{}",
        escape_json_pointer_segment(&shipment_id.to_string())
    )
}

fn ticket_path(ticket_id: Uuid) -> String {
    format!(
        "/tickets/{}",
        escape_json_pointer_segment(&ticket_id.to_string())
    )
}

pub mod shipment_patch {
    use super::*;

    pub fn add(shipment: &Shipment) -> Patch {
        value_entry(
            PatchOp::Add,
            shipment_path(shipment.id),
            to_value(shipment).unwrap_or(Value::Null),
        )
    }

    pub fn replace(shipment: &Shipment) -> Patch {
        value_entry(
            PatchOp::Replace,
            shipment_path(shipment.id),
            to_value(shipment).unwrap_or(Value::Null),
        )
    }

    pub fn remove(shipment_id: Uuid) -> Patch {
        remove_entry(shipment_path(shipment_id))
    }
}

pub mod journey_patch {
    use super::*;

    pub fn replace(shipment_id: Uuid, journey: &Journey) -> Patch {
        value_entry(
            PatchOp::Replace,
            journey_path(shipment_id),
            to_value(journey).unwrap_or(Value::Null),
        )
    }

    pub fn remove(shipment_id: Uuid) -> Patch {
        remove_entry(journey_path(shipment_id))
    }
}

pub mod ticket_patch {
    use super::*;

    pub fn add(ticket: &SupportTicket) -> Patch {
        value_entry(
            PatchOp::Add,
            ticket_path(ticket.id),
            to_value(ticket).unwrap_or(Value::Null),
        )
    }

    pub fn replace(ticket: &SupportTicket) -> Patch {
        value_entry(
            PatchOp::Replace,
            ticket_path(ticket.id),
            to_value(ticket).unwrap_or(Value::Null),
        )
    }

    pub fn remove(ticket_id: Uuid) -> Patch {
        remove_entry(ticket_path(ticket_id))
    }
}
