use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{shipment::Shipment, tracking_event::TrackingEvent};
use serde::Serialize;
use services::services::journey;
use tracking::Journey;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

/// Public tracking-page payload, keyed by tracking number rather than id.
#[derive(Debug, Serialize, TS)]
pub struct TrackingInfo {
    pub shipment: Shipment,
    pub journey: Journey,
    pub events: Vec<TrackingEvent>,
}

pub async fn track_shipment(
    State(deployment): State<DeploymentImpl>,
    Path(tracking_number): Path<String>,
) -> Result<ResponseJson<ApiResponse<TrackingInfo>>, ApiError> {
    let pool = &deployment.db().pool;
    let shipment = Shipment::find_by_tracking_number(pool, &tracking_number)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No shipment found for tracking number {tracking_number}"
            ))
        })?;

    let journey = journey::load_journey(pool, &shipment).await?;
    let events = TrackingEvent::find_by_shipment_id(pool, shipment.id).await?;

    Ok(Json(ApiResponse::success(TrackingInfo {
        shipment,
        journey,
        events,
    })))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/track/{tracking_number}", get(track_shipment))
}
