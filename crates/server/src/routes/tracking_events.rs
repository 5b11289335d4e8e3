use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::tracking_event::{CreateTrackingEvent, TrackingEvent, UpdateTrackingEvent};
use serde::{Deserialize, Serialize};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError, middleware::load_tracking_event_middleware};

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackingEventQuery {
    pub shipment_id: Option<Uuid>,
}

pub async fn get_tracking_events(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<TrackingEventQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<TrackingEvent>>>, ApiError> {
    let events = match query.shipment_id {
        Some(shipment_id) => {
            TrackingEvent::find_by_shipment_id(&deployment.db().pool, shipment_id).await?
        }
        None => TrackingEvent::find_all(&deployment.db().pool).await?,
    };

    Ok(ResponseJson(ApiResponse::success(events)))
}

pub async fn create_tracking_event(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<CreateTrackingEvent>,
) -> Result<ResponseJson<ApiResponse<TrackingEvent>>, ApiError> {
    if payload.location.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Location must not be empty".to_string(),
        ));
    }

    let event =
        TrackingEvent::create(&deployment.db().pool, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(event)))
}

pub async fn update_tracking_event(
    Extension(event): Extension<TrackingEvent>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<UpdateTrackingEvent>,
) -> Result<ResponseJson<ApiResponse<TrackingEvent>>, ApiError> {
    let updated = TrackingEvent::update(&deployment.db().pool, event.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn delete_tracking_event(
    Extension(event): Extension<TrackingEvent>,
    State(deployment): State<DeploymentImpl>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<()>>), ApiError> {
    TrackingEvent::delete(&deployment.db().pool, event.id).await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(()))))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let event_id_router = Router::new()
        .route(
            "/",
            axum::routing::put(update_tracking_event).delete(delete_tracking_event),
        )
        .layer(from_fn_with_state(
            deployment.clone(),
            load_tracking_event_middleware,
        ));

    let inner = Router::new()
        .route("/", get(get_tracking_events).post(create_tracking_event))
        .nest("/{event_id}", event_id_router);

    Router::new().nest("/tracking-events", inner)
}
