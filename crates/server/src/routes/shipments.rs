use anyhow;
use axum::{
    Extension, Json, Router,
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Json as ResponseJson},
    routing::get,
    routing::post,
};
use chrono::{NaiveDate, Utc};
use db::models::{
    shipment::{CreateShipment, Shipment, ShipmentStatus, UpdateShipment},
    tracking_event::{CreateTrackingEvent, TrackingEvent},
};
use futures::{SinkExt, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use services::services::{events::journey_patch, journey};
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracking::{Journey, RouteInfo, calculate_eta, generate_tracking_events,
    generate_tracking_number};
use ts_rs::TS;
use utils::{log_msg::LogMsg, response::ApiResponse};
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError, middleware::load_shipment_middleware};

const TRACKING_NUMBER_ATTEMPTS: usize = 5;

#[derive(Debug, Deserialize, TS)]
pub struct CreateShipmentRequest {
    pub origin: String,
    pub destination: String,
    pub tracking_number: Option<String>,
    pub status: Option<ShipmentStatus>,
    pub progress: Option<i32>,
    pub eta: Option<NaiveDate>,
    #[serde(default)]
    pub record_pickup_event: bool,
}

#[derive(Debug, Deserialize, TS)]
pub struct GenerateShipmentRequest {
    pub origin: String,
    pub destination: String,
}

#[derive(Debug, Serialize, TS)]
pub struct GenerateShipmentResponse {
    pub shipment: Shipment,
    pub events_generated: usize,
}

fn validate_route(origin: &str, destination: &str) -> Result<(), ApiError> {
    if origin.trim().is_empty() {
        return Err(ApiError::BadRequest("Origin must not be empty".to_string()));
    }
    if destination.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Destination must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Retries with a fresh number on tracking-number collisions. The
/// template's `tracking_number` is overwritten per attempt.
async fn create_with_generated_number(
    deployment: &DeploymentImpl,
    mut template: CreateShipment,
) -> Result<Shipment, ApiError> {
    for _ in 0..TRACKING_NUMBER_ATTEMPTS {
        template.tracking_number = generate_tracking_number(&mut rand::thread_rng());
        match Shipment::create(&deployment.db().pool, &template, Uuid::new_v4()).await {
            Ok(shipment) => return Ok(shipment),
            Err(err) if db::is_unique_violation(&err) => {
                tracing::debug!(
                    "Tracking number {} already taken, retrying",
                    template.tracking_number
                );
            }
            Err(err) => return Err(err.into()),
        }
    }
    Err(ApiError::Conflict(
        "Could not allocate a unique tracking number".to_string(),
    ))
}

pub async fn get_shipments(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Shipment>>>, ApiError> {
    let shipments = Shipment::find_all(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(shipments)))
}

pub async fn create_shipment(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<CreateShipmentRequest>,
) -> Result<ResponseJson<ApiResponse<Shipment>>, ApiError> {
    validate_route(&payload.origin, &payload.destination)?;
    if let Some(number) = &payload.tracking_number {
        if number.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Tracking number must not be empty".to_string(),
            ));
        }
    }

    let template = CreateShipment {
        tracking_number: payload.tracking_number.clone().unwrap_or_default(),
        origin: payload.origin.clone(),
        destination: payload.destination.clone(),
        status: payload.status.clone(),
        progress: payload.progress,
        eta: payload.eta,
    };

    let shipment = match &payload.tracking_number {
        Some(number) => Shipment::create(&deployment.db().pool, &template, Uuid::new_v4())
            .await
            .map_err(|err| {
                if db::is_unique_violation(&err) {
                    ApiError::Conflict(format!("Tracking number {number} already exists"))
                } else {
                    ApiError::Database(err)
                }
            })?,
        None => create_with_generated_number(&deployment, template).await?,
    };

    if payload.record_pickup_event {
        let event = CreateTrackingEvent {
            shipment_id: shipment.id,
            event_type: "pickup".to_string(),
            location: shipment.origin.clone(),
            timestamp: Utc::now(),
            description: format!("Shipment picked up from {}", shipment.origin),
            icon: None,
        };
        TrackingEvent::create(&deployment.db().pool, &event, Uuid::new_v4()).await?;
    }

    Ok(ResponseJson(ApiResponse::success(shipment)))
}

pub async fn generate_shipment(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<GenerateShipmentRequest>,
) -> Result<ResponseJson<ApiResponse<GenerateShipmentResponse>>, ApiError> {
    validate_route(&payload.origin, &payload.destination)?;

    let start_date = Utc::now();
    let eta = calculate_eta(start_date, &payload.origin, &payload.destination);
    let template = CreateShipment {
        tracking_number: String::new(),
        origin: payload.origin.clone(),
        destination: payload.destination.clone(),
        status: Some(ShipmentStatus::AtPort),
        progress: Some(85),
        eta: Some(eta),
    };
    let shipment = create_with_generated_number(&deployment, template).await?;

    let route = RouteInfo {
        origin: shipment.origin.clone(),
        destination: shipment.destination.clone(),
        shipment_id: shipment.id,
        start_date,
    };
    let events = generate_tracking_events(&route, &mut rand::thread_rng());
    let batch: Vec<CreateTrackingEvent> = events.into_iter().map(Into::into).collect();

    // The shipment survives even if history recording fails.
    let events_generated = match TrackingEvent::create_many(&deployment.db().pool, batch).await {
        Ok(count) => count,
        Err(err) => {
            tracing::warn!(
                "Failed to record generated events for shipment {}: {}",
                shipment.id,
                err
            );
            0
        }
    };

    Ok(ResponseJson(ApiResponse::success(
        GenerateShipmentResponse {
            shipment,
            events_generated,
        },
    )))
}

pub async fn get_shipment(
    Extension(shipment): Extension<Shipment>,
    State(_deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Shipment>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(shipment)))
}

pub async fn update_shipment(
    Extension(shipment): Extension<Shipment>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<UpdateShipment>,
) -> Result<ResponseJson<ApiResponse<Shipment>>, ApiError> {
    if let Some(origin) = &payload.origin {
        if origin.trim().is_empty() {
            return Err(ApiError::BadRequest("Origin must not be empty".to_string()));
        }
    }
    if let Some(destination) = &payload.destination {
        if destination.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Destination must not be empty".to_string(),
            ));
        }
    }

    let updated = Shipment::update(&deployment.db().pool, shipment.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn delete_shipment(
    Extension(shipment): Extension<Shipment>,
    State(deployment): State<DeploymentImpl>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<()>>), ApiError> {
    Shipment::delete(&deployment.db().pool, shipment.id).await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(()))))
}

pub async fn get_shipment_events(
    Extension(shipment): Extension<Shipment>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<TrackingEvent>>>, ApiError> {
    let events = TrackingEvent::find_by_shipment_id(&deployment.db().pool, shipment.id).await?;
    Ok(ResponseJson(ApiResponse::success(events)))
}

pub async fn get_shipment_journey(
    Extension(shipment): Extension<Shipment>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Journey>>, ApiError> {
    let journey = journey::load_journey(&deployment.db().pool, &shipment).await?;
    Ok(ResponseJson(ApiResponse::success(journey)))
}

pub async fn stream_shipments_ws(
    ws: WebSocketUpgrade,
    State(deployment): State<DeploymentImpl>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = handle_shipments_ws(socket, deployment).await {
            tracing::warn!("shipments WS closed: {}", e);
        }
    })
}

async fn handle_shipments_ws(socket: WebSocket, deployment: DeploymentImpl) -> anyhow::Result<()> {
    let mut stream = deployment
        .msg_store()
        .history_plus_stream()
        .map_ok(|msg| msg.to_ws_message_unchecked());

    let (mut sender, mut receiver) = socket.split();

    // Drain (and ignore) any client->server messages so pings/pongs work
    tokio::spawn(async move { while let Some(Ok(_)) = receiver.next().await {} });

    while let Some(item) = stream.next().await {
        match item {
            Ok(msg) => {
                if sender.send(msg).await.is_err() {
                    break; // client disconnected
                }
            }
            Err(e) => {
                tracing::error!("stream error: {}", e);
                continue;
            }
        }
    }
    let _ = sender.close().await;
    Ok(())
}

pub async fn stream_journey_ws(
    ws: WebSocketUpgrade,
    Extension(shipment): Extension<Shipment>,
    State(deployment): State<DeploymentImpl>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = handle_journey_ws(socket, deployment, shipment).await {
            tracing::warn!("journey WS closed: {}", e);
        }
    })
}

/// Sends the current journey snapshot, then only the patches that touch
/// this shipment's journey document.
async fn handle_journey_ws(
    socket: WebSocket,
    deployment: DeploymentImpl,
    shipment: Shipment,
) -> anyhow::Result<()> {
    let path_prefix = format!("/journeys/{}", shipment.id);
    let rx = deployment.msg_store().get_receiver();

    let current = journey::load_journey(&deployment.db().pool, &shipment).await?;
    let snapshot = LogMsg::JsonPatch(journey_patch::replace(shipment.id, &current));

    let (mut sender, mut receiver) = socket.split();
    tokio::spawn(async move { while let Some(Ok(_)) = receiver.next().await {} });

    if sender
        .send(snapshot.to_ws_message_unchecked())
        .await
        .is_err()
    {
        return Ok(());
    }

    let mut live = BroadcastStream::new(rx);
    while let Some(item) = live.next().await {
        match item {
            Ok(msg) => {
                let relevant = match &msg {
                    LogMsg::JsonPatch(patch) => patch_touches(patch, &path_prefix),
                    LogMsg::Finished => true,
                };
                if !relevant {
                    continue;
                }
                if sender.send(msg.to_ws_message_unchecked()).await.is_err() {
                    break;
                }
            }
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!("journey WS lagged, skipped {skipped} messages");
            }
        }
    }
    let _ = sender.close().await;
    Ok(())
}

fn patch_touches(patch: &json_patch::Patch, prefix: &str) -> bool {
    use json_patch::PatchOperation;

    patch.iter().any(|op| {
        let path: &str = match op {
            PatchOperation::Add(add) => &add.path,
            PatchOperation::Replace(replace) => &replace.path,
            PatchOperation::Remove(remove) => &remove.path,
            PatchOperation::Move(mv) => &mv.path,
            PatchOperation::Copy(cp) => &cp.path,
            PatchOperation::Test(test) => &test.path,
        };
        path.starts_with(prefix)
    })
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let shipment_id_router = Router::new()
        .route(
            "/",
            get(get_shipment).put(update_shipment).delete(delete_shipment),
        )
        .route("/events", get(get_shipment_events))
        .route("/journey", get(get_shipment_journey))
        .route("/journey/ws", get(stream_journey_ws))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_shipment_middleware,
        ));

    let inner = Router::new()
        .route("/", get(get_shipments).post(create_shipment))
        .route("/generate", post(generate_shipment))
        .route("/stream/ws", get(stream_shipments_ws))
        .nest("/{shipment_id}", shipment_id_router);

    Router::new().nest("/shipments", inner)
}
