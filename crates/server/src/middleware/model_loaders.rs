use std::{fmt::Display, future::Future};

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use db::models::{
    shipment::Shipment, support_ticket::SupportTicket, tracking_event::TrackingEvent,
};
use uuid::Uuid;

use crate::DeploymentImpl;

async fn fetch_model_or_status<M, E, Fut>(
    model_name: &'static str,
    model_id: Uuid,
    load_future: Fut,
) -> Result<M, StatusCode>
where
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    match load_future.await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => {
            tracing::warn!("{model_name} {model_id} not found");
            Err(StatusCode::NOT_FOUND)
        }
        Err(error) => {
            tracing::error!("Failed to fetch {model_name} {model_id}: {error}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn load_request_extension<M, E, Fut>(
    request: Request,
    next: Next,
    model_name: &'static str,
    model_id: Uuid,
    load_future: Fut,
) -> Result<Response, StatusCode>
where
    M: Clone + Send + Sync + 'static,
    E: Display,
    Fut: Future<Output = Result<Option<M>, E>>,
{
    let model = fetch_model_or_status(model_name, model_id, load_future).await?;
    let mut request = request;
    request.extensions_mut().insert(model);
    Ok(next.run(request).await)
}

pub async fn load_shipment_middleware(
    State(deployment): State<DeploymentImpl>,
    Path(shipment_id): Path<Uuid>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    load_request_extension(
        request,
        next,
        "Shipment",
        shipment_id,
        Shipment::find_by_id(&deployment.db().pool, shipment_id),
    )
    .await
}

pub async fn load_tracking_event_middleware(
    State(deployment): State<DeploymentImpl>,
    Path(event_id): Path<Uuid>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    load_request_extension(
        request,
        next,
        "TrackingEvent",
        event_id,
        TrackingEvent::find_by_id(&deployment.db().pool, event_id),
    )
    .await
}

pub async fn load_support_ticket_middleware(
    State(deployment): State<DeploymentImpl>,
    Path(ticket_id): Path<Uuid>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    load_request_extension(
        request,
        next,
        "SupportTicket",
        ticket_id,
        SupportTicket::find_by_id(&deployment.db().pool, ticket_id),
    )
    .await
}
