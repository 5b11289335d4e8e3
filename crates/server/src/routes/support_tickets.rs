use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::support_ticket::{CreateSupportTicket, SupportTicket, UpdateSupportTicket};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError, middleware::load_support_ticket_middleware};

pub async fn get_support_tickets(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<SupportTicket>>>, ApiError> {
    let tickets = SupportTicket::find_all(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(tickets)))
}

pub async fn create_support_ticket(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<CreateSupportTicket>,
) -> Result<ResponseJson<ApiResponse<SupportTicket>>, ApiError> {
    if payload.subject.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Subject must not be empty".to_string(),
        ));
    }

    let ticket =
        SupportTicket::create(&deployment.db().pool, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(ticket)))
}

pub async fn get_support_ticket(
    Extension(ticket): Extension<SupportTicket>,
    State(_deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<SupportTicket>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(ticket)))
}

pub async fn update_support_ticket(
    Extension(ticket): Extension<SupportTicket>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<UpdateSupportTicket>,
) -> Result<ResponseJson<ApiResponse<SupportTicket>>, ApiError> {
    let updated = SupportTicket::update(&deployment.db().pool, ticket.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn delete_support_ticket(
    Extension(ticket): Extension<SupportTicket>,
    State(deployment): State<DeploymentImpl>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<()>>), ApiError> {
    SupportTicket::delete(&deployment.db().pool, ticket.id).await?;
    Ok((StatusCode::OK, ResponseJson(ApiResponse::success(()))))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let ticket_id_router = Router::new()
        .route(
            "/",
            get(get_support_ticket)
                .put(update_support_ticket)
                .delete(delete_support_ticket),
        )
        .layer(from_fn_with_state(
            deployment.clone(),
            load_support_ticket_middleware,
        ));

    let inner = Router::new()
        .route("/", get(get_support_tickets).post(create_support_ticket))
        .nest("/{ticket_id}", ticket_id_router);

    Router::new().nest("/support-tickets", inner)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::test_support::test_deployment;

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn ticket_lifecycle_through_the_api() {
        let deployment = test_deployment().await;
        let app = crate::http::router(deployment);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/support-tickets")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "subject": "Shipment stuck at port",
                            "body": "FLIP123456 has not moved for a week",
                            "requester_email": "customer@example.com"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["status"], "open");
        let ticket_id = body["data"]["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/support-tickets/{ticket_id}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "status": "resolved" }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["status"], "resolved");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/support-tickets/{ticket_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/support-tickets/{ticket_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_subject_is_rejected() {
        let deployment = test_deployment().await;
        let app = crate::http::router(deployment);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/support-tickets")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({
                            "subject": "",
                            "body": "hello",
                            "requester_email": "customer@example.com"
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
