use axum::{
    Router,
    extract::State,
    response::{
        IntoResponse,
        sse::{KeepAlive, Sse},
    },
    routing::get,
};

use crate::DeploymentImpl;

pub async fn stream_events(State(deployment): State<DeploymentImpl>) -> impl IntoResponse {
    Sse::new(deployment.msg_store().sse_stream()).keep_alive(KeepAlive::default())
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/events", get(stream_events))
}
