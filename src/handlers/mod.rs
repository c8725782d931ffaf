use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::utils::response::success;

pub mod locks;
pub mod seats;
pub mod stream;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "parterre-api",
    };

    success(payload, "Health check successful").into_response()
}
