use crate::error::ApiError;
use crate::models::ForwardPayload;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use restdesk_core::timestamp_now;
use std::sync::Arc;

#[axum::debug_handler]
pub async fn forward_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<ForwardPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let request = payload.into_request()?;

    let started_at = timestamp_now();
    let outcome = app_state.forwarder.forward(&request).await;
    app_state.history.record_at(&request, started_at).await;

    let status = StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, Json(outcome.result)).into_response();

    if request.proxy {
        allow_any_origin(response.headers_mut());
    }

    Ok(response)
}

/// CORS relay mode: let any page read the relayed result.
fn allow_any_origin(headers: &mut HeaderMap) {
    let any = HeaderValue::from_static("*");
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, any.clone());
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, any.clone());
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, any);
}
