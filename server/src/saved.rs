use crate::error::ApiError;
use crate::models::SavePayload;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use restdesk_core::{RequestDefinition, SavedRequestMap};
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn list_saved(State(app_state): State<Arc<AppState>>) -> Json<SavedRequestMap> {
    Json(app_state.saved.list().await)
}

pub async fn get_saved(
    State(app_state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<RequestDefinition>, ApiError> {
    app_state
        .saved
        .get(&name)
        .await
        .map(Json)
        .ok_or_else(ApiError::saved_not_found)
}

#[axum::debug_handler]
pub async fn save_request(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<SavePayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let (name, definition) = payload.into_parts()?;

    app_state.saved.put(&name, definition).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": format!("Request '{}' saved successfully.", name) })),
    ))
}

pub async fn delete_saved(
    State(app_state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match app_state.saved.delete(&name).await {
        Some(_) => Ok(Json(
            json!({ "message": format!("Request '{}' deleted successfully.", name) }),
        )),
        None => Err(ApiError::saved_not_found()),
    }
}
