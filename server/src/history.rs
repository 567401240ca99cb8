use crate::AppState;
use axum::extract::State;
use axum::Json;
use restdesk_core::HistoryEntry;
use std::sync::Arc;

pub async fn list_history(State(app_state): State<Arc<AppState>>) -> Json<Vec<HistoryEntry>> {
    Json(app_state.history.list().await)
}
