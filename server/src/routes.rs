use crate::{forwarding, history, page, saved, AppState};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(page::index))
        .route("/request", post(forwarding::forward_handler))
        .route("/saved", get(saved::list_saved).post(saved::save_request))
        .route(
            "/saved/:name",
            get(saved::get_saved).delete(saved::delete_saved),
        )
        .route("/history", get(history::list_history))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
