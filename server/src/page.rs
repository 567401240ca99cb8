use axum::response::Html;
use restdesk_core::MAX_HISTORY_SIZE;

const INDEX_TEMPLATE: &str = include_str!("../assets/index.html");

pub async fn index() -> Html<String> {
    Html(INDEX_TEMPLATE.replace("{{ max_history }}", &MAX_HISTORY_SIZE.to_string()))
}
