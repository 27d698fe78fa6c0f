use axum::Json;
use dmirror_api::files::Health;

pub async fn get() -> Json<Health> {
    Json(Health::ok())
}
