use axum::http::StatusCode;

pub mod health;
pub mod updates;
pub mod search;
pub mod read;
pub mod write;

pub const BANNER: &str = "dmirror drive sync active";

pub async fn root() -> (StatusCode, &'static str) {
    (StatusCode::OK, BANNER)
}
