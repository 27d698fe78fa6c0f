use axum::Json;
use axum::extract::State;
use dmirror_api::FileRecord;

use crate::net::error;
use crate::routing::auth::Bearer;
use crate::state::ArcShared;

pub async fn get(
    _bearer: Bearer,
    State(state): State<ArcShared>,
) -> error::Result<Json<Vec<FileRecord>>> {
    let snapshot = state.snapshot().await?;

    Ok(Json(snapshot.recent().to_vec()))
}
