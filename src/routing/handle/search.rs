use axum::Json;
use axum::extract::{Query, State};
use axum::extract::rejection::QueryRejection;
use dmirror_api::FileRecord;
use dmirror_lib::query::Limit;
use serde::Deserialize;

use crate::net::error::{self, Detail, GeneralKind};
use crate::routing::auth::Bearer;
use crate::state::ArcShared;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    limit: Option<String>,
}

fn parse_limit(given: Option<&str>) -> error::Result<Limit> {
    match given.map(str::trim) {
        None | Some("") => Ok(Limit::default()),
        Some(value) => value.parse::<Limit>()
            .map_err(|_| error::Error::api((
                GeneralKind::InvalidData,
                Detail::with_key("limit"),
                "limit must be a whole number"
            )))
    }
}

pub async fn get(
    _bearer: Bearer,
    State(state): State<ArcShared>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> error::Result<Json<Vec<FileRecord>>> {
    let Query(params) = query?;
    let limit = parse_limit(params.limit.as_deref())?;

    let snapshot = state.snapshot().await?;
    let found = snapshot.search(params.q.as_deref().unwrap_or(""), limit.get());

    Ok(Json(found))
}
