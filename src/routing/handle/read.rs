use axum::Json;
use axum::extract::{Query, State};
use axum::extract::rejection::QueryRejection;
use dmirror_api::FileRecord;
use dmirror_api::files::{ReadResult, Unreadable};
use dmirror_lib::mime::{self, Kind};
use serde::Deserialize;

use crate::extract::{text, Extraction};
use crate::net::error::{self, Detail, DriveKind, GeneralKind};
use crate::routing::auth::Bearer;
use crate::state::ArcShared;

#[derive(Debug, Deserialize)]
pub struct ReadParams {
    id: Option<String>,
}

pub async fn get(
    _bearer: Bearer,
    State(state): State<ArcShared>,
    query: Result<Query<ReadParams>, QueryRejection>,
) -> error::Result<Json<ReadResult>> {
    let Query(params) = query?;

    let id = params.id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| error::Error::api((
            GeneralKind::MissingData,
            Detail::with_key("id"),
            "id is required"
        )))?;

    let snapshot = state.snapshot().await?;

    let Some(record) = snapshot.get(&id) else {
        return Err(error::Error::api((
            DriveKind::UnknownFile,
            Detail::with_key("id"),
            format!("unknown file id: {id}")
        )));
    };

    Ok(Json(read(&state, record).await?))
}

async fn read(state: &ArcShared, record: &FileRecord) -> error::Result<ReadResult> {
    if mime::is_google_native(&record.mime_type) {
        let Some(target) = mime::export_target(&record.mime_type) else {
            return Ok(unreadable(record, Extraction::Unsupported));
        };

        let data = state.store().export(&record.id, target).await?;

        return Ok(match Extraction::from_text(text::decode(&data)) {
            Extraction::Text(text) => ReadResult::with_text(record, text),
            other => unreadable(record, other),
        });
    }

    // skip the download when nothing could come of it
    match mime::classify(&record.mime_type) {
        Kind::Unsupported => return Ok(unreadable(record, Extraction::Unsupported)),
        Kind::Image if !state.extractor().ocr_enabled() => {
            return Ok(unreadable(record, Extraction::OcrDisabled));
        }
        _ => {}
    }

    let data = state.store().get_media(&record.id).await?;

    tracing::debug!("downloaded {} bytes for {}", data.len(), record.path);

    Ok(match state.extractor().extract(&record.mime_type, data).await {
        Extraction::Text(text) => ReadResult::with_text(record, text),
        other => unreadable(record, other),
    })
}

fn unreadable(record: &FileRecord, extraction: Extraction) -> ReadResult {
    let (reason, message) = extraction.unreadable()
        .unwrap_or((Unreadable::Empty, String::new()));

    tracing::debug!("no text for {}: {message}", record.path);

    ReadResult::unreadable(record, reason, message)
}
