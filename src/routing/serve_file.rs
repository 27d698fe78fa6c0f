use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, Uri, StatusCode};
use axum::response::Response;
use tokio::fs::OpenOptions;
use tokio_util::io::ReaderStream;

use crate::net::error::{self, Context, GeneralKind};
use crate::path;
use crate::state::ArcShared;

pub async fn handle(
    State(state): State<ArcShared>,
    method: Method,
    uri: Uri
) -> error::Result<Response<Body>> {
    if method != Method::GET {
        return Err(error::Error::api(GeneralKind::InvalidMethod));
    }

    let mut working = state.assets().to_path_buf();

    for part in uri.path().split('/') {
        if part.is_empty() {
            continue;
        }

        if part == ".." || part == "." {
            return Err(error::Error::api(GeneralKind::InvalidUri));
        }

        working.push(part);
    }

    let Some(metadata) = path::metadata(&working)
        .context("error when retrieving metadata for file")? else {
        return Err(error::Error::api(GeneralKind::NotFound));
    };

    if !metadata.is_file() {
        return Err(error::Error::api(GeneralKind::InvalidRequest));
    }

    let mime = path::mime_from_ext(working.extension());

    let file = OpenOptions::new()
        .read(true)
        .open(&working)
        .await
        .context("failed opening file for reading")?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.to_string())
        .header(header::CONTENT_LENGTH, metadata.len())
        .body(Body::from_stream(ReaderStream::new(file)))?)
}
