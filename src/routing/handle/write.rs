use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use bytes::Bytes;
use dmirror_api::files::{WriteRequest, WriteResponse};
use dmirror_lib::mime;
use dmirror_lib::path::TargetPath;

use crate::drive::{self, RemoteStore};
use crate::net::error::{self, Detail, DriveKind, GeneralKind};
use crate::routing::auth::Bearer;
use crate::state::ArcShared;

pub async fn post(
    _bearer: Bearer,
    State(state): State<ArcShared>,
    body: Result<Json<WriteRequest>, JsonRejection>,
) -> error::Result<Json<WriteResponse>> {
    let Json(req) = body?;

    let path = req.path.ok_or_else(|| error::Error::api((
        GeneralKind::MissingData,
        Detail::with_key("path"),
        "path is required"
    )))?;

    let content = req.content.ok_or_else(|| error::Error::api((
        GeneralKind::MissingData,
        Detail::with_key("content"),
        "content is required"
    )))?;

    let target = TargetPath::parse(&path).ok_or_else(|| error::Error::api((
        DriveKind::InvalidPath,
        Detail::with_key("path"),
        format!("invalid path: \"{path}\"")
    )))?;

    let overwrite = req.overwrite.unwrap_or(true);
    let data = Bytes::from(serde_json::to_vec_pretty(&content)?);
    let store = state.store();

    let parent = ensure_folders(store, state.root_folder(), target.folders()).await?;
    let existing = drive::find_child(store, &parent, target.name(), false).await?;

    let (entry, created) = match existing {
        Some(found) => {
            if !overwrite {
                return Err(error::Error::api((
                    DriveKind::FileExists,
                    Detail::with_key("path"),
                    format!("file already exists: {}", target.joined())
                )));
            }

            (store.update_file(&found.id, mime::JSON, data).await?, false)
        }
        None => (store.create_file(&parent, target.name(), mime::JSON, data).await?, true),
    };

    tracing::info!(
        "{} {} ({})",
        if created { "created" } else { "updated" },
        target.joined(),
        entry.id
    );

    Ok(Json(WriteResponse {
        id: entry.id,
        name: entry.name,
        path: target.joined(),
        created,
    }))
}

async fn ensure_folders(
    store: &dyn RemoteStore,
    root: &str,
    folders: &[String],
) -> error::Result<String> {
    let mut parent = root.to_owned();

    for name in folders {
        parent = match drive::find_child(store, &parent, name, true).await? {
            Some(found) => found.id,
            None => {
                tracing::debug!("creating folder {name} in {parent}");

                store.create_folder(&parent, name).await?.id
            }
        };
    }

    Ok(parent)
}
