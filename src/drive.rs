use async_trait::async_trait;
use bytes::Bytes;
use serde::{Serialize, Deserialize};

pub mod error;
pub mod auth;
pub mod client;

pub use error::DriveError;
pub use client::DriveClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    pub id: String,
    pub name: String,
    pub mime_type: String,

    #[serde(default)]
    pub modified_time: String,

    #[serde(default)]
    pub trashed: bool,
}

impl RemoteEntry {
    pub fn is_folder(&self) -> bool {
        dmirror_lib::mime::is_folder(&self.mime_type)
    }
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteEntry>, DriveError>;

    async fn get_media(&self, id: &str) -> Result<Bytes, DriveError>;

    async fn export(&self, id: &str, mime_type: &str) -> Result<Bytes, DriveError>;

    async fn create_folder(&self, parent: &str, name: &str) -> Result<RemoteEntry, DriveError>;

    async fn create_file(
        &self,
        parent: &str,
        name: &str,
        mime_type: &str,
        data: Bytes
    ) -> Result<RemoteEntry, DriveError>;

    async fn update_file(
        &self,
        id: &str,
        mime_type: &str,
        data: Bytes
    ) -> Result<RemoteEntry, DriveError>;
}

pub async fn find_child(
    store: &dyn RemoteStore,
    folder_id: &str,
    name: &str,
    folder: bool,
) -> Result<Option<RemoteEntry>, DriveError> {
    let children = store.list_children(folder_id).await?;

    Ok(children.into_iter()
        .find(|entry| !entry.trashed && entry.name == name && entry.is_folder() == folder))
}
