use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use yup_oauth2::ServiceAccountKey;
use yup_oauth2::authenticator::DefaultAuthenticator;

use super::{RemoteEntry, RemoteStore};
use super::auth;
use super::error::DriveError;

pub const API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

const FILE_FIELDS: &str = "id,name,mimeType,modifiedTime,trashed";
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,modifiedTime,trashed)";
const PAGE_SIZE: &str = "1000";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    next_page_token: Option<String>,

    #[serde(default)]
    files: Vec<RemoteEntry>,
}

pub struct DriveClient {
    http: reqwest::Client,
    auth: DefaultAuthenticator,
}

impl DriveClient {
    pub async fn new(key: ServiceAccountKey, timeout: Duration) -> Result<Self, DriveError> {
        let auth = auth::authenticator(key).await?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(DriveClient { http, auth })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, DriveError> {
        let token = auth::access_token(&self.auth).await?;
        let response = request.bearer_auth(token)
            .send()
            .await?;

        check_status(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DriveError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(text) => text,
        Err(err) => format!("<failed to read body: {err}>"),
    };

    Err(DriveError::Status {
        status: status.as_u16(),
        body,
    })
}

fn children_query(folder_id: &str) -> String {
    // single quotes inside the id would end the literal
    let escaped = folder_id.replace('\\', "\\\\").replace('\'', "\\'");

    format!("'{escaped}' in parents and trashed=false")
}

fn boundary_for(seed: i64, data: &[u8]) -> String {
    let mut boundary = format!("dmirror-{seed}");

    while contains(data, boundary.as_bytes()) {
        boundary.push('x');
    }

    boundary
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn related_body(boundary: &str, metadata: &serde_json::Value, mime_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(data.len() + 512);

    body.extend_from_slice(format!(
        "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
    ).as_bytes());
    body.extend_from_slice(format!(
        "--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n"
    ).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    body
}

#[async_trait]
impl RemoteStore for DriveClient {
    async fn list_children(&self, folder_id: &str) -> Result<Vec<RemoteEntry>, DriveError> {
        let query = children_query(folder_id);
        let mut page_token: Option<String> = None;
        let mut rtn = Vec::new();

        loop {
            let mut params = vec![
                ("q", query.as_str()),
                ("fields", LIST_FIELDS),
                ("pageSize", PAGE_SIZE),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ];

            if let Some(token) = &page_token {
                params.push(("pageToken", token.as_str()));
            }

            let request = self.http.get(format!("{API_BASE}/files"))
                .query(&params);

            let list: FileList = self.send(request)
                .await?
                .json()
                .await?;

            rtn.extend(list.files);

            match list.next_page_token {
                Some(next) if !next.is_empty() => {
                    page_token = Some(next);
                }
                _ => break,
            }
        }

        tracing::debug!("listed {} children of {folder_id}", rtn.len());

        Ok(rtn)
    }

    async fn get_media(&self, id: &str) -> Result<Bytes, DriveError> {
        let request = self.http.get(format!("{API_BASE}/files/{id}"))
            .query(&[("alt", "media"), ("supportsAllDrives", "true")]);

        Ok(self.send(request).await?.bytes().await?)
    }

    async fn export(&self, id: &str, mime_type: &str) -> Result<Bytes, DriveError> {
        let request = self.http.get(format!("{API_BASE}/files/{id}/export"))
            .query(&[("mimeType", mime_type)]);

        Ok(self.send(request).await?.bytes().await?)
    }

    async fn create_folder(&self, parent: &str, name: &str) -> Result<RemoteEntry, DriveError> {
        let metadata = serde_json::json!({
            "name": name,
            "mimeType": dmirror_lib::mime::FOLDER,
            "parents": [parent],
        });

        let request = self.http.post(format!("{API_BASE}/files"))
            .query(&[("fields", FILE_FIELDS), ("supportsAllDrives", "true")])
            .json(&metadata);

        Ok(self.send(request).await?.json().await?)
    }

    async fn create_file(
        &self,
        parent: &str,
        name: &str,
        mime_type: &str,
        data: Bytes
    ) -> Result<RemoteEntry, DriveError> {
        let metadata = serde_json::json!({
            "name": name,
            "mimeType": mime_type,
            "parents": [parent],
        });

        // metadata and media in one request so a failed upload leaves nothing
        // behind
        let seed = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let boundary = boundary_for(seed, &data);
        let body = related_body(&boundary, &metadata, mime_type, &data);

        let request = self.http.post(format!("{UPLOAD_BASE}/files"))
            .query(&[
                ("uploadType", "multipart"),
                ("fields", FILE_FIELDS),
                ("supportsAllDrives", "true"),
            ])
            .header(CONTENT_TYPE, format!("multipart/related; boundary={boundary}"))
            .body(body);

        Ok(self.send(request).await?.json().await?)
    }

    async fn update_file(
        &self,
        id: &str,
        mime_type: &str,
        data: Bytes
    ) -> Result<RemoteEntry, DriveError> {
        let request = self.http.patch(format!("{UPLOAD_BASE}/files/{id}"))
            .query(&[
                ("uploadType", "media"),
                ("fields", FILE_FIELDS),
                ("supportsAllDrives", "true"),
            ])
            .header(CONTENT_TYPE, mime_type)
            .body(data);

        Ok(self.send(request).await?.json().await?)
    }
}
