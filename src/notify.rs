use async_trait::async_trait;
use dmirror_api::FileRecord;
use serde::Serialize;

use crate::config;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification endpoint responded with status {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, record: &FileRecord) -> Result<(), NotifyError>;
}

pub fn message(record: &FileRecord) -> String {
    format!("Updated file: {} (lastModified={})", record.path, record.modified_time)
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ChatPayload<'a> {
    pub model: &'a str,
    pub messages: [ChatMessage<'a>; 2],
}

#[derive(Debug)]
pub struct ChatNotifier {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    system_prompt: String,
    api_key: Option<String>,
}

impl ChatNotifier {
    pub fn from_settings(settings: &config::Notify) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        if settings.api_key.is_none() {
            tracing::warn!("no api key for notifications. changes will only be logged");
        }

        Ok(ChatNotifier {
            http,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            system_prompt: settings.system_prompt.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    pub fn payload<'a>(&'a self, message: &'a str) -> ChatPayload<'a> {
        ChatPayload {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: message,
                },
            ],
        }
    }
}

#[async_trait]
impl Notifier for ChatNotifier {
    async fn notify(&self, record: &FileRecord) -> Result<(), NotifyError> {
        let msg = message(record);

        tracing::info!("{msg}");

        let Some(api_key) = &self.api_key else {
            return Ok(());
        };

        let response = self.http.post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&self.payload(&msg))
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record() -> FileRecord {
        FileRecord {
            id: "f1".into(),
            name: "Report.pdf".into(),
            path: "Reports/Report.pdf".into(),
            mime_type: "application/pdf".into(),
            modified_time: "2024-03-02T08:00:00.000Z".into(),
        }
    }

    #[test]
    fn message_names_path_and_time() {
        assert_eq!(
            message(&record()),
            "Updated file: Reports/Report.pdf (lastModified=2024-03-02T08:00:00.000Z)"
        );
    }

    #[test]
    fn chat_payload_shape() {
        let mut settings = config::Notify::default();
        settings.model = "gpt-test".into();
        settings.system_prompt = "refresh your knowledge".into();

        let notifier = ChatNotifier::from_settings(&settings).unwrap();
        let msg = message(&record());
        let value = serde_json::to_value(notifier.payload(&msg)).unwrap();

        assert_eq!(value, serde_json::json!({
            "model": "gpt-test",
            "messages": [
                {"role": "system", "content": "refresh your knowledge"},
                {"role": "user", "content": msg},
            ]
        }));
    }

    #[tokio::test]
    async fn without_key_nothing_is_sent() {
        let mut settings = config::Notify::default();
        settings.api_key = None;
        settings.endpoint = "http://127.0.0.1:1/unreachable".into();

        let notifier = ChatNotifier::from_settings(&settings).unwrap();

        assert!(notifier.notify(&record()).await.is_ok());
    }
}
