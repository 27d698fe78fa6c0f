use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub path: String,
    pub mime_type: String,
    pub modified_time: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unreadable {
    OcrUnavailable,
    OcrDisabled,
    Unsupported,
    Empty,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResult {
    pub id: String,
    pub name: String,
    pub path: String,
    pub mime_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Unreadable>,
}

impl ReadResult {
    pub fn with_text(record: &FileRecord, text: String) -> Self {
        ReadResult {
            id: record.id.clone(),
            name: record.name.clone(),
            path: record.path.clone(),
            mime_type: record.mime_type.clone(),
            text: Some(text),
            message: None,
            reason: None,
        }
    }

    pub fn unreadable<M>(record: &FileRecord, reason: Unreadable, message: M) -> Self
    where
        M: Into<String>
    {
        ReadResult {
            id: record.id.clone(),
            name: record.name.clone(),
            path: record.path.clone(),
            mime_type: record.mime_type.clone(),
            text: None,
            message: Some(message.into()),
            reason: Some(reason),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriteRequest {
    pub path: Option<String>,

    #[serde(default, deserialize_with = "present")]
    pub content: Option<serde_json::Value>,

    pub overwrite: Option<bool>,
}

// an explicit json null is treated the same as a missing field
fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>
{
    let value = serde_json::Value::deserialize(deserializer)?;

    if value.is_null() {
        Ok(None)
    } else {
        Ok(Some(value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteResponse {
    pub id: String,
    pub name: String,
    pub path: String,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}

impl Health {
    pub fn ok() -> Self {
        Health { status: "ok".into() }
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
            modified_time: "2024-03-01T10:00:00.000Z".into(),
        }
    }

    #[test]
    fn record_json_names() {
        let value = serde_json::to_value(record()).unwrap();

        assert_eq!(value, serde_json::json!({
            "id": "f1",
            "name": "Report.pdf",
            "path": "Reports/Report.pdf",
            "mimeType": "application/pdf",
            "modifiedTime": "2024-03-01T10:00:00.000Z",
        }));
    }

    #[test]
    fn read_result_shapes() {
        let text = serde_json::to_value(ReadResult::with_text(&record(), "hello".into())).unwrap();

        assert_eq!(text["text"], "hello");
        assert!(text.get("reason").is_none());
        assert!(text.get("message").is_none());

        let none = serde_json::to_value(ReadResult::unreadable(
            &record(),
            Unreadable::OcrUnavailable,
            "ocr tooling not installed"
        )).unwrap();

        assert_eq!(none["reason"], "ocr_unavailable");
        assert_eq!(none["mimeType"], "application/pdf");
        assert!(none.get("text").is_none());
    }

    #[test]
    fn write_request_null_content() {
        let req: WriteRequest = serde_json::from_str(r#"{"path":"a/b","content":null}"#).unwrap();
        assert!(req.content.is_none());

        let req: WriteRequest = serde_json::from_str(r#"{"path":"a/b"}"#).unwrap();
        assert!(req.content.is_none());
        assert!(req.overwrite.is_none());

        let req: WriteRequest = serde_json::from_str(r#"{"path":"a/b","content":{"k":1},"overwrite":false}"#).unwrap();
        assert_eq!(req.content, Some(serde_json::json!({"k": 1})));
        assert_eq!(req.overwrite, Some(false));
    }
}
