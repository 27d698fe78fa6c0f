use bytes::Bytes;
use dmirror_api::files::Unreadable;
use dmirror_lib::mime::{self, Kind};

use crate::config;

pub mod text;
pub mod docx;
pub mod pdf;
pub mod ocr;

pub use ocr::{Ocr, OcrError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(String),
    Empty,
    OcrDisabled,
    OcrUnavailable(String),
    Failed(String),
    Unsupported,
}

impl Extraction {
    pub fn from_text(text: String) -> Self {
        if text.trim().is_empty() {
            Extraction::Empty
        } else {
            Extraction::Text(text)
        }
    }

    pub fn unreadable(&self) -> Option<(Unreadable, String)> {
        match self {
            Extraction::Text(_) => None,
            Extraction::Empty => Some((
                Unreadable::Empty,
                "no text could be extracted from this file".into()
            )),
            Extraction::OcrDisabled => Some((
                Unreadable::OcrDisabled,
                "this file needs ocr to be read and ocr is disabled".into()
            )),
            Extraction::OcrUnavailable(reason) => Some((
                Unreadable::OcrUnavailable,
                format!("ocr is not available: {reason}")
            )),
            Extraction::Failed(reason) => Some((
                Unreadable::Failed,
                format!("text extraction failed: {reason}")
            )),
            Extraction::Unsupported => Some((
                Unreadable::Unsupported,
                "reading this file type is not supported".into()
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Extractor {
    ocr: Option<Ocr>,
}

impl Extractor {
    pub fn from_settings(settings: &config::Ocr) -> Self {
        Extractor {
            ocr: settings.enabled.then(|| Ocr::from_settings(settings)),
        }
    }

    pub fn ocr_enabled(&self) -> bool {
        self.ocr.is_some()
    }

    pub async fn extract(&self, mime_type: &str, data: Bytes) -> Extraction {
        match mime::classify(mime_type) {
            Kind::Text => text::extract(&data),
            Kind::Document => {
                let result = tokio::task::spawn_blocking(move || docx::paragraphs(&data)).await;

                match result {
                    Ok(Ok(text)) => Extraction::from_text(text),
                    Ok(Err(err)) => Extraction::Failed(err),
                    Err(err) => Extraction::Failed(format!("document parser aborted: {err}")),
                }
            }
            Kind::Pdf => self.pdf(data).await,
            Kind::Image => match &self.ocr {
                Some(ocr) => ocr_outcome(ocr.image(&data).await),
                None => Extraction::OcrDisabled,
            },
            Kind::Unsupported => Extraction::Unsupported,
        }
    }

    async fn pdf(&self, data: Bytes) -> Extraction {
        let native = pdf::text_layer(data.clone()).await;

        let failure = match native {
            Ok(text) if !text.trim().is_empty() => return Extraction::Text(text),
            Ok(_) => None,
            Err(err) => {
                tracing::debug!("pdf text layer unavailable: {err}");

                Some(err)
            }
        };

        match (&self.ocr, failure) {
            (Some(ocr), _) => ocr_outcome(ocr.pdf(&data).await),
            (None, Some(err)) => Extraction::Failed(err),
            (None, None) => Extraction::OcrDisabled,
        }
    }
}

fn ocr_outcome(result: Result<String, OcrError>) -> Extraction {
    match result {
        Ok(text) => Extraction::from_text(text),
        Err(err @ OcrError::Missing(_)) => Extraction::OcrUnavailable(err.to_string()),
        Err(OcrError::Failed(msg)) => Extraction::Failed(msg),
    }
}
