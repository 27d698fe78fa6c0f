use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::config;

const PDF_DPI: &str = "300";
const PAGE_PREFIX: &str = "page";

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("{0} is not installed")]
    Missing(String),

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Ocr {
    lang: String,
    tesseract: String,
    pdftoppm: String,
}

impl Ocr {
    pub fn from_settings(settings: &config::Ocr) -> Self {
        Ocr {
            lang: settings.lang.clone(),
            tesseract: settings.tesseract.clone(),
            pdftoppm: settings.pdftoppm.clone(),
        }
    }

    pub async fn image(&self, data: &[u8]) -> Result<String, OcrError> {
        let dir = scratch_dir()?;
        let input = dir.path().join("input.img");

        tokio::fs::write(&input, data)
            .await
            .map_err(|err| OcrError::Failed(format!("failed to write image for ocr: {err}")))?;

        self.recognize(&input).await
    }

    pub async fn pdf(&self, data: &[u8]) -> Result<String, OcrError> {
        let dir = scratch_dir()?;
        let input = dir.path().join("input.pdf");

        tokio::fs::write(&input, data)
            .await
            .map_err(|err| OcrError::Failed(format!("failed to write pdf for ocr: {err}")))?;

        run(
            Command::new(&self.pdftoppm)
                .arg("-r")
                .arg(PDF_DPI)
                .arg("-png")
                .arg(&input)
                .arg(dir.path().join(PAGE_PREFIX)),
            &self.pdftoppm,
        ).await?;

        let pages = rendered_pages(dir.path()).await?;

        tracing::debug!("rasterized {} pdf pages for ocr", pages.len());

        let mut texts = Vec::with_capacity(pages.len());

        for page in pages {
            texts.push(self.recognize(&page).await?);
        }

        Ok(texts.join("\n"))
    }

    async fn recognize(&self, image: &Path) -> Result<String, OcrError> {
        let stdout = run(
            Command::new(&self.tesseract)
                .arg(image)
                .arg("stdout")
                .arg("-l")
                .arg(&self.lang),
            &self.tesseract,
        ).await?;

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

fn scratch_dir() -> Result<tempfile::TempDir, OcrError> {
    tempfile::Builder::new()
        .prefix("dmirror-ocr")
        .tempdir()
        .map_err(|err| OcrError::Failed(format!("failed to create ocr scratch dir: {err}")))
}

async fn run(command: &mut Command, program: &str) -> Result<Vec<u8>, OcrError> {
    let output = command.kill_on_drop(true)
        .output()
        .await
        .map_err(|err| match err.kind() {
            ErrorKind::NotFound => OcrError::Missing(program.to_owned()),
            _ => OcrError::Failed(format!("failed to run {program}: {err}")),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);

        return Err(OcrError::Failed(format!(
            "{program} exited with {}: {}", output.status, stderr.trim()
        )));
    }

    Ok(output.stdout)
}

/// png files written by pdftoppm, in page order. page numbers are zero
/// padded to the same width so name order is page order
async fn rendered_pages(dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|err| OcrError::Failed(format!("failed to read ocr scratch dir: {err}")))?;

    let mut pages = Vec::new();

    while let Some(entry) = entries.next_entry()
        .await
        .map_err(|err| OcrError::Failed(format!("failed to read ocr scratch dir: {err}")))? {
        let path = entry.path();
        let is_page = path.file_name()
            .and_then(OsStr::to_str)
            .map(|name| name.starts_with(PAGE_PREFIX) && name.ends_with(".png"))
            .unwrap_or(false);

        if is_page {
            pages.push(path);
        }
    }

    pages.sort();

    Ok(pages)
}
