use std::path::PathBuf;
use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Listener {
    pub addr: String,
}

#[derive(Debug, Deserialize)]
pub struct Drive {
    pub root_folder: Option<String>,
    pub credentials: Option<String>,
    pub credentials_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Sync {
    pub poll_seconds: Option<u64>,
    pub notify_limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct Notify {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Ocr {
    pub enabled: Option<bool>,
    pub lang: Option<String>,
    pub tesseract: Option<String>,
    pub pdftoppm: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub bearer_token: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub assets: Option<PathBuf>,

    pub listeners: Option<HashMap<String, Listener>>,

    pub drive: Option<Drive>,
    pub sync: Option<Sync>,
    pub notify: Option<Notify>,
    pub ocr: Option<Ocr>,
    pub http: Option<Http>,
}
