//! mime types reported by the remote drive and how they map onto the ways
//! text can be pulled out of a file.

pub const FOLDER: &str = "application/vnd.google-apps.folder";
pub const GOOGLE_DOCUMENT: &str = "application/vnd.google-apps.document";
pub const GOOGLE_SPREADSHEET: &str = "application/vnd.google-apps.spreadsheet";
pub const GOOGLE_PRESENTATION: &str = "application/vnd.google-apps.presentation";

pub const GOOGLE_APPS_PREFIX: &str = "application/vnd.google-apps.";

pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PDF: &str = "application/pdf";
pub const JSON: &str = "application/json";
pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_CSV: &str = "text/csv";

pub fn is_folder(mime_type: &str) -> bool {
    mime_type == FOLDER
}

pub fn is_google_native(mime_type: &str) -> bool {
    mime_type.starts_with(GOOGLE_APPS_PREFIX)
}

pub fn export_target(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        GOOGLE_DOCUMENT | GOOGLE_PRESENTATION => Some(TEXT_PLAIN),
        GOOGLE_SPREADSHEET => Some(TEXT_CSV),
        _ => None
    }
}

pub fn essence(mime_type: &str) -> String {
    mime_type.split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Text,
    Document,
    Pdf,
    Image,
    Unsupported,
}

pub fn classify(mime_type: &str) -> Kind {
    let essence = essence(mime_type);

    if essence.starts_with("text/") ||
        essence == JSON ||
        essence == "application/xml" ||
        essence.ends_with("+json") ||
        essence.ends_with("+xml") {
        return Kind::Text;
    }

    match essence.as_str() {
        DOCX => Kind::Document,
        PDF => Kind::Pdf,
        "image/jpeg" |
        "image/jpg" |
        "image/png" |
        "image/tiff" => Kind::Image,
        _ => Kind::Unsupported
    }
}
