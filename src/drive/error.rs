#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("drive request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("drive responded with status {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    #[error("failed to authorize drive request: {0}")]
    Auth(String),

    #[error("invalid service account credentials: {0}")]
    Credentials(String),

    #[error("drive file not found: {0}")]
    NotFound(String),
}
