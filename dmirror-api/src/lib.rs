mod response;

pub mod error;
pub use error::{ApiError, ApiErrorKind, Detail};

pub mod files;
pub use files::FileRecord;

pub use response::{serialize_json, error_json};
