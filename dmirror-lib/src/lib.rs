pub mod error;
pub mod validation;
pub mod query;
pub mod mime;
pub mod path;
