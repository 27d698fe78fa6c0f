pub mod error;
pub mod layer;
