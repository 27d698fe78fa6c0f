pub mod timeout;
pub mod request_id;
pub mod trace;

pub use timeout::TimeoutLayer;
pub use request_id::RIDLayer;
