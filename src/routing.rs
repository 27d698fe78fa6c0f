use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::net::error::handle_error;
use crate::net::layer;
use crate::state::ArcShared;

pub mod auth;
mod handle;
mod serve_file;

pub use handle::BANNER;

pub fn routes(state: &ArcShared) -> Router {
    Router::new()
        .route("/", get(handle::root))
        .route("/healthz", get(handle::health::get))
        .route("/updates", get(handle::updates::get))
        .route("/search", get(handle::search::get))
        .route("/read", get(handle::read::get))
        .route("/write", post(handle::write::post))
        .fallback(serve_file::handle)
        .layer(ServiceBuilder::new()
            .layer(layer::RIDLayer::new())
            .layer(TraceLayer::new_for_http()
                .make_span_with(layer::trace::make_span_with)
                .on_request(layer::trace::on_request)
                .on_response(layer::trace::on_response)
                .on_failure(layer::trace::on_failure))
            .layer(HandleErrorLayer::new(handle_error))
            .layer(layer::TimeoutLayer::new(state.request_timeout())))
        .with_state(state.clone())
}
