use std::future::Future;
use std::pin::Pin;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::net::error::{self, AuthKind};
use crate::state::ArcShared;

#[derive(Debug)]
pub struct Bearer;

/// the authorization header must be exactly `Bearer <token>`. without a
/// configured token nothing is accepted
pub fn check(expected: Option<&str>, headers: &HeaderMap) -> error::Result<Bearer> {
    let Some(expected) = expected else {
        return Err(error::Error::api((AuthKind::NoTokenConfigured, "no bearer token configured")));
    };

    let Some(given) = headers.get(AUTHORIZATION) else {
        return Err(error::Error::api((AuthKind::MissingToken, "missing bearer token")));
    };

    let valid = given.to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token == expected)
        .unwrap_or(false);

    if valid {
        Ok(Bearer)
    } else {
        Err(error::Error::api((AuthKind::InvalidToken, "invalid bearer token")))
    }
}

impl FromRequestParts<ArcShared> for Bearer {
    type Rejection = error::Error;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 ArcShared
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait
    {
        let result = check(state.bearer_token(), &parts.headers);

        Box::pin(async move { result })
    }
}
