//! Caller identity extraction
//!
//! Authentication itself lives upstream; by the time a request reaches this
//! service the gateway has resolved the caller and stamped identity headers.
//! A request without them is rejected, never defaulted.

use async_trait::async_trait;
use atelier_core::AtelierError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

pub const ORGANIZATION_HEADER: &str = "x-organization-id";
pub const ACTOR_HEADER: &str = "x-actor-id";

/// The resolved caller every mutating route requires
#[derive(Debug, Clone)]
pub struct Caller {
    pub organization_id: String,
    pub actor_id: String,
}

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let organization_id = header_value(parts, ORGANIZATION_HEADER).ok_or_else(|| {
            ApiError(AtelierError::Forbidden(format!(
                "missing {} header",
                ORGANIZATION_HEADER
            )))
        })?;
        let actor_id = header_value(parts, ACTOR_HEADER).ok_or_else(|| {
            ApiError(AtelierError::Forbidden(format!(
                "missing {} header",
                ACTOR_HEADER
            )))
        })?;
        Ok(Caller {
            organization_id,
            actor_id,
        })
    }
}
