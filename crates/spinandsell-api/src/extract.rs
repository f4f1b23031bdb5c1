//! Request identity extractors.
//!
//! The auth gateway in front of the API authenticates the user and forwards
//! their id in `X-User-Id`.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use spinandsell_catalog::domain::viewer::Viewer;
use spinandsell_core::error::DomainError;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

fn user_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
}

/// The authenticated caller. Rejects with 401 when absent or malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_id(&parts.headers)
            .map(Self)
            .ok_or(ApiError(DomainError::Unauthorized))
    }
}

/// Whoever is looking at a listing: the authenticated user if any, otherwise
/// the client address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerIdentity(pub Viewer);

impl<S: Send + Sync> FromRequestParts<S> for ViewerIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = user_id(&parts.headers) {
            return Ok(Self(Viewer::User(id)));
        }

        let forwarded = parts
            .headers
            .get(FORWARDED_FOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(addr) = forwarded {
            return Ok(Self(Viewer::Address(addr.to_owned())));
        }

        let viewer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map_or(Viewer::Unknown, |ConnectInfo(addr)| {
                Viewer::Address(addr.ip().to_string())
            });
        Ok(Self(viewer))
    }
}
