//! CurrentActor extractor

use std::ops::Deref;

use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};

use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;
use shared::models::{Actor, Role};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The authenticated caller of the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentActor(pub Actor);

impl CurrentActor {
    /// Read the identity headers
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let id = headers
            .get(ACTOR_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(AppError::Unauthorized)?;
        let role = headers
            .get(ACTOR_ROLE_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let role: Role = role.parse().map_err(|e: String| {
            security_log!("WARN", "bad_role_claim", actor_id = id.to_string(), error = e);
            AppError::Unauthorized
        })?;
        Ok(Self(Actor::new(id, role)))
    }

    pub fn into_inner(self) -> Actor {
        self.0
    }
}

impl Deref for CurrentActor {
    type Target = Actor;

    fn deref(&self) -> &Actor {
        &self.0
    }
}

/// Prefer the extension set by `require_auth`; fall back to the headers
impl FromRequestParts<ServerState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(actor) = parts.extensions.get::<CurrentActor>() {
            return Ok(actor.clone());
        }
        let actor = CurrentActor::from_headers(&parts.headers)?;
        parts.extensions.insert(actor.clone());
        Ok(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(id: Option<&str>, role: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(id) = id {
            headers.insert(ACTOR_ID_HEADER, HeaderValue::from_str(id).unwrap());
        }
        if let Some(role) = role {
            headers.insert(ACTOR_ROLE_HEADER, HeaderValue::from_str(role).unwrap());
        }
        headers
    }

    #[test]
    fn test_reads_identity_headers() {
        let actor = CurrentActor::from_headers(&headers(Some("drv-7"), Some("driver"))).unwrap();
        assert_eq!(actor.into_inner(), Actor::driver("drv-7"));
    }

    #[test]
    fn test_missing_or_bad_headers_are_unauthorized() {
        for h in [
            headers(None, Some("owner")),
            headers(Some("u1"), None),
            headers(Some("  "), Some("owner")),
            headers(Some("u1"), Some("courier")),
        ] {
            assert!(matches!(
                CurrentActor::from_headers(&h),
                Err(AppError::Unauthorized)
            ));
        }
    }
}
