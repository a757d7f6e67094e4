// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token extraction and the Axum extractor for verified claims.
//!
//! Handlers behind the permission guard (see `middleware.rs`) receive the
//! verified claims with the `Auth` extractor:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(claims): Auth) -> impl IntoResponse {
//!     // claims are verified and carry the route's permission
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::{AuthError, Claims};

/// Pull the raw token out of an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively.
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let mut segments = value.split_whitespace();
    match (segments.next(), segments.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AuthError::MalformedHeader),
    }
}

/// Extractor for the claims of an authorized request.
///
/// The claims are placed in the request extensions by the permission guard.
/// A handler that uses this extractor on an unguarded route rejects every
/// request instead of running unauthenticated.
pub struct Auth(pub Claims);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| AuthError::GenericAuthFailure("route is not guarded".into()))
    }
}
