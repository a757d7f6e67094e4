// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ErrorBody;

/// Message shown to clients for every failure before the permission check.
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";

/// Authentication error type.
///
/// The variant is the precise reason and is what gets logged. Clients only
/// see [`AUTHENTICATION_FAILED`] for token-stage failures; permission-stage
/// failures keep their own message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization header is missing")]
    MissingHeader,

    #[error("Authorization header must be 'Bearer <token>'")]
    MalformedHeader,

    #[error("Token header is malformed or has no key id")]
    InvalidTokenFormat,

    #[error("Failed to fetch signing keys: {0}")]
    KeyFetchError(String),

    #[error("Unable to find the appropriate key")]
    KeyNotFound,

    #[error("Token signature is invalid")]
    SignatureInvalid,

    #[error("Token has expired")]
    TokenExpired,

    #[error("The authentication claims seem to be invalid: {0}")]
    ClaimsInvalid(String),

    #[error("Permissions could not be found")]
    PermissionsClaimMissing,

    #[error("You do not have permission to access this resource")]
    PermissionDenied,

    #[error("Unable to parse authentication token: {0}")]
    GenericAuthFailure(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "missing_header",
            AuthError::MalformedHeader => "malformed_header",
            AuthError::InvalidTokenFormat => "invalid_token_format",
            AuthError::KeyFetchError(_) => "key_fetch_error",
            AuthError::KeyNotFound => "key_not_found",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::TokenExpired => "token_expired",
            AuthError::ClaimsInvalid(_) => "claims_invalid",
            AuthError::PermissionsClaimMissing => "permissions_claim_missing",
            AuthError::PermissionDenied => "permission_denied",
            AuthError::GenericAuthFailure(_) => "generic_auth_failure",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::PermissionsClaimMissing => StatusCode::NOT_FOUND,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Whether the failure happened before a verified token existed.
    pub fn is_token_stage(&self) -> bool {
        !matches!(
            self,
            AuthError::PermissionsClaimMissing | AuthError::PermissionDenied
        )
    }

    /// Message rendered in the response body.
    pub fn public_message(&self) -> String {
        if self.is_token_stage() {
            AUTHENTICATION_FAILED.to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::warn!(
            error_code = self.error_code(),
            error = %self,
            status = status.as_u16(),
            "Request denied"
        );
        let body = Json(ErrorBody::new(status, self.public_message()));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_header_returns_generic_401() {
        let response = AuthError::MissingHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 401);
        assert_eq!(body["message"], AUTHENTICATION_FAILED);
    }

    #[tokio::test]
    async fn missing_permissions_claim_returns_404() {
        let response = AuthError::PermissionsClaimMissing.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error"], 404);
        assert_eq!(body["message"], "Permissions could not be found");
    }

    #[test]
    fn every_other_kind_is_401() {
        let kinds = [
            AuthError::MissingHeader,
            AuthError::MalformedHeader,
            AuthError::InvalidTokenFormat,
            AuthError::KeyFetchError("timeout".into()),
            AuthError::KeyNotFound,
            AuthError::SignatureInvalid,
            AuthError::TokenExpired,
            AuthError::ClaimsInvalid("aud".into()),
            AuthError::PermissionDenied,
            AuthError::GenericAuthFailure("boom".into()),
        ];
        for kind in kinds {
            assert_eq!(kind.status_code(), StatusCode::UNAUTHORIZED, "{kind:?}");
        }
    }

    #[test]
    fn permission_denied_keeps_its_message() {
        assert_eq!(
            AuthError::PermissionDenied.public_message(),
            "You do not have permission to access this resource"
        );
        assert_eq!(
            AuthError::KeyNotFound.public_message(),
            AUTHENTICATION_FAILED
        );
    }
}
