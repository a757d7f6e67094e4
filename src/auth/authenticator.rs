// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The request authenticator: extract, fetch keys, verify, check permission.

use std::future::Future;
use std::sync::Arc;

use axum::http::HeaderMap;
use jsonwebtoken::jwk::JwkSet;

use super::extractor::extract_token;
use super::jwks::JwksManager;
use super::permissions::check_permission;
use super::verify::{token_key_id, verify_with_leeway};
use super::{AuthError, Claims};
use crate::config::AuthConfig;

/// Verifies bearer tokens for one issuer and audience.
///
/// Holds the immutable [`AuthConfig`] and the shared JWKS cache; clone the
/// surrounding `Arc` to share it between requests.
pub struct Authenticator {
    config: AuthConfig,
    jwks: JwksManager,
}

impl Authenticator {
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        let jwks = JwksManager::new(config.jwks_fetch_timeout)?
            .with_cache_ttl(config.jwks_cache_ttl)
            .with_min_refresh_interval(config.jwks_min_refresh_interval);
        Ok(Self { config, jwks })
    }

    /// Signing keys of the configured issuer (cached).
    pub async fn fetch_signing_keys(&self) -> Result<Arc<JwkSet>, AuthError> {
        self.jwks.key_set(&self.config.jwks_url).await
    }

    /// Whether signing keys are available, fetching them if not cached.
    pub async fn keys_available(&self) -> bool {
        let url = &self.config.jwks_url;
        self.jwks.is_cached(url).await || self.jwks.refresh(url).await.is_ok()
    }

    /// Verify the request's bearer token and return its claims.
    ///
    /// Signing keys are fetched before the token is inspected, so an
    /// unreachable issuer is reported ahead of a malformed token.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let token = extract_token(headers)?;
        let key_set = self.fetch_signing_keys().await?;
        let kid = token_key_id(token)?;
        let key_set = if key_set.find(&kid).is_some() {
            key_set
        } else {
            self.jwks
                .key_set_for_kid(&self.config.jwks_url, &kid)
                .await?
        };

        verify_with_leeway(
            token,
            &key_set,
            &self.config.audience,
            &self.config.issuer,
            self.config.leeway,
        )
    }

    /// Authenticate the request and check it grants `permission`.
    pub async fn authorize(&self, headers: &HeaderMap, permission: &str) -> Result<Claims, AuthError> {
        let claims = self.authenticate(headers).await?;
        check_permission(permission, &claims)?;
        tracing::debug!(subject = claims.subject(), permission, "Request authorized");
        Ok(claims)
    }

    /// Run `operation` with the request's claims once the token is verified
    /// and grants `permission`.
    ///
    /// On any failure `operation` is never called and the error is returned.
    pub async fn guard<F, Fut, T>(
        &self,
        headers: &HeaderMap,
        permission: &str,
        operation: F,
    ) -> Result<T, AuthError>
    where
        F: FnOnce(Claims) -> Fut,
        Fut: Future<Output = T>,
    {
        let claims = self.authorize(headers, permission).await?;
        Ok(operation(claims).await)
    }
}
