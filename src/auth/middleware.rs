// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Permission guard middleware for Axum.
//!
//! Wraps a single handler so it only runs for requests whose token verifies
//! and grants the permission. The verified claims are inserted into the
//! request extensions for the `Auth` extractor.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let guard = PermissionGuard::new(authenticator.clone(), Permission::PostDrinks);
//!
//! let app = Router::new().route(
//!     "/drinks",
//!     post(create_drink.layer(axum::middleware::from_fn_with_state(guard, require_permission))),
//! );
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{Authenticator, Permission};

/// Middleware state: who verifies, and what the route requires.
#[derive(Clone)]
pub struct PermissionGuard {
    authenticator: Arc<Authenticator>,
    permission: Permission,
}

impl PermissionGuard {
    pub fn new(authenticator: Arc<Authenticator>, permission: Permission) -> Self {
        Self {
            authenticator,
            permission,
        }
    }
}

/// Permission guard middleware function.
pub async fn require_permission(
    State(guard): State<PermissionGuard>,
    request: Request,
    next: Next,
) -> Response {
    let headers = request.headers().clone();
    let outcome = guard
        .authenticator
        .guard(&headers, guard.permission.as_str(), move |claims| async move {
            let mut request = request;
            request.extensions_mut().insert(claims);
            next.run(request).await
        })
        .await;

    match outcome {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}
