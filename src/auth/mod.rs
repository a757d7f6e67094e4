// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer token authentication and permission checks for the drinks API.
//!
//! ## Auth Flow
//!
//! 1. The frontend signs the user in with the OAuth2 tenant
//! 2. The frontend sends `Authorization: Bearer <access token>`
//! 3. The server:
//!    - Reads the token's `kid` and fetches the tenant JWKS via HTTPS
//!    - Verifies the RS256 signature, expiry, issuer and audience
//!    - Checks the `permissions` claim contains the route's permission
//!    - Runs the handler with the verified claims
//!
//! Any failure stops the request before the handler runs.
//!
//! ## Security
//!
//! - Only RS256 is accepted
//! - JWKS is cached with TTL and refreshed single-flight
//! - Clients see a generic message for token failures; the precise reason is logged

pub mod authenticator;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod middleware;
pub mod permissions;
pub mod verify;

pub use authenticator::Authenticator;
pub use claims::Claims;
pub use error::AuthError;
pub use extractor::{extract_token, Auth};
pub use jwks::JwksManager;
pub use middleware::{require_permission, PermissionGuard};
pub use permissions::{check_permission, Permission};
pub use verify::verify;
