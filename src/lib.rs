// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coffee Shop - Drinks Menu Service
//!
//! This crate serves the drinks menu over HTTP. Reading the short menu is
//! public; everything else requires an RS256 bearer token issued by the
//! configured OAuth2 tenant and carrying the route's permission.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Bearer token verification against the issuer JWKS and permission guards
//! - `config` - Startup configuration read from the environment
//! - `storage` - Drink store (in-memory or embedded redb)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_utils;
