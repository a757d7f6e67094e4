// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token signature and claim verification against a JWKS.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::{AuthError, Claims};

/// The only accepted signing algorithm.
pub const ALGORITHM: Algorithm = Algorithm::RS256;

/// Claims a token must carry to be considered at all.
const REQUIRED_CLAIMS: [&str; 3] = ["exp", "aud", "iss"];

/// Just enough of the JOSE header to pick a key.
#[derive(Debug, Deserialize)]
struct UnverifiedHeader {
    #[serde(default)]
    kid: Option<String>,
}

/// Read the key id from a token's header without checking the signature.
pub fn token_key_id(token: &str) -> Result<String, AuthError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::InvalidTokenFormat);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header.trim_end_matches('='))
        .map_err(|_| AuthError::InvalidTokenFormat)?;
    let header: UnverifiedHeader =
        serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidTokenFormat)?;

    header.kid.ok_or(AuthError::InvalidTokenFormat)
}

/// Verify `token` against `key_set` with no clock-skew leeway.
pub fn verify(
    token: &str,
    key_set: &JwkSet,
    expected_audience: &str,
    expected_issuer: &str,
) -> Result<Claims, AuthError> {
    verify_with_leeway(token, key_set, expected_audience, expected_issuer, 0)
}

/// Verify `token` against `key_set`, allowing `leeway` seconds of clock skew
/// on the expiry check.
///
/// Steps run in order and stop at the first failure: key id, key lookup,
/// RS256 signature, then audience/issuer/expiry.
pub fn verify_with_leeway(
    token: &str,
    key_set: &JwkSet,
    expected_audience: &str,
    expected_issuer: &str,
    leeway: u64,
) -> Result<Claims, AuthError> {
    let kid = token_key_id(token)?;
    let jwk = key_set.find(&kid).ok_or(AuthError::KeyNotFound)?;
    let decoding_key = rsa_decoding_key(jwk)?;

    let mut validation = Validation::new(ALGORITHM);
    validation.leeway = leeway;
    validation.set_audience(&[expected_audience]);
    validation.set_issuer(&[expected_issuer]);
    validation.set_required_spec_claims(&REQUIRED_CLAIMS);

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                AuthError::SignatureInvalid
            }
            ErrorKind::InvalidAudience => AuthError::ClaimsInvalid("audience mismatch".into()),
            ErrorKind::InvalidIssuer => AuthError::ClaimsInvalid("issuer mismatch".into()),
            ErrorKind::ImmatureSignature => AuthError::ClaimsInvalid("token not yet valid".into()),
            ErrorKind::MissingRequiredClaim(claim) => {
                AuthError::ClaimsInvalid(format!("missing {claim} claim"))
            }
            _ => AuthError::GenericAuthFailure(e.to_string()),
        })
}

/// Convert a JWK to a DecodingKey, accepting RSA keys meant for RS256 only.
fn rsa_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    if !matches!(jwk.common.key_algorithm, None | Some(KeyAlgorithm::RS256)) {
        return Err(AuthError::SignatureInvalid);
    }

    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
            .map_err(|e| AuthError::GenericAuthFailure(format!("Failed to create RSA key: {e}"))),
        _ => Err(AuthError::SignatureInvalid),
    }
}
