// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared test fixtures: RSA signing keys, token minting and a mock issuer.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::auth::{verify::ALGORITHM, Authenticator};
use crate::config::AuthConfig;
use crate::state::AppState;
use crate::storage::MemoryDrinkStore;

pub const ISSUER: &str = "https://coffee-shop.test.example.com/";
pub const AUDIENCE: &str = "coffee-shop-api";
pub const PRIMARY_KID: &str = "primary-key";
pub const ROTATED_KID: &str = "rotated-key";

pub const JWKS_PATH: &str = "/.well-known/jwks.json";
const EXPONENT: &str = "AQAB";
const PRIMARY_MODULUS: &str = "vpgZ0xxNi_YU6APODvQLutT832jY3iWcNH5gPT-y34Yguy1hnV56D8RAO_K0rKPgTBtNn8zES-onLX34vfPTFQYo0nciEtzFB_z2lf3dMh4CCMd9-GyIs9TIRQj6Yi7LkO-lB5EKoc04XEtFdbSk0RB-x9FcCFn4rqVm1s8hyvvqjYXJz2WHzhZvbuY5fORK587dxqp4L2tZNkmvzk91C972GGDiH8VCrbFPDRW0EwdB2HCiBwuEDbWOaXQ1FJ430moCgh-XtV0t3CGwDKEHZK4CLYdW0eqETkyIjHmo90SimCLH1askpCyK0LL-4wkDDWZB3wgNIsvu8JNXXYV6CQ";
const ROTATED_MODULUS: &str = "zWKSf6qxqw7weL7ROyUcYSBzDl7KYGMUEcPLyr4PRE-k-p9hZRKp_v2lIWL00CgRugNJA-WIgmHLM4hgkAxczyk095BKuouMi-GaGmVBBpZMLkPOEAs9nnPbAHjBdeuEKsVqnUykjLmrZF02-Nqr4GbcoqLGG06oO215l-d97BnOyhS3NRqIz0iBsP5oCXRG9kvV6sQ0wk_NMsig-qAu0Ksde5wYKoCVco8tG0maTJyepV46E5LKvbX_HjS2i5Zwo1zzJHSZqEukK40ifkVfAB-s57REwtxDzr92XwRdEm48TMCbfLjOdEKvGs237Z4vkRDfH-FmPBI8ZbOwqAbv2Q";

/// Private halves of the fixture keys in `testdata/`.
#[derive(Debug, Clone, Copy)]
pub enum SigningKey {
    Primary,
    Rotated,
}

impl SigningKey {
    fn pem(self) -> &'static str {
        match self {
            SigningKey::Primary => include_str!("../testdata/signing_key_primary.pem"),
            SigningKey::Rotated => include_str!("../testdata/signing_key_rotated.pem"),
        }
    }
}

/// JWKS document publishing the public key for each kid. `ROTATED_KID` maps
/// to the rotated key; every other kid maps to the primary key.
pub fn jwks_json(kids: &[&str]) -> Value {
    let keys: Vec<Value> = kids
        .iter()
        .map(|kid| {
            let modulus = if *kid == ROTATED_KID {
                ROTATED_MODULUS
            } else {
                PRIMARY_MODULUS
            };
            json!({
                "kty": "RSA",
                "use": "sig",
                "alg": "RS256",
                "kid": kid,
                "n": modulus,
                "e": EXPONENT,
            })
        })
        .collect();
    json!({ "keys": keys })
}

pub fn jwk_set(kids: &[&str]) -> JwkSet {
    serde_json::from_value(jwks_json(kids)).expect("fixture JWKS is valid")
}

/// Claims accepted by the test authenticator, valid for an hour.
pub fn valid_claims(permissions: &[&str]) -> Value {
    let now = chrono::Utc::now().timestamp();
    json!({
        "iss": ISSUER,
        "sub": "auth0|barista",
        "aud": [AUDIENCE, "https://coffee-shop.test.example.com/userinfo"],
        "iat": now,
        "exp": now + 3600,
        "permissions": permissions,
    })
}

pub fn mint_token(claims: &Value, kid: &str, key: SigningKey) -> String {
    let mut header = Header::new(ALGORITHM);
    header.kid = Some(kid.to_string());
    let encoding_key = EncodingKey::from_rsa_pem(key.pem().as_bytes()).expect("fixture key is valid");
    encode(&header, claims, &encoding_key).expect("token encodes")
}

/// Token signed by the primary key carrying `permissions`.
pub fn token_with(permissions: &[&str]) -> String {
    mint_token(&valid_claims(permissions), PRIMARY_KID, SigningKey::Primary)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Start a mock issuer publishing `kids` and return an auth config pointing at it.
pub async fn mock_issuer(kids: &[&str]) -> (MockServer, AuthConfig) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json(kids)))
        .mount(&server)
        .await;

    let config = issuer_config(&server);
    (server, config)
}

/// Auth config pointing at the JWKS path of `server`; mount responses yourself.
pub fn issuer_config(server: &MockServer) -> AuthConfig {
    let jwks_url = Url::parse(&format!("{}{JWKS_PATH}", server.uri())).expect("mock URL parses");
    AuthConfig::new(ISSUER, AUDIENCE, jwks_url).with_jwks_fetch_timeout(Duration::from_secs(2))
}

pub fn authenticator(config: AuthConfig) -> Arc<Authenticator> {
    Arc::new(Authenticator::new(config).expect("authenticator builds"))
}

/// App state over an empty in-memory store.
pub fn test_state(config: AuthConfig) -> AppState {
    AppState::new(Arc::new(MemoryDrinkStore::new()), authenticator(config))
}
