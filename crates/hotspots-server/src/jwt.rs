//! Bearer JWT verification for the API.
//!
//! Tokens carry the caller's id in `sub` and an Auth0-style `permissions`
//! array. The configured `admin_permission` is mapped onto the core
//! [`ADMIN`] permission so the rest of the service only knows one name for it.

use std::str::FromStr;

use chrono::{Duration, Utc};
use hotspots_core::{
  Error as CoreError,
  identity::{ADMIN, Authenticator, Identity},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
  ServerConfig,
  error::{Error, Result},
};

pub fn parse_algorithm(alg: &str) -> Result<Algorithm> {
  Algorithm::from_str(alg).map_err(|_| Error::Algorithm(alg.to_string()))
}

fn is_symmetric(algorithm: Algorithm) -> bool {
  matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

fn decoding_key(key_data: &str, algorithm: Algorithm) -> Result<DecodingKey> {
  match algorithm {
    Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
      Ok(DecodingKey::from_secret(key_data.as_bytes()))
    }
    Algorithm::RS256
    | Algorithm::RS384
    | Algorithm::RS512
    | Algorithm::PS256
    | Algorithm::PS384
    | Algorithm::PS512 => DecodingKey::from_rsa_pem(key_data.as_bytes()).map_err(Error::Key),
    Algorithm::ES256 | Algorithm::ES384 => {
      DecodingKey::from_ec_pem(key_data.as_bytes()).map_err(Error::Key)
    }
    Algorithm::EdDSA => DecodingKey::from_ed_pem(key_data.as_bytes()).map_err(Error::Key),
  }
}

/// Claims read from an incoming token. `aud`, `iss` and `exp` are checked by
/// [`Validation`] before this is produced.
#[derive(Debug, Deserialize)]
struct Claims {
  sub:         String,
  #[serde(default)]
  permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
struct IssuedClaims<'a> {
  sub:         &'a str,
  permissions: Vec<&'a str>,
  iat:         i64,
  exp:         i64,
  #[serde(skip_serializing_if = "Option::is_none")]
  aud:         Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  iss:         Option<&'a str>,
}

pub struct JwtAuthenticator {
  key:              DecodingKey,
  validation:       Validation,
  admin_permission: String,
}

impl JwtAuthenticator {
  pub fn from_config(config: &ServerConfig) -> Result<Self> {
    let algorithm = parse_algorithm(&config.jwt_algorithm)?;
    if config.jwt_secret.trim().is_empty() {
      return Err(Error::Config("jwt_secret must be set".into()));
    }
    let key = decoding_key(&config.jwt_secret, algorithm)?;

    let mut validation = Validation::new(algorithm);
    validation.leeway = 0;
    match &config.jwt_audience {
      Some(aud) => validation.set_audience(&[aud]),
      None => validation.validate_aud = false,
    }
    if let Some(iss) = &config.jwt_issuer {
      validation.set_issuer(&[iss]);
    }

    Ok(Self { key, validation, admin_permission: config.admin_permission.clone() })
  }
}

impl Authenticator for JwtAuthenticator {
  fn verify(&self, credential: &str) -> hotspots_core::Result<Identity> {
    let data = decode::<Claims>(credential, &self.key, &self.validation).map_err(|e| {
      tracing::debug!(error = %e, "jwt verification failed");
      CoreError::Unauthorized("invalid or expired token".into())
    })?;
    let claims = data.claims;
    if claims.sub.trim().is_empty() {
      return Err(CoreError::Unauthorized("token has no subject".into()));
    }

    let mut identity = Identity::new(claims.sub);
    for permission in claims.permissions {
      if permission == self.admin_permission {
        identity = identity.with_permission(ADMIN);
      }
      identity = identity.with_permission(permission);
    }
    Ok(identity)
  }
}

/// Sign a token with the configured shared secret. Only symmetric algorithms
/// are supported since the server never holds a private key.
pub fn issue_token(config: &ServerConfig, sub: &str, admin: bool, ttl: Duration) -> Result<String> {
  let algorithm = parse_algorithm(&config.jwt_algorithm)?;
  if !is_symmetric(algorithm) {
    return Err(Error::Config(format!(
      "token issuing needs an HS algorithm, configured {}",
      config.jwt_algorithm
    )));
  }
  if config.jwt_secret.trim().is_empty() {
    return Err(Error::Config("jwt_secret must be set".into()));
  }

  let now = Utc::now();
  let claims = IssuedClaims {
    sub,
    permissions: if admin { vec![config.admin_permission.as_str()] } else { Vec::new() },
    iat: now.timestamp(),
    exp: (now + ttl).timestamp(),
    aud: config.jwt_audience.as_deref(),
    iss: config.jwt_issuer.as_deref(),
  };
  encode(
    &Header::new(algorithm),
    &claims,
    &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
  )
  .map_err(Error::Sign)
}
