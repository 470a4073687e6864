//! HTTP server for HotSpots.
//!
//! Wires configuration, the [`Catalog`] and the bearer authenticator into one
//! axum [`Router`]: the JSON API under `/api`, a `/health` check, CORS, and a
//! fixed set of security headers on every response.

pub mod error;
pub mod jwt;

pub use error::{Error, Result};

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Json, Router,
  http::{HeaderName, HeaderValue, Method, header},
  routing::get,
};
use hotspots_core::{
  catalog::Catalog,
  clock::Clock,
  factor::RatingScale,
  identity::Authenticator,
  store::{BlobStore, SpotStore},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `HOTSPOTS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  /// HS shared secret, or the PEM public key for RS/PS/ES/EdDSA algorithms.
  pub jwt_secret:       String,
  pub jwt_algorithm:    String,
  pub jwt_audience:     Option<String>,
  pub jwt_issuer:       Option<String>,
  /// Token permission that grants admin rights.
  pub admin_permission: String,
  /// Browser origin allowed by CORS. No CORS headers are sent when unset.
  pub allowed_origin:   Option<String>,
  pub rating_min:       f64,
  pub rating_max:       f64,
  pub max_image_bytes:  usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let scale = RatingScale::default();
    Self {
      host:             "127.0.0.1".to_string(),
      port:             8080,
      store_path:       PathBuf::from("~/.local/share/hotspots/hotspots.db"),
      jwt_secret:       String::new(),
      jwt_algorithm:    "HS256".to_string(),
      jwt_audience:     None,
      jwt_issuer:       None,
      admin_permission: hotspots_core::identity::ADMIN.to_string(),
      allowed_origin:   None,
      rating_min:       scale.min,
      rating_max:       scale.max,
      max_image_bytes:  5 * 1024 * 1024,
    }
  }
}

impl ServerConfig {
  pub fn rating_scale(&self) -> Result<RatingScale> {
    RatingScale::new(self.rating_min, self.rating_max)
      .map_err(|e| Error::Config(e.to_string()))
  }
}

/// Build the catalog service over `store` using the configured rating scale.
pub fn catalog<S>(config: &ServerConfig, store: Arc<S>, clock: Arc<dyn Clock>) -> Result<Catalog<S>>
where
  S: SpotStore + BlobStore,
{
  Ok(Catalog::new(store, config.rating_scale()?, clock))
}

// ─── Router ───────────────────────────────────────────────────────────────────

const SECURITY_HEADERS: [(HeaderName, &str); 8] = [
  (header::X_FRAME_OPTIONS, "DENY"),
  (header::CONTENT_SECURITY_POLICY, "default-src 'self'; frame-ancestors 'none'"),
  (header::REFERRER_POLICY, "no-referrer"),
  (header::X_XSS_PROTECTION, "0"),
  (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
  (header::CACHE_CONTROL, "no-store, max-age=0"),
  (header::PRAGMA, "no-cache"),
  (header::EXPIRES, "0"),
];

fn cors_layer(origin: &str) -> Result<CorsLayer> {
  let origin = HeaderValue::from_str(origin)
    .map_err(|_| Error::Config(format!("invalid allowed_origin: {origin:?}")))?;
  Ok(
    CorsLayer::new()
      .allow_origin(origin)
      .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
      .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
      .max_age(Duration::from_secs(86_400)),
  )
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// Build the full application router.
pub fn router<S>(
  config: &ServerConfig,
  catalog: Arc<Catalog<S>>,
  authenticator: Arc<dyn Authenticator>,
) -> Result<Router>
where
  S: SpotStore + BlobStore + 'static,
{
  let mut app = Router::new()
    .route("/health", get(health))
    .nest(
      "/api",
      hotspots_api::api_router(catalog, authenticator, config.max_image_bytes),
    );

  for (name, value) in SECURITY_HEADERS {
    app = app.layer(SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value)));
  }
  if let Some(origin) = &config.allowed_origin {
    app = app.layer(cors_layer(origin)?);
  }
  Ok(app.layer(TraceLayer::new_for_http()))
}
