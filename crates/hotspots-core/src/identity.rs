//! Caller identity and the credential-verification seam.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Permission tag that overrides review ownership and gates spot management.
pub const ADMIN: &str = "admin";

/// A verified caller. Derived per request from a credential; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub user_id:     String,
  pub permissions: BTreeSet<String>,
}

impl Identity {
  pub fn new(user_id: impl Into<String>) -> Self {
    Self { user_id: user_id.into(), permissions: BTreeSet::new() }
  }

  pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
    self.permissions.insert(permission.into());
    self
  }

  pub fn has_permission(&self, permission: &str) -> bool {
    self.permissions.contains(permission)
  }

  pub fn is_admin(&self) -> bool { self.has_permission(ADMIN) }
}

/// Verifies a bearer credential and yields the caller's identity.
///
/// Implementations must be safe to call concurrently; any key material they
/// cache is their own concern.
pub trait Authenticator: Send + Sync {
  /// Returns [`crate::Error::Unauthorized`] if the credential is not valid.
  fn verify(&self, credential: &str) -> Result<Identity>;
}
