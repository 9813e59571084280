use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::channel::UserId;
use crate::error::AppError;

/// The authenticated actor behind a request.
///
/// Always passed explicitly; there is no ambient "current user".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
}

impl Principal {
    pub fn new(id: UserId) -> Self {
        Self { id }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// User roles
    #[serde(default)]
    pub roles: Vec<String>,
    /// Additional custom claims
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Claims {
    /// Resolve the principal these claims authenticate.
    pub fn principal(&self) -> Result<Principal, AppError> {
        let id = self.sub.parse::<UserId>().map_err(|_| {
            AppError::Auth(format!("Subject is not a numeric user id: {}", self.sub))
        })?;
        Ok(Principal::new(id))
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp < now
    }
}
