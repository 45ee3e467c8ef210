//! Identity claims carried by staff bearer tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims issued by the identity provider for a staff member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (staff ID).
    pub sub: Uuid,
    /// Display name of the staff member.
    #[serde(default)]
    pub name: String,
    /// Role string: `admin`, `ketua`, `sekretaris` or `bendahara`.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a staff member.
    #[must_use]
    pub fn new(staff_id: Uuid, name: &str, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: staff_id,
            name: name.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the staff ID from claims.
    #[must_use]
    pub const fn staff_id(&self) -> Uuid {
        self.sub
    }
}
