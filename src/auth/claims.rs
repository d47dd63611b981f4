use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::{dto::SessionUser, repo_types::Role};

/// Session token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,      // user ID
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(rename = "institutionName")]
    pub institution_name: String,
    pub iat: usize,     // issued at (unix timestamp)
    pub exp: usize,     // expires at (unix timestamp)
    pub iss: String,    // issuer
    pub aud: String,    // audience
    pub jti: Uuid,      // token id
}

impl Claims {
    pub fn user(&self) -> SessionUser {
        SessionUser {
            id: self.sub,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            institution_name: self.institution_name.clone(),
        }
    }

    pub fn expires_at(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.exp as i64).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}
