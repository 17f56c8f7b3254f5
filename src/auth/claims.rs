use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::repo_types::User;

/// Access token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub jti: Uuid,  // unique per issued token
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
}

/// Refresh token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub id: Uuid,
    pub email: String,
    pub jti: Uuid,
    pub iat: usize,
    pub exp: usize,
}

/// Identity fields an access token is minted from.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: String,
}

impl From<&User> for Identity {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            username: u.username.clone(),
            full_name: u.full_name.clone(),
        }
    }
}

/// Common view over both claim sets for the token codec.
pub trait Expiring {
    fn set_times(&mut self, iat: usize, exp: usize);
}

impl Expiring for AccessClaims {
    fn set_times(&mut self, iat: usize, exp: usize) {
        self.iat = iat;
        self.exp = exp;
    }
}

impl Expiring for RefreshClaims {
    fn set_times(&mut self, iat: usize, exp: usize) {
        self.iat = iat;
        self.exp = exp;
    }
}

impl AccessClaims {
    pub fn for_identity(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
            username: identity.username.clone(),
            full_name: identity.full_name.clone(),
            jti: Uuid::new_v4(),
            iat: 0,
            exp: 0,
        }
    }
}

impl RefreshClaims {
    pub fn for_identity(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email.clone(),
            jti: Uuid::new_v4(),
            iat: 0,
            exp: 0,
        }
    }
}
