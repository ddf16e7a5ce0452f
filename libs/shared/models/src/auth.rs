use serde::{Deserialize, Serialize};

/// Claims carried by every bearer token issued at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub username: String,
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// The caller resolved by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub is_admin: bool,
}

impl AuthUser {
    /// True when the caller is the owner of a record or an administrator.
    pub fn can_access(&self, owner_id: &str) -> bool {
        self.is_admin || self.id == owner_id
    }
}

impl From<JwtClaims> for AuthUser {
    fn from(claims: JwtClaims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            email: claims.email,
            is_admin: claims.is_admin,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub username: String,
    pub email: Option<String>,
}
