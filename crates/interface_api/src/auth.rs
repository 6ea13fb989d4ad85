//! Authentication and authorization
//!
//! Tokens are tenant-scoped: the JWT subject is the tenant identifier, and
//! every handler resolves its data through it. There is no cross-tenant
//! access path.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::TenantId;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (tenant ID)
    pub sub: String,
    /// Caller's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl Claims {
    /// Parses the subject as a tenant identifier
    pub fn tenant_id(&self) -> Result<TenantId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing permission: {0}")]
    MissingPermission(String),
}

/// Creates a new JWT token for a tenant
pub fn create_token(
    tenant_id: TenantId,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: tenant_id.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        if e.to_string().contains("ExpiredSignature") {
            AuthError::TokenExpired
        } else {
            AuthError::InvalidToken
        }
    })?;

    Ok(token_data.claims)
}

/// Checks if the caller has the required role
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims.roles.iter().any(|r| r == required_role || r == "admin")
}

/// Permission definitions
pub mod permissions {
    pub const INVOICE_READ: &str = "invoice:read";
    pub const INVOICE_WRITE: &str = "invoice:write";
    pub const INVOICE_ISSUE: &str = "invoice:issue";
    pub const SERIES_READ: &str = "series:read";
    pub const SERIES_WRITE: &str = "series:write";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let tenant = TenantId::new();
        let token = create_token(tenant, vec!["invoice:read".to_string()], "secret", 60).unwrap();
        let claims = validate_token(&token, "secret").unwrap();

        assert_eq!(claims.tenant_id().unwrap(), tenant);
        assert!(has_role(&claims, "invoice:read"));
        assert!(!has_role(&claims, "invoice:issue"));
    }

    #[test]
    fn test_admin_implies_everything() {
        let tenant = TenantId::new();
        let token = create_token(tenant, vec!["admin".to_string()], "secret", 60).unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert!(has_role(&claims, permissions::INVOICE_ISSUE));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token(TenantId::new(), vec![], "secret", 60).unwrap();
        assert!(validate_token(&token, "other").is_err());
    }
}
