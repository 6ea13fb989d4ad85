//! Request handlers

pub mod health;
pub mod invoice;
pub mod series;

use core_kernel::TenantId;

use crate::auth::{self, Claims};
use crate::error::ApiError;

/// Checks the caller's permission and resolves the tenant from the token
fn authorize(claims: &Claims, permission: &str) -> Result<TenantId, ApiError> {
    if !auth::has_role(claims, permission) {
        return Err(ApiError::Forbidden(format!(
            "Missing permission: {permission}"
        )));
    }
    claims.tenant_id().map_err(|_| ApiError::Unauthorized)
}
