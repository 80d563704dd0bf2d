pub mod auth;
pub mod categories;
pub mod comments;
pub mod companies;
pub mod error;
pub mod messages;
pub mod posts;
pub mod search;

pub use error::{ApiError, ApiResult};

use axum::http::HeaderMap;
use lux_types::{Actor, AuthContext};
use uuid::Uuid;

use crate::db::repositories::CompanyRepository;
use crate::state::AppState;

/// Resolve the request headers into an authenticated actor.
///
/// An `X-Admin-Token` header is checked first and must match the configured
/// token exactly; with no token configured admin access is disabled
/// entirely. Otherwise `X-Session-Token` identifies a company session.
pub(crate) fn resolve_context(state: &AppState, headers: &HeaderMap) -> ApiResult<AuthContext> {
    if let Some(candidate) = headers.get("X-Admin-Token").and_then(|v| v.to_str().ok()) {
        return match &state.admin_token {
            Some(expected) if expected == candidate => Ok(AuthContext::admin()),
            _ => Err(ApiError::Unauthorized("Invalid admin token".to_string())),
        };
    }

    let token = headers
        .get("X-Session-Token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    let company_id = state
        .get_authenticated_company_id_from_token(token)
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired session token".to_string()))?;

    let company = CompanyRepository::new(state.db.pool.clone())
        .get_by_id(&company_id)?
        .ok_or_else(|| ApiError::Unauthorized("Invalid session token".to_string()))?;

    Ok(AuthContext::company(company.id, company.name))
}

/// Admin-only gate for category management endpoints
pub(crate) fn require_admin(context: &AuthContext) -> ApiResult<()> {
    if context.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Admin role required".to_string()))
    }
}

/// Gate for endpoints that act as a specific company. The admin token
/// carries no company identity, so it cannot post, like, invest, comment
/// or message.
pub(crate) fn require_company(context: &AuthContext) -> ApiResult<(Uuid, String)> {
    match &context.actor {
        Actor::Company { id, name } => Ok((*id, name.clone())),
        Actor::Admin => Err(ApiError::Forbidden(
            "A company session is required".to_string(),
        )),
    }
}
