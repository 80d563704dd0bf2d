use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use lux_types::{Company, LoginRequest, LoginResponse, RegisterRequest};

use super::{ApiError, ApiResult};
use crate::credential::{hash_password, verify_password};
use crate::db::repositories::{CategoryRepository, CompanyRepository};
use crate::state::AppState;
use crate::validation::validate_name;

/// Response for session validation
#[derive(Serialize)]
pub struct ValidateSessionResponse {
    pub company: Company,
    pub valid: bool,
}

/// POST /auth/register - Register a new company
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<LoginResponse>> {
    validate_name(&payload.name).map_err(ApiError::BadRequest)?;
    if payload.password.is_empty() {
        return Err(ApiError::BadRequest("Password cannot be empty".to_string()));
    }

    // The category assignment is optional but must point at a real category
    if let Some(category_id) = payload.category_id {
        let categories = CategoryRepository::new(state.db.pool.clone());
        categories
            .get_by_id(&category_id)
            .map_err(|e| ApiError::InternalError(e.to_string()))?
            .ok_or_else(|| ApiError::NotFound(format!("Category '{}' not found", category_id)))?;
    }

    let repo = CompanyRepository::new(state.db.pool.clone());
    if repo
        .get_by_name(&payload.name)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Company '{}' already exists",
            payload.name
        )));
    }

    let credential_hash =
        hash_password(&payload.password).map_err(|e| ApiError::InternalError(e.to_string()))?;

    let company = Company {
        id: Uuid::new_v4(),
        name: payload.name,
        category_id: payload.category_id,
        created_at: Utc::now(),
    };
    repo.create(&company, &credential_hash)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let session_token = state
        .session_manager
        .create_session(company.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    tracing::info!("Registered company {} ({})", company.name, company.id);

    Ok(Json(LoginResponse {
        company,
        session_token,
    }))
}

/// POST /auth/login - Login with company credentials
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let repo = CompanyRepository::new(state.db.pool.clone());

    // Unknown name and wrong password produce the same response, the
    // endpoint never confirms whether a company exists
    let (company, credential_hash) = repo
        .find_with_credential(&payload.name)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid name or password".to_string()))?;

    let verified = verify_password(&payload.password, &credential_hash)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    if !verified {
        return Err(ApiError::Unauthorized(
            "Invalid name or password".to_string(),
        ));
    }

    let session_token = state
        .session_manager
        .create_session(company.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(LoginResponse {
        company,
        session_token,
    }))
}

/// POST /auth/logout - Logout current company
pub async fn logout(
    State(state): State<AppState>,
    Json(session_token): Json<String>,
) -> ApiResult<Json<serde_json::Value>> {
    // Delete session
    state
        .session_manager
        .delete_session(&session_token)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": "Logged out successfully"
    })))
}

/// GET /auth/validate - Validate session token
///
/// Validates the session token from the X-Session-Token header and returns
/// the associated company information if valid.
pub async fn validate_session(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> ApiResult<Json<ValidateSessionResponse>> {
    // Extract session token from header
    let token = headers
        .get("X-Session-Token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    // Validate session token
    let company_id = state
        .session_manager
        .validate_session(token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired session".to_string()))?;

    // Get company information
    let repo = CompanyRepository::new(state.db.pool.clone());
    let company = repo
        .get_by_id(&company_id)
        .map_err(|e| ApiError::InternalError(format!("Failed to get company: {}", e)))?
        .ok_or_else(|| ApiError::NotFound("Company not found".to_string()))?;

    Ok(Json(ValidateSessionResponse {
        company,
        valid: true,
    }))
}
