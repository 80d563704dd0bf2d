use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use uuid::Uuid;

use crate::{
    api::{resolve_context, ApiError, ApiResult},
    db::repositories::{CategoryRepository, CompanyRepository, PostRepository},
    ranking,
    state::AppState,
};
use lux_types::{CompanyProfile, RankedCompany, UpdateCompanyRequest};

/// GET /companies/top - The "Top companies by AI" list
///
/// Companies whose aggregate score reaches at least 1, ranked by aggregate,
/// capped at 100 entries. Recomputed from the posts on every request.
pub async fn top_companies(State(state): State<AppState>) -> ApiResult<Json<Vec<RankedCompany>>> {
    let companies = CompanyRepository::new(state.db.pool.clone())
        .list_all()
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let posts = PostRepository::new(state.db.pool.clone())
        .list_all()
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(ranking::top_companies(companies, &posts)))
}

/// GET /companies/:id - Company profile with aggregate score and posts
pub async fn get_company(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<CompanyProfile>> {
    let repo = CompanyRepository::new(state.db.pool.clone());
    let company = repo
        .get_by_id(&company_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Company '{}' not found", company_id)))?;

    let posts = PostRepository::new(state.db.pool.clone())
        .list_by_company(&company_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let aggregate = ranking::aggregate_score(&posts);

    Ok(Json(CompanyProfile {
        company,
        aggregate,
        posts,
    }))
}

/// PUT /companies/:id - Update a company's category assignment
pub async fn update_company(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<UpdateCompanyRequest>,
) -> ApiResult<Json<CompanyProfile>> {
    let context = resolve_context(&state, &headers)?;

    let repo = CompanyRepository::new(state.db.pool.clone());
    repo.get_by_id(&company_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Company '{}' not found", company_id)))?;

    if !context.can_modify(&company_id) {
        return Err(ApiError::Forbidden(
            "You can only update your own company".to_string(),
        ));
    }

    if let Some(category_id) = payload.category_id {
        let categories = CategoryRepository::new(state.db.pool.clone());
        categories
            .get_by_id(&category_id)
            .map_err(|e| ApiError::InternalError(e.to_string()))?
            .ok_or_else(|| ApiError::NotFound(format!("Category '{}' not found", category_id)))?;
    }

    repo.set_category(&company_id, payload.category_id.as_ref())
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let company = repo
        .get_by_id(&company_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Company '{}' not found", company_id)))?;
    let posts = PostRepository::new(state.db.pool.clone())
        .list_by_company(&company_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let aggregate = ranking::aggregate_score(&posts);

    Ok(Json(CompanyProfile {
        company,
        aggregate,
        posts,
    }))
}
