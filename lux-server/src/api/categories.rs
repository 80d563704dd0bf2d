use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{require_admin, resolve_context, ApiError, ApiResult},
    db::repositories::{CategoryRepository, CompanyRepository, PostRepository},
    ranking,
    state::AppState,
    validation::validate_name,
};
use lux_types::{Category, CreateCategoryRequest, Post, RankedCompany, UpdateCategoryRequest};

/// GET /categories - List all categories
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let repo = CategoryRepository::new(state.db.pool.clone());
    let categories = repo
        .list_all()
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(categories))
}

/// POST /categories - Create a category (admin only)
pub async fn create_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    let context = resolve_context(&state, &headers)?;
    require_admin(&context)?;

    validate_name(&payload.name).map_err(ApiError::BadRequest)?;

    let repo = CategoryRepository::new(state.db.pool.clone());
    if repo
        .get_by_name(&payload.name)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Category '{}' already exists",
            payload.name
        )));
    }

    let category = Category {
        id: Uuid::new_v4(),
        name: payload.name,
        description: payload.description,
    };
    repo.create(&category)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    tracing::info!("Created category {} ({})", category.name, category.id);

    Ok(Json(category))
}

/// PUT /categories/:id - Update a category (admin only)
pub async fn update_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    let context = resolve_context(&state, &headers)?;
    require_admin(&context)?;

    validate_name(&payload.name).map_err(ApiError::BadRequest)?;

    let repo = CategoryRepository::new(state.db.pool.clone());
    repo.get_by_id(&category_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Category '{}' not found", category_id)))?;

    // The new name must not collide with a different category
    if let Some(existing) = repo
        .get_by_name(&payload.name)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
    {
        if existing.id != category_id {
            return Err(ApiError::Conflict(format!(
                "Category '{}' already exists",
                payload.name
            )));
        }
    }

    repo.update(&category_id, &payload.name, payload.description.as_deref())
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(Category {
        id: category_id,
        name: payload.name,
        description: payload.description,
    }))
}

/// DELETE /categories/:id - Delete a category and its posts (admin only)
pub async fn delete_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let context = resolve_context(&state, &headers)?;
    require_admin(&context)?;

    let repo = CategoryRepository::new(state.db.pool.clone());
    repo.get_by_id(&category_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Category '{}' not found", category_id)))?;

    repo.delete_cascade(&category_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    tracing::info!("Deleted category {}", category_id);

    Ok(Json(serde_json::json!({
        "message": "Category deleted successfully",
        "category_id": category_id
    })))
}

#[derive(Deserialize)]
pub struct RankingQuery {
    #[serde(default)]
    q: Option<String>,
}

/// GET /categories/:id/ranking - Rank the companies assigned to a category
///
/// Aggregates are computed over all of a company's posts, not only the posts
/// in this category; the category decides membership in the list. An optional
/// `q` filters by company name or post title.
pub async fn category_ranking(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
    Query(query): Query<RankingQuery>,
) -> ApiResult<Json<Vec<RankedCompany>>> {
    let categories = CategoryRepository::new(state.db.pool.clone());
    categories
        .get_by_id(&category_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Category '{}' not found", category_id)))?;

    let companies = CompanyRepository::new(state.db.pool.clone())
        .list_by_category(&category_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let posts = PostRepository::new(state.db.pool.clone())
        .list_all()
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let ranked = ranking::rank(companies, &posts, query.q.as_deref());

    Ok(Json(ranked))
}

/// GET /categories/:id/posts - Posts in a category, highest score first
pub async fn category_posts(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Post>>> {
    let categories = CategoryRepository::new(state.db.pool.clone());
    categories
        .get_by_id(&category_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Category '{}' not found", category_id)))?;

    let mut posts = PostRepository::new(state.db.pool.clone())
        .list_by_category(&category_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    posts.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    Ok(Json(posts))
}
