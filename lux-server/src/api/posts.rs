use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{resolve_context, require_company, ApiError, ApiResult},
    db::repositories::{
        CategoryRepository, CommentRepository, InvestmentRepository, LikeRepository,
        PostRepository,
    },
    state::AppState,
    validation::{validate_content, validate_title},
};
use lux_types::{
    Comment, CreateCommentRequest, CreatePostRequest, Investment, InvestRequest, Post,
    UpdatePostRequest,
};

#[derive(Deserialize)]
pub struct GetPostsQuery {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    category_id: Option<Uuid>,
}

fn default_limit() -> i64 {
    25
}

/// GET /posts - Get the newest posts, optionally filtered by category
pub async fn get_posts(
    State(state): State<AppState>,
    Query(query): Query<GetPostsQuery>,
) -> ApiResult<Json<Vec<Post>>> {
    let repo = PostRepository::new(state.db.pool.clone());
    let posts = repo
        .list_recent(query.limit, query.category_id.as_ref())
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(posts))
}

/// POST /posts - Create a new post
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<Json<Post>> {
    let context = resolve_context(&state, &headers)?;
    let (company_id, company_name) = require_company(&context)?;

    validate_title(&payload.title).map_err(ApiError::BadRequest)?;
    validate_content(&payload.content).map_err(ApiError::BadRequest)?;

    let categories = CategoryRepository::new(state.db.pool.clone());
    categories
        .get_by_id(&payload.category_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Category '{}' not found", payload.category_id))
        })?;

    let repo = PostRepository::new(state.db.pool.clone());
    let post = Post {
        id: Uuid::new_v4(),
        company_id,
        company_name,
        category_id: payload.category_id,
        title: payload.title,
        content: payload.content,
        created_at: Utc::now(),
        likes: 0,
        investment: 0,
        comment_count: 0,
        score: 0.0,
    };
    repo.create(&post)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    repo.refresh_engagement(&post.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let created = repo
        .get_by_id(&post.id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::InternalError("Created post disappeared".to_string()))?;

    Ok(Json(created))
}

/// GET /posts/:id - Get a single post
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<Post>> {
    let repo = PostRepository::new(state.db.pool.clone());
    let post = repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Post '{}' not found", post_id)))?;

    Ok(Json(post))
}

/// PUT /posts/:id - Update a post's title and content
pub async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<UpdatePostRequest>,
) -> ApiResult<Json<Post>> {
    let context = resolve_context(&state, &headers)?;

    let repo = PostRepository::new(state.db.pool.clone());
    let post = repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Post '{}' not found", post_id)))?;

    if !context.can_modify(&post.company_id) {
        return Err(ApiError::Forbidden(
            "You can only edit your own posts".to_string(),
        ));
    }

    validate_title(&payload.title).map_err(ApiError::BadRequest)?;
    validate_content(&payload.content).map_err(ApiError::BadRequest)?;

    repo.update_content(&post_id, &payload.title, &payload.content)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    // Content length feeds the score, so the cached value must follow
    repo.refresh_engagement(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let updated = repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Post '{}' not found", post_id)))?;

    Ok(Json(updated))
}

/// DELETE /posts/:id - Delete a post
pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let context = resolve_context(&state, &headers)?;

    let repo = PostRepository::new(state.db.pool.clone());
    let post = repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Post '{}' not found", post_id)))?;

    if !context.can_modify(&post.company_id) {
        return Err(ApiError::Forbidden(
            "You can only delete your own posts".to_string(),
        ));
    }

    repo.delete(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": "Post deleted successfully",
        "post_id": post_id
    })))
}

/// POST /posts/:id/like - Like a post (idempotent)
pub async fn like_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let context = resolve_context(&state, &headers)?;
    let (company_id, _) = require_company(&context)?;

    let repo = PostRepository::new(state.db.pool.clone());
    repo.get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Post '{}' not found", post_id)))?;

    let likes = LikeRepository::new(state.db.pool.clone());
    likes
        .like(&post_id, &company_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    repo.refresh_engagement(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let post = repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Post '{}' not found", post_id)))?;

    Ok(Json(serde_json::json!({
        "message": "Post liked",
        "post_id": post_id,
        "likes": post.likes,
        "score": post.score
    })))
}

/// POST /posts/:id/invest - Invest in a post
pub async fn invest(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<InvestRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let context = resolve_context(&state, &headers)?;
    let (company_id, _) = require_company(&context)?;

    if payload.amount < 1 {
        return Err(ApiError::BadRequest(
            "Investment amount must be at least 1".to_string(),
        ));
    }

    let repo = PostRepository::new(state.db.pool.clone());
    repo.get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Post '{}' not found", post_id)))?;

    let investments = InvestmentRepository::new(state.db.pool.clone());
    investments
        .create(&Investment {
            id: Uuid::new_v4(),
            post_id,
            company_id,
            amount: payload.amount,
            created_at: Utc::now(),
        })
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    repo.refresh_engagement(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let post = repo
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Post '{}' not found", post_id)))?;

    Ok(Json(serde_json::json!({
        "message": "Investment recorded",
        "post_id": post_id,
        "investment": post.investment,
        "score": post.score
    })))
}

/// GET /posts/:id/comments - Get all comments on a post, oldest first
pub async fn get_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Comment>>> {
    let posts = PostRepository::new(state.db.pool.clone());
    posts
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Post '{}' not found", post_id)))?;

    let repo = CommentRepository::new(state.db.pool.clone());
    let comments = repo
        .list_by_post(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(comments))
}

/// POST /posts/:id/comments - Comment on a post
pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    let context = resolve_context(&state, &headers)?;
    let (company_id, company_name) = require_company(&context)?;

    if payload.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Comment cannot be empty".to_string()));
    }

    let posts = PostRepository::new(state.db.pool.clone());
    posts
        .get_by_id(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Post '{}' not found", post_id)))?;

    let repo = CommentRepository::new(state.db.pool.clone());
    let comment = Comment {
        id: Uuid::new_v4(),
        post_id,
        company_id,
        company_name,
        content: payload.content,
        created_at: Utc::now(),
    };
    repo.create(&comment)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    posts
        .refresh_engagement(&post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(comment))
}
