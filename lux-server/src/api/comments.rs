use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use uuid::Uuid;

use crate::{
    api::{resolve_context, ApiError, ApiResult},
    db::repositories::{CommentRepository, PostRepository},
    state::AppState,
};

/// DELETE /comments/:id - Delete a comment
pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let context = resolve_context(&state, &headers)?;

    let repo = CommentRepository::new(state.db.pool.clone());
    let comment = repo
        .get_by_id(&comment_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("Comment '{}' not found", comment_id)))?;

    if !context.can_modify(&comment.company_id) {
        return Err(ApiError::Forbidden(
            "You can only delete your own comments".to_string(),
        ));
    }

    repo.delete(&comment_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    // Comment count feeds the post score
    let posts = PostRepository::new(state.db.pool.clone());
    posts
        .refresh_engagement(&comment.post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "message": "Comment deleted successfully",
        "comment_id": comment_id
    })))
}
