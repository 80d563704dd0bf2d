use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    api::{ApiError, ApiResult},
    db::repositories::{CompanyRepository, PostRepository},
    ranking,
    search::{parse, parse_combined, ParsedQuery},
    state::AppState,
};
use lux_types::{Post, SearchOutcome};

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

/// GET /search - General search over companies and posts
///
/// A blank query lists every company ranked. Exactly two tokens are tried
/// as a company-name fragment plus post-title fragment and resolve to that
/// single post; when either half fails to match, the whole raw query falls
/// back to fuzzy company filtering. Everything else is fuzzy from the start.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchOutcome>> {
    let companies = CompanyRepository::new(state.db.pool.clone());
    let posts = PostRepository::new(state.db.pool.clone());

    match parse(&query.q) {
        ParsedQuery::Empty => {
            let all_companies = companies
                .list_all()
                .map_err(|e| ApiError::InternalError(e.to_string()))?;
            let all_posts = posts
                .list_all()
                .map_err(|e| ApiError::InternalError(e.to_string()))?;
            Ok(Json(SearchOutcome::Companies {
                companies: ranking::rank(all_companies, &all_posts, None),
            }))
        }
        ParsedQuery::TwoToken { company, post, raw } => {
            if let Some(matched_company) = companies
                .find_by_name_fragment(&company)
                .map_err(|e| ApiError::InternalError(e.to_string()))?
            {
                if let Some(matched_post) = posts
                    .find_by_title_fragment(&matched_company.id, &post)
                    .map_err(|e| ApiError::InternalError(e.to_string()))?
                {
                    return Ok(Json(SearchOutcome::Post { post: matched_post }));
                }
            }
            // Exact resolution came up empty, retry the untouched query as
            // a fuzzy filter
            fuzzy_companies(&state, &raw)
        }
        ParsedQuery::Fuzzy(needle) => fuzzy_companies(&state, &needle),
    }
}

fn fuzzy_companies(state: &AppState, needle: &str) -> ApiResult<Json<SearchOutcome>> {
    let all_companies = CompanyRepository::new(state.db.pool.clone())
        .list_all()
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    let all_posts = PostRepository::new(state.db.pool.clone())
        .list_all()
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(SearchOutcome::Companies {
        companies: ranking::rank(all_companies, &all_posts, Some(needle)),
    }))
}

/// GET /search/combined - Exact `company+post` lookup
///
/// Unlike the general search this never falls back: a malformed query is a
/// 400 and a missed lookup is a 404.
pub async fn search_combined(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Post>> {
    let (company_fragment, post_fragment) =
        parse_combined(&query.q).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let companies = CompanyRepository::new(state.db.pool.clone());
    let company = companies
        .find_by_name_fragment(&company_fragment)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| {
            ApiError::NotFound(format!("No company matching '{}'", company_fragment))
        })?;

    let posts = PostRepository::new(state.db.pool.clone());
    let post = posts
        .find_by_title_fragment(&company.id, &post_fragment)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No post matching '{}' for company '{}'",
                post_fragment, company.name
            ))
        })?;

    Ok(Json(post))
}
