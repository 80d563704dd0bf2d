use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    api::{require_company, resolve_context, ApiError, ApiResult},
    db::repositories::{CompanyRepository, MessageRepository},
    state::AppState,
};
use lux_types::{Conversation, Message, SendMessageRequest};

/// GET /messages/conversations - Conversation overview, most recent first
pub async fn get_conversations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Conversation>>> {
    let context = resolve_context(&state, &headers)?;
    let (company_id, _) = require_company(&context)?;

    let messages = MessageRepository::new(state.db.pool.clone());
    let companies = CompanyRepository::new(state.db.pool.clone());

    let partner_ids = messages
        .conversation_partners(&company_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    let mut conversations = Vec::with_capacity(partner_ids.len());
    for partner_id in partner_ids {
        // Partner rows cascade away with the company, skip any that raced
        let Some(partner) = companies
            .get_by_id(&partner_id)
            .map_err(|e| ApiError::InternalError(e.to_string()))?
        else {
            continue;
        };

        let thread = messages
            .conversation_between(&company_id, &partner_id)
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        let Some(last) = thread.last() else {
            continue;
        };

        conversations.push(Conversation {
            company_id: partner.id,
            company_name: partner.name,
            last_message: last.content.clone(),
            last_message_time: last.created_at.to_rfc3339(),
        });
    }

    Ok(Json(conversations))
}

/// GET /messages/conversations/:company_id - Full thread with one company
pub async fn get_conversation_with(
    State(state): State<AppState>,
    Path(other_company_id): Path<Uuid>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Message>>> {
    let context = resolve_context(&state, &headers)?;
    let (company_id, _) = require_company(&context)?;

    let companies = CompanyRepository::new(state.db.pool.clone());
    companies
        .get_by_id(&other_company_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Company '{}' not found", other_company_id))
        })?;

    let messages = MessageRepository::new(state.db.pool.clone());
    let thread = messages
        .conversation_between(&company_id, &other_company_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(thread))
}

/// POST /messages - Send a message to another company by name
pub async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SendMessageRequest>,
) -> ApiResult<Json<Message>> {
    let context = resolve_context(&state, &headers)?;
    let (sender_id, sender_name) = require_company(&context)?;

    if payload.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".to_string()));
    }

    let companies = CompanyRepository::new(state.db.pool.clone());
    let receiver = companies
        .get_by_name(&payload.to_company)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Company '{}' not found", payload.to_company))
        })?;

    if receiver.id == sender_id {
        return Err(ApiError::BadRequest(
            "Cannot send message to yourself".to_string(),
        ));
    }

    let message = Message {
        id: Uuid::new_v4(),
        sender_id,
        receiver_id: receiver.id,
        sender_name,
        receiver_name: receiver.name,
        content: payload.content,
        created_at: Utc::now(),
    };
    MessageRepository::new(state.db.pool.clone())
        .create(&message)
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(message))
}
