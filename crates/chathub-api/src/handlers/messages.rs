//! Message handlers.

use std::collections::HashSet;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use validator::Validate;

use chathub_core::error::AppError;
use chathub_entity::message::Message;
use chathub_service::ConversationView;

use crate::dto::request::{SendMessageRequest, SidebarQuery};
use crate::dto::response::{ApiResponse, MarkSeenResponse, SidebarResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::extractors::path::{parse_message_id, parse_user_id, parse_user_ids};
use crate::state::AppState;

/// GET /api/messages/users
pub async fn sidebar(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SidebarQuery>,
) -> Result<Json<ApiResponse<SidebarResponse>>, ApiError> {
    let viewer = auth.id();
    let mut users = match query.ids.as_deref() {
        Some(list) => parse_user_ids(list)?,
        None => state.conversations.counterparts(viewer).await?,
    };
    let mut listed = HashSet::new();
    users.retain(|u| *u != viewer && listed.insert(*u));

    let unseen_messages = state.unseen.sidebar_counts(viewer, &users).await?;

    Ok(Json(ApiResponse::ok(SidebarResponse {
        users,
        unseen_messages,
        online_users: state.realtime.registry.snapshot(),
    })))
}

/// GET /api/messages/{other_user_id}
pub async fn conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(other): Path<String>,
) -> Result<Json<ApiResponse<ConversationView>>, ApiError> {
    let other = parse_user_id(&other)?;
    let view = state.conversations.open(auth.id(), other).await?;
    Ok(Json(ApiResponse::ok(view)))
}

/// PUT /api/messages/mark/{id}
pub async fn mark_seen(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MarkSeenResponse>>, ApiError> {
    let message_id = parse_message_id(&id)?;
    state.conversations.mark_seen(message_id).await?;
    Ok(Json(ApiResponse::ok(MarkSeenResponse {
        message_id,
        seen: true,
    })))
}

/// POST /api/messages/send/{receiver_id}
///
/// Responds `201 Created` with the stored message.
pub async fn send(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(receiver): Path<String>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Message>>), ApiError> {
    let receiver = parse_user_id(&receiver)?;
    let Json(req) = payload.map_err(|e| AppError::validation(e.body_text()))?;
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let (text, media_ref) = req.into_parts();
    let message = state
        .delivery
        .send(auth.id(), receiver, text, media_ref)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message))))
}
