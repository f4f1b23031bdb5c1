//! Routes for the Messaging bounded context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use spinandsell_core::model::{Message, Thread, ThreadOpening};
use spinandsell_messaging::application::{command_handlers, query_handlers};
use spinandsell_messaging::domain::commands::{OpenThread, SendMessage};

use crate::error::ApiError;
use crate::extract::AuthenticatedUser;
use crate::state::AppState;

/// Request body for POST /conversations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenConversationRequest {
    pub other_user_id: Uuid,
    #[serde(default)]
    pub product_id: Option<Uuid>,
}

/// Request body for POST /conversations/{id}/messages.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// The opened conversation and whether this request created it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenConversationResponse {
    pub id: Uuid,
    pub created: bool,
    pub conversation: Thread,
}

/// GET /conversations
#[instrument(skip(state), fields(user_id = %user))]
async fn list_conversations(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<query_handlers::ThreadView>>, ApiError> {
    let threads = query_handlers::list_threads_for_user(
        user,
        state.threads.as_ref(),
        state.users.as_ref(),
        state.listings.as_ref(),
    )
    .await?;
    Ok(Json(threads))
}

/// POST /conversations
#[instrument(skip(state, request), fields(user_id = %user, other_user_id = %request.other_user_id))]
async fn open_conversation(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(request): Json<OpenConversationRequest>,
) -> Result<(StatusCode, Json<OpenConversationResponse>), ApiError> {
    let command = OpenThread {
        correlation_id: Uuid::new_v4(),
        requester_id: user,
        other_user_id: request.other_user_id,
        listing_id: request.product_id,
    };

    let opening = command_handlers::handle_open_thread(
        &command,
        state.clock.as_ref(),
        state.users.as_ref(),
        state.listings.as_ref(),
        state.threads.as_ref(),
    )
    .await?;

    let (status, created, thread) = match opening {
        ThreadOpening::Created(thread) => (StatusCode::CREATED, true, thread),
        ThreadOpening::Existing(thread) => (StatusCode::OK, false, thread),
    };
    Ok((
        status,
        Json(OpenConversationResponse {
            id: thread.id,
            created,
            conversation: thread,
        }),
    ))
}

/// GET /conversations/{id}/messages
#[instrument(skip(state), fields(user_id = %user))]
async fn read_messages(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(thread_id): Path<Uuid>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = query_handlers::read_thread_messages(
        thread_id,
        user,
        state.clock.as_ref(),
        state.threads.as_ref(),
    )
    .await?;
    Ok(Json(messages))
}

/// POST /conversations/{id}/messages
#[instrument(skip(state, request), fields(user_id = %user))]
async fn send_message(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(thread_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let command = SendMessage {
        correlation_id: Uuid::new_v4(),
        thread_id,
        sender_id: user,
        content: request.content,
    };

    let message =
        command_handlers::handle_send_message(&command, state.clock.as_ref(), state.threads.as_ref())
            .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Returns the router for conversations.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_conversations).post(open_conversation))
        .route("/{id}/messages", get(read_messages).post(send_message))
}
