//! Query handlers for the Messaging context.

use chrono::{DateTime, Utc};
use serde::Serialize;
use spinandsell_core::clock::Clock;
use spinandsell_core::error::DomainError;
use spinandsell_core::model::{Message, User};
use spinandsell_core::repository::{ListingRepository, ThreadRepository, UserRepository};
use uuid::Uuid;

/// Public view of a thread participant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
}

impl From<&User> for ParticipantView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Listing summary shown alongside a thread.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadListingView {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub price: i64,
    pub sold: bool,
}

/// A thread as seen by one of its participants.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadView {
    pub id: Uuid,
    pub other_participant: Option<ParticipantView>,
    pub listing: Option<ThreadListingView>,
    pub last_message: Option<Message>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Lists the threads of `user_id`, most recently active first.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if any lookup fails.
pub async fn list_threads_for_user(
    user_id: Uuid,
    threads: &dyn ThreadRepository,
    users: &dyn UserRepository,
    listings: &dyn ListingRepository,
) -> Result<Vec<ThreadView>, DomainError> {
    let summaries = threads.list_threads(user_id).await?;
    let mut views = Vec::with_capacity(summaries.len());
    for summary in summaries {
        let thread = summary.thread;
        let other = users.find_user(thread.other_participant(user_id)).await?;
        let listing = match thread.listing_id {
            Some(listing_id) => listings.find_listing(listing_id).await?,
            None => None,
        };
        views.push(ThreadView {
            id: thread.id,
            other_participant: other.as_ref().map(ParticipantView::from),
            listing: listing.map(|l| ThreadListingView {
                id: l.id,
                brand: l.brand,
                model: l.model,
                price: l.price,
                sold: l.sold,
            }),
            last_message: summary.last_message,
            last_message_at: thread.last_message_at,
            created_at: thread.created_at,
        });
    }
    Ok(views)
}

/// Returns the messages of a thread in ascending order and marks the
/// reader's unread incoming messages as read.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the thread does not exist or the reader
/// is not a participant.
pub async fn read_thread_messages(
    thread_id: Uuid,
    reader_id: Uuid,
    clock: &dyn Clock,
    threads: &dyn ThreadRepository,
) -> Result<Vec<Message>, DomainError> {
    threads
        .find_thread(thread_id)
        .await?
        .filter(|t| t.has_participant(reader_id))
        .ok_or_else(|| DomainError::not_found("conversation", thread_id))?;

    let mut messages = threads.list_messages(thread_id).await?;
    let now = clock.now();
    let marked = threads.mark_read(thread_id, reader_id, now).await?;
    if marked > 0 {
        for message in messages
            .iter_mut()
            .filter(|m| m.sender_id != reader_id && m.read_at.is_none())
        {
            message.read_at = Some(now);
        }
    }
    Ok(messages)
}
