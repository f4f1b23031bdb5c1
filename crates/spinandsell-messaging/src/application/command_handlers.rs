//! Command handlers for the Messaging context.

use spinandsell_core::clock::Clock;
use spinandsell_core::command::Command;
use spinandsell_core::error::DomainError;
use spinandsell_core::model::{Message, Thread, ThreadOpening};
use spinandsell_core::repository::{ListingRepository, ThreadRepository, UserRepository};
use uuid::Uuid;

use crate::domain::commands::{OpenSaleThread, OpenThread, SendMessage};
use crate::domain::rules::normalize_content;

/// Handles the `OpenThread` command.
///
/// Returns `ThreadOpening::Existing` when a thread for the same participants
/// and listing already exists.
///
/// # Errors
///
/// Returns `DomainError::Validation` when opening a thread with oneself,
/// `DomainError::NotFound` if the other user or the listing does not exist.
pub async fn handle_open_thread(
    command: &OpenThread,
    clock: &dyn Clock,
    users: &dyn UserRepository,
    listings: &dyn ListingRepository,
    threads: &dyn ThreadRepository,
) -> Result<ThreadOpening, DomainError> {
    tracing::debug!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        "handling command"
    );
    if command.requester_id == command.other_user_id {
        return Err(DomainError::Validation(
            "cannot open a conversation with yourself".to_owned(),
        ));
    }
    if users.find_user(command.other_user_id).await?.is_none() {
        return Err(DomainError::not_found("user", command.other_user_id));
    }
    if let Some(listing_id) = command.listing_id {
        if listings.find_listing(listing_id).await?.is_none() {
            return Err(DomainError::not_found("listing", listing_id));
        }
    }

    if let Some(existing) = threads
        .find_thread_between(
            command.requester_id,
            command.other_user_id,
            command.listing_id,
        )
        .await?
    {
        return Ok(ThreadOpening::Existing(existing));
    }

    let thread = Thread::between(
        Uuid::new_v4(),
        command.requester_id,
        command.other_user_id,
        command.listing_id,
        clock.now(),
    );
    threads.create_thread(&thread).await
}

/// Handles the `SendMessage` command. Only participants may post.
///
/// # Errors
///
/// Returns `DomainError::Validation` for empty or oversized content and
/// `DomainError::NotFound` if the thread does not exist or the sender is not
/// a participant.
pub async fn handle_send_message(
    command: &SendMessage,
    clock: &dyn Clock,
    threads: &dyn ThreadRepository,
) -> Result<Message, DomainError> {
    let content = normalize_content(&command.content)?;
    let thread = threads
        .find_thread(command.thread_id)
        .await?
        .filter(|t| t.has_participant(command.sender_id))
        .ok_or_else(|| DomainError::not_found("conversation", command.thread_id))?;

    let message = Message {
        id: Uuid::new_v4(),
        thread_id: thread.id,
        sender_id: command.sender_id,
        content,
        read_at: None,
        created_at: clock.now(),
    };
    threads.insert_message(&message).await?;

    tracing::info!(
        thread_id = %thread.id,
        message_id = %message.id,
        correlation_id = %command.correlation_id,
        "message sent"
    );
    Ok(message)
}

/// Handles the `OpenSaleThread` command: opens the buyer/seller thread for a
/// listing and, only when the thread is new, posts the greeting from the
/// buyer. Running it twice for the same sale creates at most one thread and
/// one greeting.
///
/// # Errors
///
/// Returns `DomainError::Validation` without touching storage if the greeting
/// is empty or oversized, or any `DomainError` from thread creation or the
/// greeting insert.
pub async fn handle_open_sale_thread(
    command: &OpenSaleThread,
    clock: &dyn Clock,
    threads: &dyn ThreadRepository,
) -> Result<ThreadOpening, DomainError> {
    // The greeting must be valid before the thread exists: a created thread
    // is never greeted later.
    let content = normalize_content(&command.greeting)?;
    let now = clock.now();
    let thread = Thread::between(
        Uuid::new_v4(),
        command.buyer_id,
        command.seller_id,
        Some(command.listing_id),
        now,
    );
    let opening = threads.create_thread(&thread).await?;

    if let ThreadOpening::Created(created) = &opening {
        let greeting = Message {
            id: Uuid::new_v4(),
            thread_id: created.id,
            sender_id: command.buyer_id,
            content,
            read_at: None,
            created_at: now,
        };
        threads.insert_message(&greeting).await?;
        tracing::info!(
            thread_id = %created.id,
            listing_id = %command.listing_id,
            correlation_id = %command.correlation_id,
            "sale thread opened"
        );
    }
    Ok(opening)
}
