//! Commands for the Messaging context.

use spinandsell_core::command::Command;
use uuid::Uuid;

/// Command to open a thread with another user, optionally about a listing.
#[derive(Debug, Clone)]
pub struct OpenThread {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The authenticated user opening the thread.
    pub requester_id: Uuid,
    /// The other participant.
    pub other_user_id: Uuid,
    /// The listing the conversation is about, if any.
    pub listing_id: Option<Uuid>,
}

impl Command for OpenThread {
    fn command_type(&self) -> &'static str {
        "messaging.open_thread"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to post a message to a thread.
#[derive(Debug, Clone)]
pub struct SendMessage {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Target thread.
    pub thread_id: Uuid,
    /// The authenticated sender.
    pub sender_id: Uuid,
    /// Raw message text, trimmed before storage.
    pub content: String,
}

impl Command for SendMessage {
    fn command_type(&self) -> &'static str {
        "messaging.send_message"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command issued by fulfillment to open the buyer/seller thread of a sale.
#[derive(Debug, Clone)]
pub struct OpenSaleThread {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub listing_id: Uuid,
    /// Greeting posted from the buyer when the thread is new.
    pub greeting: String,
}

impl Command for OpenSaleThread {
    fn command_type(&self) -> &'static str {
        "messaging.open_sale_thread"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
