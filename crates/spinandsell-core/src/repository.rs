//! Repository abstractions over marketplace storage.
//!
//! Uniqueness constraints in the backing store are the only mutual-exclusion
//! mechanism: implementations must turn duplicate inserts into the documented
//! no-op outcomes rather than surfacing raw constraint violations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::model::{
    Favorite, FavoriteWithListing, InvoiceAttachment, LedgerEntry, Listing, Message,
    SaleRecording, Thread, ThreadOpening, ThreadSummary, User,
};
use crate::search::{ListingPage, ListingQuery};

/// Read access to users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Loads a user by id.
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, DomainError>;
}

/// Listing persistence, including the view de-duplication table.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Loads a listing by id.
    async fn find_listing(&self, listing_id: Uuid) -> Result<Option<Listing>, DomainError>;

    /// Inserts a new listing.
    async fn insert_listing(&self, listing: &Listing) -> Result<(), DomainError>;

    /// Deletes a listing. Returns `false` if it did not exist.
    async fn delete_listing(&self, listing_id: Uuid) -> Result<bool, DomainError>;

    /// Returns the requested page of unsold, non-withdrawn listings matching
    /// `query`, with the total match count.
    async fn search_listings(&self, query: &ListingQuery) -> Result<ListingPage, DomainError>;

    /// Lists every listing of a seller, sold or not, newest first.
    async fn list_seller_listings(&self, seller_id: Uuid) -> Result<Vec<Listing>, DomainError>;

    /// Sets the withdrawn flag of an unsold listing. Returns the updated
    /// listing, or `None` if it does not exist or has been sold.
    async fn set_withdrawn(
        &self,
        listing_id: Uuid,
        withdrawn: bool,
    ) -> Result<Option<Listing>, DomainError>;

    /// Records a view of `listing_id` by `viewer_key`, incrementing the view
    /// counter only on the first view for that key. Returns `true` when the
    /// counter was incremented.
    async fn record_view(
        &self,
        listing_id: Uuid,
        viewer_key: &str,
        viewed_at: DateTime<Utc>,
    ) -> Result<bool, DomainError>;
}

/// Ledger persistence.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Inserts `entry` and marks its listing sold and paid to `entry.buyer_id`
    /// in a single transaction.
    ///
    /// A second call with the same `payment_session_id` writes nothing and
    /// returns `SaleRecording::AlreadyRecorded` with the stored entry.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if the listing is already sold to a
    /// different buyer, `DomainError::NotFound` if the listing vanished.
    async fn record_sale(
        &self,
        entry: &LedgerEntry,
        sold_at: DateTime<Utc>,
    ) -> Result<SaleRecording, DomainError>;

    /// Patches the invoice fields of a ledger entry.
    async fn attach_invoice(
        &self,
        entry_id: Uuid,
        invoice: &InvoiceAttachment,
    ) -> Result<(), DomainError>;

    /// Loads a ledger entry by provider session id.
    async fn find_by_payment_session(
        &self,
        payment_session_id: &str,
    ) -> Result<Option<LedgerEntry>, DomainError>;
}

/// Thread and message persistence.
#[async_trait]
pub trait ThreadRepository: Send + Sync {
    /// Loads a thread by id.
    async fn find_thread(&self, thread_id: Uuid) -> Result<Option<Thread>, DomainError>;

    /// Finds the thread between two users for a listing (or for no listing),
    /// regardless of participant order.
    async fn find_thread_between(
        &self,
        first: Uuid,
        second: Uuid,
        listing_id: Option<Uuid>,
    ) -> Result<Option<Thread>, DomainError>;

    /// Creates `thread` unless one already exists for the same participants
    /// and listing, in which case the existing one is returned.
    async fn create_thread(&self, thread: &Thread) -> Result<ThreadOpening, DomainError>;

    /// Lists the threads a user takes part in, most recently active first.
    async fn list_threads(&self, user_id: Uuid) -> Result<Vec<ThreadSummary>, DomainError>;

    /// Appends a message and bumps the thread's `last_message_at`.
    async fn insert_message(&self, message: &Message) -> Result<(), DomainError>;

    /// Lists the messages of a thread in ascending creation order.
    async fn list_messages(&self, thread_id: Uuid) -> Result<Vec<Message>, DomainError>;

    /// Marks every unread message not sent by `reader_id` as read. Returns the
    /// number of messages updated.
    async fn mark_read(
        &self,
        thread_id: Uuid,
        reader_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<u64, DomainError>;
}

/// Favorite persistence. The listing `likes` counter moves in the same
/// transaction as the relation row.
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Inserts a favorite and increments the listing's like counter.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if the pair is already a favorite.
    async fn add_favorite(&self, favorite: &Favorite) -> Result<(), DomainError>;

    /// Deletes a favorite and decrements the like counter. Returns `false` if
    /// the pair was not a favorite.
    async fn remove_favorite(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool, DomainError>;

    /// Lists a user's favorites, newest first.
    async fn list_favorites(&self, user_id: Uuid)
    -> Result<Vec<FavoriteWithListing>, DomainError>;
}
