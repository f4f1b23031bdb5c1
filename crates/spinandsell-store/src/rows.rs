//! Row types and their conversion into domain records.

use chrono::{DateTime, Utc};
use spinandsell_core::error::DomainError;
use spinandsell_core::model::{
    Favorite, FavoriteWithListing, LedgerEntry, LedgerStatus, Listing, ListingCategory,
    ListingCondition, Message, Thread, ThreadSummary, User,
};
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: Uuid,
    name: Option<String>,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ListingRow {
    id: Uuid,
    seller_id: Uuid,
    buyer_id: Option<Uuid>,
    brand: String,
    model: String,
    year: i32,
    category: String,
    condition: String,
    description: String,
    images: Vec<String>,
    price: i64,
    sold: bool,
    paid: bool,
    views: i64,
    likes: i64,
    created_at: DateTime<Utc>,
    sold_at: Option<DateTime<Utc>>,
    withdrawn: bool,
}

impl TryFrom<ListingRow> for Listing {
    type Error = DomainError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            seller_id: row.seller_id,
            buyer_id: row.buyer_id,
            brand: row.brand,
            model: row.model,
            year: row.year,
            category: ListingCategory::parse(&row.category).map_err(corrupt)?,
            condition: ListingCondition::parse(&row.condition).map_err(corrupt)?,
            description: row.description,
            images: row.images,
            price: row.price,
            sold: row.sold,
            paid: row.paid,
            views: row.views,
            likes: row.likes,
            created_at: row.created_at,
            sold_at: row.sold_at,
            withdrawn: row.withdrawn,
        })
    }
}

/// Stored values failing domain parsing means the data is corrupt, not that
/// the caller sent something invalid.
fn corrupt(err: DomainError) -> DomainError {
    DomainError::Infrastructure(format!("corrupt row: {err}"))
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct LedgerRow {
    id: Uuid,
    payment_session_id: String,
    payment_intent_id: Option<String>,
    listing_id: Uuid,
    seller_id: Uuid,
    buyer_id: Uuid,
    amount: i64,
    platform_fee: i64,
    currency: String,
    status: String,
    invoice_number: Option<String>,
    invoice_url: Option<String>,
    tax_amount: Option<i64>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = DomainError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            payment_session_id: row.payment_session_id,
            payment_intent_id: row.payment_intent_id,
            listing_id: row.listing_id,
            seller_id: row.seller_id,
            buyer_id: row.buyer_id,
            amount: row.amount,
            platform_fee: row.platform_fee,
            currency: row.currency,
            status: LedgerStatus::parse(&row.status)?,
            invoice_number: row.invoice_number,
            invoice_url: row.invoice_url,
            tax_amount: row.tax_amount,
            metadata: row.metadata,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ThreadRow {
    id: Uuid,
    participant_one_id: Uuid,
    participant_two_id: Uuid,
    listing_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    last_message_at: Option<DateTime<Utc>>,
}

impl From<ThreadRow> for Thread {
    fn from(row: ThreadRow) -> Self {
        Self {
            id: row.id,
            participant_one_id: row.participant_one_id,
            participant_two_id: row.participant_two_id,
            listing_id: row.listing_id,
            created_at: row.created_at,
            last_message_at: row.last_message_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct MessageRow {
    id: Uuid,
    thread_id: Uuid,
    sender_id: Uuid,
    content: String,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            thread_id: row.thread_id,
            sender_id: row.sender_id,
            content: row.content,
            read_at: row.read_at,
            created_at: row.created_at,
        }
    }
}

/// A thread joined with its latest message, if any.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ThreadSummaryRow {
    #[sqlx(flatten)]
    thread: ThreadRow,
    last_message_id: Option<Uuid>,
    last_message_sender_id: Option<Uuid>,
    last_message_content: Option<String>,
    last_message_read_at: Option<DateTime<Utc>>,
    last_message_created_at: Option<DateTime<Utc>>,
}

impl From<ThreadSummaryRow> for ThreadSummary {
    fn from(row: ThreadSummaryRow) -> Self {
        let thread_id = row.thread.id;
        let last_message = match (
            row.last_message_id,
            row.last_message_sender_id,
            row.last_message_content,
            row.last_message_created_at,
        ) {
            (Some(id), Some(sender_id), Some(content), Some(created_at)) => Some(Message {
                id,
                thread_id,
                sender_id,
                content,
                read_at: row.last_message_read_at,
                created_at,
            }),
            _ => None,
        };
        Self {
            thread: row.thread.into(),
            last_message,
        }
    }
}

/// A favorite joined with its listing.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FavoriteListingRow {
    favorite_id: Uuid,
    favorite_user_id: Uuid,
    favorited_at: DateTime<Utc>,
    #[sqlx(flatten)]
    listing: ListingRow,
}

impl TryFrom<FavoriteListingRow> for FavoriteWithListing {
    type Error = DomainError;

    fn try_from(row: FavoriteListingRow) -> Result<Self, Self::Error> {
        let listing = Listing::try_from(row.listing)?;
        Ok(Self {
            favorite: Favorite {
                id: row.favorite_id,
                user_id: row.favorite_user_id,
                listing_id: listing.id,
                created_at: row.favorited_at,
            },
            listing,
        })
    }
}
