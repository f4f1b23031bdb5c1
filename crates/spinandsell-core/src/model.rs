//! Marketplace records shared by every context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::money::MinorUnits;

/// A registered marketplace user. Read-only from this system's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User identifier.
    pub id: Uuid,
    /// Optional display name.
    pub name: Option<String>,
    /// Contact address used for notifications.
    pub email: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns the display name, or `fallback` when the user has none.
    #[must_use]
    pub fn display_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().filter(|n| !n.trim().is_empty()).unwrap_or(fallback)
    }
}

/// Listing category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingCategory {
    RoadBike,
    MountainBike,
    SpinningBike,
    ElectricBike,
    ElectricScooter,
}

impl ListingCategory {
    /// Storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RoadBike => "ROAD_BIKE",
            Self::MountainBike => "MOUNTAIN_BIKE",
            Self::SpinningBike => "SPINNING_BIKE",
            Self::ElectricBike => "ELECTRIC_BIKE",
            Self::ElectricScooter => "ELECTRIC_SCOOTER",
        }
    }

    /// Parses the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an unknown category.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "ROAD_BIKE" => Ok(Self::RoadBike),
            "MOUNTAIN_BIKE" => Ok(Self::MountainBike),
            "SPINNING_BIKE" => Ok(Self::SpinningBike),
            "ELECTRIC_BIKE" => Ok(Self::ElectricBike),
            "ELECTRIC_SCOOTER" => Ok(Self::ElectricScooter),
            other => Err(DomainError::Validation(format!("unknown category: {other}"))),
        }
    }
}

/// Listing condition grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingCondition {
    /// Excellent.
    A,
    /// Good.
    B,
    /// Acceptable.
    C,
}

impl ListingCondition {
    /// Storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }

    /// Parses the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an unknown grade.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            other => Err(DomainError::Validation(format!("unknown condition: {other}"))),
        }
    }
}

/// A sellable bicycle or scooter.
///
/// `paid` implies `sold`, and `buyer_id` is set exactly when `sold` is true.
/// Only the fulfillment workflow sells a listing; its seller can only take it
/// off the market (`withdrawn`) and back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub buyer_id: Option<Uuid>,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub category: ListingCategory,
    pub condition: ListingCondition,
    pub description: String,
    pub images: Vec<String>,
    /// Public price in minor units.
    pub price: MinorUnits,
    pub sold: bool,
    pub paid: bool,
    pub views: i64,
    pub likes: i64,
    pub created_at: DateTime<Utc>,
    pub sold_at: Option<DateTime<Utc>>,
    /// Hidden from browsing and not purchasable.
    pub withdrawn: bool,
}

impl Listing {
    /// Human-readable title, e.g. `Orbea Orca (2021)`.
    #[must_use]
    pub fn title(&self) -> String {
        format!("{} {} ({})", self.brand, self.model, self.year)
    }
}

/// Status of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
    Refunded,
}

impl LedgerStatus {
    /// Storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// Parses the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` for an unknown status, since
    /// statuses only ever come from storage.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            "REFUNDED" => Ok(Self::Refunded),
            other => Err(DomainError::Infrastructure(format!(
                "unknown ledger status: {other}"
            ))),
        }
    }
}

/// The durable record of a completed sale, keyed by the provider session id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: Uuid,
    /// Provider checkout session id. Unique across the ledger.
    pub payment_session_id: String,
    pub payment_intent_id: Option<String>,
    pub listing_id: Uuid,
    pub seller_id: Uuid,
    pub buyer_id: Uuid,
    pub amount: MinorUnits,
    pub platform_fee: MinorUnits,
    pub currency: String,
    pub status: LedgerStatus,
    pub invoice_number: Option<String>,
    pub invoice_url: Option<String>,
    pub tax_amount: Option<MinorUnits>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Document fields patched onto a ledger entry after the invoice is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceAttachment {
    pub invoice_number: String,
    pub invoice_url: String,
    pub tax_amount: MinorUnits,
}

/// Outcome of recording a sale.
#[derive(Debug, Clone, PartialEq)]
pub enum SaleRecording {
    /// The ledger entry was inserted and the listing marked sold.
    Recorded(LedgerEntry),
    /// A ledger entry for the same payment session already existed; nothing
    /// was written.
    AlreadyRecorded(LedgerEntry),
}

/// A two-party conversation, optionally scoped to a listing.
///
/// Participants are stored in canonical order (see [`canonical_pair`]) so a
/// single uniqueness constraint covers both orderings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: Uuid,
    pub participant_one_id: Uuid,
    pub participant_two_id: Uuid,
    pub listing_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl Thread {
    /// Creates a thread between two users with participants in canonical order.
    #[must_use]
    pub fn between(
        id: Uuid,
        first: Uuid,
        second: Uuid,
        listing_id: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let (participant_one_id, participant_two_id) = canonical_pair(first, second);
        Self {
            id,
            participant_one_id,
            participant_two_id,
            listing_id,
            created_at,
            last_message_at: None,
        }
    }

    /// Returns true if `user_id` takes part in this thread.
    #[must_use]
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participant_one_id == user_id || self.participant_two_id == user_id
    }

    /// Returns the participant that is not `user_id`.
    #[must_use]
    pub fn other_participant(&self, user_id: Uuid) -> Uuid {
        if self.participant_one_id == user_id {
            self.participant_two_id
        } else {
            self.participant_one_id
        }
    }
}

/// Orders two participant ids so that `(a, b)` and `(b, a)` map to the same key.
#[must_use]
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Outcome of opening a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadOpening {
    /// A new thread was created.
    Created(Thread),
    /// A thread for the same participants and listing already existed.
    Existing(Thread),
}

impl ThreadOpening {
    /// The thread, whether new or existing.
    #[must_use]
    pub fn thread(&self) -> &Thread {
        match self {
            Self::Created(thread) | Self::Existing(thread) => thread,
        }
    }
}

/// A message inside a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A thread together with its most recent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSummary {
    pub thread: Thread,
    pub last_message: Option<Message>,
}

/// A (user, listing) favorite relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub listing_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A favorite joined with its listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteWithListing {
    #[serde(flatten)]
    pub favorite: Favorite,
    pub listing: Listing,
}
