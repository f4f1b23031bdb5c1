//! Commands for the Catalogue context.

use spinandsell_core::command::Command;
use uuid::Uuid;

/// Unvalidated listing fields as submitted by a seller.
#[derive(Debug, Clone)]
pub struct ListingDraft {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub category: String,
    pub condition: String,
    pub description: String,
    pub images: Vec<String>,
    /// Public price in minor units.
    pub price: i64,
}

/// Command to publish a new listing.
#[derive(Debug, Clone)]
pub struct CreateListing {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The authenticated seller.
    pub seller_id: Uuid,
    /// Listing fields.
    pub draft: ListingDraft,
}

impl Command for CreateListing {
    fn command_type(&self) -> &'static str {
        "catalog.create_listing"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to remove a listing. Only its seller may do so.
#[derive(Debug, Clone)]
pub struct DeleteListing {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    pub listing_id: Uuid,
    pub requester_id: Uuid,
}

impl Command for DeleteListing {
    fn command_type(&self) -> &'static str {
        "catalog.delete_listing"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to take a listing off the market or put it back. Only its seller
/// may do so, and only while it is unsold.
#[derive(Debug, Clone)]
pub struct SetListingAvailability {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    pub listing_id: Uuid,
    pub requester_id: Uuid,
    pub available: bool,
}

impl Command for SetListingAvailability {
    fn command_type(&self) -> &'static str {
        "catalog.set_listing_availability"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to add a listing to a user's favorites.
#[derive(Debug, Clone)]
pub struct AddFavorite {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    pub user_id: Uuid,
    pub listing_id: Uuid,
}

impl Command for AddFavorite {
    fn command_type(&self) -> &'static str {
        "catalog.add_favorite"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to remove a listing from a user's favorites.
#[derive(Debug, Clone)]
pub struct RemoveFavorite {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    pub user_id: Uuid,
    pub listing_id: Uuid,
}

impl Command for RemoveFavorite {
    fn command_type(&self) -> &'static str {
        "catalog.remove_favorite"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
