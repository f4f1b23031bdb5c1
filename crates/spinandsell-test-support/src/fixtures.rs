//! Record fixtures.

use chrono::{TimeZone, Utc};
use spinandsell_core::model::{Listing, ListingCategory, ListingCondition, User};
use uuid::Uuid;

/// A user with a name and an address derived from `name`.
#[must_use]
pub fn user_fixture(name: &str) -> User {
    User {
        id: Uuid::new_v4(),
        name: Some(name.to_owned()),
        email: format!("{}@example.com", name.to_lowercase()),
        created_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
    }
}

/// An unsold road bike listed by `seller_id` at `price` minor units.
#[must_use]
pub fn listing_fixture(seller_id: Uuid, price: i64) -> Listing {
    Listing {
        id: Uuid::new_v4(),
        seller_id,
        buyer_id: None,
        brand: "Orbea".to_owned(),
        model: "Orca".to_owned(),
        year: 2021,
        category: ListingCategory::RoadBike,
        condition: ListingCondition::A,
        description: "Carbon frame, Ultegra groupset".to_owned(),
        images: vec!["https://img.example.com/orca-1.jpg".to_owned()],
        price,
        sold: false,
        paid: false,
        views: 0,
        likes: 0,
        created_at: Utc.with_ymd_and_hms(2025, 12, 1, 12, 0, 0).unwrap(),
        sold_at: None,
        withdrawn: false,
    }
}
