//! Validation rules for new listings.

use chrono::{DateTime, Utc};
use spinandsell_core::error::DomainError;
use spinandsell_core::model::{Listing, ListingCategory, ListingCondition};
use uuid::Uuid;

use super::commands::ListingDraft;

/// Maximum brand and model length in characters.
pub const MAX_NAME_CHARS: usize = 100;
/// Earliest model year accepted.
pub const MIN_YEAR: i32 = 1900;
/// Maximum description length in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;
/// Maximum number of images per listing; the hosted checkout page shows at
/// most this many.
pub const MAX_IMAGES: usize = 8;

/// Validates `draft` and builds an unsold listing owned by `seller_id`.
///
/// # Errors
///
/// Returns `DomainError::Validation` naming the first offending field.
pub fn build_listing(
    id: Uuid,
    seller_id: Uuid,
    draft: ListingDraft,
    current_year: i32,
    now: DateTime<Utc>,
) -> Result<Listing, DomainError> {
    let brand = required(&draft.brand, "brand")?;
    let model = required(&draft.model, "model")?;
    if draft.year < MIN_YEAR || draft.year > current_year + 1 {
        return Err(DomainError::Validation(format!(
            "year must be between {MIN_YEAR} and {}",
            current_year + 1
        )));
    }
    if draft.price <= 0 {
        return Err(DomainError::Validation(
            "price must be greater than zero".to_owned(),
        ));
    }
    let description = draft.description.trim().to_owned();
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(DomainError::Validation(format!(
            "description cannot exceed {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    if draft.images.len() > MAX_IMAGES {
        return Err(DomainError::Validation(format!(
            "at most {MAX_IMAGES} images are allowed"
        )));
    }

    Ok(Listing {
        id,
        seller_id,
        buyer_id: None,
        brand,
        model,
        year: draft.year,
        category: ListingCategory::parse(&draft.category)?,
        condition: ListingCondition::parse(&draft.condition)?,
        description,
        images: draft.images,
        price: draft.price,
        sold: false,
        paid: false,
        views: 0,
        likes: 0,
        created_at: now,
        sold_at: None,
        withdrawn: false,
    })
}

fn required(value: &str, field: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(DomainError::Validation(format!(
            "{field} cannot exceed {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(trimmed.to_owned())
}
