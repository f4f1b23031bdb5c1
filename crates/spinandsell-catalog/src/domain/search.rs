//! Browse criteria as received from a client.

use spinandsell_core::error::DomainError;
use spinandsell_core::model::{ListingCategory, ListingCondition};
use spinandsell_core::search::{ListingQuery, ListingSort};

/// Page size when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 12;
/// Largest page a client may request.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Raw search parameters. Blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub category: Option<String>,
    pub condition: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SearchCriteria {
    /// Normalizes the criteria into a storage query.
    ///
    /// Pages start at 1 and the page size is clamped to `1..=MAX_PAGE_SIZE`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an unknown category or condition,
    /// a negative price bound, or a minimum above the maximum.
    pub fn into_query(self) -> Result<ListingQuery, DomainError> {
        let category = non_blank(self.category)
            .map(|c| ListingCategory::parse(&c))
            .transpose()?;
        let condition = non_blank(self.condition)
            .map(|c| ListingCondition::parse(&c))
            .transpose()?;

        if self.min_price.is_some_and(|p| p < 0) || self.max_price.is_some_and(|p| p < 0) {
            return Err(DomainError::Validation(
                "price bounds cannot be negative".to_owned(),
            ));
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(DomainError::Validation(
                    "minPrice cannot exceed maxPrice".to_owned(),
                ));
            }
        }

        Ok(ListingQuery {
            category,
            condition,
            brand: non_blank(self.brand),
            min_price: self.min_price,
            max_price: self.max_price,
            search: non_blank(self.search),
            sort: non_blank(self.sort_by)
                .map(|s| ListingSort::parse(&s))
                .unwrap_or_default(),
            page: self.page.unwrap_or(1).max(1),
            limit: self
                .limit
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
