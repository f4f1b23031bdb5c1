//! Listing search criteria shared by the catalogue and its storage.

use std::cmp::Ordering;

use crate::model::{Listing, ListingCategory, ListingCondition};

/// Result ordering for listing search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListingSort {
    #[default]
    Newest,
    Oldest,
    PriceAsc,
    PriceDesc,
    /// Most liked first.
    Popular,
    /// Most viewed first.
    MostViewed,
}

impl ListingSort {
    /// Parses a `sortBy` value. Unknown values sort newest first.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "oldest" => Self::Oldest,
            "price-asc" => Self::PriceAsc,
            "price-desc" => Self::PriceDesc,
            "popular" => Self::Popular,
            "views" => Self::MostViewed,
            _ => Self::Newest,
        }
    }

    /// Orders two listings. Ties fall back to newest first, then id, so that
    /// pages never overlap.
    #[must_use]
    pub fn compare(self, a: &Listing, b: &Listing) -> Ordering {
        let primary = match self {
            Self::Newest => b.created_at.cmp(&a.created_at),
            Self::Oldest => a.created_at.cmp(&b.created_at),
            Self::PriceAsc => a.price.cmp(&b.price),
            Self::PriceDesc => b.price.cmp(&a.price),
            Self::Popular => b.likes.cmp(&a.likes),
            Self::MostViewed => b.views.cmp(&a.views),
        };
        primary
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Normalized search over listings on the market.
///
/// `page` starts at 1 and `limit` is at least 1; text filters are matched
/// case-insensitively as substrings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub category: Option<ListingCategory>,
    pub condition: Option<ListingCondition>,
    pub brand: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Matched against brand, model and description.
    pub search: Option<String>,
    pub sort: ListingSort,
    pub page: u32,
    pub limit: u32,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            category: None,
            condition: None,
            brand: None,
            min_price: None,
            max_price: None,
            search: None,
            sort: ListingSort::default(),
            page: 1,
            limit: 12,
        }
    }
}

impl ListingQuery {
    /// Rows to skip before the requested page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// Whether `listing` is on the market and satisfies every filter.
    #[must_use]
    pub fn matches(&self, listing: &Listing) -> bool {
        if listing.sold || listing.withdrawn {
            return false;
        }
        if self.category.is_some_and(|c| c != listing.category)
            || self.condition.is_some_and(|c| c != listing.condition)
            || self.min_price.is_some_and(|min| listing.price < min)
            || self.max_price.is_some_and(|max| listing.price > max)
        {
            return false;
        }
        if let Some(brand) = &self.brand {
            if !contains_ignore_case(&listing.brand, brand) {
                return false;
            }
        }
        if let Some(term) = &self.search {
            return contains_ignore_case(&listing.brand, term)
                || contains_ignore_case(&listing.model, term)
                || contains_ignore_case(&listing.description, term);
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// One page of search results and the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub listings: Vec<Listing>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;

    fn listing(brand: &str, price: i64) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            buyer_id: None,
            brand: brand.to_owned(),
            model: "Orca".to_owned(),
            year: 2021,
            category: ListingCategory::RoadBike,
            condition: ListingCondition::A,
            description: "Cuadro de carbono".to_owned(),
            images: vec![],
            price,
            sold: false,
            paid: false,
            views: 0,
            likes: 0,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            sold_at: None,
            withdrawn: false,
        }
    }

    #[test]
    fn test_unknown_sort_falls_back_to_newest() {
        assert_eq!(ListingSort::parse("price-asc"), ListingSort::PriceAsc);
        assert_eq!(ListingSort::parse("cheapest"), ListingSort::Newest);
    }

    #[test]
    fn test_matches_text_filters_ignoring_case() {
        let query = ListingQuery {
            brand: Some("orb".to_owned()),
            search: Some("CARBONO".to_owned()),
            ..ListingQuery::default()
        };

        assert!(query.matches(&listing("Orbea", 100)));
        assert!(!query.matches(&listing("Trek", 100)));
    }

    #[test]
    fn test_matches_excludes_sold_and_withdrawn() {
        let query = ListingQuery::default();
        let mut sold = listing("Orbea", 100);
        sold.sold = true;
        let mut withdrawn = listing("Orbea", 100);
        withdrawn.withdrawn = true;

        assert!(!query.matches(&sold));
        assert!(!query.matches(&withdrawn));
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let query = ListingQuery {
            min_price: Some(100),
            max_price: Some(200),
            ..ListingQuery::default()
        };

        assert!(query.matches(&listing("Orbea", 100)));
        assert!(query.matches(&listing("Orbea", 200)));
        assert!(!query.matches(&listing("Orbea", 201)));
    }

    #[test]
    fn test_offset_of_first_page_is_zero() {
        let query = ListingQuery {
            page: 3,
            limit: 12,
            ..ListingQuery::default()
        };

        assert_eq!(ListingQuery::default().offset(), 0);
        assert_eq!(query.offset(), 24);
    }
}
