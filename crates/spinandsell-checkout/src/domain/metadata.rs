//! Sale metadata carried on the provider session.
//!
//! The webhook receiver is stateless: these four string entries are the only
//! link between a completed payment and the listing it paid for.

use std::collections::BTreeMap;

use spinandsell_core::error::DomainError;
use spinandsell_core::money::MinorUnits;
use thiserror::Error;
use uuid::Uuid;

pub const LISTING_ID_KEY: &str = "productId";
pub const SELLER_ID_KEY: &str = "sellerId";
pub const BUYER_ID_KEY: &str = "buyerId";
pub const PLATFORM_FEE_KEY: &str = "platformFee";

/// Why session metadata could not be interpreted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetadataError {
    /// A required key is absent or empty.
    #[error("missing metadata field `{0}`")]
    Missing(&'static str),

    /// A key is present but its value does not parse.
    #[error("malformed metadata field `{field}`: {value:?}")]
    Malformed {
        /// The offending key.
        field: &'static str,
        /// The raw value.
        value: String,
    },
}

impl From<MetadataError> for DomainError {
    fn from(err: MetadataError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Typed view of the sale correlation metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleMetadata {
    pub listing_id: Uuid,
    pub seller_id: Uuid,
    pub buyer_id: Uuid,
    /// Fee computed at checkout time. Optional on the wire so sessions
    /// created without it can still be fulfilled.
    pub platform_fee: Option<MinorUnits>,
}

impl SaleMetadata {
    /// Serializes to provider metadata entries.
    #[must_use]
    pub fn to_entries(&self) -> BTreeMap<String, String> {
        let mut entries = BTreeMap::new();
        entries.insert(LISTING_ID_KEY.to_owned(), self.listing_id.to_string());
        entries.insert(SELLER_ID_KEY.to_owned(), self.seller_id.to_string());
        entries.insert(BUYER_ID_KEY.to_owned(), self.buyer_id.to_string());
        if let Some(fee) = self.platform_fee {
            entries.insert(PLATFORM_FEE_KEY.to_owned(), fee.to_string());
        }
        entries
    }

    /// Parses provider metadata entries.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError` if an id is missing or any present field is
    /// malformed.
    pub fn parse(entries: &BTreeMap<String, String>) -> Result<Self, MetadataError> {
        let platform_fee = non_empty(entries, PLATFORM_FEE_KEY)
            .map(parse_fee)
            .transpose()?;
        Ok(Self {
            listing_id: required_id(entries, LISTING_ID_KEY)?,
            seller_id: required_id(entries, SELLER_ID_KEY)?,
            buyer_id: required_id(entries, BUYER_ID_KEY)?,
            platform_fee,
        })
    }
}

fn non_empty<'a>(entries: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    entries
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn parse_fee(raw: &str) -> Result<MinorUnits, MetadataError> {
    raw.parse::<MinorUnits>()
        .ok()
        .filter(|fee| *fee >= 0)
        .ok_or_else(|| MetadataError::Malformed {
            field: PLATFORM_FEE_KEY,
            value: raw.to_owned(),
        })
}

fn required_id(
    entries: &BTreeMap<String, String>,
    key: &'static str,
) -> Result<Uuid, MetadataError> {
    let raw = non_empty(entries, key).ok_or(MetadataError::Missing(key))?;
    Uuid::parse_str(raw).map_err(|_| MetadataError::Malformed {
        field: key,
        value: raw.to_owned(),
    })
}
