//! Viewer identity used for view de-duplication.

use uuid::Uuid;

/// Who is looking at a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    /// An authenticated user.
    User(Uuid),
    /// An anonymous visitor identified by client address.
    Address(String),
    /// No usable identity; the view is not counted.
    Unknown,
}

impl Viewer {
    /// The de-duplication key, or `None` if views by this viewer are not
    /// counted.
    #[must_use]
    pub fn dedup_key(&self) -> Option<String> {
        match self {
            Self::User(id) => Some(format!("user:{id}")),
            Self::Address(addr) => Some(format!("ip:{addr}")),
            Self::Unknown => None,
        }
    }
}
