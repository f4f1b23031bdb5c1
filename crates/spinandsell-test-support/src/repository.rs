//! Test repositories — in-memory and failing implementations of every
//! repository trait.
//!
//! `InMemoryMarketplace` keeps all tables behind one mutex, so each trait
//! method is atomic the way a storage transaction would be.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spinandsell_core::error::DomainError;
use spinandsell_core::model::{
    Favorite, FavoriteWithListing, InvoiceAttachment, LedgerEntry, Listing, Message,
    SaleRecording, Thread, ThreadOpening, ThreadSummary, User, canonical_pair,
};
use spinandsell_core::repository::{
    FavoriteRepository, LedgerRepository, ListingRepository, ThreadRepository, UserRepository,
};
use spinandsell_core::search::{ListingPage, ListingQuery};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    listings: Vec<Listing>,
    views: HashSet<(Uuid, String)>,
    ledger: Vec<LedgerEntry>,
    threads: Vec<Thread>,
    messages: Vec<Message>,
    favorites: Vec<Favorite>,
}

/// An in-memory store implementing every repository trait.
#[derive(Debug, Default)]
pub struct InMemoryMarketplace {
    tables: Mutex<Tables>,
}

impl InMemoryMarketplace {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a user.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn with_user(self, user: User) -> Self {
        self.tables.lock().unwrap().users.push(user);
        self
    }

    /// Seeds a listing.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn with_listing(self, listing: Listing) -> Self {
        self.tables.lock().unwrap().listings.push(listing);
        self
    }

    /// Returns a snapshot of a listing.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn listing(&self, listing_id: Uuid) -> Option<Listing> {
        let tables = self.tables.lock().unwrap();
        tables.listings.iter().find(|l| l.id == listing_id).cloned()
    }

    /// Returns a snapshot of every ledger entry.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn ledger_entries(&self) -> Vec<LedgerEntry> {
        self.tables.lock().unwrap().ledger.clone()
    }

    /// Returns a snapshot of every thread.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn threads(&self) -> Vec<Thread> {
        self.tables.lock().unwrap().threads.clone()
    }

    /// Returns a snapshot of every message.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn messages(&self) -> Vec<Message> {
        self.tables.lock().unwrap().messages.clone()
    }

    /// Returns the number of favorite rows for a listing.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn favorite_count(&self, listing_id: Uuid) -> usize {
        let tables = self.tables.lock().unwrap();
        tables
            .favorites
            .iter()
            .filter(|f| f.listing_id == listing_id)
            .count()
    }
}

fn same_thread_key(thread: &Thread, first: Uuid, second: Uuid, listing_id: Option<Uuid>) -> bool {
    let (one, two) = canonical_pair(first, second);
    thread.participant_one_id == one
        && thread.participant_two_id == two
        && thread.listing_id == listing_id
}

#[async_trait]
impl UserRepository for InMemoryMarketplace {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.id == user_id).cloned())
    }
}

#[async_trait]
impl ListingRepository for InMemoryMarketplace {
    async fn find_listing(&self, listing_id: Uuid) -> Result<Option<Listing>, DomainError> {
        Ok(self.listing(listing_id))
    }

    async fn insert_listing(&self, listing: &Listing) -> Result<(), DomainError> {
        self.tables.lock().unwrap().listings.push(listing.clone());
        Ok(())
    }

    async fn delete_listing(&self, listing_id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.listings.len();
        tables.listings.retain(|l| l.id != listing_id || l.sold);
        let deleted = tables.listings.len() != before;
        if deleted {
            tables.favorites.retain(|f| f.listing_id != listing_id);
            tables.views.retain(|(id, _)| *id != listing_id);
        }
        Ok(deleted)
    }

    async fn search_listings(&self, query: &ListingQuery) -> Result<ListingPage, DomainError> {
        let tables = self.tables.lock().unwrap();
        let mut matching: Vec<Listing> = tables
            .listings
            .iter()
            .filter(|l| query.matches(l))
            .cloned()
            .collect();
        matching.sort_by(|a, b| query.sort.compare(a, b));
        let total = matching.len() as u64;
        let listings = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .collect();
        Ok(ListingPage { listings, total })
    }

    async fn list_seller_listings(&self, seller_id: Uuid) -> Result<Vec<Listing>, DomainError> {
        let tables = self.tables.lock().unwrap();
        let mut listings: Vec<Listing> = tables
            .listings
            .iter()
            .filter(|l| l.seller_id == seller_id)
            .cloned()
            .collect();
        listings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(listings)
    }

    async fn set_withdrawn(
        &self,
        listing_id: Uuid,
        withdrawn: bool,
    ) -> Result<Option<Listing>, DomainError> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables
            .listings
            .iter_mut()
            .find(|l| l.id == listing_id && !l.sold)
            .map(|listing| {
                listing.withdrawn = withdrawn;
                listing.clone()
            }))
    }

    async fn record_view(
        &self,
        listing_id: Uuid,
        viewer_key: &str,
        _viewed_at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.listings.iter().any(|l| l.id == listing_id) {
            return Err(DomainError::not_found("listing", listing_id));
        }
        if !tables.views.insert((listing_id, viewer_key.to_owned())) {
            return Ok(false);
        }
        if let Some(listing) = tables.listings.iter_mut().find(|l| l.id == listing_id) {
            listing.views += 1;
        }
        Ok(true)
    }
}

#[async_trait]
impl LedgerRepository for InMemoryMarketplace {
    async fn record_sale(
        &self,
        entry: &LedgerEntry,
        sold_at: DateTime<Utc>,
    ) -> Result<SaleRecording, DomainError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables
            .ledger
            .iter()
            .find(|e| e.payment_session_id == entry.payment_session_id)
        {
            return Ok(SaleRecording::AlreadyRecorded(existing.clone()));
        }
        let listing = tables
            .listings
            .iter_mut()
            .find(|l| l.id == entry.listing_id)
            .ok_or_else(|| DomainError::not_found("listing", entry.listing_id))?;
        if listing.sold && listing.buyer_id != Some(entry.buyer_id) {
            return Err(DomainError::Conflict(format!(
                "listing {} already sold to another buyer",
                entry.listing_id
            )));
        }
        listing.sold = true;
        listing.paid = true;
        listing.buyer_id = Some(entry.buyer_id);
        listing.sold_at = listing.sold_at.or(Some(sold_at));
        tables.ledger.push(entry.clone());
        Ok(SaleRecording::Recorded(entry.clone()))
    }

    async fn attach_invoice(
        &self,
        entry_id: Uuid,
        invoice: &InvoiceAttachment,
    ) -> Result<(), DomainError> {
        let mut tables = self.tables.lock().unwrap();
        let entry = tables
            .ledger
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| DomainError::not_found("ledger entry", entry_id))?;
        entry.invoice_number = Some(invoice.invoice_number.clone());
        entry.invoice_url = Some(invoice.invoice_url.clone());
        entry.tax_amount = Some(invoice.tax_amount);
        Ok(())
    }

    async fn find_by_payment_session(
        &self,
        payment_session_id: &str,
    ) -> Result<Option<LedgerEntry>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .ledger
            .iter()
            .find(|e| e.payment_session_id == payment_session_id)
            .cloned())
    }
}

#[async_trait]
impl ThreadRepository for InMemoryMarketplace {
    async fn find_thread(&self, thread_id: Uuid) -> Result<Option<Thread>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.threads.iter().find(|t| t.id == thread_id).cloned())
    }

    async fn find_thread_between(
        &self,
        first: Uuid,
        second: Uuid,
        listing_id: Option<Uuid>,
    ) -> Result<Option<Thread>, DomainError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .threads
            .iter()
            .find(|t| same_thread_key(t, first, second, listing_id))
            .cloned())
    }

    async fn create_thread(&self, thread: &Thread) -> Result<ThreadOpening, DomainError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables.threads.iter().find(|t| {
            same_thread_key(
                t,
                thread.participant_one_id,
                thread.participant_two_id,
                thread.listing_id,
            )
        }) {
            return Ok(ThreadOpening::Existing(existing.clone()));
        }
        tables.threads.push(thread.clone());
        Ok(ThreadOpening::Created(thread.clone()))
    }

    async fn list_threads(&self, user_id: Uuid) -> Result<Vec<ThreadSummary>, DomainError> {
        let tables = self.tables.lock().unwrap();
        let mut summaries: Vec<ThreadSummary> = tables
            .threads
            .iter()
            .filter(|t| t.has_participant(user_id))
            .map(|t| ThreadSummary {
                thread: t.clone(),
                last_message: tables
                    .messages
                    .iter()
                    .filter(|m| m.thread_id == t.id)
                    .max_by_key(|m| m.created_at)
                    .cloned(),
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.thread
                .last_message_at
                .unwrap_or(b.thread.created_at)
                .cmp(&a.thread.last_message_at.unwrap_or(a.thread.created_at))
        });
        Ok(summaries)
    }

    async fn insert_message(&self, message: &Message) -> Result<(), DomainError> {
        let mut tables = self.tables.lock().unwrap();
        let thread = tables
            .threads
            .iter_mut()
            .find(|t| t.id == message.thread_id)
            .ok_or_else(|| DomainError::not_found("thread", message.thread_id))?;
        thread.last_message_at = Some(message.created_at);
        tables.messages.push(message.clone());
        Ok(())
    }

    async fn list_messages(&self, thread_id: Uuid) -> Result<Vec<Message>, DomainError> {
        let tables = self.tables.lock().unwrap();
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.thread_id == thread_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn mark_read(
        &self,
        thread_id: Uuid,
        reader_id: Uuid,
        read_at: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let mut tables = self.tables.lock().unwrap();
        let mut updated = 0;
        for message in tables
            .messages
            .iter_mut()
            .filter(|m| m.thread_id == thread_id && m.sender_id != reader_id && m.read_at.is_none())
        {
            message.read_at = Some(read_at);
            updated += 1;
        }
        Ok(updated)
    }
}

#[async_trait]
impl FavoriteRepository for InMemoryMarketplace {
    async fn add_favorite(&self, favorite: &Favorite) -> Result<(), DomainError> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .favorites
            .iter()
            .any(|f| f.user_id == favorite.user_id && f.listing_id == favorite.listing_id)
        {
            return Err(DomainError::Conflict("listing already in favorites".to_owned()));
        }
        let listing = tables
            .listings
            .iter_mut()
            .find(|l| l.id == favorite.listing_id)
            .ok_or_else(|| DomainError::not_found("listing", favorite.listing_id))?;
        listing.likes += 1;
        tables.favorites.push(favorite.clone());
        Ok(())
    }

    async fn remove_favorite(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool, DomainError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.favorites.len();
        tables
            .favorites
            .retain(|f| !(f.user_id == user_id && f.listing_id == listing_id));
        if tables.favorites.len() == before {
            return Ok(false);
        }
        if let Some(listing) = tables.listings.iter_mut().find(|l| l.id == listing_id) {
            listing.likes -= 1;
        }
        Ok(true)
    }

    async fn list_favorites(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FavoriteWithListing>, DomainError> {
        let tables = self.tables.lock().unwrap();
        let mut favorites: Vec<FavoriteWithListing> = tables
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .filter_map(|f| {
                tables
                    .listings
                    .iter()
                    .find(|l| l.id == f.listing_id)
                    .map(|l| FavoriteWithListing {
                        favorite: f.clone(),
                        listing: l.clone(),
                    })
            })
            .collect();
        favorites.sort_by(|a, b| b.favorite.created_at.cmp(&a.favorite.created_at));
        Ok(favorites)
    }
}

/// A repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingRepository;

fn connection_refused<T>() -> Result<T, DomainError> {
    Err(DomainError::Infrastructure("connection refused".into()))
}

#[async_trait]
impl UserRepository for FailingRepository {
    async fn find_user(&self, _user_id: Uuid) -> Result<Option<User>, DomainError> {
        connection_refused()
    }
}

#[async_trait]
impl ListingRepository for FailingRepository {
    async fn find_listing(&self, _listing_id: Uuid) -> Result<Option<Listing>, DomainError> {
        connection_refused()
    }

    async fn insert_listing(&self, _listing: &Listing) -> Result<(), DomainError> {
        connection_refused()
    }

    async fn delete_listing(&self, _listing_id: Uuid) -> Result<bool, DomainError> {
        connection_refused()
    }

    async fn search_listings(&self, _query: &ListingQuery) -> Result<ListingPage, DomainError> {
        connection_refused()
    }

    async fn list_seller_listings(&self, _seller_id: Uuid) -> Result<Vec<Listing>, DomainError> {
        connection_refused()
    }

    async fn set_withdrawn(
        &self,
        _listing_id: Uuid,
        _withdrawn: bool,
    ) -> Result<Option<Listing>, DomainError> {
        connection_refused()
    }

    async fn record_view(
        &self,
        _listing_id: Uuid,
        _viewer_key: &str,
        _viewed_at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        connection_refused()
    }
}

#[async_trait]
impl LedgerRepository for FailingRepository {
    async fn record_sale(
        &self,
        _entry: &LedgerEntry,
        _sold_at: DateTime<Utc>,
    ) -> Result<SaleRecording, DomainError> {
        connection_refused()
    }

    async fn attach_invoice(
        &self,
        _entry_id: Uuid,
        _invoice: &InvoiceAttachment,
    ) -> Result<(), DomainError> {
        connection_refused()
    }

    async fn find_by_payment_session(
        &self,
        _payment_session_id: &str,
    ) -> Result<Option<LedgerEntry>, DomainError> {
        connection_refused()
    }
}

#[async_trait]
impl ThreadRepository for FailingRepository {
    async fn find_thread(&self, _thread_id: Uuid) -> Result<Option<Thread>, DomainError> {
        connection_refused()
    }

    async fn find_thread_between(
        &self,
        _first: Uuid,
        _second: Uuid,
        _listing_id: Option<Uuid>,
    ) -> Result<Option<Thread>, DomainError> {
        connection_refused()
    }

    async fn create_thread(&self, _thread: &Thread) -> Result<ThreadOpening, DomainError> {
        connection_refused()
    }

    async fn list_threads(&self, _user_id: Uuid) -> Result<Vec<ThreadSummary>, DomainError> {
        connection_refused()
    }

    async fn insert_message(&self, _message: &Message) -> Result<(), DomainError> {
        connection_refused()
    }

    async fn list_messages(&self, _thread_id: Uuid) -> Result<Vec<Message>, DomainError> {
        connection_refused()
    }

    async fn mark_read(
        &self,
        _thread_id: Uuid,
        _reader_id: Uuid,
        _read_at: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        connection_refused()
    }
}

#[async_trait]
impl FavoriteRepository for FailingRepository {
    async fn add_favorite(&self, _favorite: &Favorite) -> Result<(), DomainError> {
        connection_refused()
    }

    async fn remove_favorite(
        &self,
        _user_id: Uuid,
        _listing_id: Uuid,
    ) -> Result<bool, DomainError> {
        connection_refused()
    }

    async fn list_favorites(
        &self,
        _user_id: Uuid,
    ) -> Result<Vec<FavoriteWithListing>, DomainError> {
        connection_refused()
    }
}
