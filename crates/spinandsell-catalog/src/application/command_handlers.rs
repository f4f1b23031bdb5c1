//! Command handlers for the Catalogue context.
//!
//! Each handler validates against current storage state and then performs a
//! single repository write; counter maintenance happens inside the
//! repository transaction.

use spinandsell_core::clock::Clock;
use spinandsell_core::command::Command;
use spinandsell_core::error::DomainError;
use spinandsell_core::model::{Favorite, Listing};
use spinandsell_core::repository::{FavoriteRepository, ListingRepository, UserRepository};
use uuid::Uuid;

use crate::domain::commands::{
    AddFavorite, CreateListing, DeleteListing, RemoveFavorite, SetListingAvailability,
};
use crate::domain::listing_rules::build_listing;

/// Handles the `CreateListing` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the seller does not exist and
/// `DomainError::Validation` for invalid listing fields.
pub async fn handle_create_listing(
    command: &CreateListing,
    clock: &dyn Clock,
    users: &dyn UserRepository,
    listings: &dyn ListingRepository,
) -> Result<Listing, DomainError> {
    if users.find_user(command.seller_id).await?.is_none() {
        return Err(DomainError::not_found("user", command.seller_id));
    }
    let listing = build_listing(
        Uuid::new_v4(),
        command.seller_id,
        command.draft.clone(),
        clock.current_year(),
        clock.now(),
    )?;
    listings.insert_listing(&listing).await?;

    tracing::info!(
        listing_id = %listing.id,
        seller_id = %listing.seller_id,
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        "listing published"
    );
    Ok(listing)
}

/// Handles the `DeleteListing` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the listing does not exist,
/// `DomainError::Forbidden` if the requester is not the seller and
/// `DomainError::InvalidState` if the listing has already been sold.
pub async fn handle_delete_listing(
    command: &DeleteListing,
    listings: &dyn ListingRepository,
) -> Result<(), DomainError> {
    let listing = listings
        .find_listing(command.listing_id)
        .await?
        .ok_or_else(|| DomainError::not_found("listing", command.listing_id))?;
    if listing.seller_id != command.requester_id {
        return Err(DomainError::Forbidden(
            "only the seller may delete this listing".to_owned(),
        ));
    }
    if listing.sold {
        return Err(DomainError::InvalidState(
            "sold listings cannot be deleted".to_owned(),
        ));
    }
    if !listings.delete_listing(listing.id).await? {
        return Err(DomainError::not_found("listing", listing.id));
    }
    tracing::info!(
        listing_id = %listing.id,
        correlation_id = %command.correlation_id,
        "listing deleted"
    );
    Ok(())
}

/// Handles the `SetListingAvailability` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the listing does not exist,
/// `DomainError::Forbidden` if the requester is not the seller and
/// `DomainError::InvalidState` if the listing has already been sold.
pub async fn handle_set_listing_availability(
    command: &SetListingAvailability,
    listings: &dyn ListingRepository,
) -> Result<Listing, DomainError> {
    let listing = listings
        .find_listing(command.listing_id)
        .await?
        .ok_or_else(|| DomainError::not_found("listing", command.listing_id))?;
    if listing.seller_id != command.requester_id {
        return Err(DomainError::Forbidden(
            "only the seller may change this listing".to_owned(),
        ));
    }
    if listing.sold {
        return Err(DomainError::InvalidState(
            "sold listings cannot change availability".to_owned(),
        ));
    }
    // A sale can land between the read and the write.
    let updated = listings
        .set_withdrawn(listing.id, !command.available)
        .await?
        .ok_or_else(|| {
            DomainError::InvalidState("sold listings cannot change availability".to_owned())
        })?;

    tracing::info!(
        listing_id = %updated.id,
        available = command.available,
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        "listing availability changed"
    );
    Ok(updated)
}

/// Handles the `AddFavorite` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the listing does not exist and
/// `DomainError::Conflict` if it is already a favorite.
pub async fn handle_add_favorite(
    command: &AddFavorite,
    clock: &dyn Clock,
    listings: &dyn ListingRepository,
    favorites: &dyn FavoriteRepository,
) -> Result<Favorite, DomainError> {
    if listings.find_listing(command.listing_id).await?.is_none() {
        return Err(DomainError::not_found("listing", command.listing_id));
    }
    let favorite = Favorite {
        id: Uuid::new_v4(),
        user_id: command.user_id,
        listing_id: command.listing_id,
        created_at: clock.now(),
    };
    favorites.add_favorite(&favorite).await?;
    Ok(favorite)
}

/// Handles the `RemoveFavorite` command.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the listing is not a favorite.
pub async fn handle_remove_favorite(
    command: &RemoveFavorite,
    favorites: &dyn FavoriteRepository,
) -> Result<(), DomainError> {
    if favorites
        .remove_favorite(command.user_id, command.listing_id)
        .await?
    {
        Ok(())
    } else {
        Err(DomainError::not_found("favorite", command.listing_id))
    }
}

#[cfg(test)]
mod tests {
    use spinandsell_core::error::DomainError;
    use spinandsell_test_support::{
        FailingRepository, FixedClock, InMemoryMarketplace, listing_fixture, user_fixture,
    };
    use uuid::Uuid;

    use super::*;
    use crate::domain::commands::ListingDraft;

    fn add(user_id: Uuid, listing_id: Uuid) -> AddFavorite {
        AddFavorite {
            correlation_id: Uuid::new_v4(),
            user_id,
            listing_id,
        }
    }

    fn remove(user_id: Uuid, listing_id: Uuid) -> RemoveFavorite {
        RemoveFavorite {
            correlation_id: Uuid::new_v4(),
            user_id,
            listing_id,
        }
    }

    #[tokio::test]
    async fn test_create_listing_persists_unsold_listing() {
        // Arrange
        let seller = user_fixture("Bruno");
        let store = InMemoryMarketplace::new().with_user(seller.clone());
        let command = CreateListing {
            correlation_id: Uuid::new_v4(),
            seller_id: seller.id,
            draft: ListingDraft {
                brand: "Xiaomi".to_owned(),
                model: "Pro 2".to_owned(),
                year: 2022,
                category: "ELECTRIC_SCOOTER".to_owned(),
                condition: "C".to_owned(),
                description: String::new(),
                images: vec![],
                price: 25_000,
            },
        };

        // Act
        let listing = handle_create_listing(&command, &FixedClock::default(), &store, &store)
            .await
            .unwrap();

        // Assert
        let stored = store.listing(listing.id).unwrap();
        assert_eq!(stored.seller_id, seller.id);
        assert!(!stored.sold);
        assert_eq!(stored.price, 25_000);
    }

    #[tokio::test]
    async fn test_delete_listing_by_other_user_is_forbidden() {
        let seller = user_fixture("Bruno");
        let listing = listing_fixture(seller.id, 10_000);
        let store = InMemoryMarketplace::new().with_listing(listing.clone());

        let result = handle_delete_listing(
            &DeleteListing {
                correlation_id: Uuid::new_v4(),
                listing_id: listing.id,
                requester_id: Uuid::new_v4(),
            },
            &store,
        )
        .await;

        assert!(matches!(result, Err(DomainError::Forbidden(_))));
        assert!(store.listing(listing.id).is_some());
    }

    #[tokio::test]
    async fn test_delete_sold_listing_is_invalid_state() {
        let seller = user_fixture("Bruno");
        let mut listing = listing_fixture(seller.id, 10_000);
        listing.sold = true;
        listing.paid = true;
        listing.buyer_id = Some(Uuid::new_v4());
        let store = InMemoryMarketplace::new().with_listing(listing.clone());

        let result = handle_delete_listing(
            &DeleteListing {
                correlation_id: Uuid::new_v4(),
                listing_id: listing.id,
                requester_id: seller.id,
            },
            &store,
        )
        .await;

        assert!(matches!(result, Err(DomainError::InvalidState(_))));
    }

    fn set_available(
        listing_id: Uuid,
        requester_id: Uuid,
        available: bool,
    ) -> SetListingAvailability {
        SetListingAvailability {
            correlation_id: Uuid::new_v4(),
            listing_id,
            requester_id,
            available,
        }
    }

    #[tokio::test]
    async fn test_seller_can_withdraw_and_relist() {
        // Arrange
        let seller = user_fixture("Bruno");
        let listing = listing_fixture(seller.id, 10_000);
        let store = InMemoryMarketplace::new().with_listing(listing.clone());

        // Act
        let withdrawn =
            handle_set_listing_availability(&set_available(listing.id, seller.id, false), &store)
                .await
                .unwrap();
        let relisted =
            handle_set_listing_availability(&set_available(listing.id, seller.id, true), &store)
                .await
                .unwrap();

        // Assert
        assert!(withdrawn.withdrawn);
        assert!(!relisted.withdrawn);
        let stored = store.listing(listing.id).unwrap();
        assert!(!stored.withdrawn);
        assert!(!stored.sold);
        assert_eq!(stored.buyer_id, None);
    }

    #[tokio::test]
    async fn test_availability_of_other_sellers_listing_is_forbidden() {
        let seller = user_fixture("Bruno");
        let listing = listing_fixture(seller.id, 10_000);
        let store = InMemoryMarketplace::new().with_listing(listing.clone());

        let result = handle_set_listing_availability(
            &set_available(listing.id, Uuid::new_v4(), false),
            &store,
        )
        .await;

        assert!(matches!(result, Err(DomainError::Forbidden(_))));
        assert!(!store.listing(listing.id).unwrap().withdrawn);
    }

    #[tokio::test]
    async fn test_availability_of_sold_listing_is_invalid_state() {
        let seller = user_fixture("Bruno");
        let mut listing = listing_fixture(seller.id, 10_000);
        listing.sold = true;
        listing.buyer_id = Some(Uuid::new_v4());
        let store = InMemoryMarketplace::new().with_listing(listing.clone());

        let result =
            handle_set_listing_availability(&set_available(listing.id, seller.id, true), &store)
                .await;

        assert!(matches!(result, Err(DomainError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_availability_of_missing_listing_is_not_found() {
        let store = InMemoryMarketplace::new();

        let result = handle_set_listing_availability(
            &set_available(Uuid::new_v4(), Uuid::new_v4(), false),
            &store,
        )
        .await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_favorite_toggle_keeps_counter_equal_to_rows() {
        // Arrange
        let seller = user_fixture("Bruno");
        let listing = listing_fixture(seller.id, 10_000);
        let store = InMemoryMarketplace::new().with_listing(listing.clone());
        let clock = FixedClock::default();
        let ana = Uuid::new_v4();
        let carla = Uuid::new_v4();

        // Act
        handle_add_favorite(&add(ana, listing.id), &clock, &store, &store)
            .await
            .unwrap();
        handle_add_favorite(&add(carla, listing.id), &clock, &store, &store)
            .await
            .unwrap();
        handle_remove_favorite(&remove(ana, listing.id), &store)
            .await
            .unwrap();

        // Assert
        let likes = store.listing(listing.id).unwrap().likes;
        assert_eq!(likes, 1);
        assert_eq!(store.favorite_count(listing.id), 1);
    }

    #[tokio::test]
    async fn test_double_favorite_is_conflict_and_does_not_double_count() {
        let seller = user_fixture("Bruno");
        let listing = listing_fixture(seller.id, 10_000);
        let store = InMemoryMarketplace::new().with_listing(listing.clone());
        let clock = FixedClock::default();
        let ana = Uuid::new_v4();

        handle_add_favorite(&add(ana, listing.id), &clock, &store, &store)
            .await
            .unwrap();
        let second = handle_add_favorite(&add(ana, listing.id), &clock, &store, &store).await;

        assert!(matches!(second, Err(DomainError::Conflict(_))));
        assert_eq!(store.listing(listing.id).unwrap().likes, 1);
    }

    #[tokio::test]
    async fn test_remove_missing_favorite_is_not_found() {
        let store = InMemoryMarketplace::new();

        let result = handle_remove_favorite(&remove(Uuid::new_v4(), Uuid::new_v4()), &store).await;

        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_add_favorite_propagates_storage_failure() {
        let result = handle_add_favorite(
            &add(Uuid::new_v4(), Uuid::new_v4()),
            &FixedClock::default(),
            &FailingRepository,
            &FailingRepository,
        )
        .await;

        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}
