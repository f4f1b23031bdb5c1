//! Hosted checkout session creation.

use spinandsell_core::command::Command;
use spinandsell_core::error::DomainError;
use spinandsell_core::model::Listing;
use spinandsell_core::payment::{CheckoutSessionRequest, HostedSession, LineItem};

use super::CheckoutServices;
use crate::domain::commands::CreateCheckout;
use crate::domain::metadata::SaleMetadata;
use crate::domain::settings::CheckoutSettings;

/// The provider accepts at most this many images per line item.
pub const MAX_LINE_ITEM_IMAGES: usize = 8;

/// Handles the `CreateCheckout` command.
///
/// Nothing is written locally: the session stays provisional until the
/// provider reports it completed.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the listing or buyer does not exist,
/// `DomainError::InvalidState` if the listing is sold or withdrawn or the
/// buyer is its seller, and `DomainError::ExternalProvider` if session creation fails.
#[tracing::instrument(
    skip_all,
    fields(listing_id = %command.listing_id, buyer_id = %command.buyer_id)
)]
pub async fn handle_create_checkout(
    command: &CreateCheckout,
    services: CheckoutServices<'_>,
) -> Result<HostedSession, DomainError> {
    let listing = services
        .listings
        .find_listing(command.listing_id)
        .await?
        .ok_or_else(|| DomainError::not_found("listing", command.listing_id))?;
    if listing.sold {
        return Err(DomainError::InvalidState(
            "this listing has already been sold".to_owned(),
        ));
    }
    if listing.withdrawn {
        return Err(DomainError::InvalidState(
            "this listing is not available".to_owned(),
        ));
    }
    if services.users.find_user(command.buyer_id).await?.is_none() {
        return Err(DomainError::not_found("user", command.buyer_id));
    }
    if listing.seller_id == command.buyer_id {
        return Err(DomainError::InvalidState(
            "you cannot buy your own listing".to_owned(),
        ));
    }

    let request = session_request(&listing, command, services.settings);
    let session = services.payments.create_checkout_session(&request).await?;

    tracing::info!(
        session_id = %session.id,
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        "checkout session created"
    );
    Ok(session)
}

fn session_request(
    listing: &Listing,
    command: &CreateCheckout,
    settings: &CheckoutSettings,
) -> CheckoutSessionRequest {
    let metadata = SaleMetadata {
        listing_id: listing.id,
        seller_id: listing.seller_id,
        buyer_id: command.buyer_id,
        platform_fee: Some(settings.fees.platform_fee(listing.price)),
    };
    let base = &settings.base_url;

    CheckoutSessionRequest {
        currency: settings.currency.clone(),
        line_item: LineItem {
            name: listing.title(),
            description: listing.description.clone(),
            images: listing
                .images
                .iter()
                .take(MAX_LINE_ITEM_IMAGES)
                .cloned()
                .collect(),
            unit_amount: listing.price,
            quantity: 1,
        },
        success_url: format!(
            "{base}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}&product_id={}",
            listing.id
        ),
        cancel_url: format!("{base}/producto/{}?checkout=cancelled", listing.id),
        metadata: metadata.to_entries(),
    }
}

#[cfg(test)]
mod tests {
    use spinandsell_core::error::DomainError;
    use spinandsell_core::model::{Listing, User};
    use spinandsell_test_support::{
        FailingPaymentProvider, FixedClock, InMemoryMarketplace, RecordingDocumentStore,
        RecordingMailer, RecordingPaymentProvider, listing_fixture, user_fixture,
    };
    use uuid::Uuid;

    use super::*;
    use crate::application::CheckoutServices;
    use crate::domain::metadata::{BUYER_ID_KEY, LISTING_ID_KEY, PLATFORM_FEE_KEY, SELLER_ID_KEY};

    struct Fixture {
        store: InMemoryMarketplace,
        payments: RecordingPaymentProvider,
        documents: RecordingDocumentStore,
        mailer: RecordingMailer,
        clock: FixedClock,
        settings: CheckoutSettings,
        buyer: User,
        seller: User,
    }

    impl Fixture {
        fn new(listing: impl FnOnce(&User) -> Listing) -> (Self, Listing) {
            let buyer = user_fixture("Ana");
            let seller = user_fixture("Bruno");
            let listing = listing(&seller);
            let store = InMemoryMarketplace::new()
                .with_user(buyer.clone())
                .with_user(seller.clone())
                .with_listing(listing.clone());
            (
                Self {
                    store,
                    payments: RecordingPaymentProvider::new(),
                    documents: RecordingDocumentStore::default(),
                    mailer: RecordingMailer::default(),
                    clock: FixedClock::default(),
                    settings: CheckoutSettings::default(),
                    buyer,
                    seller,
                },
                listing,
            )
        }

        fn services(&self) -> CheckoutServices<'_> {
            CheckoutServices {
                settings: &self.settings,
                clock: &self.clock,
                users: &self.store,
                listings: &self.store,
                ledger: &self.store,
                threads: &self.store,
                payments: &self.payments,
                documents: &self.documents,
                mailer: &self.mailer,
            }
        }
    }

    fn command(listing_id: Uuid, buyer_id: Uuid) -> CreateCheckout {
        CreateCheckout {
            correlation_id: Uuid::new_v4(),
            listing_id,
            buyer_id,
        }
    }

    #[tokio::test]
    async fn test_checkout_embeds_sale_metadata_and_redirects() {
        // Arrange
        let (fixture, listing) = Fixture::new(|seller| listing_fixture(seller.id, 89_900));

        // Act
        let session = handle_create_checkout(
            &command(listing.id, fixture.buyer.id),
            fixture.services(),
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(session.id, "cs_test_1");
        let requests = fixture.payments.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.line_item.unit_amount, 89_900);
        assert_eq!(request.line_item.quantity, 1);
        assert_eq!(request.line_item.name, listing.title());
        assert_eq!(request.currency, "eur");
        let listing_id = listing.id.to_string();
        assert_eq!(request.metadata[LISTING_ID_KEY], listing_id);
        assert_eq!(request.metadata[SELLER_ID_KEY], fixture.seller.id.to_string());
        assert_eq!(request.metadata[BUYER_ID_KEY], fixture.buyer.id.to_string());
        assert_eq!(request.metadata[PLATFORM_FEE_KEY], "4495");
        assert_eq!(
            request.success_url,
            format!(
                "http://localhost:3000/checkout/success?session_id={{CHECKOUT_SESSION_ID}}&product_id={listing_id}"
            )
        );
        assert_eq!(
            request.cancel_url,
            format!("http://localhost:3000/producto/{listing_id}?checkout=cancelled")
        );
        assert!(fixture.store.ledger_entries().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_caps_images() {
        let (fixture, listing) = Fixture::new(|seller| {
            let mut listing = listing_fixture(seller.id, 10_000);
            listing.images = (0..12).map(|i| format!("https://img.example.com/{i}.jpg")).collect();
            listing
        });

        handle_create_checkout(&command(listing.id, fixture.buyer.id), fixture.services())
            .await
            .unwrap();

        assert_eq!(
            fixture.payments.requests()[0].line_item.images.len(),
            MAX_LINE_ITEM_IMAGES
        );
    }

    #[tokio::test]
    async fn test_self_purchase_never_reaches_provider() {
        // Arrange
        let (fixture, listing) = Fixture::new(|seller| listing_fixture(seller.id, 10_000));

        // Act
        let result = handle_create_checkout(
            &command(listing.id, fixture.seller.id),
            fixture.services(),
        )
        .await;

        // Assert
        assert!(matches!(result, Err(DomainError::InvalidState(_))));
        assert!(fixture.payments.requests().is_empty());
    }

    #[tokio::test]
    async fn test_sold_listing_never_reaches_provider() {
        let (fixture, listing) = Fixture::new(|seller| {
            let mut listing = listing_fixture(seller.id, 10_000);
            listing.sold = true;
            listing.paid = true;
            listing.buyer_id = Some(Uuid::new_v4());
            listing
        });

        let result =
            handle_create_checkout(&command(listing.id, fixture.buyer.id), fixture.services())
                .await;

        assert!(matches!(result, Err(DomainError::InvalidState(_))));
        assert!(fixture.payments.requests().is_empty());
    }

    #[tokio::test]
    async fn test_withdrawn_listing_never_reaches_provider() {
        let (fixture, listing) = Fixture::new(|seller| Listing {
            withdrawn: true,
            ..listing_fixture(seller.id, 10_000)
        });

        let result =
            handle_create_checkout(&command(listing.id, fixture.buyer.id), fixture.services())
                .await;

        assert!(matches!(result, Err(DomainError::InvalidState(_))));
        assert!(fixture.payments.requests().is_empty());
    }

    #[tokio::test]
    async fn test_sold_is_checked_before_buyer_existence() {
        let (fixture, listing) = Fixture::new(|seller| {
            let mut listing = listing_fixture(seller.id, 10_000);
            listing.sold = true;
            listing
        });

        let result =
            handle_create_checkout(&command(listing.id, Uuid::new_v4()), fixture.services()).await;

        assert!(matches!(result, Err(DomainError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_unknown_listing_is_not_found() {
        let (fixture, _) = Fixture::new(|seller| listing_fixture(seller.id, 10_000));

        let result = handle_create_checkout(
            &command(Uuid::new_v4(), fixture.buyer.id),
            fixture.services(),
        )
        .await;

        match result {
            Err(DomainError::NotFound { entity, .. }) => assert_eq!(entity, "listing"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_buyer_is_not_found() {
        let (fixture, listing) = Fixture::new(|seller| listing_fixture(seller.id, 10_000));

        let result =
            handle_create_checkout(&command(listing.id, Uuid::new_v4()), fixture.services()).await;

        match result {
            Err(DomainError::NotFound { entity, .. }) => assert_eq!(entity, "user"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_provider_failure_is_external_error() {
        let (fixture, listing) = Fixture::new(|seller| listing_fixture(seller.id, 10_000));
        let services = CheckoutServices {
            payments: &FailingPaymentProvider,
            ..fixture.services()
        };

        let result = handle_create_checkout(&command(listing.id, fixture.buyer.id), services).await;

        assert!(matches!(result, Err(DomainError::ExternalProvider { .. })));
        assert!(fixture.store.ledger_entries().is_empty());
    }
}
