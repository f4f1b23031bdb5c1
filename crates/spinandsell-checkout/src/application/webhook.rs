//! Dispatch of verified payment provider events.

use spinandsell_core::error::DomainError;
use uuid::Uuid;

use super::CheckoutServices;
use super::fulfillment::fulfill_checkout;
use crate::domain::events::{PaymentEvent, PaymentEventKind};
use crate::domain::metadata::LISTING_ID_KEY;
use crate::domain::report::FulfillmentReport;

/// What dispatching an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A completed checkout ran through fulfillment.
    Fulfillment(FulfillmentReport),
    /// The event was logged and needs no further action.
    Logged,
    /// The event type is not one the marketplace reacts to.
    Ignored,
}

/// Dispatches a verified provider event by kind.
///
/// # Errors
///
/// Returns `DomainError` only if fulfillment could not load or record the
/// sale for a transient reason. Failures of later fulfillment steps are part
/// of the report, not errors.
#[tracing::instrument(skip_all, fields(event_id = %event.id))]
pub async fn handle_payment_event(
    event: &PaymentEvent,
    services: CheckoutServices<'_>,
) -> Result<DispatchOutcome, DomainError> {
    match &event.kind {
        PaymentEventKind::CheckoutCompleted(session) => {
            let report = fulfill_checkout(session, Uuid::new_v4(), services).await?;
            tracing::info!(
                session_id = %report.session_id,
                status = ?report.status,
                failed_steps = report.failures().count(),
                "checkout completion handled"
            );
            Ok(DispatchOutcome::Fulfillment(report))
        }
        PaymentEventKind::PaymentSucceeded { payment_intent_id } => {
            tracing::info!(%payment_intent_id, "payment succeeded");
            Ok(DispatchOutcome::Logged)
        }
        PaymentEventKind::PaymentFailed { payment_intent_id } => {
            log_failed_payment(payment_intent_id, services).await;
            Ok(DispatchOutcome::Logged)
        }
        PaymentEventKind::Unhandled(event_type) => {
            tracing::debug!(%event_type, "unhandled event type");
            Ok(DispatchOutcome::Ignored)
        }
    }
}

// TODO: notify the buyer once a payment-failed e-mail template exists.
async fn log_failed_payment(payment_intent_id: &str, services: CheckoutServices<'_>) {
    match services
        .payments
        .find_session_by_payment_intent(payment_intent_id)
        .await
    {
        Ok(Some(session)) => {
            let listing_id = session
                .metadata
                .get(LISTING_ID_KEY)
                .map_or("unknown", String::as_str);
            tracing::warn!(%payment_intent_id, session_id = %session.id, %listing_id, "payment failed");
        }
        Ok(None) => {
            tracing::warn!(%payment_intent_id, "payment failed for an unknown session");
        }
        Err(err) => {
            tracing::error!(%payment_intent_id, error = %err, "could not look up failed payment");
        }
    }
}
