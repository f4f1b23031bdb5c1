//! Payment provider events.
//!
//! Only the event kinds the marketplace reacts to are decoded; every other
//! kind is kept as `Unhandled` with its type name so it can be logged.

use serde::Deserialize;
use spinandsell_core::error::DomainError;
use spinandsell_core::payment::ProviderSession;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const PAYMENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_FAILED: &str = "payment_intent.payment_failed";

/// The decoded event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventKind {
    /// A hosted checkout session was paid.
    CheckoutCompleted(ProviderSession),
    /// A payment intent succeeded.
    PaymentSucceeded {
        /// Provider payment intent id.
        payment_intent_id: String,
    },
    /// A payment intent failed.
    PaymentFailed {
        /// Provider payment intent id.
        payment_intent_id: String,
    },
    /// Any other event type.
    Unhandled(String),
}

/// A verified event received from the payment provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    /// Provider event id.
    pub id: String,
    /// Decoded payload.
    pub kind: PaymentEventKind,
}

#[derive(Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Deserialize)]
struct RawPaymentIntent {
    id: String,
}

impl PaymentEvent {
    /// Decodes an event from the raw webhook body.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the body is not an event, or if
    /// an event of a handled kind carries an object of the wrong shape.
    pub fn from_payload(payload: &[u8]) -> Result<Self, DomainError> {
        let raw: RawEvent = serde_json::from_slice(payload)
            .map_err(|e| DomainError::Validation(format!("invalid event payload: {e}")))?;

        let kind = match raw.event_type.as_str() {
            CHECKOUT_COMPLETED => {
                PaymentEventKind::CheckoutCompleted(decode_object(raw.data.object, CHECKOUT_COMPLETED)?)
            }
            PAYMENT_SUCCEEDED => {
                let intent: RawPaymentIntent = decode_object(raw.data.object, PAYMENT_SUCCEEDED)?;
                PaymentEventKind::PaymentSucceeded {
                    payment_intent_id: intent.id,
                }
            }
            PAYMENT_FAILED => {
                let intent: RawPaymentIntent = decode_object(raw.data.object, PAYMENT_FAILED)?;
                PaymentEventKind::PaymentFailed {
                    payment_intent_id: intent.id,
                }
            }
            _ => PaymentEventKind::Unhandled(raw.event_type),
        };

        Ok(Self { id: raw.id, kind })
    }
}

fn decode_object<T: for<'de> Deserialize<'de>>(
    object: serde_json::Value,
    event_type: &str,
) -> Result<T, DomainError> {
    serde_json::from_value(object)
        .map_err(|e| DomainError::Validation(format!("invalid {event_type} object: {e}")))
}
