//! Commands for the Checkout context.

use spinandsell_core::command::Command;
use uuid::Uuid;

/// Command to start a hosted checkout for a listing.
#[derive(Debug, Clone)]
pub struct CreateCheckout {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The listing being bought.
    pub listing_id: Uuid,
    /// The authenticated buyer.
    pub buyer_id: Uuid,
}

impl Command for CreateCheckout {
    fn command_type(&self) -> &'static str {
        "checkout.create_checkout"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
