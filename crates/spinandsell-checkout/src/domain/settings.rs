//! Checkout settings injected from application configuration.

use super::fees::FeePolicy;

/// Default tax rate applied to invoices, in percent.
pub const DEFAULT_TAX_RATE_PERCENT: u32 = 21;

/// Settings for checkout and fulfillment.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    /// Public base URL used for redirect and e-mail links, without a
    /// trailing slash.
    pub base_url: String,
    /// ISO currency code passed to the payment provider, lowercase.
    pub currency: String,
    /// Platform fee policy.
    pub fees: FeePolicy,
    /// Tax rate applied to the fee-exclusive subtotal, in percent.
    pub tax_rate_percent: u32,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_owned(),
            currency: "eur".to_owned(),
            fees: FeePolicy::default(),
            tax_rate_percent: DEFAULT_TAX_RATE_PERCENT,
        }
    }
}
