//! Platform fee policy.

use spinandsell_core::money::{MinorUnits, percent_of};

/// Percentage-based platform fee with a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    /// Fee percentage of the gross amount.
    pub percent: u32,
    /// Minimum fee in minor units.
    pub minimum: MinorUnits,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            percent: 5,
            minimum: 50,
        }
    }
}

impl FeePolicy {
    /// `max(round(gross × percent / 100), minimum)`.
    #[must_use]
    pub fn platform_fee(&self, gross: MinorUnits) -> MinorUnits {
        percent_of(gross, self.percent).max(self.minimum)
    }
}
