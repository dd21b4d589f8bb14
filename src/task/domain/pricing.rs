use super::TaskCategory;
use crate::payments::domain::{FeeRate, FeeSplit, Money};

/// Price floors and the platform fee rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    fee_rate: FeeRate,
    minimum_price: Money,
    emergency_minimum_price: Money,
}

impl PricingPolicy {
    /// Creates a pricing policy.
    #[must_use]
    pub const fn new(fee_rate: FeeRate, minimum_price: Money, emergency_minimum_price: Money) -> Self {
        Self {
            fee_rate,
            minimum_price,
            emergency_minimum_price,
        }
    }

    /// Returns the platform fee rate.
    #[must_use]
    pub const fn fee_rate(&self) -> FeeRate {
        self.fee_rate
    }

    /// Returns the lowest price accepted for `category`.
    #[must_use]
    pub const fn minimum_for(&self, category: TaskCategory) -> Money {
        if category.is_emergency() {
            self.emergency_minimum_price
        } else {
            self.minimum_price
        }
    }

    /// Splits `amount` between platform and payee.
    #[must_use]
    pub fn split(&self, amount: Money) -> FeeSplit {
        FeeSplit::compute(amount, self.fee_rate)
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self::new(
            FeeRate::default(),
            Money::from_units(7),
            Money::from_units(100),
        )
    }
}
