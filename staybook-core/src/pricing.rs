//! Stay pricing.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::availability::DateSpan;

/// Stays this long or longer use the monthly rate when a property has one.
pub const MONTHLY_STAY_NIGHTS: i64 = 30;

/// Prices of a property, in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateCard {
    pub nightly: i64,
    pub monthly: Option<i64>,
    pub cleaning_fee: i64,
}

/// Price breakdown stored on a booking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    /// Price of each night, keyed by the night's date.
    pub nightly: BTreeMap<NaiveDate, i64>,
    pub cleaning_fee: i64,
    pub subtotal: i64,
    pub total: i64,
    pub currency: String,
}

impl RateCard {
    /// Per-night rate for a stay of `nights`.
    pub fn rate_for(&self, nights: i64) -> i64 {
        match self.monthly {
            Some(monthly) if nights >= MONTHLY_STAY_NIGHTS => {
                (monthly + MONTHLY_STAY_NIGHTS / 2) / MONTHLY_STAY_NIGHTS
            }
            _ => self.nightly,
        }
    }

    pub fn quote(&self, stay: &DateSpan, currency: &str) -> Pricing {
        let rate = self.rate_for(stay.num_nights());
        let nightly: BTreeMap<NaiveDate, i64> = stay.nights().map(|night| (night, rate)).collect();
        let subtotal = nightly.values().sum();

        Pricing {
            nightly,
            cleaning_fee: self.cleaning_fee,
            subtotal,
            total: subtotal + self.cleaning_fee,
            currency: currency.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stay(start: &str, end: &str) -> DateSpan {
        DateSpan::stay(
            NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
            NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn short_stay_charges_nightly_plus_one_cleaning_fee() {
        let rates = RateCard {
            nightly: 10_000,
            monthly: Some(240_000),
            cleaning_fee: 5_000,
        };

        let pricing = rates.quote(&stay("2025-03-01", "2025-03-04"), "jpy");
        assert_eq!(pricing.nightly.len(), 3);
        assert_eq!(pricing.subtotal, 30_000);
        assert_eq!(pricing.total, 35_000);
        assert_eq!(pricing.currency, "jpy");
    }

    #[test]
    fn long_stay_uses_prorated_monthly_rate() {
        let rates = RateCard {
            nightly: 10_000,
            monthly: Some(240_000),
            cleaning_fee: 0,
        };

        let pricing = rates.quote(&stay("2025-03-01", "2025-03-31"), "jpy");
        assert_eq!(pricing.nightly.len(), 30);
        assert!(pricing.nightly.values().all(|p| *p == 8_000));
        assert_eq!(pricing.total, 240_000);
    }

    #[test]
    fn long_stay_without_monthly_rate_stays_nightly() {
        let rates = RateCard {
            nightly: 7_000,
            monthly: None,
            cleaning_fee: 3_000,
        };

        let pricing = rates.quote(&stay("2025-03-01", "2025-04-05"), "jpy");
        assert_eq!(pricing.subtotal, 35 * 7_000);
        assert_eq!(pricing.total, 35 * 7_000 + 3_000);
    }
}
