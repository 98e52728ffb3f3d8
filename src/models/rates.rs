use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::order::GarmentType;

/// Measurement piece rates. New-customer rates are higher, reflecting the
/// extra onboarding effort of a full first measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementRates {
    pub shirt_new: Decimal,
    pub shirt_returning: Decimal,
    pub pant_new: Decimal,
    pub pant_returning: Decimal,
    pub coat: Decimal,
    pub safari: Decimal,
    pub fallback: Decimal,
}

impl Default for MeasurementRates {
    fn default() -> Self {
        Self {
            shirt_new: dec!(40),
            shirt_returning: dec!(20),
            pant_new: dec!(30),
            pant_returning: dec!(15),
            coat: dec!(60),
            safari: dec!(50),
            fallback: dec!(25),
        }
    }
}

/// Admin-mutable piece-rate configuration. Every payout resolves through this
/// table; changes apply prospectively only. A payout already posted keeps the
/// rate captured at the time, never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    pub measurement: MeasurementRates,
    pub cutting: BTreeMap<GarmentType, Decimal>,
    pub cutting_fallback: Decimal,
    pub stitching: BTreeMap<GarmentType, Decimal>,
    pub stitching_fallback: Decimal,
    pub kaj_button: BTreeMap<GarmentType, Decimal>,
    pub kaj_button_fallback: Decimal,
    pub finishing: Decimal,
    /// Flat bonus for returning a delivered order's cash to the showroom.
    /// Paid gross; the referral deduction does not apply.
    pub delivery_return_bonus: Decimal,
    pub material_stock_entry: Decimal,
    pub material_issue: Decimal,
    /// Percent of order value credited to the booking staff at intake.
    pub booking_commission_percent: Decimal,
}

impl Default for RateTable {
    fn default() -> Self {
        let cutting = BTreeMap::from([
            (GarmentType::Shirt, dec!(20)),
            (GarmentType::Kurta, dec!(20)),
            (GarmentType::Pant, dec!(15)),
            (GarmentType::Pyjama, dec!(15)),
            (GarmentType::Trousers, dec!(15)),
            (GarmentType::Coat, dec!(80)),
            (GarmentType::Safari, dec!(60)),
            (GarmentType::Sherwani, dec!(100)),
        ]);
        let stitching = BTreeMap::from([
            (GarmentType::Shirt, dec!(120)),
            (GarmentType::Kurta, dec!(120)),
            (GarmentType::Pant, dec!(100)),
            (GarmentType::Pyjama, dec!(80)),
            (GarmentType::Trousers, dec!(100)),
            (GarmentType::Coat, dec!(400)),
            (GarmentType::Safari, dec!(250)),
            (GarmentType::Sherwani, dec!(500)),
        ]);
        let kaj_button = BTreeMap::from([
            (GarmentType::Shirt, dec!(10)),
            (GarmentType::Coat, dec!(25)),
        ]);
        Self {
            measurement: MeasurementRates::default(),
            cutting,
            cutting_fallback: dec!(50),
            stitching,
            stitching_fallback: dec!(150),
            kaj_button,
            kaj_button_fallback: dec!(10),
            finishing: dec!(10),
            delivery_return_bonus: dec!(5),
            material_stock_entry: dec!(2),
            material_issue: dec!(1),
            booking_commission_percent: dec!(10),
        }
    }
}

/// One referral level's share. Each configured level draws its percent from
/// the same commission pool independently; the percents are not required to
/// sum to 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralLevel {
    pub level: u8,
    pub percent: Decimal,
}

/// Commission percents for upline levels 1..=6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralLevelTable {
    pub levels: Vec<ReferralLevel>,
}

/// Hard bound on the upline walk, regardless of chain structure.
pub const MAX_REFERRAL_DEPTH: u8 = 6;

impl Default for ReferralLevelTable {
    fn default() -> Self {
        Self {
            levels: vec![
                ReferralLevel { level: 1, percent: dec!(5) },
                ReferralLevel { level: 2, percent: dec!(3) },
                ReferralLevel { level: 3, percent: dec!(2) },
                ReferralLevel { level: 4, percent: dec!(1) },
                ReferralLevel { level: 5, percent: dec!(0.5) },
                ReferralLevel { level: 6, percent: dec!(0.5) },
            ],
        }
    }
}

impl ReferralLevelTable {
    pub fn percent_for(&self, level: u8) -> Decimal {
        self.levels
            .iter()
            .find(|l| l.level == level)
            .map(|l| l.percent)
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_percents() {
        let table = ReferralLevelTable::default();
        assert_eq!(table.percent_for(1), dec!(5));
        assert_eq!(table.percent_for(6), dec!(0.5));
        assert_eq!(table.percent_for(7), Decimal::ZERO);
    }

    #[test]
    fn rate_table_covers_every_garment_for_cutting_and_stitching() {
        use strum::IntoEnumIterator;
        let table = RateTable::default();
        for garment in GarmentType::iter() {
            // Jodhpuri intentionally resolves through the fallback.
            if garment != GarmentType::Jodhpuri {
                assert!(table.cutting.contains_key(&garment), "cutting rate for {garment}");
                assert!(table.stitching.contains_key(&garment), "stitching rate for {garment}");
            }
        }
    }
}
