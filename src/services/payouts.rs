//! Piece-rate payout computation and posting.
//!
//! Rate selection is a pure function over the admin-editable rate table;
//! nothing here hard-codes a rate inline. Posting splits a gross rate into
//! the worker's net credit and the referral cascade's commission pool.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{EntryKind, GarmentType, RateTable, StaffRole, Transaction};
use crate::services::referrals::ReferralService;
use crate::store::Datastore;

/// Material-handling actions carry their own small incentives, not tied to a
/// garment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialAction {
    StockEntry,
    Issue,
}

/// Piece rate for a production role completing work on one garment.
///
/// Measurement rates depend on the garment category and on whether the
/// customer is new; the bench roles key purely on garment type. Unmatched
/// keys resolve to the table's role-specific fallback.
pub fn rate_for(
    role: StaffRole,
    garment: GarmentType,
    is_new_customer: bool,
    rates: &RateTable,
) -> Decimal {
    match role {
        StaffRole::Measurement => {
            let m = &rates.measurement;
            match garment {
                GarmentType::Shirt | GarmentType::Kurta => {
                    if is_new_customer {
                        m.shirt_new
                    } else {
                        m.shirt_returning
                    }
                }
                GarmentType::Pant | GarmentType::Pyjama => {
                    if is_new_customer {
                        m.pant_new
                    } else {
                        m.pant_returning
                    }
                }
                GarmentType::Coat | GarmentType::Jodhpuri => m.coat,
                GarmentType::Safari => m.safari,
                _ => m.fallback,
            }
        }
        StaffRole::Cutting => rates
            .cutting
            .get(&garment)
            .copied()
            .unwrap_or(rates.cutting_fallback),
        role if role.is_stitching() => rates
            .stitching
            .get(&garment)
            .copied()
            .unwrap_or(rates.stitching_fallback),
        StaffRole::KajButton => rates
            .kaj_button
            .get(&garment)
            .copied()
            .unwrap_or(rates.kaj_button_fallback),
        StaffRole::Finishing => rates.finishing,
        StaffRole::Delivery => rates.delivery_return_bonus,
        _ => Decimal::ZERO,
    }
}

pub fn material_rate(action: MaterialAction, rates: &RateTable) -> Decimal {
    match action {
        MaterialAction::StockEntry => rates.material_stock_entry,
        MaterialAction::Issue => rates.material_issue,
    }
}

/// Breakdown of one posted payout.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutBreakdown {
    pub gross: Decimal,
    pub deduction: Decimal,
    pub net: Decimal,
}

#[derive(Clone)]
pub struct PayoutService {
    store: Arc<Datastore>,
    referrals: Arc<ReferralService>,
    event_sender: EventSender,
    /// Fraction of each gross payout withheld for the referral cascade.
    deduction_fraction: Decimal,
}

impl PayoutService {
    pub fn new(
        store: Arc<Datastore>,
        referrals: Arc<ReferralService>,
        event_sender: EventSender,
        deduction_fraction: Decimal,
    ) -> Self {
        Self {
            store,
            referrals,
            event_sender,
            deduction_fraction,
        }
    }

    /// Post a piece-rate payout: the worker is credited the gross amount net
    /// of the referral deduction, and the deducted amount funds the cascade.
    /// With a zero deduction fraction the cascade is never invoked.
    #[instrument(skip(self), fields(worker_id = %worker_id, gross = %gross))]
    pub fn process_worker_payout(
        &self,
        worker_id: &str,
        gross: Decimal,
        description: &str,
        bill_number: Option<String>,
    ) -> Result<PayoutBreakdown, ServiceError> {
        if gross <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "payout amount must be positive".into(),
            ));
        }
        if !self.store.accounts.contains_key(worker_id) {
            return Err(ServiceError::NotFound(format!("account {worker_id} not found")));
        }

        let deduction = gross * self.deduction_fraction;
        let net = gross - deduction;

        self.store.post(Transaction::new(
            worker_id,
            EntryKind::Credit,
            net,
            format!("{description} (Net)"),
            bill_number,
        ))?;
        self.event_sender.send(Event::PayoutPosted {
            account_id: worker_id.to_string(),
            gross,
            net,
        });

        if deduction > Decimal::ZERO {
            // Cascade failures past this point leave the net credit posted;
            // each level is an independent append (no cross-entry rollback).
            self.referrals.distribute(worker_id, deduction, description)?;
        }

        info!(worker_id, %gross, %net, "worker payout posted");
        Ok(PayoutBreakdown { gross, deduction, net })
    }

    /// Material-handling incentive (stock entry, material issue). Small flat
    /// rates from the table, restricted to material staff, paid through the
    /// normal pipeline so the deduction applies.
    #[instrument(skip(self), fields(worker_id = %worker_id, action = ?action))]
    pub fn pay_material_incentive(
        &self,
        worker_id: &str,
        action: MaterialAction,
        description: &str,
        bill_number: Option<String>,
    ) -> Result<PayoutBreakdown, ServiceError> {
        let worker = self
            .store
            .accounts
            .get(worker_id)
            .ok_or_else(|| ServiceError::NotFound(format!("account {worker_id} not found")))?;
        if worker.role != StaffRole::Material {
            return Err(ServiceError::Unauthorized(
                "only material staff earn handling incentives".into(),
            ));
        }
        drop(worker);
        let rate = material_rate(action, &self.store.rates());
        if rate <= Decimal::ZERO {
            // Incentive configured off; the handling action itself still
            // succeeds.
            return Ok(PayoutBreakdown {
                gross: Decimal::ZERO,
                deduction: Decimal::ZERO,
                net: Decimal::ZERO,
            });
        }
        self.process_worker_payout(worker_id, rate, description, bill_number)
    }

    /// Post a flat bonus gross, bypassing the referral deduction. Used for
    /// the delivery return bonus.
    #[instrument(skip(self), fields(worker_id = %worker_id, amount = %amount))]
    pub fn pay_flat_bonus(
        &self,
        worker_id: &str,
        amount: Decimal,
        description: &str,
        bill_number: Option<String>,
    ) -> Result<(), ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "bonus amount must be positive".into(),
            ));
        }
        if !self.store.accounts.contains_key(worker_id) {
            return Err(ServiceError::NotFound(format!("account {worker_id} not found")));
        }
        self.store.post(Transaction::new(
            worker_id,
            EntryKind::Credit,
            amount,
            description,
            bill_number,
        ))?;
        self.event_sender.send(Event::PayoutPosted {
            account_id: worker_id.to_string(),
            gross: amount,
            net: amount,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{account, account_referred_by, store_and_events};
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test_case(StaffRole::Cutting, GarmentType::Pant => dec!(15); "cutting pant")]
    #[test_case(StaffRole::Cutting, GarmentType::Sherwani => dec!(100); "cutting sherwani")]
    #[test_case(StaffRole::Stitching, GarmentType::Coat => dec!(400); "stitching coat")]
    #[test_case(StaffRole::CoatMaker, GarmentType::Coat => dec!(400); "coat maker same table")]
    #[test_case(StaffRole::KajButton, GarmentType::Shirt => dec!(10); "kaj shirt")]
    #[test_case(StaffRole::KajButton, GarmentType::Sherwani => dec!(10); "kaj fallback")]
    #[test_case(StaffRole::Finishing, GarmentType::Pant => dec!(10); "finishing flat")]
    #[test_case(StaffRole::Delivery, GarmentType::Pant => dec!(5); "delivery bonus")]
    fn returning_customer_rates(role: StaffRole, garment: GarmentType) -> Decimal {
        rate_for(role, garment, false, &RateTable::default())
    }

    #[test]
    fn measurement_rates_depend_on_customer_freshness() {
        let rates = RateTable::default();
        let fresh = rate_for(StaffRole::Measurement, GarmentType::Shirt, true, &rates);
        let returning = rate_for(StaffRole::Measurement, GarmentType::Shirt, false, &rates);
        assert!(fresh > returning);

        // Trousers are not in the measurement matrix; fallback applies.
        assert_eq!(
            rate_for(StaffRole::Measurement, GarmentType::Trousers, true, &rates),
            rates.measurement.fallback
        );
    }

    #[test]
    fn bench_roles_key_on_garment_with_fallback() {
        let rates = RateTable::default();
        assert_eq!(
            rate_for(StaffRole::Cutting, GarmentType::Coat, false, &rates),
            *rates.cutting.get(&GarmentType::Coat).unwrap()
        );
        // Jodhpuri has no cutting entry; the role fallback applies.
        assert_eq!(
            rate_for(StaffRole::Cutting, GarmentType::Jodhpuri, false, &rates),
            rates.cutting_fallback
        );
        // Maker roles resolve through the stitching table.
        assert_eq!(
            rate_for(StaffRole::PantMaker, GarmentType::Pant, false, &rates),
            *rates.stitching.get(&GarmentType::Pant).unwrap()
        );
        // Non-production roles earn no piece rate.
        assert_eq!(
            rate_for(StaffRole::Showroom, GarmentType::Pant, false, &rates),
            Decimal::ZERO
        );
    }

    #[test]
    fn payout_splits_net_and_cascade_pool() {
        let (store, events, _rx) = store_and_events();
        let referrals = Arc::new(ReferralService::new(store.clone(), events.clone()));
        let svc = PayoutService::new(store.clone(), referrals, events, dec!(0.10));

        store.accounts.insert("A".into(), account("A", StaffRole::Manager));
        store
            .accounts
            .insert("B".into(), account_referred_by("B", StaffRole::Showroom, "A"));
        store
            .accounts
            .insert("C".into(), account_referred_by("C", StaffRole::Cutting, "B"));

        let breakdown = svc
            .process_worker_payout("C", dec!(100), "Cutting for Pant", None)
            .unwrap();
        assert_eq!(breakdown.net, dec!(90.00));
        assert_eq!(breakdown.deduction, dec!(10.00));

        // Scenario from the workflow docs: C nets 90, B gets 0.50, A 0.30.
        assert_eq!(store.balance("C"), dec!(90.00));
        assert_eq!(store.balance("B"), dec!(0.500));
        assert_eq!(store.balance("A"), dec!(0.300));
    }

    #[test]
    fn zero_deduction_skips_the_cascade() {
        let (store, events, _rx) = store_and_events();
        let referrals = Arc::new(ReferralService::new(store.clone(), events.clone()));
        let svc = PayoutService::new(store.clone(), referrals, events, Decimal::ZERO);

        store.accounts.insert("A".into(), account("A", StaffRole::Manager));
        store
            .accounts
            .insert("C".into(), account_referred_by("C", StaffRole::Cutting, "A"));

        svc.process_worker_payout("C", dec!(100), "Cutting", None).unwrap();
        assert_eq!(store.balance("C"), dec!(100));
        assert_eq!(store.balance("A"), Decimal::ZERO);
        assert!(store.referral_logs_for("A").is_empty());
    }

    #[test]
    fn flat_bonus_is_paid_gross() {
        let (store, events, _rx) = store_and_events();
        let referrals = Arc::new(ReferralService::new(store.clone(), events.clone()));
        let svc = PayoutService::new(store.clone(), referrals, events, dec!(0.10));

        store.accounts.insert("A".into(), account("A", StaffRole::Manager));
        store
            .accounts
            .insert("D".into(), account_referred_by("D", StaffRole::Delivery, "A"));

        svc.pay_flat_bonus("D", dec!(5), "Showroom return bonus", None).unwrap();
        assert_eq!(store.balance("D"), dec!(5));
        // No deduction, no cascade.
        assert_eq!(store.balance("A"), Decimal::ZERO);
    }

    #[test]
    fn non_positive_gross_is_rejected() {
        let (store, events, _rx) = store_and_events();
        let referrals = Arc::new(ReferralService::new(store.clone(), events.clone()));
        let svc = PayoutService::new(store.clone(), referrals, events, dec!(0.10));
        store.accounts.insert("C".into(), account("C", StaffRole::Cutting));

        let err = svc
            .process_worker_payout("C", Decimal::ZERO, "noop", None)
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
        assert_eq!(store.ledger_len(), 0);
    }
}
