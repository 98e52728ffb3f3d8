//! Multi-level referral commission engine.
//!
//! A payout's referral deduction becomes a commission pool. The cascade walks
//! the source account's upline chain (level 1 = immediate upline) and pays
//! each configured level its percent of the pool. Levels draw from the same
//! pool independently; there is no shrinking remainder.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::rates::MAX_REFERRAL_DEPTH;
use crate::models::{EntryKind, ReferralIncomeLog, StaffRole, Transaction};
use crate::store::Datastore;

/// Per-level summary of an account's downline network.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NetworkLevel {
    pub level: u8,
    pub member_count: usize,
    pub total_earnings: Decimal,
    pub percent: Decimal,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub role: StaffRole,
    pub level: u8,
}

/// Outcome of one cascade run, for callers that audit the spread.
#[derive(Debug, Clone, Default)]
pub struct CascadeOutcome {
    pub levels_paid: u8,
    pub total_paid: Decimal,
}

#[derive(Clone)]
pub struct ReferralService {
    store: Arc<Datastore>,
    event_sender: EventSender,
}

impl ReferralService {
    pub fn new(store: Arc<Datastore>, event_sender: EventSender) -> Self {
        Self { store, event_sender }
    }

    /// Walk the upline chain of `source_account_id` and pay graded
    /// commissions out of `pool`.
    ///
    /// The walk stops at the earlier of: the chain ending (no upline, or a
    /// dangling reference, which is not an error), an account already visited in this
    /// call (defends against short cycles), or the hard six-level cap. Each
    /// level's credit is an independent append; a stop partway leaves the
    /// already-posted levels in place.
    #[instrument(skip(self), fields(source = %source_account_id, pool = %pool))]
    pub fn distribute(
        &self,
        source_account_id: &str,
        pool: Decimal,
        action: &str,
    ) -> Result<CascadeOutcome, ServiceError> {
        if pool <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "commission pool must be positive".into(),
            ));
        }
        let source = self
            .store
            .accounts
            .get(source_account_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("account {source_account_id} not found"))
            })?;
        let source_name = source.name.clone();
        let source_role = source.role;
        let mut upline = source.referred_by.clone();
        drop(source);

        let levels = self.store.referral_levels();
        let mut visited: HashSet<String> = HashSet::from([source_account_id.to_string()]);
        let mut outcome = CascadeOutcome::default();

        let mut level: u8 = 1;
        while let Some(upline_id) = upline {
            if level > MAX_REFERRAL_DEPTH {
                break;
            }
            if !visited.insert(upline_id.clone()) {
                warn!(account_id = %upline_id, "referral chain revisited an account; stopping walk");
                break;
            }
            // Dangling upline terminates the walk without error.
            let Some(mut recipient) = self.store.accounts.get_mut(&upline_id) else {
                break;
            };

            let percent = levels.percent_for(level);
            let commission = pool * percent / Decimal::ONE_HUNDRED;
            if commission > Decimal::ZERO {
                self.store.post(Transaction::new(
                    upline_id.clone(),
                    EntryKind::Credit,
                    commission,
                    format!("Level {level} referral commission ({action})"),
                    None,
                ))?;
                self.store.append_referral_log(ReferralIncomeLog {
                    id: Uuid::new_v4(),
                    recipient_id: upline_id.clone(),
                    source_name: source_name.clone(),
                    source_role,
                    action: action.to_string(),
                    level,
                    amount: commission,
                    posted_at: chrono::Utc::now(),
                });
                recipient.total_referral_earnings += commission;
                outcome.levels_paid += 1;
                outcome.total_paid += commission;
                self.event_sender.send(Event::CommissionPosted {
                    recipient_id: upline_id.clone(),
                    level,
                    amount: commission,
                });
            }

            upline = recipient.referred_by.clone();
            level += 1;
        }

        info!(
            levels_paid = outcome.levels_paid,
            total_paid = %outcome.total_paid,
            "referral cascade finished"
        );
        Ok(outcome)
    }

    pub fn income_logs(&self, account_id: &str) -> Vec<ReferralIncomeLog> {
        let mut logs = self.store.referral_logs_for(account_id);
        logs.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        logs
    }

    /// Credit the wallet with referral earnings accrued since the last claim.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub fn claim_rewards(&self, account_id: &str) -> Result<Decimal, ServiceError> {
        let mut account = self
            .store
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| ServiceError::NotFound(format!("account {account_id} not found")))?;
        let available = account.unclaimed_referral_earnings();
        if available <= Decimal::ZERO {
            return Err(ServiceError::InvalidOperation(
                "no unclaimed referral earnings".into(),
            ));
        }
        self.store.post(Transaction::new(
            account_id,
            EntryKind::Credit,
            available,
            "Referral payout claim",
            None,
        ))?;
        account.claimed_referral_earnings += available;
        Ok(available)
    }

    /// Breadth-first downline walk, capped at six levels, cycle-safe.
    pub fn network_stats(&self, account_id: &str) -> Vec<NetworkLevel> {
        let levels = self.store.referral_levels();
        let logs = self.store.referral_logs_for(account_id);
        let mut visited: HashSet<String> = HashSet::from([account_id.to_string()]);
        let mut frontier: Vec<String> = vec![account_id.to_string()];
        let mut stats = Vec::with_capacity(MAX_REFERRAL_DEPTH as usize);

        for level in 1..=MAX_REFERRAL_DEPTH {
            let mut next = Vec::new();
            for entry in self.store.accounts.iter() {
                if let Some(upline) = &entry.referred_by {
                    if frontier.contains(upline) && visited.insert(entry.id.clone()) {
                        next.push(entry.id.clone());
                    }
                }
            }
            let total_earnings = logs
                .iter()
                .filter(|l| l.level == level)
                .map(|l| l.amount)
                .sum();
            stats.push(NetworkLevel {
                level,
                member_count: next.len(),
                total_earnings,
                percent: levels.percent_for(level),
            });
            frontier = next;
        }
        stats
    }

    /// Flattened downline listing with each member's depth.
    pub fn team_members(&self, account_id: &str) -> Vec<TeamMember> {
        let mut visited: HashSet<String> = HashSet::from([account_id.to_string()]);
        let mut frontier: Vec<String> = vec![account_id.to_string()];
        let mut team = Vec::new();

        for level in 1..=MAX_REFERRAL_DEPTH {
            let mut next = Vec::new();
            for entry in self.store.accounts.iter() {
                if let Some(upline) = &entry.referred_by {
                    if frontier.contains(upline) && visited.insert(entry.id.clone()) {
                        team.push(TeamMember {
                            id: entry.id.clone(),
                            name: entry.name.clone(),
                            role: entry.role,
                            level,
                        });
                        next.push(entry.id.clone());
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        team
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{account, account_referred_by, store_and_events};
    use rust_decimal_macros::dec;

    fn chain_store() -> (ReferralService, Arc<Datastore>) {
        let (store, events, _rx) = store_and_events();
        let svc = ReferralService::new(store.clone(), events);
        // A <- B <- C (A is C's level-2 upline)
        store.accounts.insert("A".into(), account("A", StaffRole::Manager));
        store
            .accounts
            .insert("B".into(), account_referred_by("B", StaffRole::Showroom, "A"));
        store
            .accounts
            .insert("C".into(), account_referred_by("C", StaffRole::Cutting, "B"));
        (svc, store)
    }

    #[test]
    fn cascade_pays_the_documented_scenario() {
        // Pool of 10 with level percents [5, 3, ...]: B gets 0.50, A gets 0.30.
        let (svc, store) = chain_store();
        let outcome = svc.distribute("C", dec!(10), "Cutting for Pant").unwrap();

        assert_eq!(outcome.levels_paid, 2);
        assert_eq!(store.balance("B"), dec!(0.50));
        assert_eq!(store.balance("A"), dec!(0.30));
        assert_eq!(outcome.total_paid, dec!(0.80));

        assert_eq!(store.accounts.get("B").unwrap().total_referral_earnings, dec!(0.50));
        let logs_b = store.referral_logs_for("B");
        assert_eq!(logs_b.len(), 1);
        assert_eq!(logs_b[0].level, 1);
        assert_eq!(logs_b[0].amount, dec!(0.50));
    }

    #[test]
    fn dangling_upline_ends_walk_silently() {
        let (svc, store) = chain_store();
        store.accounts.get_mut("B").unwrap().referred_by = Some("GONE".into());
        let outcome = svc.distribute("C", dec!(10), "payout").unwrap();
        // B still gets level 1; the dangling reference stops level 2.
        assert_eq!(outcome.levels_paid, 1);
        assert_eq!(store.balance("B"), dec!(0.50));
        assert_eq!(store.balance("A"), Decimal::ZERO);
    }

    #[test]
    fn cycle_cannot_pay_the_same_account_twice() {
        let (svc, store) = chain_store();
        // Close the loop: A's upline is C.
        store.accounts.get_mut("A").unwrap().referred_by = Some("C".into());
        let outcome = svc.distribute("C", dec!(100), "payout").unwrap();
        // B (level 1) and A (level 2) paid once each; the walk stops when it
        // would revisit C.
        assert_eq!(outcome.levels_paid, 2);
        assert_eq!(store.referral_logs_for("B").len(), 1);
        assert_eq!(store.referral_logs_for("A").len(), 1);
        assert!(store.referral_logs_for("C").is_empty());
    }

    #[test]
    fn walk_is_capped_at_six_levels() {
        let (store, events, _rx) = store_and_events();
        let svc = ReferralService::new(store.clone(), events);
        // Chain of 9: U0 <- U1 <- ... <- U8, source is U8.
        store.accounts.insert("U0".into(), account("U0", StaffRole::Manager));
        for i in 1..9 {
            store.accounts.insert(
                format!("U{i}"),
                account_referred_by(&format!("U{i}"), StaffRole::Showroom, &format!("U{}", i - 1)),
            );
        }
        let outcome = svc.distribute("U8", dec!(1000), "payout").unwrap();
        assert_eq!(outcome.levels_paid, 6);
        // Level 7 would be U1; it must remain unpaid.
        assert!(store.referral_logs_for("U1").is_empty());
        assert_eq!(store.referral_logs_for("U7").len(), 1);
    }

    #[test]
    fn zero_percent_levels_are_skipped_but_walk_continues() {
        let (svc, store) = chain_store();
        let mut levels = store.referral_levels();
        levels.levels[0].percent = Decimal::ZERO;
        store.set_referral_levels(levels);

        let outcome = svc.distribute("C", dec!(10), "payout").unwrap();
        assert_eq!(outcome.levels_paid, 1);
        assert_eq!(store.balance("B"), Decimal::ZERO);
        assert_eq!(store.balance("A"), dec!(0.30));
    }

    #[test]
    fn claim_moves_earnings_to_wallet_once() {
        let (svc, store) = chain_store();
        svc.distribute("C", dec!(10), "payout").unwrap();
        let claimed = svc.claim_rewards("B").unwrap();
        assert_eq!(claimed, dec!(0.50));
        // Ledger now holds commission + claim credit.
        assert_eq!(store.balance("B"), dec!(1.00));
        let err = svc.claim_rewards("B").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidOperation(_)));
    }

    #[test]
    fn network_stats_count_downline_by_level() {
        let (svc, store) = chain_store();
        store
            .accounts
            .insert("D".into(), account_referred_by("D", StaffRole::Showroom, "A"));
        let stats = svc.network_stats("A");
        assert_eq!(stats.len(), 6);
        assert_eq!(stats[0].member_count, 2); // B and D
        assert_eq!(stats[1].member_count, 1); // C via B
        assert_eq!(stats[2].member_count, 0);
    }
}
