//! Profit-sharing investment pool.
//!
//! Investors lock a principal out of their wallet and earn proportional
//! daily dividends out of 1% of declared company profit, capped at a fixed
//! 3x total return.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{EntryKind, Investment, InvestmentStatus, StaffRole, Transaction};
use crate::store::Datastore;

/// Fixed total-return multiple on the principal.
const TARGET_RETURN_MULTIPLE: Decimal = dec!(3);
/// Fraction of declared company profit distributed per day.
const DAILY_POOL_FRACTION: Decimal = dec!(0.01);

/// Audit summary of one dividend distribution run.
#[derive(Debug, Clone, Serialize)]
pub struct DividendReport {
    pub declared_pool: Decimal,
    /// May be less than the declared pool when target-return caps bind, and
    /// zero when there are no active investments.
    pub distributed: Decimal,
    pub investments_paid: usize,
    pub investments_completed: usize,
}

#[derive(Clone)]
pub struct InvestmentService {
    store: Arc<Datastore>,
    event_sender: EventSender,
}

impl InvestmentService {
    pub fn new(store: Arc<Datastore>, event_sender: EventSender) -> Self {
        Self { store, event_sender }
    }

    /// Lock `principal` out of the investor's wallet into a new ACTIVE
    /// investment with a 3x target return.
    #[instrument(skip(self), fields(account_id = %account_id, principal = %principal))]
    pub fn create(
        &self,
        account_id: &str,
        principal: Decimal,
    ) -> Result<Investment, ServiceError> {
        if principal <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "principal must be positive".into(),
            ));
        }
        if !self.store.accounts.contains_key(account_id) {
            return Err(ServiceError::NotFound(format!("account {account_id} not found")));
        }

        // Balance check and debit share one critical section in the store.
        self.store.debit_checked(
            account_id,
            principal,
            "New investment plan started",
            None,
        )?;

        let investment = Investment {
            id: Uuid::new_v4(),
            account_id: account_id.to_string(),
            principal,
            total_target_return: principal * TARGET_RETURN_MULTIPLE,
            returned_so_far: Decimal::ZERO,
            status: InvestmentStatus::Active,
            started_at: Utc::now().date_naive(),
            last_payout_at: None,
        };
        self.store.investments.insert(investment.id, investment.clone());
        self.event_sender.send(Event::InvestmentCreated {
            account_id: account_id.to_string(),
            principal,
        });
        info!(investment_id = %investment.id, "investment created");
        Ok(investment)
    }

    pub fn list(&self, account_id: Option<&str>) -> Vec<Investment> {
        let mut investments: Vec<Investment> = self
            .store
            .investments
            .iter()
            .filter(|i| account_id.map_or(true, |a| i.account_id == a))
            .map(|i| i.clone())
            .collect();
        investments.sort_by(|a, b| a.started_at.cmp(&b.started_at).then(a.id.cmp(&b.id)));
        investments
    }

    /// Distribute one day's dividends out of `company_profit`.
    ///
    /// Pool = 1% of profit, shared across ACTIVE investments pro rata by
    /// principal, with each share capped at the investment's remaining
    /// headroom to its 3x target. An investment whose cap is reached flips to
    /// COMPLETED. With no active principal this is a no-op reporting zero.
    ///
    /// This is an explicit admin batch action with no idempotency key:
    /// invoking it twice for the same day pays twice, matching the manual
    /// trigger it models.
    #[instrument(skip(self), fields(actor_id = %actor_id, company_profit = %company_profit))]
    pub fn distribute_daily_dividends(
        &self,
        actor_id: &str,
        company_profit: Decimal,
    ) -> Result<DividendReport, ServiceError> {
        let actor = self
            .store
            .accounts
            .get(actor_id)
            .ok_or_else(|| ServiceError::NotFound(format!("account {actor_id} not found")))?;
        if actor.role != StaffRole::Admin {
            return Err(ServiceError::Unauthorized(
                "only admins may distribute dividends".into(),
            ));
        }
        drop(actor);
        if company_profit <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "company profit must be positive".into(),
            ));
        }

        let pool = company_profit * DAILY_POOL_FRACTION;
        let active = self.list(None);
        let active: Vec<Investment> = active
            .into_iter()
            .filter(|i| i.status == InvestmentStatus::Active)
            .collect();
        let total_principal: Decimal = active.iter().map(|i| i.principal).sum();

        let mut report = DividendReport {
            declared_pool: pool,
            distributed: Decimal::ZERO,
            investments_paid: 0,
            investments_completed: 0,
        };
        if active.is_empty() || total_principal <= Decimal::ZERO {
            info!("no active investments; nothing distributed");
            return Ok(report);
        }

        let today = Utc::now().date_naive();
        for investment in active {
            let share = pool * investment.principal / total_principal;
            // Never pay past the target return.
            let payout = share.min(investment.remaining_cap());
            if payout <= Decimal::ZERO {
                continue;
            }

            self.store.post(Transaction::new(
                investment.account_id.clone(),
                EntryKind::Credit,
                payout,
                "Daily dividend (profit pool share)",
                None,
            ))?;

            if let Some(mut stored) = self.store.investments.get_mut(&investment.id) {
                stored.returned_so_far += payout;
                stored.last_payout_at = Some(today);
                if stored.returned_so_far >= stored.total_target_return {
                    stored.status = InvestmentStatus::Completed;
                    report.investments_completed += 1;
                }
            }
            report.distributed += payout;
            report.investments_paid += 1;
        }

        self.event_sender.send(Event::DividendsDistributed {
            declared_pool: pool,
            distributed: report.distributed,
        });
        info!(distributed = %report.distributed, paid = report.investments_paid, "dividends distributed");
        Ok(report)
    }
}
