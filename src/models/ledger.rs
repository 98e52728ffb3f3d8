use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::account::StaffRole;

/// Signed effect of a ledger entry on the account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Credit,
    Debit,
}

/// One immutable ledger entry. The account balance is always the fold of
/// these entries; a cached balance is never trusted over the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: String,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub description: String,
    pub bill_number: Option<String>,
    pub posted_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        account_id: impl Into<String>,
        kind: EntryKind,
        amount: Decimal,
        description: impl Into<String>,
        bill_number: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id: account_id.into(),
            kind,
            amount,
            description: description.into(),
            bill_number,
            posted_at: Utc::now(),
        }
    }

    /// Signed contribution of this entry to its account's balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            EntryKind::Credit => self.amount,
            EntryKind::Debit => -self.amount,
        }
    }
}

/// Audit record of one referral commission payment. The money movement itself
/// is a parallel ledger [`Transaction`]; this log exists for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralIncomeLog {
    pub id: Uuid,
    pub recipient_id: String,
    pub source_name: String,
    pub source_role: StaffRole,
    pub action: String,
    pub level: u8,
    pub amount: Decimal,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentStatus {
    Active,
    Completed,
}

/// A principal contribution to the profit-sharing pool. Dividends accrue
/// until `returned_so_far` reaches the fixed 3x target, at which point the
/// investment completes and drops out of future distributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: Uuid,
    pub account_id: String,
    pub principal: Decimal,
    pub total_target_return: Decimal,
    pub returned_so_far: Decimal,
    pub status: InvestmentStatus,
    pub started_at: NaiveDate,
    pub last_payout_at: Option<NaiveDate>,
}

impl Investment {
    /// Headroom left before the target return caps further payouts.
    pub fn remaining_cap(&self) -> Decimal {
        self.total_target_return - self.returned_so_far
    }
}
