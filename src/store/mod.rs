//! In-memory authoritative state.
//!
//! The store is the single source of truth for the engine. Directory maps use
//! `DashMap`; the ledger log sits behind a mutex so every multi-entry
//! financial sequence (balance check, then one or more appends) runs as one
//! critical section. Order mutations happen under the order's `DashMap` entry
//! guard, which serialises concurrent transitions on the same bill number.
//!
//! Any external mirror (a document database, a local cache file) is a
//! replication concern layered on top of this store; the engine's invariants
//! hold against this state regardless of whether a mirror succeeds.

pub mod mirror;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use chrono::{Datelike, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{
    Account, Customer, EntryKind, Investment, Notification, Order, RateTable, ReferralIncomeLog,
    ReferralLevelTable, Transaction,
};

#[derive(Debug, Default)]
pub struct Datastore {
    pub accounts: DashMap<String, Account>,
    pub customers: DashMap<String, Customer>,
    pub orders: DashMap<String, Order>,
    pub investments: DashMap<Uuid, Investment>,

    ledger: Mutex<Vec<Transaction>>,
    referral_logs: Mutex<Vec<ReferralIncomeLog>>,
    notifications: Mutex<Vec<Notification>>,

    rates: RwLock<RateTable>,
    referral_levels: RwLock<ReferralLevelTable>,

    bill_seq: AtomicU64,
    customer_seq: AtomicU64,
}

impl Datastore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- id generation -------------------------------------------------

    /// Next base bill number, e.g. `ORD-2026-001`. Sub-garment suffixes are
    /// appended by the booking flow.
    pub fn next_bill_number(&self) -> String {
        let seq = self.bill_seq.fetch_add(1, Ordering::Relaxed) + 1;
        format!("ORD-{}-{:03}", Utc::now().year(), seq)
    }

    pub fn next_customer_id(&self) -> String {
        let seq = self.customer_seq.fetch_add(1, Ordering::Relaxed) + 1;
        format!("CUST-{}-{:03}", Utc::now().year(), seq)
    }

    // ---- ledger --------------------------------------------------------

    /// Append a single validated entry to the log.
    pub fn post(&self, txn: Transaction) -> Result<Transaction, ServiceError> {
        validate_entry(&txn)?;
        let mut ledger = self.ledger.lock().expect("ledger lock poisoned");
        ledger.push(txn.clone());
        Ok(txn)
    }

    /// Append several entries as one atomic unit. Either all entries land in
    /// the log or (on validation failure) none do.
    pub fn post_all(&self, txns: Vec<Transaction>) -> Result<(), ServiceError> {
        for txn in &txns {
            validate_entry(txn)?;
        }
        let mut ledger = self.ledger.lock().expect("ledger lock poisoned");
        ledger.extend(txns);
        Ok(())
    }

    /// Balance recomputed from the log; there is no trusted cached balance.
    pub fn balance(&self, account_id: &str) -> Decimal {
        let ledger = self.ledger.lock().expect("ledger lock poisoned");
        balance_of(&ledger, account_id)
    }

    /// Debit with a balance check in the same critical section, so two
    /// concurrent debits cannot both pass against a stale balance.
    pub fn debit_checked(
        &self,
        account_id: &str,
        amount: Decimal,
        description: impl Into<String>,
        bill_number: Option<String>,
    ) -> Result<Transaction, ServiceError> {
        let txn = Transaction::new(account_id, EntryKind::Debit, amount, description, bill_number);
        validate_entry(&txn)?;
        let mut ledger = self.ledger.lock().expect("ledger lock poisoned");
        if balance_of(&ledger, account_id) < amount {
            return Err(ServiceError::InsufficientFunds(format!(
                "account {account_id} has insufficient balance for {amount}"
            )));
        }
        ledger.push(txn.clone());
        Ok(txn)
    }

    /// Atomic transfer: the sender's balance check and both entries share one
    /// critical section.
    pub fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: Decimal,
        debit_description: impl Into<String>,
        credit_description: impl Into<String>,
    ) -> Result<(Transaction, Transaction), ServiceError> {
        let debit = Transaction::new(from, EntryKind::Debit, amount, debit_description, None);
        let credit = Transaction::new(to, EntryKind::Credit, amount, credit_description, None);
        validate_entry(&debit)?;
        validate_entry(&credit)?;
        let mut ledger = self.ledger.lock().expect("ledger lock poisoned");
        if balance_of(&ledger, from) < amount {
            return Err(ServiceError::InsufficientFunds(format!(
                "account {from} has insufficient balance for {amount}"
            )));
        }
        ledger.push(debit.clone());
        ledger.push(credit.clone());
        Ok((debit, credit))
    }

    pub fn transactions_for(&self, account_id: &str) -> Vec<Transaction> {
        let ledger = self.ledger.lock().expect("ledger lock poisoned");
        ledger
            .iter()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect()
    }

    pub fn ledger_len(&self) -> usize {
        self.ledger.lock().expect("ledger lock poisoned").len()
    }

    // ---- referral logs -------------------------------------------------

    pub fn append_referral_log(&self, log: ReferralIncomeLog) {
        let mut logs = self.referral_logs.lock().expect("referral log lock poisoned");
        logs.push(log);
    }

    pub fn referral_logs_for(&self, recipient_id: &str) -> Vec<ReferralIncomeLog> {
        let logs = self.referral_logs.lock().expect("referral log lock poisoned");
        logs.iter()
            .filter(|l| l.recipient_id == recipient_id)
            .cloned()
            .collect()
    }

    // ---- notifications -------------------------------------------------

    pub fn append_notification(&self, notification: Notification) {
        let mut list = self.notifications.lock().expect("notification lock poisoned");
        list.push(notification);
    }

    pub fn notifications_snapshot(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .expect("notification lock poisoned")
            .clone()
    }

    pub fn mark_notification_read(&self, id: Uuid) -> bool {
        let mut list = self.notifications.lock().expect("notification lock poisoned");
        match list.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    // ---- configuration -------------------------------------------------

    pub fn rates(&self) -> RateTable {
        self.rates.read().expect("rate table lock poisoned").clone()
    }

    pub fn set_rates(&self, rates: RateTable) {
        *self.rates.write().expect("rate table lock poisoned") = rates;
    }

    pub fn referral_levels(&self) -> ReferralLevelTable {
        self.referral_levels
            .read()
            .expect("referral level lock poisoned")
            .clone()
    }

    pub fn set_referral_levels(&self, levels: ReferralLevelTable) {
        *self
            .referral_levels
            .write()
            .expect("referral level lock poisoned") = levels;
    }
}

fn validate_entry(txn: &Transaction) -> Result<(), ServiceError> {
    if txn.amount <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "transaction amount must be positive, got {}",
            txn.amount
        )));
    }
    if txn.account_id.is_empty() {
        return Err(ServiceError::ValidationError(
            "transaction account id must not be empty".into(),
        ));
    }
    Ok(())
}

fn balance_of(ledger: &[Transaction], account_id: &str) -> Decimal {
    ledger
        .iter()
        .filter(|t| t.account_id == account_id)
        .map(Transaction::signed_amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn credit(store: &Datastore, account: &str, amount: Decimal) {
        store
            .post(Transaction::new(account, EntryKind::Credit, amount, "seed", None))
            .unwrap();
    }

    #[test]
    fn balance_is_sum_of_credits_minus_debits() {
        let store = Datastore::new();
        credit(&store, "W1", dec!(100));
        credit(&store, "W1", dec!(50));
        store
            .post(Transaction::new("W1", EntryKind::Debit, dec!(30), "spend", None))
            .unwrap();
        credit(&store, "W2", dec!(999));

        assert_eq!(store.balance("W1"), dec!(120));
        assert_eq!(store.balance("W2"), dec!(999));
        assert_eq!(store.balance("missing"), Decimal::ZERO);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let store = Datastore::new();
        let err = store
            .post(Transaction::new("W1", EntryKind::Credit, Decimal::ZERO, "zero", None))
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
        assert_eq!(store.ledger_len(), 0);
    }

    #[test]
    fn debit_checked_rejects_overdraft_without_posting() {
        let store = Datastore::new();
        credit(&store, "W1", dec!(10));
        let err = store.debit_checked("W1", dec!(11), "too much", None).unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientFunds(_)));
        assert_eq!(store.balance("W1"), dec!(10));
        assert_eq!(store.ledger_len(), 1);
    }

    #[test]
    fn transfer_moves_funds_atomically() {
        let store = Datastore::new();
        credit(&store, "A", dec!(100));
        store.transfer("A", "B", dec!(40), "to B", "from A").unwrap();
        assert_eq!(store.balance("A"), dec!(60));
        assert_eq!(store.balance("B"), dec!(40));

        let err = store.transfer("A", "B", dec!(61), "to B", "from A").unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientFunds(_)));
        assert_eq!(store.balance("A"), dec!(60));
        assert_eq!(store.balance("B"), dec!(40));
    }

    #[test]
    fn bill_numbers_are_unique_and_sequential() {
        let store = Datastore::new();
        let a = store.next_bill_number();
        let b = store.next_bill_number();
        assert_ne!(a, b);
        assert!(a.starts_with("ORD-"));
    }
}
