use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{EntryKind, StaffRole, Transaction};
use crate::store::Datastore;

/// Staff wallet operations over the append-only ledger.
///
/// Balances are always recomputed from the transaction log; the store's
/// ledger lock serialises every check-then-post sequence.
#[derive(Clone)]
pub struct WalletService {
    store: Arc<Datastore>,
    event_sender: EventSender,
}

impl WalletService {
    pub fn new(store: Arc<Datastore>, event_sender: EventSender) -> Self {
        Self { store, event_sender }
    }

    pub fn balance(&self, account_id: &str) -> Result<Decimal, ServiceError> {
        self.ensure_account(account_id)?;
        Ok(self.store.balance(account_id))
    }

    pub fn transactions(&self, account_id: &str) -> Result<Vec<Transaction>, ServiceError> {
        self.ensure_account(account_id)?;
        let mut txns = self.store.transactions_for(account_id);
        txns.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        Ok(txns)
    }

    /// Credit a wallet from an external source (cash deposit, adjustment).
    #[instrument(skip(self), fields(account_id = %account_id, amount = %amount))]
    pub fn add_funds(
        &self,
        account_id: &str,
        amount: Decimal,
        source: &str,
    ) -> Result<Transaction, ServiceError> {
        self.ensure_account(account_id)?;
        let txn = self.store.post(Transaction::new(
            account_id,
            EntryKind::Credit,
            amount,
            format!("Wallet load ({source})"),
            None,
        ))?;
        info!(account_id, %amount, source, "funds added");
        Ok(txn)
    }

    #[instrument(skip(self), fields(account_id = %account_id, amount = %amount))]
    pub fn withdraw_funds(
        &self,
        account_id: &str,
        amount: Decimal,
    ) -> Result<Transaction, ServiceError> {
        self.ensure_account(account_id)?;
        let txn = self
            .store
            .debit_checked(account_id, amount, "Withdrawal", None)?;
        info!(account_id, %amount, "funds withdrawn");
        Ok(txn)
    }

    /// Move funds between wallets. Only admins may transfer; the balance
    /// check and both entries run as one atomic unit.
    #[instrument(skip(self), fields(from = %from, to = %to, amount = %amount))]
    pub fn transfer_funds(
        &self,
        actor_id: &str,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<(), ServiceError> {
        let actor = self
            .store
            .accounts
            .get(actor_id)
            .ok_or_else(|| ServiceError::NotFound(format!("account {actor_id} not found")))?;
        if actor.role != StaffRole::Admin {
            return Err(ServiceError::Unauthorized(
                "only admins may transfer funds".into(),
            ));
        }
        drop(actor);
        self.ensure_account(from)?;
        self.ensure_account(to)?;
        if from == to {
            return Err(ServiceError::ValidationError(
                "cannot transfer to the same account".into(),
            ));
        }

        self.store.transfer(
            from,
            to,
            amount,
            format!("Transfer to {to}"),
            format!("Received from {from}"),
        )?;
        self.event_sender.send(Event::FundsTransferred {
            from: from.to_string(),
            to: to.to_string(),
            amount,
        });
        Ok(())
    }

    fn ensure_account(&self, account_id: &str) -> Result<(), ServiceError> {
        if self.store.accounts.contains_key(account_id) {
            Ok(())
        } else {
            Err(ServiceError::NotFound(format!("account {account_id} not found")))
        }
    }
}
