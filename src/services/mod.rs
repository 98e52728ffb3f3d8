//! Service layer: all business rules live here. Handlers adapt HTTP to these
//! services; the store underneath is the authoritative state.

pub mod accounts;
pub mod customers;
pub mod investments;
pub mod notifications;
pub mod orders;
pub mod payouts;
pub mod referrals;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use chrono::Utc;
    use rust_decimal::Decimal;
    use tokio::sync::mpsc;

    use crate::events::EventSender;
    use crate::models::{Account, StaffRole};
    use crate::store::Datastore;

    pub fn account(id: &str, role: StaffRole) -> Account {
        Account {
            id: id.into(),
            name: format!("{id} ({role})"),
            mobile: "9000000000".into(),
            email: None,
            role,
            password: "123456".into(),
            referred_by: None,
            total_referral_earnings: Decimal::ZERO,
            claimed_referral_earnings: Decimal::ZERO,
            wallet_pin: None,
            manager_rank: None,
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn account_referred_by(id: &str, role: StaffRole, upline: &str) -> Account {
        Account {
            referred_by: Some(upline.into()),
            ..account(id, role)
        }
    }

    /// Fresh store plus an event channel. Tests keep the receiver alive (or
    /// inspect it) so `try_send` never sees a closed channel.
    pub fn store_and_events() -> (
        Arc<Datastore>,
        EventSender,
        mpsc::Receiver<crate::events::Event>,
    ) {
        let (tx, rx) = mpsc::channel(256);
        (Arc::new(Datastore::new()), EventSender::new(tx), rx)
    }
}
