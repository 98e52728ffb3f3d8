//! Fire-and-forget domain events.
//!
//! Services emit an [`Event`] after each committed state change; a background
//! task drains the channel and logs them. Delivery is best-effort and never
//! part of an operation's correctness; a full channel drops the event with a
//! warning rather than failing the operation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::models::{OrderStatus, StaffRole};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order lifecycle
    OrderBooked {
        bill_number: String,
        customer_id: String,
    },
    OrderStatusChanged {
        bill_number: String,
        old_status: OrderStatus,
        new_status: OrderStatus,
        forced: bool,
    },
    OrderDeleted {
        bill_number: String,
    },
    PaymentSettled {
        bill_number: String,
        amount: Decimal,
    },
    CashHandoverVerified {
        bill_number: String,
        amount: Decimal,
        delivery_boy_id: String,
    },

    // Wallet / ledger
    PayoutPosted {
        account_id: String,
        gross: Decimal,
        net: Decimal,
    },
    CommissionPosted {
        recipient_id: String,
        level: u8,
        amount: Decimal,
    },
    FundsTransferred {
        from: String,
        to: String,
        amount: Decimal,
    },

    // Investment pool
    InvestmentCreated {
        account_id: String,
        principal: Decimal,
    },
    DividendsDistributed {
        declared_pool: Decimal,
        distributed: Decimal,
    },

    // Directory
    AccountCreated {
        account_id: String,
        role: StaffRole,
    },
    AccountDeactivated {
        account_id: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Enqueue an event without blocking the calling operation. Drops the
    /// event if the channel is full.
    pub fn send(&self, event: Event) {
        if let Err(e) = self.sender.try_send(event) {
            warn!(error = %e, "event channel full; dropping event");
        }
    }
}

/// Background consumer: drains the event channel, logs each event, and
/// pushes it to the configured mirror (best-effort).
pub async fn process_events(
    mut receiver: mpsc::Receiver<Event>,
    mirror: Option<std::sync::Arc<dyn crate::store::mirror::Mirror>>,
) {
    while let Some(event) = receiver.recv().await {
        if let Some(mirror) = &mirror {
            crate::store::mirror::replicate_with_retry(mirror.as_ref(), &event).await;
        }
        match &event {
            Event::OrderStatusChanged { bill_number, old_status, new_status, forced } => {
                info!(
                    bill_number = %bill_number,
                    old_status = %old_status,
                    new_status = %new_status,
                    forced = forced,
                    "order status changed"
                );
            }
            Event::CashHandoverVerified { bill_number, amount, delivery_boy_id } => {
                info!(
                    bill_number = %bill_number,
                    amount = %amount,
                    delivery_boy_id = %delivery_boy_id,
                    "cash handover verified"
                );
            }
            Event::DividendsDistributed { declared_pool, distributed } => {
                info!(declared_pool = %declared_pool, distributed = %distributed, "dividends distributed");
            }
            other => info!(event = ?other, "event processed"),
        }
    }
    info!("event channel closed; processor exiting");
}
