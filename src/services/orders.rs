//! Order booking and the production workflow engine.
//!
//! Orders move through a strict forward stage sequence; each transition is
//! made by the role responsible for the current stage and pays that worker
//! their piece rate. Delivery is settled through the cash-handover protocol
//! instead of a plain transition.

use std::sync::Arc;

use chrono::NaiveDate;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{
    GarmentType, Order, OrderStatus, PaymentState, PaymentStatus, Priority, StaffRole,
};
use crate::services::notifications::NotificationService;
use crate::services::payouts::{self, MaterialAction, PayoutService};
use crate::store::Datastore;

/// One bookable showroom item. Composite items split into several physical
/// garments, each of which becomes its own independent order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogItem {
    Single(GarmentType),
    /// Two-piece suit: coat + pant.
    Suit,
    /// Safari suit: safari jacket + pant.
    SafariSuit,
    ShirtPantPair,
    KurtaPyjamaSet,
}

impl CatalogItem {
    /// Physical garments this item produces, in booking order.
    pub fn parts(self) -> Vec<GarmentType> {
        match self {
            CatalogItem::Single(garment) => vec![garment],
            CatalogItem::Suit => vec![GarmentType::Coat, GarmentType::Pant],
            CatalogItem::SafariSuit => vec![GarmentType::Safari, GarmentType::Pant],
            CatalogItem::ShirtPantPair => vec![GarmentType::Shirt, GarmentType::Pant],
            CatalogItem::KurtaPyjamaSet => vec![GarmentType::Kurta, GarmentType::Pyjama],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BookingItem {
    pub item: CatalogItem,
    pub price: Decimal,
    pub fabric_meters: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BookOrderRequest {
    #[validate(length(min = 1, message = "Customer id is required"))]
    pub customer_id: String,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<BookingItem>,
    pub advance_amount: Decimal,
    pub delivery_date: NaiveDate,
    pub trial_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub showroom_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceOrderRequest {
    pub target_status: OrderStatus,
    pub description: Option<String>,
    pub next_worker_id: Option<String>,
    pub next_worker_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub assigned_worker_id: Option<String>,
    pub customer_id: Option<String>,
}

/// Result of a verified cash handover.
#[derive(Debug, Clone, Serialize)]
pub struct HandoverOutcome {
    pub bill_number: String,
    pub amount_collected: Decimal,
    pub settled: bool,
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<Datastore>,
    payouts: Arc<PayoutService>,
    notifications: Arc<NotificationService>,
    event_sender: EventSender,
    house_account_id: String,
    default_showroom_name: String,
}

impl OrderService {
    pub fn new(
        store: Arc<Datastore>,
        payouts: Arc<PayoutService>,
        notifications: Arc<NotificationService>,
        event_sender: EventSender,
        house_account_id: String,
        default_showroom_name: String,
    ) -> Self {
        Self {
            store,
            payouts,
            notifications,
            event_sender,
            house_account_id,
            default_showroom_name,
        }
    }

    // ---- booking -------------------------------------------------------

    /// Book a cart of items for a customer. Composite items are split into
    /// one order per physical garment: each sub-order gets a proportional
    /// share of the item price, advance and fabric, an alphabetic bill
    /// suffix (never numeric, so it cannot read as a quantity), and its own
    /// freshly generated handover PIN.
    #[instrument(skip(self, request), fields(actor_id = %actor_id, customer_id = %request.customer_id))]
    pub fn book(
        &self,
        actor_id: &str,
        request: BookOrderRequest,
    ) -> Result<Vec<Order>, ServiceError> {
        request.validate()?;
        let actor = self
            .store
            .accounts
            .get(actor_id)
            .ok_or_else(|| ServiceError::NotFound(format!("account {actor_id} not found")))?
            .clone();
        if !actor.role.may_book_orders() {
            return Err(ServiceError::Unauthorized(format!(
                "role {} may not book orders",
                actor.role
            )));
        }
        let customer = self
            .store
            .customers
            .get(&request.customer_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("customer {} not found", request.customer_id))
            })?
            .clone();

        let cart_total: Decimal = request.items.iter().map(|i| i.price).sum();
        if request.items.iter().any(|i| i.price <= Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "item prices must be positive".into(),
            ));
        }
        if request.advance_amount < Decimal::ZERO || request.advance_amount > cart_total {
            return Err(ServiceError::ValidationError(
                "advance must be between zero and the cart total".into(),
            ));
        }

        let base_bill = self.store.next_bill_number();
        let showroom_name = request
            .showroom_name
            .unwrap_or_else(|| self.default_showroom_name.clone());
        let booking_percent = self.store.rates().booking_commission_percent;

        let mut orders = Vec::new();
        let mut part_index: usize = 0;
        for booking_item in &request.items {
            // Advance allocated across cart lines in proportion to price,
            // then split evenly over the line's physical garments.
            let item_advance = request.advance_amount * booking_item.price / cart_total;
            let parts = booking_item.item.parts();
            let split = Decimal::from(parts.len());

            for garment in parts {
                let sub_total = (booking_item.price / split).round_dp(2);
                let sub_advance = (item_advance / split).round_dp(2);
                let sub_fabric = (booking_item.fabric_meters / split).round_dp(2);
                // Alphabetic sub-index: A, B, C... never a number.
                let alpha = char::from(b'A' + (part_index % 26) as u8);
                let bill_number =
                    format!("{base_bill}-{}-{alpha}", garment.to_string().to_uppercase());
                let handover_pin = generate_pin();

                let mut order = Order {
                    bill_number: bill_number.clone(),
                    customer_id: customer.id.clone(),
                    customer_name: customer.name.clone(),
                    is_new_customer: customer.is_new,
                    garment,
                    status: OrderStatus::Measurement,
                    assigned_worker_id: None,
                    assigned_worker_name: None,
                    sales_staff_id: actor.id.clone(),
                    showroom_name: showroom_name.clone(),
                    payment: PaymentState::new(sub_total, sub_advance),
                    fabric_meters: sub_fabric,
                    order_date: chrono::Utc::now().date_naive(),
                    delivery_date: request.delivery_date,
                    trial_date: request.trial_date.unwrap_or(request.delivery_date),
                    priority: request.priority.unwrap_or(Priority::Medium),
                    notes: None,
                    history: Vec::new(),
                    handover_pin: Some(handover_pin),
                };
                order.append_history(
                    OrderStatus::Pending,
                    Some(format!("Order booked. Part of bill {base_bill}")),
                    Some(actor.name.clone()),
                    false,
                );
                self.store.orders.insert(bill_number.clone(), order.clone());
                self.event_sender.send(Event::OrderBooked {
                    bill_number: bill_number.clone(),
                    customer_id: customer.id.clone(),
                });

                // Booking commission rides the normal payout pipeline so the
                // referral cascade sees it too.
                let commission = sub_total * booking_percent / Decimal::ONE_HUNDRED;
                if commission > Decimal::ZERO {
                    self.payouts.process_worker_payout(
                        &actor.id,
                        commission,
                        &format!("Booking commission for {bill_number}"),
                        Some(bill_number.clone()),
                    )?;
                }

                self.notifications.notify(
                    "New order booked",
                    &format!("Customer {} waiting for measurement.", customer.name),
                    Some(bill_number),
                    Some(StaffRole::Measurement),
                    None,
                );
                orders.push(order);
                part_index += 1;
            }
        }

        // First booking consumes the new-customer measurement tier.
        if customer.is_new {
            if let Some(mut c) = self.store.customers.get_mut(&customer.id) {
                c.is_new = false;
            }
        }

        info!(%base_bill, count = orders.len(), "booking created");
        Ok(orders)
    }

    // ---- reads ---------------------------------------------------------

    pub fn get(&self, bill_number: &str) -> Result<Order, ServiceError> {
        self.store
            .orders
            .get(bill_number)
            .map(|o| o.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("order {bill_number} not found")))
    }

    pub fn list(&self, filter: &OrderFilter) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .store
            .orders
            .iter()
            .filter(|o| {
                filter.status.map_or(true, |s| o.status == s)
                    && filter
                        .assigned_worker_id
                        .as_deref()
                        .map_or(true, |w| o.assigned_worker_id.as_deref() == Some(w))
                    && filter
                        .customer_id
                        .as_deref()
                        .map_or(true, |c| o.customer_id == c)
            })
            .map(|o| o.clone())
            .collect();
        orders.sort_by(|a, b| a.delivery_date.cmp(&b.delivery_date));
        orders
    }

    // ---- workflow ------------------------------------------------------

    /// Advance an order to the next stage.
    ///
    /// The actor's role must be responsible for the order's *current* stage,
    /// and the requested target must be the unique legal successor for the
    /// garment, with no skipping. On success the completing worker is paid their
    /// piece rate net of the referral deduction.
    #[instrument(skip(self, request), fields(actor_id = %actor_id, bill_number = %bill_number, target = %request.target_status))]
    pub fn advance(
        &self,
        actor_id: &str,
        bill_number: &str,
        request: AdvanceOrderRequest,
    ) -> Result<Order, ServiceError> {
        let actor = self
            .store
            .accounts
            .get(actor_id)
            .ok_or_else(|| ServiceError::NotFound(format!("account {actor_id} not found")))?
            .clone();

        let (updated, old_status, garment, is_new_customer) = {
            let mut order = self
                .store
                .orders
                .get_mut(bill_number)
                .ok_or_else(|| ServiceError::NotFound(format!("order {bill_number} not found")))?;

            let expected = order.status.next_for(order.garment).ok_or_else(|| {
                ServiceError::InvalidTransition(format!(
                    "order {bill_number} is already delivered"
                ))
            })?;
            if expected == OrderStatus::Delivered {
                return Err(ServiceError::InvalidOperation(
                    "delivery is completed through the cash-handover protocol".into(),
                ));
            }
            if request.target_status != expected {
                return Err(ServiceError::InvalidTransition(format!(
                    "cannot move order {bill_number} from {} to {}; next stage is {}",
                    order.status, request.target_status, expected
                )));
            }
            if !order.status.permits(actor.role, order.garment) {
                return Err(ServiceError::Unauthorized(format!(
                    "role {} may not complete stage {}",
                    actor.role, order.status
                )));
            }

            let old_status = order.status;
            order.status = request.target_status;
            if let Some(worker_id) = &request.next_worker_id {
                order.assigned_worker_id = Some(worker_id.clone());
                order.assigned_worker_name = request.next_worker_name.clone();
            }
            order.append_history(
                request.target_status,
                request.description.clone(),
                Some(actor.name.clone()),
                false,
            );
            (order.clone(), old_status, order.garment, order.is_new_customer)
        };

        self.event_sender.send(Event::OrderStatusChanged {
            bill_number: bill_number.to_string(),
            old_status,
            new_status: updated.status,
            forced: false,
        });

        // Piece rate for the stage just completed; delivery completions are
        // settled via the handover protocol instead.
        let rate = payouts::rate_for(actor.role, garment, is_new_customer, &self.store.rates());
        if rate > Decimal::ZERO {
            self.payouts.process_worker_payout(
                actor_id,
                rate,
                &format!("{} for {garment} ({bill_number})", actor.role),
                Some(bill_number.to_string()),
            )?;
        }

        self.notify_next_department(&updated, request.next_worker_id.as_deref());
        Ok(updated)
    }

    /// Admin override: set any status, bypassing capability and ordering
    /// checks. Still appends a history entry, tagged as forced.
    #[instrument(skip(self), fields(actor_id = %actor_id, bill_number = %bill_number, status = %status))]
    pub fn force_status(
        &self,
        actor_id: &str,
        bill_number: &str,
        status: OrderStatus,
        description: Option<String>,
    ) -> Result<Order, ServiceError> {
        let actor = self.require_admin(actor_id)?;
        let (updated, old_status) = {
            let mut order = self
                .store
                .orders
                .get_mut(bill_number)
                .ok_or_else(|| ServiceError::NotFound(format!("order {bill_number} not found")))?;
            let old_status = order.status;
            order.status = status;
            order.append_history(status, description, Some(actor.name.clone()), true);
            (order.clone(), old_status)
        };
        warn!(bill_number, %old_status, new_status = %status, "order status force-set");
        self.event_sender.send(Event::OrderStatusChanged {
            bill_number: bill_number.to_string(),
            old_status,
            new_status: status,
            forced: true,
        });
        Ok(updated)
    }

    // ---- money ---------------------------------------------------------

    /// Record a payment against an order's pending balance. Collections land
    /// on the house account.
    #[instrument(skip(self), fields(bill_number = %bill_number, amount = %amount))]
    pub fn settle_payment(
        &self,
        bill_number: &str,
        amount: Decimal,
        collected_by: &str,
    ) -> Result<Order, ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "settlement amount must be positive".into(),
            ));
        }
        let updated = {
            let mut order = self
                .store
                .orders
                .get_mut(bill_number)
                .ok_or_else(|| ServiceError::NotFound(format!("order {bill_number} not found")))?;
            if amount > order.payment.pending_amount {
                return Err(ServiceError::ValidationError(format!(
                    "settlement {amount} exceeds pending balance {}",
                    order.payment.pending_amount
                )));
            }
            order.payment.advance_amount += amount;
            order.payment.pending_amount -= amount;
            order.payment.status = if order.payment.pending_amount.is_zero() {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Partial
            };
            let status = order.status;
            order.append_history(
                status,
                Some(format!("Payment collected: {amount} by {collected_by}")),
                Some(collected_by.to_string()),
                false,
            );
            order.clone()
        };

        self.store.post(crate::models::Transaction::new(
            self.house_account_id.clone(),
            crate::models::EntryKind::Credit,
            amount,
            format!("Payment collected for bill {bill_number} by {collected_by}"),
            Some(bill_number.to_string()),
        ))?;
        self.event_sender.send(Event::PaymentSettled {
            bill_number: bill_number.to_string(),
            amount,
        });
        Ok(updated)
    }

    /// Terminal transition: verify the handover PIN, move the collected cash
    /// from the sales staff's wallet to the house account, settle the order
    /// and mark it delivered. The delivery worker earns the flat return
    /// bonus, paid gross.
    ///
    /// On any failure nothing changes: no ledger entry, no status change.
    #[instrument(skip(self, pin), fields(actor_id = %actor_id, bill_number = %bill_number))]
    pub fn verify_cash_handover(
        &self,
        actor_id: &str,
        bill_number: &str,
        pin: Option<&str>,
    ) -> Result<HandoverOutcome, ServiceError> {
        let actor = self
            .store
            .accounts
            .get(actor_id)
            .ok_or_else(|| ServiceError::NotFound(format!("account {actor_id} not found")))?
            .clone();
        if actor.role != StaffRole::Delivery {
            return Err(ServiceError::Unauthorized(
                "only delivery staff may complete a handover".into(),
            ));
        }

        let (outcome, old_status, sales_staff_id) = {
            let mut order = self
                .store
                .orders
                .get_mut(bill_number)
                .ok_or_else(|| ServiceError::NotFound(format!("order {bill_number} not found")))?;
            if order.status != OrderStatus::Ready {
                return Err(ServiceError::InvalidTransition(format!(
                    "order {bill_number} is not ready for delivery (status {})",
                    order.status
                )));
            }

            let pending = order.payment.pending_amount;
            let sales_staff_id = order.sales_staff_id.clone();
            let settled = pending > Decimal::ZERO;

            if settled {
                let (staff_pin, sales_staff_name) = {
                    let staff = self.store.accounts.get(&sales_staff_id).ok_or_else(|| {
                        ServiceError::NotFound(format!("sales staff {sales_staff_id} not found"))
                    })?;
                    (staff.wallet_pin.clone(), staff.name.clone())
                };
                let expected_pin =
                    order.handover_pin.clone().or(staff_pin).ok_or_else(|| {
                        ServiceError::Unauthorized(
                            "no handover PIN configured for this order".into(),
                        )
                    })?;
                if pin != Some(expected_pin.as_str()) {
                    return Err(ServiceError::Unauthorized("invalid secret PIN".into()));
                }
                self.store.post_all(vec![
                    crate::models::Transaction::new(
                        sales_staff_id.clone(),
                        crate::models::EntryKind::Debit,
                        pending,
                        format!("Cash handover to house (via delivery {})", actor.id),
                        Some(bill_number.to_string()),
                    ),
                    crate::models::Transaction::new(
                        self.house_account_id.clone(),
                        crate::models::EntryKind::Credit,
                        pending,
                        format!("Funds received from {sales_staff_name}"),
                        Some(bill_number.to_string()),
                    ),
                ])?;

                order.payment.advance_amount += pending;
                order.payment.pending_amount = Decimal::ZERO;
                order.payment.status = PaymentStatus::Paid;
                let status = order.status;
                order.append_history(
                    status,
                    Some(format!("Cash handover verified: {pending}")),
                    Some(actor.name.clone()),
                    false,
                );
            }

            let old_status = order.status;
            order.status = OrderStatus::Delivered;
            // The PIN is single-use.
            order.handover_pin = None;
            order.append_history(
                OrderStatus::Delivered,
                Some(if settled {
                    "Delivered and cash verified".to_string()
                } else {
                    "Returned to showroom, no dues".to_string()
                }),
                Some(actor.name.clone()),
                false,
            );
            (
                HandoverOutcome {
                    bill_number: bill_number.to_string(),
                    amount_collected: pending,
                    settled,
                },
                old_status,
                sales_staff_id,
            )
        };

        if outcome.settled {
            self.event_sender.send(Event::CashHandoverVerified {
                bill_number: bill_number.to_string(),
                amount: outcome.amount_collected,
                delivery_boy_id: actor.id.clone(),
            });
        }
        self.event_sender.send(Event::OrderStatusChanged {
            bill_number: bill_number.to_string(),
            old_status,
            new_status: OrderStatus::Delivered,
            forced: false,
        });

        let bonus = self.store.rates().delivery_return_bonus;
        if bonus > Decimal::ZERO {
            self.payouts.pay_flat_bonus(
                actor_id,
                bonus,
                &format!("Showroom return bonus for {bill_number}"),
                Some(bill_number.to_string()),
            )?;
        }
        let message = if outcome.settled {
            format!("Bill {bill_number} delivered; cash verified.")
        } else {
            format!("Bill {bill_number} returned to showroom, no dues.")
        };
        self.notifications.notify(
            "Order delivered",
            &message,
            Some(bill_number.to_string()),
            None,
            Some(sales_staff_id),
        );
        Ok(outcome)
    }

    // ---- misc ----------------------------------------------------------

    /// Append a free-form production log entry without changing status.
    pub fn add_log(
        &self,
        actor_id: &str,
        bill_number: &str,
        description: &str,
    ) -> Result<Order, ServiceError> {
        let actor_name = self
            .store
            .accounts
            .get(actor_id)
            .map(|a| a.name.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("account {actor_id} not found")))?;
        let mut order = self
            .store
            .orders
            .get_mut(bill_number)
            .ok_or_else(|| ServiceError::NotFound(format!("order {bill_number} not found")))?;
        let status = order.status;
        order.append_history(status, Some(description.to_string()), Some(actor_name), false);
        Ok(order.clone())
    }

    /// Material issue against an order: logs the issue and pays the material
    /// clerk their handling incentive.
    pub fn log_material_issue(
        &self,
        actor_id: &str,
        bill_number: &str,
        description: &str,
    ) -> Result<Order, ServiceError> {
        let actor = self
            .store
            .accounts
            .get(actor_id)
            .ok_or_else(|| ServiceError::NotFound(format!("account {actor_id} not found")))?
            .clone();
        if actor.role != StaffRole::Material {
            return Err(ServiceError::Unauthorized(
                "only material staff may issue material".into(),
            ));
        }
        let order = self.add_log(actor_id, bill_number, description)?;
        self.payouts.pay_material_incentive(
            actor_id,
            MaterialAction::Issue,
            &format!("Material issue for {bill_number}"),
            Some(bill_number.to_string()),
        )?;
        Ok(order)
    }

    pub fn set_priority(
        &self,
        bill_number: &str,
        priority: Priority,
    ) -> Result<Order, ServiceError> {
        let mut order = self
            .store
            .orders
            .get_mut(bill_number)
            .ok_or_else(|| ServiceError::NotFound(format!("order {bill_number} not found")))?;
        order.priority = priority;
        Ok(order.clone())
    }

    pub fn set_notes(&self, bill_number: &str, notes: String) -> Result<Order, ServiceError> {
        let mut order = self
            .store
            .orders
            .get_mut(bill_number)
            .ok_or_else(|| ServiceError::NotFound(format!("order {bill_number} not found")))?;
        order.notes = Some(notes);
        Ok(order.clone())
    }

    #[instrument(skip(self), fields(actor_id = %actor_id, bill_number = %bill_number))]
    pub fn delete(&self, actor_id: &str, bill_number: &str) -> Result<(), ServiceError> {
        self.require_admin(actor_id)?;
        self.store
            .orders
            .remove(bill_number)
            .ok_or_else(|| ServiceError::NotFound(format!("order {bill_number} not found")))?;
        self.event_sender.send(Event::OrderDeleted {
            bill_number: bill_number.to_string(),
        });
        Ok(())
    }

    fn require_admin(&self, actor_id: &str) -> Result<crate::models::Account, ServiceError> {
        let actor = self
            .store
            .accounts
            .get(actor_id)
            .map(|a| a.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("account {actor_id} not found")))?;
        if actor.role != StaffRole::Admin {
            return Err(ServiceError::Unauthorized(format!(
                "account {actor_id} is not an admin"
            )));
        }
        Ok(actor)
    }

    fn notify_next_department(&self, order: &Order, next_worker_id: Option<&str>) {
        let Some(department) = department_for(order.status, order.garment) else {
            return;
        };
        if let Some(worker_id) = next_worker_id {
            self.notifications.notify(
                &format!("Ready for {}", order.status),
                "Assigned to you.",
                Some(order.bill_number.clone()),
                None,
                Some(worker_id.to_string()),
            );
        } else {
            self.notifications.notify(
                &format!("Ready for {}", order.status),
                &format!("Bill {} waiting in your queue.", order.bill_number),
                Some(order.bill_number.clone()),
                Some(department),
                None,
            );
        }
    }
}

/// Role responsible for working an order that sits in `status`.
fn department_for(status: OrderStatus, garment: GarmentType) -> Option<StaffRole> {
    match status {
        OrderStatus::Pending | OrderStatus::Measurement => Some(StaffRole::Measurement),
        OrderStatus::Cutting => Some(StaffRole::Cutting),
        OrderStatus::Stitching => Some(garment.maker_role()),
        OrderStatus::KajButton => Some(StaffRole::KajButton),
        OrderStatus::Finishing => Some(StaffRole::Finishing),
        OrderStatus::Ready => Some(StaffRole::Delivery),
        OrderStatus::Delivered => None,
    }
}

fn generate_pin() -> String {
    rand::thread_rng().gen_range(1000..=9999).to_string()
}
