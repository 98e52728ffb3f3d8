use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::account::StaffRole;

/// Garment types a single production order can carry. Composite showroom
/// items (a suit, a kurta-pyjama set) are split into one order per physical
/// garment at booking time, so the workflow only ever sees these.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString, EnumIter,
)]
pub enum GarmentType {
    Shirt,
    Kurta,
    Pant,
    Pyjama,
    Trousers,
    Coat,
    Safari,
    Sherwani,
    Jodhpuri,
}

impl GarmentType {
    /// Lower-body garments go straight from stitching to finishing; everything
    /// else passes through the kaj-button bench first.
    pub fn is_lower_body(self) -> bool {
        matches!(self, GarmentType::Pant | GarmentType::Pyjama | GarmentType::Trousers)
    }

    /// The dedicated maker role for this garment, used to gate stitching-stage
    /// work alongside the general `Stitching` role.
    pub fn maker_role(self) -> StaffRole {
        match self {
            GarmentType::Shirt | GarmentType::Kurta => StaffRole::ShirtMaker,
            GarmentType::Pant | GarmentType::Pyjama | GarmentType::Trousers => StaffRole::PantMaker,
            GarmentType::Coat | GarmentType::Jodhpuri => StaffRole::CoatMaker,
            GarmentType::Safari => StaffRole::SafariMaker,
            GarmentType::Sherwani => StaffRole::SherwaniMaker,
        }
    }
}

/// Production stages in strict forward order. `sequence` gives the ordering
/// used by the monotonicity invariant; `next_for` is the single legal
/// successor for a garment (lower-body garments skip `KajButton`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Measurement,
    Cutting,
    Stitching,
    KajButton,
    Finishing,
    Ready,
    Delivered,
}

impl OrderStatus {
    pub fn sequence(self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Measurement => 1,
            OrderStatus::Cutting => 2,
            OrderStatus::Stitching => 3,
            OrderStatus::KajButton => 4,
            OrderStatus::Finishing => 5,
            OrderStatus::Ready => 6,
            OrderStatus::Delivered => 7,
        }
    }

    /// The unique legal successor stage for the given garment, or `None` from
    /// the terminal stage.
    pub fn next_for(self, garment: GarmentType) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Measurement),
            OrderStatus::Measurement => Some(OrderStatus::Cutting),
            OrderStatus::Cutting => Some(OrderStatus::Stitching),
            OrderStatus::Stitching => {
                if garment.is_lower_body() {
                    Some(OrderStatus::Finishing)
                } else {
                    Some(OrderStatus::KajButton)
                }
            }
            OrderStatus::KajButton => Some(OrderStatus::Finishing),
            OrderStatus::Finishing => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    /// Capability check: may `role` advance an order out of this stage?
    /// Stitching is additionally gated on the garment family so a pant maker
    /// cannot complete a sherwani.
    pub fn permits(self, role: StaffRole, garment: GarmentType) -> bool {
        match self {
            OrderStatus::Pending | OrderStatus::Measurement => role == StaffRole::Measurement,
            OrderStatus::Cutting => role == StaffRole::Cutting,
            OrderStatus::Stitching => {
                role == StaffRole::Stitching || role == garment.maker_role()
            }
            OrderStatus::KajButton => role == StaffRole::KajButton,
            OrderStatus::Finishing => role == StaffRole::Finishing,
            OrderStatus::Ready => role == StaffRole::Delivery,
            OrderStatus::Delivered => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum PaymentStatus {
    Paid,
    Partial,
}

/// Money position of one order. Invariant: `advance_amount + pending_amount
/// == total_amount` and `pending_amount >= 0` after every settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentState {
    pub total_amount: Decimal,
    pub advance_amount: Decimal,
    pub pending_amount: Decimal,
    pub status: PaymentStatus,
}

impl PaymentState {
    pub fn new(total: Decimal, advance: Decimal) -> Self {
        let pending = total - advance;
        Self {
            total_amount: total,
            advance_amount: advance,
            pending_amount: pending,
            status: if pending.is_zero() { PaymentStatus::Paid } else { PaymentStatus::Partial },
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.advance_amount + self.pending_amount == self.total_amount
            && self.pending_amount >= Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// One entry of an order's append-only production history. Entries are never
/// edited or removed once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub status: OrderStatus,
    pub at: DateTime<Utc>,
    pub description: Option<String>,
    pub updated_by: Option<String>,
    /// Set when an admin force-set bypassed the capability check.
    #[serde(default)]
    pub forced: bool,
}

/// One production unit: exactly one garment piece under one bill number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub bill_number: String,
    pub customer_id: String,
    pub customer_name: String,
    pub is_new_customer: bool,
    pub garment: GarmentType,
    pub status: OrderStatus,
    pub assigned_worker_id: Option<String>,
    pub assigned_worker_name: Option<String>,
    /// Booking staff; their wallet is debited at cash handover.
    pub sales_staff_id: String,
    pub showroom_name: String,
    pub payment: PaymentState,
    pub fabric_meters: Decimal,
    pub order_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub trial_date: NaiveDate,
    pub priority: Priority,
    pub notes: Option<String>,
    pub history: Vec<HistoryEntry>,
    /// Single-use 4-digit PIN authorising the cash handover at delivery.
    pub handover_pin: Option<String>,
}

impl Order {
    pub fn append_history(
        &mut self,
        status: OrderStatus,
        description: Option<String>,
        updated_by: Option<String>,
        forced: bool,
    ) {
        self.history.push(HistoryEntry {
            status,
            at: Utc::now(),
            description,
            updated_by,
            forced,
        });
    }
}
