//! Domain models for the tailoring workflow and ledger engine.

pub mod account;
pub mod customer;
pub mod ledger;
pub mod notification;
pub mod order;
pub mod rates;

pub use account::{Account, ManagerRank, StaffRole};
pub use customer::Customer;
pub use ledger::{EntryKind, Investment, InvestmentStatus, ReferralIncomeLog, Transaction};
pub use notification::Notification;
pub use order::{
    GarmentType, HistoryEntry, Order, OrderStatus, PaymentState, PaymentStatus, Priority,
};
pub use rates::{MeasurementRates, RateTable, ReferralLevel, ReferralLevelTable};
