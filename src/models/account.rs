use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Staff roles, one per department plus the administrative and investor
/// roles. The production roles double as capabilities: a worker may only
/// advance orders out of the stage their role is responsible for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    Admin,
    Showroom,
    Manager,
    BookingMaster,
    Measurement,
    Cutting,
    /// General stitching floor; handles any garment type.
    Stitching,
    ShirtMaker,
    PantMaker,
    CoatMaker,
    SafariMaker,
    SherwaniMaker,
    KajButton,
    Finishing,
    Delivery,
    Material,
    Investor,
}

impl StaffRole {
    /// Roles that perform stitching work. Dedicated makers are restricted to
    /// their garment family; the general `Stitching` role takes anything.
    pub fn is_stitching(self) -> bool {
        matches!(
            self,
            StaffRole::Stitching
                | StaffRole::ShirtMaker
                | StaffRole::PantMaker
                | StaffRole::CoatMaker
                | StaffRole::SafariMaker
                | StaffRole::SherwaniMaker
        )
    }

    /// Roles allowed to book orders from the showroom counter.
    pub fn may_book_orders(self) -> bool {
        matches!(
            self,
            StaffRole::Admin | StaffRole::Showroom | StaffRole::Manager | StaffRole::BookingMaster
        )
    }
}

/// Rank ladder for showroom managers, driven by referred showroom count.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ManagerRank {
    Associate,
    Senior,
    Director,
}

impl ManagerRank {
    /// Referred-showroom threshold for each rank.
    pub fn required_showrooms(self) -> usize {
        match self {
            ManagerRank::Associate => 2,
            ManagerRank::Senior => 5,
            ManagerRank::Director => 10,
        }
    }

    pub fn for_showroom_count(count: usize) -> Option<ManagerRank> {
        [ManagerRank::Director, ManagerRank::Senior, ManagerRank::Associate]
            .into_iter()
            .find(|rank| count >= rank.required_showrooms())
    }
}

/// A staff, admin or investor account. Accounts are never physically removed
/// while ledger entries reference them; deactivation flips `active` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub role: StaffRole,
    /// Opaque credential for the login gate. Credential handling beyond the
    /// equality check is outside the core.
    #[serde(skip_serializing)]
    pub password: String,
    /// Upline account that referred this one. Forms a forest; the directory
    /// rejects self-references and cycles at write time.
    pub referred_by: Option<String>,
    pub total_referral_earnings: Decimal,
    pub claimed_referral_earnings: Decimal,
    /// 4-digit wallet PIN, used as the cash-handover fallback.
    pub wallet_pin: Option<String>,
    pub manager_rank: Option<ManagerRank>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn unclaimed_referral_earnings(&self) -> Decimal {
        self.total_referral_earnings - self.claimed_referral_earnings
    }
}
