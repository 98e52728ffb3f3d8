use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A showroom customer. `is_new` is captured at registration and drives the
/// measurement piece rates until their first order completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub mobile: String,
    pub address: Option<String>,
    pub is_new: bool,
    /// Free-form measurement sheet, keyed by field name (chest, waist, ...).
    #[serde(default)]
    pub measurements: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}
