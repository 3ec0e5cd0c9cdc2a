//! Cumulative distance per gear item.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::records::{gear_label, GearType};
use crate::views::conversions::meters_to_km;

/// One row of the `gear_distance` view.
///
/// Gear that was never used in a workout reports zero distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearDistance {
    pub gear_id: Uuid,
    pub user_id: Uuid,
    pub gear_type: GearType,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub retired: bool,
    /// Sum of linked workout distances, any sport
    pub total_distance_m: f64,
}

impl GearDistance {
    /// Total distance in kilometers.
    pub fn total_distance_km(&self) -> f64 {
        meters_to_km(self.total_distance_m)
    }
}

/// Gear distance in kilometers for display, see `ReportStore::gear_totals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearTotal {
    pub gear_id: Uuid,
    pub gear_type: GearType,
    pub label: String,
    pub retired: bool,
    pub total_distance_km: f64,
}

impl From<&GearDistance> for GearTotal {
    fn from(row: &GearDistance) -> Self {
        Self {
            gear_id: row.gear_id,
            gear_type: row.gear_type,
            label: gear_label(row.gear_type, row.brand.as_deref(), row.model.as_deref()),
            retired: row.retired,
            total_distance_km: row.total_distance_km(),
        }
    }
}
