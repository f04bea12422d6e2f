use serde_json::Value;

use crate::normalize::from_remote;
use crate::record::WorkshopRecord;

const SEED_JSON: &str = include_str!("../seed/workshops.json");

/// Baseline records used to populate an empty archive, or as the offline fallback
pub fn seed_records() -> Vec<WorkshopRecord> {
    let rows: Vec<Value> = serde_json::from_str(SEED_JSON).unwrap_or_default();
    rows.into_iter().filter_map(|row| from_remote(row).ok()).collect()
}
