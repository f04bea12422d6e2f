use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::category::{Category, Frequency};

/// One row of a workshop's agenda
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgendaItem {
    pub particulars: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(alias = "speaker")]
    pub speaker_name: String,
    pub remarks: String,
    pub is_activity: bool,
}

/// A speaker catalogued against a workshop, keyed by `name`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Speaker {
    pub name: String,
    pub designation: String,
    pub takeaways: String,
}

impl Speaker {
    /// A speaker with only a name, as synthesized from an agenda row
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether any detail beyond the name has been entered
    pub fn has_details(&self) -> bool {
        !self.designation.is_empty() || !self.takeaways.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metrics {
    pub participant_count: u32,
    pub demographic: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Feedback {
    /// Average rating on a 0-5 scale
    pub average_rating: f64,
    pub qualitative_comments: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Expense {
    pub description: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    pub allocated: f64,
    pub expenses: Vec<Expense>,
}

impl Budget {
    /// Sum of all expense amounts, recomputed on every call
    pub fn total_expenses(&self) -> f64 {
        self.expenses
            .iter()
            .map(|e| if e.amount.is_finite() { e.amount } else { 0.0 })
            .sum()
    }

    /// Allocated amount minus incurred expenses
    pub fn remaining(&self) -> f64 {
        self.allocated - self.total_expenses()
    }
}

/// Every field of a workshop record except its id.
///
/// This is also the shape of a draft while it is being edited.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkshopDetails {
    pub title: String,
    pub theme: String,
    pub category: Category,
    pub lead: String,
    /// ISO date (`YYYY-MM-DD`)
    pub date: String,
    pub venue: String,
    pub frequency: Frequency,
    pub agenda: Vec<AgendaItem>,
    pub speakers: Vec<Speaker>,
    pub activities: Vec<String>,
    pub metrics: Metrics,
    pub feedback: Feedback,
    pub budget: Budget,
    pub action_plan: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_name: Option<String>,
}

/// In-progress record being edited in a form
pub type Draft = WorkshopDetails;

/// A finalized, persisted workshop record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkshopRecord {
    pub id: String,
    #[serde(flatten)]
    pub details: WorkshopDetails,
}

impl WorkshopRecord {
    pub fn new(id: impl Into<String>, details: WorkshopDetails) -> Self {
        Self {
            id: id.into(),
            details,
        }
    }

    pub fn title(&self) -> &str {
        &self.details.title
    }
}

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Generate a new record id from the current time in milliseconds.
///
/// Ids handed out by one process are strictly increasing even when two
/// records are finalized within the same millisecond.
pub fn generate_id() -> String {
    let now = chrono::Utc::now().timestamp_millis();
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next.to_string(),
            Err(actual) => last = actual,
        }
    }
}
