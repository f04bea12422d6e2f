//! Shape repair for records coming from, and going to, the remote store.
//!
//! Remote rows may be partially shaped or use older field spellings. Reading
//! upgrades a row through each schema version in turn and then fills every
//! missing or malformed field with an empty value. Writing produces the
//! remote column layout.

use serde_json::{Map, Value};

use crate::category::{Category, Frequency, UNCATEGORIZED};
use crate::error::ShapeError;
use crate::form::{clamp_count, parse_number};
use crate::record::{
    AgendaItem, Budget, Expense, Feedback, Metrics, Speaker, WorkshopDetails, WorkshopRecord,
};

/// Version of the in-memory record shape
pub const SCHEMA_VERSION: u32 = 1;

/// Remote column holding the action plan
pub const REMOTE_ACTION_PLAN: &str = "actionplan";
/// Remote key for an agenda row's speaker
pub const REMOTE_AGENDA_SPEAKER: &str = "speaker";
pub const REMOTE_ATTACHMENT_URL: &str = "attachment_url";
pub const REMOTE_ATTACHMENT_NAME: &str = "attachment_name";

/// Remote spellings of the action plan field, most preferred first
const ACTION_PLAN_KEYS: [&str; 3] = ["actionPlan", "actionplan", "action_plan"];
const ATTACHMENT_URL_KEYS: [&str; 3] = ["attachmentUrl", "attachment_url", "attachmenturl"];
const ATTACHMENT_NAME_KEYS: [&str; 3] = ["attachmentName", "attachment_name", "attachmentname"];

/// Detect which schema version a raw row was written with.
///
/// Rows written by several generations of clients can mix spellings, so any
/// legacy key on any field marks the whole row as v0.
pub fn detect_version(row: &Map<String, Value>) -> u32 {
    let legacy = [&ACTION_PLAN_KEYS, &ATTACHMENT_URL_KEYS, &ATTACHMENT_NAME_KEYS]
        .iter()
        .any(|keys| keys[1..].iter().any(|key| row.contains_key(*key)));
    if legacy {
        0
    } else {
        SCHEMA_VERSION
    }
}

/// v0 -> v1: move legacy field spellings to their current keys
fn migrate_v0(row: &mut Map<String, Value>) {
    rename_first(row, &ACTION_PLAN_KEYS);
    rename_first(row, &ATTACHMENT_URL_KEYS);
    rename_first(row, &ATTACHMENT_NAME_KEYS);
}

/// Move the first present, non-null key among `keys[1..]` to `keys[0]` unless `keys[0]` already holds a value
fn rename_first(row: &mut Map<String, Value>, keys: &[&str]) {
    let target = keys[0];
    if row.get(target).is_some_and(|v| !v.is_null()) {
        return;
    }
    for key in &keys[1..] {
        match row.remove(*key) {
            Some(v) if !v.is_null() => {
                row.insert(target.to_string(), v);
                return;
            }
            _ => {}
        }
    }
}

/// Upgrade a raw row to the current schema version
pub fn migrate(mut row: Map<String, Value>) -> Map<String, Value> {
    let mut version = detect_version(&row);
    while version < SCHEMA_VERSION {
        match version {
            0 => migrate_v0(&mut row),
            _ => unreachable!("no migration from schema version {}", version),
        }
        version += 1;
    }
    row
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        Some(Value::String(s)) => parse_number(s),
        _ => 0.0,
    }
}

fn count(value: Option<&Value>) -> u32 {
    clamp_count(number(value))
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

fn objects(value: Option<&Value>) -> impl Iterator<Item = &Map<String, Value>> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn strings(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|v| v.is_string() || v.is_number())
        .map(|v| text(Some(v)))
        .collect()
}

fn agenda_item(obj: &Map<String, Value>) -> AgendaItem {
    AgendaItem {
        particulars: text(obj.get("particulars")),
        start_time: text(obj.get("startTime")),
        end_time: text(obj.get("endTime")),
        speaker_name: text(
            obj.get("speakerName")
                .or_else(|| obj.get(REMOTE_AGENDA_SPEAKER)),
        ),
        remarks: text(obj.get("remarks")),
        is_activity: flag(obj.get("isActivity")),
    }
}

fn speaker(obj: &Map<String, Value>) -> Speaker {
    Speaker {
        name: text(obj.get("name")),
        designation: text(obj.get("designation")),
        takeaways: text(obj.get("takeaways")),
    }
}

fn nested<'a>(row: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    row.get(key).and_then(Value::as_object)
}

fn id_of(row: &Map<String, Value>) -> Result<String, ShapeError> {
    match row.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ShapeError::MissingId),
    }
}

/// Repair an already-migrated row into a record
fn ensure_defaults(row: &Map<String, Value>) -> Result<WorkshopRecord, ShapeError> {
    let id = id_of(row)?;

    let category = text(row.get("category"));
    let category = if category.trim().is_empty() {
        Category::Custom(UNCATEGORIZED.to_string())
    } else {
        Category::from(category.as_str())
    };

    let frequency = text(row.get("frequency")).parse().unwrap_or(Frequency::Annual);

    let metrics = nested(row, "metrics")
        .map(|m| Metrics {
            participant_count: count(m.get("participantCount")),
            demographic: text(m.get("demographic")),
        })
        .unwrap_or_default();

    let feedback = nested(row, "feedback")
        .map(|f| Feedback {
            average_rating: number(f.get("averageRating")).clamp(0.0, 5.0),
            qualitative_comments: strings(f.get("qualitativeComments")),
        })
        .unwrap_or_default();

    let budget = nested(row, "budget")
        .map(|b| Budget {
            allocated: number(b.get("allocated")),
            expenses: objects(b.get("expenses"))
                .map(|e| Expense {
                    description: text(e.get("description")),
                    amount: number(e.get("amount")),
                })
                .collect(),
        })
        .unwrap_or_default();

    let details = WorkshopDetails {
        title: text(row.get("title")),
        theme: text(row.get("theme")),
        category,
        lead: text(row.get("lead")),
        date: text(row.get("date")),
        venue: text(row.get("venue")),
        frequency,
        agenda: objects(row.get("agenda")).map(agenda_item).collect(),
        speakers: objects(row.get("speakers")).map(speaker).collect(),
        activities: strings(row.get("activities")),
        metrics,
        feedback,
        budget,
        action_plan: strings(row.get("actionPlan")),
        attachment_url: optional_text(row.get("attachmentUrl")),
        attachment_name: optional_text(row.get("attachmentName")),
    };

    Ok(WorkshopRecord::new(id, details))
}

/// Read-repair a remote row into a fully shaped record
pub fn from_remote(row: Value) -> Result<WorkshopRecord, ShapeError> {
    match row {
        Value::Object(map) => ensure_defaults(&migrate(map)),
        _ => Err(ShapeError::NotAnObject),
    }
}

/// Write-repair a record into the remote column layout
pub fn to_remote(record: &WorkshopRecord) -> Map<String, Value> {
    let mut row = match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };

    if let Some(v) = row.remove("actionPlan") {
        row.insert(REMOTE_ACTION_PLAN.to_string(), v);
    }
    let url = row.remove("attachmentUrl").unwrap_or(Value::Null);
    row.insert(REMOTE_ATTACHMENT_URL.to_string(), url);
    let name = row.remove("attachmentName").unwrap_or(Value::Null);
    row.insert(REMOTE_ATTACHMENT_NAME.to_string(), name);

    if let Some(Value::Array(agenda)) = row.get_mut("agenda") {
        for item in agenda.iter_mut().filter_map(Value::as_object_mut) {
            if let Some(v) = item.remove("speakerName") {
                item.insert(REMOTE_AGENDA_SPEAKER.to_string(), v);
            }
        }
    }

    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::category::WorkshopCategory;

    #[test]
    fn test_sparse_row_gets_defaults() {
        let record = from_remote(json!({ "id": "7", "title": "Bare" })).unwrap();
        let d = &record.details;
        assert_eq!(record.id, "7");
        assert_eq!(d.title, "Bare");
        assert!(d.agenda.is_empty());
        assert!(d.speakers.is_empty());
        assert_eq!(d.metrics, Metrics::default());
        assert_eq!(d.feedback, Feedback::default());
        assert_eq!(d.budget, Budget::default());
        assert!(d.action_plan.is_empty());
        assert_eq!(d.frequency, Frequency::Annual);
        assert_eq!(d.category.as_str(), UNCATEGORIZED);
    }

    #[test]
    fn test_malformed_fields_are_replaced() {
        let record = from_remote(json!({
            "id": 12,
            "category": "AI Literacy",
            "frequency": "Weekly",
            "agenda": "not a list",
            "speakers": [{"name": "Ms. Priya Rai"}, 4],
            "metrics": null,
            "feedback": {"averageRating": "4.5", "qualitativeComments": ["Good", null, 3]},
            "budget": {"allocated": "10000", "expenses": [{"description": "Zoom", "amount": 5000}]},
        }))
        .unwrap();
        let d = &record.details;
        assert_eq!(record.id, "12");
        assert_eq!(d.category, Category::Known(WorkshopCategory::AiLiteracy));
        assert_eq!(d.frequency, Frequency::Annual);
        assert!(d.agenda.is_empty());
        assert_eq!(d.speakers, vec![Speaker::named("Ms. Priya Rai")]);
        assert_eq!(d.metrics.participant_count, 0);
        assert_eq!(d.feedback.average_rating, 4.5);
        assert_eq!(d.feedback.qualitative_comments, vec!["Good", "3"]);
        assert_eq!(d.budget.allocated, 10000.0);
        assert_eq!(d.budget.total_expenses(), 5000.0);
    }

    #[test]
    fn test_legacy_spellings() {
        let record = from_remote(json!({
            "id": "1",
            "actionplan": ["Update the handbook"],
            "attachment_url": "https://files.example/r.pdf",
            "agenda": [{"particulars": "Intro", "speaker": "Mr. Rohan Gupta", "isActivity": "true"}],
        }))
        .unwrap();
        let d = &record.details;
        assert_eq!(d.action_plan, vec!["Update the handbook"]);
        assert_eq!(d.attachment_url.as_deref(), Some("https://files.example/r.pdf"));
        assert_eq!(d.agenda[0].speaker_name, "Mr. Rohan Gupta");
        assert!(d.agenda[0].is_activity);
    }

    #[test]
    fn test_mixed_spellings() {
        let row = json!({
            "id": "1",
            "actionPlan": ["x"],
            "attachment_url": "http://f/a.pdf",
            "attachmentname": "a.pdf",
        });
        assert_eq!(detect_version(row.as_object().unwrap()), 0);

        let record = from_remote(row).unwrap();
        let d = &record.details;
        assert_eq!(d.action_plan, vec!["x"]);
        assert_eq!(d.attachment_url.as_deref(), Some("http://f/a.pdf"));
        assert_eq!(d.attachment_name.as_deref(), Some("a.pdf"));
    }

    #[test]
    fn test_current_row_needs_no_migration() {
        let row = json!({ "id": "1", "actionPlan": ["x"], "attachmentUrl": "http://f/a.pdf" });
        assert_eq!(detect_version(row.as_object().unwrap()), SCHEMA_VERSION);
    }

    #[test]
    fn test_current_spelling_wins() {
        let record = from_remote(json!({
            "id": "1",
            "actionPlan": ["current"],
            "action_plan": ["stale"],
        }))
        .unwrap();
        assert_eq!(record.details.action_plan, vec!["current"]);
    }

    #[test]
    fn test_missing_id_is_rejected() {
        assert_eq!(from_remote(json!({ "title": "x" })), Err(ShapeError::MissingId));
        assert_eq!(from_remote(json!({ "id": "  " })), Err(ShapeError::MissingId));
        assert_eq!(from_remote(json!([1, 2])), Err(ShapeError::NotAnObject));
    }

    #[test]
    fn test_remote_round_trip() {
        let mut details = WorkshopDetails {
            title: "Nurturing the Soul".into(),
            action_plan: vec!["Silent meditation".into()],
            attachment_name: Some("report.pdf".into()),
            attachment_url: Some("https://files.example/report.pdf".into()),
            ..Default::default()
        };
        details.agenda.push(AgendaItem {
            particulars: "Meditation".into(),
            speaker_name: "Dr. Anita Sharma".into(),
            is_activity: true,
            ..Default::default()
        });
        let record = WorkshopRecord::new("1", details);

        let row = to_remote(&record);
        assert!(row.contains_key(REMOTE_ACTION_PLAN));
        assert!(!row.contains_key("actionPlan"));
        assert_eq!(row["agenda"][0][REMOTE_AGENDA_SPEAKER], "Dr. Anita Sharma");
        assert_eq!(row[REMOTE_ATTACHMENT_NAME], "report.pdf");

        assert_eq!(from_remote(Value::Object(row)).unwrap(), record);
    }
}
