//! Turning free-text workshop reports into records.
//!
//! The extraction model returns a partially filled record. Every field it
//! leaves out is defaulted here before the result is shape-repaired like any
//! other externally sourced row.

use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use crate::category::WorkshopCategory;
use crate::error::IngestError;
use crate::normalize::from_remote;
use crate::record::WorkshopRecord;

/// Scalar defaults applied when the model leaves a field blank
const SCALAR_DEFAULTS: [(&str, &str); 6] = [
    ("title", "Untitled Workshop"),
    ("theme", "No theme provided"),
    ("lead", "Unknown Organizer"),
    ("venue", "Virtual"),
    ("frequency", "One-time"),
    ("category", "Teacher Training"),
];

/// Instructions sent to the extraction model ahead of the report text
pub fn extraction_prompt(raw_text: &str) -> String {
    let categories: Vec<&str> = WorkshopCategory::ALL.iter().map(|c| c.label()).collect();
    format!(
        "Extract workshop details from the following report and structure it according to the schema.\n\
         Ensure you capture the Title, Theme, Category (choose from: {}),\n\
         Lead (The person who organized/conducted the workshop), Agenda (list of {{particulars, startTime, endTime, speaker, remarks, isActivity}}),\n\
         Speakers (list of {{name, designation, takeaways}}), Activities, Metrics, Feedback, Action Plan,\n\
         and Budget (allocated amount and list of incurred expenses with {{description, amount}}).\n\n\
         REPORT TEXT:\n{}",
        categories.join(", "),
        raw_text
    )
}

/// Structured-output schema for the extraction model
pub fn response_schema() -> Value {
    let string = json!({ "type": "STRING" });
    let number = json!({ "type": "NUMBER" });
    let strings = json!({ "type": "ARRAY", "items": { "type": "STRING" } });

    json!({
        "type": "OBJECT",
        "properties": {
            "title": string,
            "theme": string,
            "category": string,
            "lead": string,
            "date": string,
            "venue": string,
            "frequency": string,
            "agenda": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "particulars": string,
                        "startTime": string,
                        "endTime": string,
                        "speaker": string,
                        "remarks": string,
                        "isActivity": { "type": "BOOLEAN" }
                    },
                    "required": ["particulars", "startTime", "endTime"]
                }
            },
            "speakers": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": string,
                        "designation": string,
                        "takeaways": string
                    },
                    "required": ["name", "designation", "takeaways"]
                }
            },
            "activities": strings,
            "metrics": {
                "type": "OBJECT",
                "properties": { "participantCount": number, "demographic": string }
            },
            "feedback": {
                "type": "OBJECT",
                "properties": { "averageRating": number, "qualitativeComments": strings }
            },
            "budget": {
                "type": "OBJECT",
                "properties": {
                    "allocated": number,
                    "expenses": {
                        "type": "ARRAY",
                        "items": {
                            "type": "OBJECT",
                            "properties": { "description": string, "amount": number },
                            "required": ["description", "amount"]
                        }
                    }
                },
                "required": ["allocated", "expenses"]
            },
            "actionPlan": strings
        },
        "required": ["title", "category", "date", "lead", "budget"]
    })
}

/// Strip a surrounding markdown code fence, if any
fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the model's text output into a partial record object
pub fn parse_extraction(model_output: &str) -> Result<Map<String, Value>, IngestError> {
    let body = strip_fence(model_output);
    if body.is_empty() {
        return Err(IngestError::EmptyInput);
    }
    match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(IngestError::NotAnObject),
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

/// Default every field the model left out and build a record
pub fn record_from_extraction(
    mut extracted: Map<String, Value>,
    id: String,
    today: NaiveDate,
) -> Result<WorkshopRecord, IngestError> {
    for (key, default) in SCALAR_DEFAULTS {
        if is_blank(extracted.get(key)) {
            extracted.insert(key.to_string(), Value::String(default.to_string()));
        }
    }
    if is_blank(extracted.get("date")) {
        extracted.insert(
            "date".to_string(),
            Value::String(today.format("%Y-%m-%d").to_string()),
        );
    }
    if !extracted.get("metrics").is_some_and(Value::is_object) {
        extracted.insert(
            "metrics".to_string(),
            json!({ "participantCount": 0, "demographic": "N/A" }),
        );
    }
    extracted.insert("id".to_string(), Value::String(id));

    Ok(from_remote(Value::Object(extracted))?)
}
