use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::FormError;

/// Parse raw text input as a number; anything that is not a finite number becomes 0
pub fn parse_number(input: &str) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Parse raw text input as a non-negative whole count
pub fn parse_count(input: &str) -> u32 {
    clamp_count(parse_number(input))
}

/// Truncate a number to a count, saturating at the bounds of `u32`
pub fn clamp_count(n: f64) -> u32 {
    if !n.is_finite() || n <= 0.0 {
        0
    } else if n >= u32::MAX as f64 {
        u32::MAX
    } else {
        n as u32
    }
}

/// Top-level scalar fields of a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarField {
    Title,
    Theme,
    Lead,
    Date,
    Venue,
    Frequency,
}

impl FromStr for ScalarField {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(ScalarField::Title),
            "theme" => Ok(ScalarField::Theme),
            "lead" => Ok(ScalarField::Lead),
            "date" => Ok(ScalarField::Date),
            "venue" => Ok(ScalarField::Venue),
            "frequency" => Ok(ScalarField::Frequency),
            other => Err(FormError::UnknownField(other.to_string())),
        }
    }
}

/// Fields inside the nested `metrics`, `budget` and `feedback` objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NestedField {
    ParticipantCount,
    Demographic,
    Allocated,
    AverageRating,
}

impl NestedField {
    /// Resolve a `(parent, field)` pair such as `("metrics", "participantCount")`
    pub fn parse(parent: &str, field: &str) -> Result<Self, FormError> {
        match (parent, field) {
            ("metrics", "participantCount") => Ok(NestedField::ParticipantCount),
            ("metrics", "demographic") => Ok(NestedField::Demographic),
            ("budget", "allocated") => Ok(NestedField::Allocated),
            ("feedback", "averageRating") => Ok(NestedField::AverageRating),
            _ => Err(FormError::UnknownField(format!("{}.{}", parent, field))),
        }
    }
}

/// Editable fields of a speaker row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpeakerField {
    Name,
    Designation,
    Takeaways,
}

/// Editable fields of an expense row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpenseField {
    Description,
    Amount,
}

/// Plain string lists on a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListField {
    ActionPlan,
    Comments,
    Activities,
}

impl ListField {
    pub fn name(&self) -> &'static str {
        match self {
            ListField::ActionPlan => "actionPlan",
            ListField::Comments => "qualitativeComments",
            ListField::Activities => "activities",
        }
    }
}

/// Direction for moving an agenda row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Up,
    Down,
}

/// Partial agenda row; `None` fields are left untouched on merge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgendaPatch {
    pub particulars: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub speaker_name: Option<String>,
    pub remarks: Option<String>,
    pub is_activity: Option<bool>,
}

impl AgendaPatch {
    pub fn particulars(value: impl Into<String>) -> Self {
        Self {
            particulars: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn speaker(value: impl Into<String>) -> Self {
        Self {
            speaker_name: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn activity(value: bool) -> Self {
        Self {
            is_activity: Some(value),
            ..Default::default()
        }
    }
}
