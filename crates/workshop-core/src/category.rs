use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::FormError;

/// Label stored when a custom category is submitted without any text
pub const UNCATEGORIZED: &str = "Uncategorized";

/// The fixed set of institutional workshop categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkshopCategory {
    SecurityExcellence,
    AiLiteracy,
    SpiritualCurriculum,
    TeacherTraining,
    LeadershipDevelopment,
    AdministrativeExcellence,
}

impl WorkshopCategory {
    pub const ALL: [WorkshopCategory; 6] = [
        WorkshopCategory::SecurityExcellence,
        WorkshopCategory::AiLiteracy,
        WorkshopCategory::SpiritualCurriculum,
        WorkshopCategory::TeacherTraining,
        WorkshopCategory::LeadershipDevelopment,
        WorkshopCategory::AdministrativeExcellence,
    ];

    /// Display label, also used as the stored value
    pub fn label(&self) -> &'static str {
        match self {
            WorkshopCategory::SecurityExcellence => "Security Excellence",
            WorkshopCategory::AiLiteracy => "AI Literacy",
            WorkshopCategory::SpiritualCurriculum => "Spiritual Curriculum",
            WorkshopCategory::TeacherTraining => "Teacher Training",
            WorkshopCategory::LeadershipDevelopment => "Leadership Development",
            WorkshopCategory::AdministrativeExcellence => "Administrative Excellence",
        }
    }

    /// Look up a category by its exact label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for WorkshopCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A record's category: one of the known values or user-defined text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Known(WorkshopCategory),
    Custom(String),
}

impl Default for Category {
    fn default() -> Self {
        Category::Known(WorkshopCategory::TeacherTraining)
    }
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Known(c) => c.label(),
            Category::Custom(s) => s,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Category::Custom(_))
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        match WorkshopCategory::from_label(value) {
            Some(known) => Category::Known(known),
            None => Category::Custom(value.to_string()),
        }
    }
}

impl From<WorkshopCategory> for Category {
    fn from(value: WorkshopCategory) -> Self {
        Category::Known(value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Category::from(s.as_str()))
    }
}

/// How often a workshop is held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Frequency {
    #[default]
    Annual,
    #[serde(rename = "Bi-Annual")]
    BiAnnual,
    #[serde(rename = "One-time")]
    OneTime,
}

impl Frequency {
    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Annual => "Annual",
            Frequency::BiAnnual => "Bi-Annual",
            Frequency::OneTime => "One-time",
        }
    }
}

impl FromStr for Frequency {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Annual" => Ok(Frequency::Annual),
            "Bi-Annual" => Ok(Frequency::BiAnnual),
            "One-time" => Ok(Frequency::OneTime),
            other => Err(FormError::InvalidFrequency(other.to_string())),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_label() {
        assert_eq!(
            Category::from("AI Literacy"),
            Category::Known(WorkshopCategory::AiLiteracy)
        );
        assert_eq!(
            Category::from("Community Outreach"),
            Category::Custom("Community Outreach".to_string())
        );
        // Labels are matched exactly
        assert!(Category::from("ai literacy").is_custom());
    }

    #[test]
    fn test_category_serializes_as_label() {
        let json = serde_json::to_string(&Category::Known(WorkshopCategory::TeacherTraining)).unwrap();
        assert_eq!(json, "\"Teacher Training\"");

        let parsed: Category = serde_json::from_str("\"Parent Engagement\"").unwrap();
        assert_eq!(parsed, Category::Custom("Parent Engagement".to_string()));
    }

    #[test]
    fn test_frequency_labels() {
        assert_eq!(serde_json::to_string(&Frequency::BiAnnual).unwrap(), "\"Bi-Annual\"");
        assert_eq!("One-time".parse::<Frequency>().unwrap(), Frequency::OneTime);
        assert!("Weekly".parse::<Frequency>().is_err());
    }
}
