//! Read-only views over the record list: inventory filtering, yearly
//! dashboard, cross-workshop comparison and export naming.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::record::WorkshopRecord;

/// Inventory filter value matching every category
pub const ALL_CATEGORIES: &str = "All";

/// Years always offered by the dashboard year picker
const DASHBOARD_YEARS: std::ops::RangeInclusive<i32> = 2020..=2030;

fn parse_date(date: &str) -> Option<NaiveDate> {
    // Accept plain dates as well as full timestamps
    let prefix = date.get(..10).unwrap_or(date);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// Format an ISO date as `dd-mm-yyyy`, or "N/A" if it cannot be read
pub fn format_date(date: &str) -> String {
    match parse_date(date.trim()) {
        Some(d) => d.format("%d-%m-%Y").to_string(),
        None => "N/A".to_string(),
    }
}

/// Calendar year of a record, if its date can be read
pub fn record_year(record: &WorkshopRecord) -> Option<i32> {
    parse_date(record.details.date.trim()).map(|d| d.year())
}

/// Records matching a category (or [`ALL_CATEGORIES`]) and a case-insensitive search
/// over title, venue and lead
pub fn filter_inventory<'a>(
    records: &'a [WorkshopRecord],
    category: &str,
    search: &str,
) -> Vec<&'a WorkshopRecord> {
    let needle = search.to_lowercase();
    records
        .iter()
        .filter(|r| category == ALL_CATEGORIES || r.details.category.as_str() == category)
        .filter(|r| {
            let d = &r.details;
            d.title.to_lowercase().contains(&needle)
                || d.venue.to_lowercase().contains(&needle)
                || d.lead.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Category filter options: "All" followed by each category in first-seen order
pub fn inventory_categories(records: &[WorkshopRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut categories = vec![ALL_CATEGORIES.to_string()];
    for record in records {
        let category = record.details.category.as_str();
        if seen.insert(category) {
            categories.push(category.to_string());
        }
    }
    categories
}

/// Years offered by the dashboard, newest first
pub fn dashboard_years(records: &[WorkshopRecord]) -> Vec<i32> {
    let mut years: Vec<i32> = DASHBOARD_YEARS
        .chain(records.iter().filter_map(record_year))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years
}

/// Initials of a person's name, e.g. "Dr. Anita Sharma" -> "DAS"
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRow {
    pub id: String,
    pub title: String,
    pub category: String,
    pub lead: String,
    pub lead_initials: String,
    pub date: String,
    pub participants: u32,
}

/// Aggregate view of one calendar year
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub year: i32,
    pub record_count: usize,
    pub total_participants: u64,
    /// Mean rating to one decimal place
    pub average_rating: String,
    pub rows: Vec<DashboardRow>,
}

pub fn dashboard(records: &[WorkshopRecord], year: i32) -> DashboardSummary {
    let in_year: Vec<&WorkshopRecord> = records
        .iter()
        .filter(|r| record_year(r) == Some(year))
        .collect();

    let total_participants = in_year
        .iter()
        .map(|r| u64::from(r.details.metrics.participant_count))
        .sum();

    let average_rating = if in_year.is_empty() {
        "0.0".to_string()
    } else {
        let sum: f64 = in_year.iter().map(|r| r.details.feedback.average_rating).sum();
        format!("{:.1}", sum / in_year.len() as f64)
    };

    let rows = in_year
        .iter()
        .map(|r| DashboardRow {
            id: r.id.clone(),
            title: r.details.title.clone(),
            category: r.details.category.to_string(),
            lead: r.details.lead.clone(),
            lead_initials: initials(&r.details.lead),
            date: format_date(&r.details.date),
            participants: r.details.metrics.participant_count,
        })
        .collect();

    DashboardSummary {
        year,
        record_count: in_year.len(),
        total_participants,
        average_rating,
        rows,
    }
}

/// Rating bucket used to highlight comparison cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingBand {
    High,
    Good,
    Standard,
}

impl RatingBand {
    pub fn of(rating: f64) -> Self {
        if rating >= 4.5 {
            RatingBand::High
        } else if rating >= 4.0 {
            RatingBand::Good
        } else {
            RatingBand::Standard
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub id: String,
    pub title: String,
    pub date: String,
    pub category: String,
    pub participants: u32,
    pub rating: f64,
    pub band: RatingBand,
    pub first_action: Option<String>,
}

/// Side-by-side view of every record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub rows: Vec<ComparisonRow>,
    /// Id of the record with the highest satisfaction rating
    pub highest_rated: Option<String>,
}

pub fn comparison(records: &[WorkshopRecord]) -> Comparison {
    let rows = records
        .iter()
        .map(|r| {
            let d = &r.details;
            ComparisonRow {
                id: r.id.clone(),
                title: d.title.clone(),
                date: format_date(&d.date),
                category: d.category.to_string(),
                participants: d.metrics.participant_count,
                rating: d.feedback.average_rating,
                band: RatingBand::of(d.feedback.average_rating),
                first_action: d.action_plan.first().cloned(),
            }
        })
        .collect();

    // First record wins ties
    let highest_rated = records
        .iter()
        .fold(None::<&WorkshopRecord>, |best, r| match best {
            Some(b) if b.details.feedback.average_rating >= r.details.feedback.average_rating => {
                Some(b)
            }
            _ => Some(r),
        })
        .map(|r| r.id.clone());

    Comparison {
        rows,
        highest_rated,
    }
}

fn unsafe_file_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"[/\\?%*:|"<>]"#).expect("file name pattern is valid"))
}

/// File name for a record's exported report
pub fn export_file_name(title: &str) -> String {
    format!("{}_Report.pdf", unsafe_file_chars().replace_all(title, "-"))
}
