//! Derivation of the speaker roster and activity list from an agenda.
//!
//! The agenda decides which speakers and activities exist. Entries a user
//! catalogued by hand that the agenda knows nothing about are kept after
//! the derived ones. Nothing flows back from speakers into the agenda.

use std::collections::HashSet;

use crate::record::{AgendaItem, Speaker};

/// Speaker names on agenda rows that never become speakers (compared case-insensitively)
const SPEAKER_SENTINELS: [&str; 2] = ["panel", "none"];

fn is_sentinel(name: &str) -> bool {
    SPEAKER_SENTINELS
        .iter()
        .any(|s| name.eq_ignore_ascii_case(s))
}

/// Trimmed, non-sentinel speaker names in first-seen order
pub fn agenda_speaker_names(agenda: &[AgendaItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    agenda
        .iter()
        .map(|item| item.speaker_name.trim())
        .filter(|name| !name.is_empty() && !is_sentinel(name))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Trimmed particulars of activity rows in first-seen order
pub fn agenda_activities(agenda: &[AgendaItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    agenda
        .iter()
        .filter(|item| item.is_activity)
        .map(|item| item.particulars.trim())
        .filter(|p| !p.is_empty())
        .filter(|p| seen.insert(*p))
        .map(str::to_string)
        .collect()
}

/// Rebuild the speaker roster against the agenda.
///
/// Existing speakers are matched by exact name and kept as-is. Speakers
/// absent from the agenda survive only if they carry a designation or
/// takeaways.
pub fn derive_speakers(agenda: &[AgendaItem], current: &[Speaker]) -> Vec<Speaker> {
    let names = agenda_speaker_names(agenda);

    let mut speakers: Vec<Speaker> = names
        .iter()
        .map(|name| {
            current
                .iter()
                .find(|s| &s.name == name)
                .cloned()
                .unwrap_or_else(|| Speaker::named(name.as_str()))
        })
        .collect();

    speakers.extend(
        current
            .iter()
            .filter(|s| !names.contains(&s.name) && s.has_details())
            .cloned(),
    );

    speakers
}

/// Rebuild the activity list against the agenda, keeping manual entries after the derived ones
pub fn derive_activities(agenda: &[AgendaItem], current: &[String]) -> Vec<String> {
    let mut activities = agenda_activities(agenda);
    let manual: Vec<String> = current
        .iter()
        .filter(|a| !activities.contains(*a))
        .cloned()
        .collect();
    activities.extend(manual);
    activities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(particulars: &str, speaker: &str, is_activity: bool) -> AgendaItem {
        AgendaItem {
            particulars: particulars.to_string(),
            speaker_name: speaker.to_string(),
            is_activity,
            ..Default::default()
        }
    }

    #[test]
    fn test_sentinels_are_excluded() {
        let agenda = vec![
            row("a", "", false),
            row("b", "panel", false),
            row("c", "PANEL", false),
            row("d", "none", false),
            row("e", "None", false),
            row("f", "  Ms. Priya Rai ", false),
        ];
        assert_eq!(agenda_speaker_names(&agenda), vec!["Ms. Priya Rai"]);
    }

    #[test]
    fn test_speaker_names_are_case_sensitive() {
        let agenda = vec![
            row("a", "Dr. Anita Sharma", false),
            row("b", "dr. anita sharma", false),
            row("c", "Dr. Anita Sharma", false),
        ];
        assert_eq!(
            agenda_speaker_names(&agenda),
            vec!["Dr. Anita Sharma", "dr. anita sharma"]
        );
    }

    #[test]
    fn test_existing_speaker_details_survive() {
        let agenda = vec![row("Keynote", "Jane Doe", false)];
        let current = vec![Speaker {
            name: "Jane Doe".into(),
            designation: "Principal".into(),
            takeaways: String::new(),
        }];
        let derived = derive_speakers(&agenda, &current);
        assert_eq!(derived, current);
    }

    #[test]
    fn test_unlinked_speaker_with_details_is_appended() {
        let agenda = vec![row("Keynote", "Jane Doe", false)];
        let current = vec![
            Speaker {
                name: "Unlinked Person".into(),
                designation: String::new(),
                takeaways: "Stories bridge theory and morality.".into(),
            },
            Speaker::named("Dropped Blank"),
        ];
        let derived = derive_speakers(&agenda, &current);
        let names: Vec<&str> = derived.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Jane Doe", "Unlinked Person"]);
    }

    #[test]
    fn test_activities_deduplicated_in_order() {
        let agenda = vec![
            row("Session A", "", true),
            row("Session B", "", false),
            row("Session A", "", true),
        ];
        assert_eq!(derive_activities(&agenda, &[]), vec!["Session A"]);
    }

    #[test]
    fn test_manual_activities_kept_after_derived() {
        let agenda = vec![row(" Curriculum Mapping ", "", true), row("", "", true)];
        let current = vec!["Campus Walk".to_string(), "Curriculum Mapping".to_string()];
        assert_eq!(
            derive_activities(&agenda, &current),
            vec!["Curriculum Mapping", "Campus Walk"]
        );
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let agenda = vec![
            row("Meditation", "Dr. Anita Sharma", true),
            row("Ethics", "Ms. Priya Rai", false),
            row("Mapping", "Panel", true),
        ];
        let current = vec![Speaker {
            name: "Guest".into(),
            designation: "Trustee".into(),
            takeaways: String::new(),
        }];
        let once = derive_speakers(&agenda, &current);
        let twice = derive_speakers(&agenda, &once);
        assert_eq!(once, twice);

        let once = derive_activities(&agenda, &["Extra".to_string()]);
        let twice = derive_activities(&agenda, &once);
        assert_eq!(once, twice);
    }
}
