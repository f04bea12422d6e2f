pub mod derive;
pub mod field;

pub use derive::{agenda_activities, agenda_speaker_names, derive_activities, derive_speakers};
pub use field::{
    clamp_count, parse_count, parse_number, AgendaPatch, Direction, ExpenseField, ListField, NestedField,
    ScalarField, SpeakerField,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::category::{Category, UNCATEGORIZED};
use crate::error::FormError;
use crate::record::{
    generate_id, AgendaItem, Budget, Draft, Expense, Feedback, Metrics, Speaker, WorkshopRecord,
};

/// Select-box value that switches the form into custom category entry
pub const CREATE_NEW: &str = "CREATE_NEW";

/// A value picked in the category selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySelection {
    Value(Category),
    CreateNew,
}

impl FromStr for CategorySelection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == CREATE_NEW {
            Ok(CategorySelection::CreateNew)
        } else {
            Ok(CategorySelection::Value(Category::from(s)))
        }
    }
}

/// A draft as created for a brand new record
pub fn blank_draft(today: NaiveDate) -> Draft {
    Draft {
        date: today.format("%Y-%m-%d").to_string(),
        agenda: vec![AgendaItem::default()],
        metrics: Metrics::default(),
        feedback: Feedback {
            average_rating: 5.0,
            qualitative_comments: vec![String::new()],
        },
        budget: Budget {
            allocated: 0.0,
            expenses: vec![Expense::default()],
        },
        action_plan: vec![String::new()],
        ..Default::default()
    }
}

/// Form state for creating or editing one workshop record.
///
/// Every agenda mutation re-derives `speakers` and `activities` before
/// returning, so the draft is always consistent with its agenda.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopForm {
    draft: Draft,
    /// Free-text category while custom entry is active
    #[serde(default)]
    custom_category: Option<String>,
    /// Id of the record being edited, if any
    #[serde(default)]
    editing: Option<String>,
}

impl Default for WorkshopForm {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkshopForm {
    /// Start a new record dated today
    pub fn new() -> Self {
        Self::new_on(chrono::Local::now().date_naive())
    }

    pub fn new_on(today: NaiveDate) -> Self {
        Self {
            draft: blank_draft(today),
            custom_category: None,
            editing: None,
        }
    }

    /// Hydrate a form from an existing record for editing
    pub fn edit(record: &WorkshopRecord) -> Self {
        let draft = record.details.clone();
        let custom_category = match &draft.category {
            Category::Custom(text) => Some(text.clone()),
            Category::Known(_) => None,
        };
        let mut form = Self {
            draft,
            custom_category,
            editing: Some(record.id.clone()),
        };
        form.recompute_derived();
        form
    }

    /// Wrap an arbitrary draft, e.g. one submitted by a client
    pub fn from_draft(draft: Draft) -> Self {
        let mut form = Self {
            draft,
            custom_category: None,
            editing: None,
        };
        form.recompute_derived();
        form
    }

    /// Mark the form as editing the record with `id`; finalizing keeps that id
    pub fn with_editing(mut self, id: impl Into<String>) -> Self {
        self.editing = Some(id.into());
        self
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn is_custom_category(&self) -> bool {
        self.custom_category.is_some()
    }

    pub fn custom_category(&self) -> Option<&str> {
        self.custom_category.as_deref()
    }

    // Scalar fields

    pub fn set_field(&mut self, field: ScalarField, value: &str) -> Result<(), FormError> {
        let draft = &mut self.draft;
        match field {
            ScalarField::Title => draft.title = value.to_string(),
            ScalarField::Theme => draft.theme = value.to_string(),
            ScalarField::Lead => draft.lead = value.to_string(),
            ScalarField::Date => draft.date = value.to_string(),
            ScalarField::Venue => draft.venue = value.to_string(),
            ScalarField::Frequency => draft.frequency = value.parse()?,
        }
        Ok(())
    }

    /// Select a category, or switch into custom entry with [`CategorySelection::CreateNew`]
    pub fn set_category(&mut self, selection: CategorySelection) {
        match selection {
            CategorySelection::CreateNew => {
                self.custom_category = Some(String::new());
                self.draft.category = Category::Custom(String::new());
            }
            CategorySelection::Value(category) => {
                self.custom_category = None;
                self.draft.category = category;
            }
        }
    }

    /// Update the free-text category; enters custom mode if not already active
    pub fn set_custom_category(&mut self, text: &str) {
        self.custom_category = Some(text.to_string());
        self.draft.category = Category::Custom(text.to_string());
    }

    pub fn set_nested_field(&mut self, field: NestedField, value: &str) {
        let draft = &mut self.draft;
        match field {
            NestedField::ParticipantCount => draft.metrics.participant_count = parse_count(value),
            NestedField::Demographic => draft.metrics.demographic = value.to_string(),
            NestedField::Allocated => draft.budget.allocated = parse_number(value).max(0.0),
            NestedField::AverageRating => {
                draft.feedback.average_rating = parse_number(value).clamp(0.0, 5.0)
            }
        }
    }

    pub fn set_attachment(&mut self, url: impl Into<String>, name: impl Into<String>) {
        self.draft.attachment_url = Some(url.into());
        self.draft.attachment_name = Some(name.into());
    }

    pub fn clear_attachment(&mut self) {
        self.draft.attachment_url = None;
        self.draft.attachment_name = None;
    }

    // Agenda

    /// Merge the set fields of `patch` into the agenda row at `index`
    pub fn upsert_agenda(&mut self, index: usize, patch: AgendaPatch) -> Result<(), FormError> {
        let len = self.draft.agenda.len();
        let item = self
            .draft
            .agenda
            .get_mut(index)
            .ok_or(FormError::IndexOutOfRange {
                collection: "agenda",
                index,
                len,
            })?;

        if let Some(v) = patch.particulars {
            item.particulars = v;
        }
        if let Some(v) = patch.start_time {
            item.start_time = v;
        }
        if let Some(v) = patch.end_time {
            item.end_time = v;
        }
        if let Some(v) = patch.speaker_name {
            item.speaker_name = v;
        }
        if let Some(v) = patch.remarks {
            item.remarks = v;
        }
        if let Some(v) = patch.is_activity {
            item.is_activity = v;
        }

        self.recompute_derived();
        Ok(())
    }

    /// Swap the row at `index` with its neighbour. Returns false at the boundaries.
    pub fn move_agenda(&mut self, index: usize, direction: Direction) -> bool {
        let len = self.draft.agenda.len();
        let target = match direction {
            Direction::Up if index > 0 && index < len => index - 1,
            Direction::Down if index + 1 < len => index + 1,
            _ => return false,
        };
        self.draft.agenda.swap(index, target);
        self.recompute_derived();
        true
    }

    pub fn append_agenda(&mut self, item: AgendaItem) {
        self.draft.agenda.push(item);
        self.recompute_derived();
    }

    /// Remove an agenda row. The last remaining row is never removed.
    pub fn remove_agenda(&mut self, index: usize) -> bool {
        if self.draft.agenda.len() <= 1 || index >= self.draft.agenda.len() {
            return false;
        }
        self.draft.agenda.remove(index);
        self.recompute_derived();
        true
    }

    // Speakers

    pub fn upsert_speaker(
        &mut self,
        index: usize,
        field: SpeakerField,
        value: &str,
    ) -> Result<(), FormError> {
        let len = self.draft.speakers.len();
        let speaker = self
            .draft
            .speakers
            .get_mut(index)
            .ok_or(FormError::IndexOutOfRange {
                collection: "speakers",
                index,
                len,
            })?;
        match field {
            SpeakerField::Name => speaker.name = value.to_string(),
            SpeakerField::Designation => speaker.designation = value.to_string(),
            SpeakerField::Takeaways => speaker.takeaways = value.to_string(),
        }
        Ok(())
    }

    pub fn append_speaker(&mut self, speaker: Speaker) {
        self.draft.speakers.push(speaker);
    }

    pub fn remove_speaker(&mut self, index: usize) -> bool {
        if index >= self.draft.speakers.len() {
            return false;
        }
        self.draft.speakers.remove(index);
        true
    }

    // Budget expenses

    pub fn upsert_expense(
        &mut self,
        index: usize,
        field: ExpenseField,
        value: &str,
    ) -> Result<(), FormError> {
        let len = self.draft.budget.expenses.len();
        let expense = self
            .draft
            .budget
            .expenses
            .get_mut(index)
            .ok_or(FormError::IndexOutOfRange {
                collection: "expenses",
                index,
                len,
            })?;
        match field {
            ExpenseField::Description => expense.description = value.to_string(),
            ExpenseField::Amount => expense.amount = parse_number(value),
        }
        Ok(())
    }

    pub fn append_expense(&mut self, expense: Expense) {
        self.draft.budget.expenses.push(expense);
    }

    pub fn remove_expense(&mut self, index: usize) -> bool {
        if index >= self.draft.budget.expenses.len() {
            return false;
        }
        self.draft.budget.expenses.remove(index);
        true
    }

    /// Total of all expense rows
    pub fn total_expenses(&self) -> f64 {
        self.draft.budget.total_expenses()
    }

    // String lists

    fn list_mut(&mut self, field: ListField) -> &mut Vec<String> {
        match field {
            ListField::ActionPlan => &mut self.draft.action_plan,
            ListField::Comments => &mut self.draft.feedback.qualitative_comments,
            ListField::Activities => &mut self.draft.activities,
        }
    }

    pub fn set_list_item(
        &mut self,
        field: ListField,
        index: usize,
        value: &str,
    ) -> Result<(), FormError> {
        let list = self.list_mut(field);
        let len = list.len();
        let slot = list.get_mut(index).ok_or(FormError::IndexOutOfRange {
            collection: field.name(),
            index,
            len,
        })?;
        *slot = value.to_string();
        Ok(())
    }

    pub fn append_list_item(&mut self, field: ListField, value: &str) {
        self.list_mut(field).push(value.to_string());
    }

    pub fn remove_list_item(&mut self, field: ListField, index: usize) -> bool {
        let list = self.list_mut(field);
        if index >= list.len() {
            return false;
        }
        list.remove(index);
        true
    }

    /// Re-derive speakers and activities from the agenda.
    ///
    /// Each list is only replaced when its derived value differs from the
    /// current one. Returns whether anything changed.
    fn recompute_derived(&mut self) -> bool {
        let mut changed = false;

        let speakers = derive_speakers(&self.draft.agenda, &self.draft.speakers);
        if speakers != self.draft.speakers {
            self.draft.speakers = speakers;
            changed = true;
        }

        let activities = derive_activities(&self.draft.agenda, &self.draft.activities);
        if activities != self.draft.activities {
            self.draft.activities = activities;
            changed = true;
        }

        changed
    }

    /// Freeze the draft into a record, generating an id for new records
    pub fn finalize(self) -> WorkshopRecord {
        self.finalize_with(generate_id)
    }

    /// Freeze the draft into a record, calling `new_id` only when creating
    pub fn finalize_with(self, new_id: impl FnOnce() -> String) -> WorkshopRecord {
        let mut draft = self.draft;

        let category = match self.custom_category {
            Some(text) => Category::from(text.trim()),
            None => draft.category,
        };
        draft.category = if category.is_empty() {
            Category::Custom(UNCATEGORIZED.to_string())
        } else {
            category
        };

        let id = self.editing.unwrap_or_else(new_id);
        WorkshopRecord::new(id, draft)
    }
}
