use workshop_core::WorkshopRecord;

use crate::error::MutationError;

/// Type alias for boxed mutations
pub type MutationBox = Box<dyn Mutation>;

/// State of a record before a mutation touched it
#[derive(Debug, Clone, PartialEq)]
pub enum Prior {
    /// No record with the id existed
    Absent,
    /// The record and the position it held
    Present { index: usize, record: WorkshopRecord },
}

/// A local change to the record collection that can be reverted.
///
/// `apply` captures the record's prior state. `revert` locates its target by
/// record id rather than by position, and only acts while the collection
/// still shows what this mutation left there, so changes made in between are
/// never overwritten.
pub trait Mutation: std::fmt::Debug + Send + Sync {
    /// Apply the change to the collection
    fn apply(&mut self, records: &mut Vec<WorkshopRecord>) -> Result<(), MutationError>;

    /// Undo a previously applied change; returns whether anything was restored
    fn revert(&mut self, records: &mut Vec<WorkshopRecord>) -> bool;

    /// Hand over the captured prior state, leaving nothing to revert
    fn take_prior(&mut self) -> Option<Prior>;

    /// Adopt an older prior state from an abandoned mutation of the same record
    fn rebase(&mut self, prior: Prior);

    /// Id of the record this mutation targets
    fn record_id(&self) -> &str;

    /// Get a description of this mutation (for logs)
    fn description(&self) -> &str;
}

fn position(records: &[WorkshopRecord], id: &str) -> Option<usize> {
    records.iter().position(|r| r.id == id)
}

/// Put `prior` back for `id`, provided the collection still holds `written`
fn restore(
    records: &mut Vec<WorkshopRecord>,
    id: &str,
    written: Option<&WorkshopRecord>,
    prior: Prior,
) -> bool {
    let current = position(records, id);
    let untouched = match (current, written) {
        (Some(index), Some(written)) => records[index] == *written,
        (None, None) => true,
        _ => false,
    };
    if !untouched {
        return false;
    }

    match (current, prior) {
        (Some(index), Prior::Present { record, .. }) => records[index] = record,
        (Some(index), Prior::Absent) => {
            records.remove(index);
        }
        // Original slot, clamped in case the collection shrank meanwhile
        (None, Prior::Present { index, record }) => {
            let index = index.min(records.len());
            records.insert(index, record);
        }
        (None, Prior::Absent) => {}
    }
    true
}

/// Add a new record at the front
#[derive(Debug)]
pub struct InsertRecord {
    record: WorkshopRecord,
    prior: Option<Prior>,
}

impl InsertRecord {
    pub fn new(record: WorkshopRecord) -> Self {
        Self {
            record,
            prior: None,
        }
    }
}

impl Mutation for InsertRecord {
    fn apply(&mut self, records: &mut Vec<WorkshopRecord>) -> Result<(), MutationError> {
        if position(records, &self.record.id).is_some() {
            return Err(MutationError::DuplicateId(self.record.id.clone()));
        }
        records.insert(0, self.record.clone());
        self.prior = Some(Prior::Absent);
        Ok(())
    }

    fn revert(&mut self, records: &mut Vec<WorkshopRecord>) -> bool {
        match self.prior.take() {
            Some(prior) => restore(records, &self.record.id, Some(&self.record), prior),
            None => false,
        }
    }

    fn take_prior(&mut self) -> Option<Prior> {
        self.prior.take()
    }

    fn rebase(&mut self, prior: Prior) {
        self.prior = Some(prior);
    }

    fn record_id(&self) -> &str {
        &self.record.id
    }

    fn description(&self) -> &str {
        "Insert record"
    }
}

/// Replace the record sharing the new record's id
#[derive(Debug)]
pub struct ReplaceRecord {
    record: WorkshopRecord,
    prior: Option<Prior>,
}

impl ReplaceRecord {
    pub fn new(record: WorkshopRecord) -> Self {
        Self {
            record,
            prior: None,
        }
    }
}

impl Mutation for ReplaceRecord {
    fn apply(&mut self, records: &mut Vec<WorkshopRecord>) -> Result<(), MutationError> {
        let index = position(records, &self.record.id)
            .ok_or_else(|| MutationError::NotFound(self.record.id.clone()))?;
        // Capture old state for revert
        let previous = std::mem::replace(&mut records[index], self.record.clone());
        self.prior = Some(Prior::Present {
            index,
            record: previous,
        });
        Ok(())
    }

    fn revert(&mut self, records: &mut Vec<WorkshopRecord>) -> bool {
        match self.prior.take() {
            Some(prior) => restore(records, &self.record.id, Some(&self.record), prior),
            None => false,
        }
    }

    fn take_prior(&mut self) -> Option<Prior> {
        self.prior.take()
    }

    fn rebase(&mut self, prior: Prior) {
        self.prior = Some(prior);
    }

    fn record_id(&self) -> &str {
        &self.record.id
    }

    fn description(&self) -> &str {
        "Replace record"
    }
}

/// Remove a record by id
#[derive(Debug)]
pub struct RemoveRecord {
    id: String,
    prior: Option<Prior>,
}

impl RemoveRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prior: None,
        }
    }
}

impl Mutation for RemoveRecord {
    fn apply(&mut self, records: &mut Vec<WorkshopRecord>) -> Result<(), MutationError> {
        let index =
            position(records, &self.id).ok_or_else(|| MutationError::NotFound(self.id.clone()))?;
        let record = records.remove(index);
        self.prior = Some(Prior::Present { index, record });
        Ok(())
    }

    fn revert(&mut self, records: &mut Vec<WorkshopRecord>) -> bool {
        match self.prior.take() {
            Some(prior) => restore(records, &self.id, None, prior),
            None => false,
        }
    }

    fn take_prior(&mut self) -> Option<Prior> {
        self.prior.take()
    }

    fn rebase(&mut self, prior: Prior) {
        self.prior = Some(prior);
    }

    fn record_id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> &str {
        "Remove record"
    }
}
