use std::collections::BTreeMap;
use std::fmt;

use workshop_core::WorkshopRecord;

use crate::error::MutationError;
use crate::mutation::MutationBox;

/// Handle for one applied-but-unconfirmed mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tracks optimistic mutations whose remote writes are still in flight.
///
/// Each applied mutation is held under its own ticket until the remote
/// outcome is known; it is then either confirmed (forgotten) or rolled back.
/// Tickets resolve independently and in any order.
#[derive(Default)]
pub struct PendingLedger {
    pending: BTreeMap<Ticket, MutationBox>,
    next_ticket: u64,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a mutation to the collection and hold it until resolved
    pub fn apply(
        &mut self,
        mut mutation: MutationBox,
        records: &mut Vec<WorkshopRecord>,
    ) -> Result<Ticket, MutationError> {
        mutation.apply(records)?;

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.pending.insert(ticket, mutation);
        Ok(ticket)
    }

    /// The remote write succeeded; drop the inverse
    pub fn confirm(&mut self, ticket: Ticket) -> bool {
        self.pending.remove(&ticket).is_some()
    }

    /// The remote write failed; revert the local change.
    ///
    /// When a newer mutation of the same record is still in flight, the
    /// collection shows that newer value. The failed mutation's prior state
    /// is then handed to it instead, so a later failure of the newer write
    /// restores the state from before both.
    pub fn rollback(&mut self, ticket: Ticket, records: &mut Vec<WorkshopRecord>) -> bool {
        let Some(mut mutation) = self.pending.remove(&ticket) else {
            return false;
        };

        let successor = self
            .pending
            .range_mut(ticket..)
            .map(|(_, m)| m)
            .find(|m| m.record_id() == mutation.record_id());
        match successor {
            Some(next) => {
                if let Some(prior) = mutation.take_prior() {
                    next.rebase(prior);
                }
            }
            None => {
                mutation.revert(records);
            }
        }
        true
    }

    /// Check if a ticket is still awaiting its remote outcome
    pub fn is_pending(&self, ticket: Ticket) -> bool {
        self.pending.contains_key(&ticket)
    }

    /// Get the number of unresolved mutations
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Ids of records with an unresolved mutation, oldest first
    pub fn pending_ids(&self) -> Vec<&str> {
        self.pending.values().map(|m| m.record_id()).collect()
    }

    /// Get the description of a pending mutation
    pub fn description(&self, ticket: Ticket) -> Option<&str> {
        self.pending.get(&ticket).map(|m| m.description())
    }

    /// Forget every pending mutation without reverting it.
    ///
    /// Outstanding tickets become unknown: confirming or rolling them back
    /// afterwards does nothing.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl fmt::Debug for PendingLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingLedger")
            .field("pending_count", &self.pending.len())
            .field("next_ticket", &self.next_ticket)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::{InsertRecord, RemoveRecord, ReplaceRecord};
    use workshop_core::WorkshopDetails;

    fn record(id: &str, title: &str) -> WorkshopRecord {
        WorkshopRecord::new(
            id,
            WorkshopDetails {
                title: title.to_string(),
                ..Default::default()
            },
        )
    }

    fn ids(records: &[WorkshopRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_confirm_keeps_change() {
        let mut records = vec![record("1", "a")];
        let mut ledger = PendingLedger::new();

        let ticket = ledger
            .apply(Box::new(InsertRecord::new(record("2", "b"))), &mut records)
            .unwrap();
        assert!(ledger.is_pending(ticket));
        assert_eq!(ledger.description(ticket), Some("Insert record"));

        assert!(ledger.confirm(ticket));
        assert!(!ledger.is_pending(ticket));
        assert!(!ledger.rollback(ticket, &mut records));
        assert_eq!(ids(&records), ["2", "1"]);
    }

    #[test]
    fn test_rollback_failed_insert() {
        let mut records = vec![record("1", "a")];
        let mut ledger = PendingLedger::new();

        let ticket = ledger
            .apply(Box::new(InsertRecord::new(record("2", "b"))), &mut records)
            .unwrap();
        assert!(ledger.rollback(ticket, &mut records));
        assert_eq!(ids(&records), ["1"]);
        assert_eq!(ledger.pending_count(), 0);
    }

    #[test]
    fn test_failed_apply_is_not_tracked() {
        let mut records = vec![record("1", "a")];
        let mut ledger = PendingLedger::new();

        let result = ledger.apply(Box::new(RemoveRecord::new("9")), &mut records);
        assert_eq!(result, Err(MutationError::NotFound("9".into())));
        assert_eq!(ledger.pending_count(), 0);
    }

    #[test]
    fn test_interleaved_resolution() {
        let mut records = vec![record("1", "a"), record("2", "b"), record("3", "c")];
        let mut ledger = PendingLedger::new();

        let edit = ledger
            .apply(Box::new(ReplaceRecord::new(record("1", "a2"))), &mut records)
            .unwrap();
        let delete = ledger
            .apply(Box::new(RemoveRecord::new("3")), &mut records)
            .unwrap();
        assert_ne!(edit, delete);
        assert_eq!(ledger.pending_ids(), ["1", "3"]);

        // The delete fails remotely while the edit is still in flight
        assert!(ledger.rollback(delete, &mut records));
        assert_eq!(ids(&records), ["1", "2", "3"]);
        assert_eq!(records[0].title(), "a2");

        assert!(ledger.confirm(edit));
        assert_eq!(records[0].title(), "a2");
    }

    #[test]
    fn test_rollback_out_of_order() {
        let mut records = vec![record("1", "a")];
        let mut ledger = PendingLedger::new();

        let first = ledger
            .apply(Box::new(InsertRecord::new(record("2", "b"))), &mut records)
            .unwrap();
        let second = ledger
            .apply(Box::new(InsertRecord::new(record("3", "c"))), &mut records)
            .unwrap();

        ledger.rollback(first, &mut records);
        assert_eq!(ids(&records), ["3", "1"]);
        ledger.confirm(second);
        assert_eq!(ids(&records), ["3", "1"]);
    }

    #[test]
    fn test_overlapping_replace_earlier_fails() {
        let mut records = vec![record("1", "v1")];
        let mut ledger = PendingLedger::new();

        let first = ledger
            .apply(Box::new(ReplaceRecord::new(record("1", "v2"))), &mut records)
            .unwrap();
        let second = ledger
            .apply(Box::new(ReplaceRecord::new(record("1", "v3"))), &mut records)
            .unwrap();

        assert!(ledger.rollback(first, &mut records));
        assert_eq!(records[0].title(), "v3");
        assert!(ledger.confirm(second));
        assert_eq!(records[0].title(), "v3");
    }

    #[test]
    fn test_overlapping_replace_later_confirmed_first() {
        let mut records = vec![record("1", "v1")];
        let mut ledger = PendingLedger::new();

        let first = ledger
            .apply(Box::new(ReplaceRecord::new(record("1", "v2"))), &mut records)
            .unwrap();
        let second = ledger
            .apply(Box::new(ReplaceRecord::new(record("1", "v3"))), &mut records)
            .unwrap();

        assert!(ledger.confirm(second));
        assert!(ledger.rollback(first, &mut records));
        assert_eq!(records[0].title(), "v3");
    }

    #[test]
    fn test_overlapping_replace_both_fail() {
        let mut records = vec![record("1", "v1")];
        let mut ledger = PendingLedger::new();

        let first = ledger
            .apply(Box::new(ReplaceRecord::new(record("1", "v2"))), &mut records)
            .unwrap();
        let second = ledger
            .apply(Box::new(ReplaceRecord::new(record("1", "v3"))), &mut records)
            .unwrap();

        ledger.rollback(first, &mut records);
        ledger.rollback(second, &mut records);
        assert_eq!(records[0].title(), "v1");

        // Resolution order does not matter
        let mut records = vec![record("1", "v1")];
        let first = ledger
            .apply(Box::new(ReplaceRecord::new(record("1", "v2"))), &mut records)
            .unwrap();
        let second = ledger
            .apply(Box::new(ReplaceRecord::new(record("1", "v3"))), &mut records)
            .unwrap();
        ledger.rollback(second, &mut records);
        assert_eq!(records[0].title(), "v2");
        ledger.rollback(first, &mut records);
        assert_eq!(records[0].title(), "v1");
    }

    #[test]
    fn test_failed_insert_then_failed_edit_of_it() {
        let mut records = vec![record("1", "a")];
        let mut ledger = PendingLedger::new();

        let insert = ledger
            .apply(Box::new(InsertRecord::new(record("2", "b"))), &mut records)
            .unwrap();
        let edit = ledger
            .apply(Box::new(ReplaceRecord::new(record("2", "b2"))), &mut records)
            .unwrap();

        ledger.rollback(insert, &mut records);
        assert_eq!(ids(&records), ["2", "1"]);
        ledger.rollback(edit, &mut records);
        assert_eq!(ids(&records), ["1"]);
    }

    #[test]
    fn test_clear_forgets_tickets() {
        let mut records = vec![record("1", "a")];
        let mut ledger = PendingLedger::new();

        let ticket = ledger
            .apply(Box::new(ReplaceRecord::new(record("1", "a2"))), &mut records)
            .unwrap();
        ledger.clear();
        assert_eq!(ledger.pending_count(), 0);

        // A reloaded collection is left alone by the late outcome
        let mut reloaded = vec![record("1", "remote")];
        assert!(!ledger.rollback(ticket, &mut reloaded));
        assert!(!ledger.confirm(ticket));
        assert_eq!(reloaded[0].title(), "remote");
    }

    #[test]
    fn test_ticket_display() {
        let mut records = Vec::new();
        let mut ledger = PendingLedger::new();
        let ticket = ledger
            .apply(Box::new(InsertRecord::new(record("1", "a"))), &mut records)
            .unwrap();
        assert_eq!(ticket.to_string(), "#0");
        assert!(format!("{ledger:?}").contains("pending_count: 1"));
    }
}
