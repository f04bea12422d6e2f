pub mod error;
pub mod ledger;
pub mod mutation;

pub use error::MutationError;
pub use ledger::{PendingLedger, Ticket};
pub use mutation::{InsertRecord, Mutation, MutationBox, Prior, RemoveRecord, ReplaceRecord};
