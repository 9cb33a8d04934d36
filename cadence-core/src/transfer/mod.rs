//! Transfer orchestration and the progress event stream.
//!
//! A transfer runs as a spawned task that owns the whole pipeline - fetch,
//! match, write - and reports through an ordered event channel. Consumers
//! (the HTTP handler, the CLI) only ever see the event stream.

pub mod events;
pub mod orchestrator;
pub mod summary;

#[cfg(test)]
pub(crate) mod test_mocks;

pub use events::{EventDecoder, Severity, TransferEvent};
pub use orchestrator::{
    CancelToken, TransferContext, TransferRequest, TransferStream, spawn_transfer,
};
pub use summary::{CollectionOutcome, TransferSummary};
