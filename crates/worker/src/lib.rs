//! The offline request cache for the portfolio site.
//!
//! [`OfflineWorker`] runs the install and activate lifecycle, answers
//! intercepted page requests from its stores or the network, replays
//! queued contact submissions and builds push notifications. [`host`]
//! drives it from line-delimited JSON events.

pub mod error;
pub mod events;
pub mod handler;
pub mod host;

#[cfg(test)]
mod testing;

pub use error::WorkerError;
pub use events::{
    ActivateReport, ClientAction, FailedAsset, FetchDisposition, InstallReport, Notification, PassReason, SyncReport,
};
pub use handler::{OfflineWorker, WorkerState};
