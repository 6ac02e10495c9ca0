//! Lifecycle and functional event handlers for [`OfflineWorker`](crate::handler::OfflineWorker).

pub mod activate;
pub mod fetch;
pub mod install;
pub mod push;
pub mod sync;

pub use activate::ActivateReport;
pub use fetch::{FetchDisposition, PassReason};
pub use install::{FailedAsset, InstallReport};
pub use push::{ClientAction, Notification, PushPayload};
pub use sync::SyncReport;
