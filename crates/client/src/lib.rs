//! Client code for folio-sw.
//!
//! This crate provides the network seam used by the offline cache and the
//! codec for replaying contact submissions to the relay.

pub mod fetch;
pub mod relay;

pub use fetch::{FetchClient, FetchConfig, Network, resolve, same_origin};
pub use relay::{RelayOutcome, RelayResponse, relay_outcome, relay_request};
