//! SQLite-backed named cache stores.
//!
//! This module provides persistent, version-named request/response stores
//! using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Request identity keys using SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - A durable queue of contact submissions awaiting replay

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod stores;
pub mod submissions;

pub use crate::Error;

pub use connection::CacheDb;
pub use hash::RequestKey;
pub use submissions::PendingSubmission;
