//! Core types and shared functionality for folio-sw.
//!
//! This crate provides:
//! - Named cache stores and the pending submission queue, backed by SQLite
//! - The request/response model and the static routing table
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod contact;
pub mod error;
pub mod http;
pub mod routes;

pub use cache::{CacheDb, PendingSubmission, RequestKey};
pub use config::{AppConfig, CacheNames, ConfigError, PrecachePolicy};
pub use contact::ContactSubmission;
pub use error::Error;
pub use http::{CachedResponse, Request, RequestMode};
pub use routes::{RouteClass, RouteTable, Strategy};
