//! Real-estate listing watcher.
//!
//! Pulls listing records from a search source, drops the ones surfaced by earlier runs,
//! evaluates the rest against property and school-tier criteria, and hands the net-new
//! matches to a notifier. See [`workflows::watch`] for the ingestion pipeline.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
