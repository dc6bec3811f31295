//! # Team dispatch worker
//! This crate hosts the process that keeps team claims honest. It is responsible for:
//! * Opening (and optionally migrating) the dispatch database.
//! * Running the deadline reaper on a fixed cadence, so that claims that were not confirmed within their dispatch
//!   window are released and their orders become snatchable again.
//!
//! ## Configuration
//! The worker is configured via environment variables. See [config](config/index.html) for more information.
pub mod cli;
pub mod config;
pub mod errors;
pub mod reaper_worker;
