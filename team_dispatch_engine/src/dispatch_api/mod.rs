//! # Team dispatch public API
//!
//! The `dispatch_api` module exposes the programmatic API of the team dispatch engine.
//!
//! * [`snatch_api`] lets team leaders claim team-queued orders, give them up again, and inspect an order's
//!   assignment history.
//! * [`reaper_api`] releases claims whose dispatch deadline passed without confirmation.
//! * [`confirmation_api`] manages the roster of members taking part in an assignment, and confirms the assignment
//!   once everyone has accepted.
//! * [`payout_api`] validates and stores how the proceeds of an assignment are split.
//!
//! # API usage
//!
//! Every API is created from a backend that implements the collaborator traits it needs, plus a [`Clock`].
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use team_dispatch_engine::{helpers::SystemClock, SnatchApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = SnatchApi::new(db, Arc::new(SystemClock));
//! let assignment = api.snatch_order(leader_id, order_id, team_id).await?;
//! ```
//!
//! [`Clock`]: crate::helpers::Clock
pub mod assignment_objects;
pub mod confirmation_api;
pub mod errors;
mod guards;
pub mod payout_api;
pub mod reaper_api;
pub mod snatch_api;

#[cfg(test)]
mod mocks;
