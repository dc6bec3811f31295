//! Team Dispatch Engine
//!
//! The team dispatch engine decides which team gets to serve a team-queued order, and on what terms. Several team
//! leaders may race to claim ("snatch") the same order; exactly one of them wins. The winning team then has a
//! dispatch window in which to gather and confirm its members, after which an unconfirmed claim is released
//! automatically so that the order can be snatched again.
//!
//! The library is divided into three main sections:
//! 1. The collaborator contracts ([`mod@traits`]). The engine never talks to a database directly. Team membership,
//!    orders, assignments, rosters, payout plans and the audit trail are each reached through a narrow trait.
//!    The data types passed through those traits are defined in [`mod@db_types`] and are public.
//! 2. A SQLite backend ([`SqliteDatabase`]) that implements every one of those traits. The one-claim-per-order
//!    guarantee lives in its schema, not in process memory.
//! 3. The public API ([`mod@dispatch_api`]). [`SnatchApi`] claims and releases orders, [`ReaperApi`] reclaims
//!    assignments whose deadline has passed, [`ConfirmationApi`] manages the assignment roster and
//!    [`PayoutPlanApi`] validates and stores how the proceeds are split.
//!
//! Every API takes its notion of "now" from a [`helpers::Clock`], so that deadline logic can be driven
//! deterministically in tests.
pub mod db_types;
pub mod dispatch_api;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(all(feature = "sqlite", any(feature = "test_utils", test)))]
pub mod test_utils;

pub use dispatch_api::{
    assignment_objects,
    confirmation_api::ConfirmationApi,
    errors::DispatchError,
    payout_api::PayoutPlanApi,
    reaper_api::ReaperApi,
    snatch_api::SnatchApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
