//! # Collaborator contracts
//!
//! The assignment engine never talks to a database directly. Everything it needs from the outside world is expressed
//! as one trait per responsibility, and a backend (e.g. [`crate::SqliteDatabase`]) implements whichever of them it
//! supports.
//!
//! * [`MembershipLookup`] resolves a user's role and status within a team. Membership is owned elsewhere.
//! * [`OrderGateway`] reads the latest committed state of an order and applies typed partial updates to it.
//! * [`AssignmentStore`] owns the `TeamOrderAssignment` rows, and is where the one-claim-per-order guarantee lives.
//! * [`AssignmentRoster`] tracks which team members were invited to an assignment, and whether they accepted.
//! * [`PayoutPlanStore`] persists how an assignment's proceeds are split.
//! * [`AuditLogger`] is a best-effort operation trail.
mod assignment_roster;
mod assignment_store;
mod audit_logger;
mod membership;
mod order_gateway;
mod payout_plans;

pub use assignment_roster::{AssignmentRoster, RosterError};
pub use assignment_store::{AssignmentStore, AssignmentStoreError};
pub use audit_logger::{AuditLogError, AuditLogger};
pub use membership::{MembershipError, MembershipLookup};
pub use order_gateway::{OrderGateway, OrderGatewayError};
pub use payout_plans::{PayoutPlanError, PayoutPlanStore};
