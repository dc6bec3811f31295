use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {0}: {1}")]
pub struct ConversionError(&'static str, String);

/// Implements `Display` and `FromStr` for a fieldless enum using the variant names, which is also how sqlx stores them.
macro_rules! string_enum {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, stringify!($variant)),)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok(Self::$variant),)+
                    s => Err(ConversionError(stringify!($name), s.to_string())),
                }
            }
        }
    };
}

//--------------------------------------     TeamMember       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TeamRole {
    Leader,
    Member,
}

string_enum!(TeamRole { Leader, Member });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum MemberStatus {
    Active,
    Inactive,
}

string_enum!(MemberStatus { Active, Inactive });

/// A user's membership of a team. Membership is owned by the surrounding system; this engine only reads it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: i64,
    pub team_id: i64,
    pub user_id: i64,
    pub role: TeamRole,
    pub status: MemberStatus,
    pub joined_at: Option<DateTime<Utc>>,
}

impl TeamMember {
    /// Only an active leader may act on behalf of the team.
    pub fn is_active_leader(&self) -> bool {
        self.role == TeamRole::Leader && self.status == MemberStatus::Active
    }

    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order is waiting for a player or team to take it.
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Canceled,
    Refunded,
}

string_enum!(OrderStatusType { Pending, Confirmed, InProgress, Completed, Canceled, Refunded });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum QueueType {
    /// Served by a single player
    Individual,
    /// Served by a team, claimed through a snatch
    Team,
}

string_enum!(QueueType { Individual, Team });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum AssignmentSource {
    Team,
    Manual,
    System,
}

string_enum!(AssignmentSource { Team, Manual, System });

//--------------------------------------        Order       ---------------------------------------------------------
/// The subset of an order's columns that the assignment engine reads and writes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub status: OrderStatusType,
    pub queue_type: QueueType,
    pub assigned_team_id: Option<i64>,
    pub assignment_source: Option<AssignmentSource>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// An order can be snatched when it is still pending and sits in the team queue.
    pub fn is_snatchable(&self) -> bool {
        self.status == OrderStatusType::Pending && self.queue_type == QueueType::Team
    }
}

//--------------------------------------      OrderUpdate      ---------------------------------------------------------
/// A typed partial update for an order. Fields that are `None` are left untouched.
///
/// `assigned_team_id` is doubly optional: `Some(None)` clears the column, `Some(Some(id))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderUpdate {
    pub assigned_team_id: Option<Option<i64>>,
    pub assignment_source: Option<AssignmentSource>,
}

impl OrderUpdate {
    pub fn with_assigned_team(mut self, team_id: i64) -> Self {
        self.assigned_team_id = Some(Some(team_id));
        self
    }

    pub fn clear_assigned_team(mut self) -> Self {
        self.assigned_team_id = Some(None);
        self
    }

    pub fn with_assignment_source(mut self, source: AssignmentSource) -> Self {
        self.assignment_source = Some(source);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assigned_team_id.is_none() && self.assignment_source.is_none()
    }
}

//--------------------------------------   AssignmentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum AssignmentStatus {
    /// The team has claimed the order and is gathering members before the dispatch deadline.
    Dispatching,
    /// Every invited member accepted. Terminal.
    Confirmed,
    /// The claim lapsed or was given up. Terminal.
    Released,
}

string_enum!(AssignmentStatus { Dispatching, Confirmed, Released });

impl AssignmentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Dispatching)
    }

    /// Whether the state machine permits moving from `self` to `to`.
    pub fn can_transition_to(&self, to: AssignmentStatus) -> bool {
        use AssignmentStatus::*;
        matches!((self, to), (Dispatching, Confirmed) | (Dispatching, Released))
    }
}

//--------------------------------------  TeamOrderAssignment  ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TeamOrderAssignment {
    pub id: i64,
    pub order_id: i64,
    pub team_id: i64,
    pub status: AssignmentStatus,
    pub dispatch_deadline: DateTime<Utc>,
    pub locked_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamOrderAssignment {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == AssignmentStatus::Dispatching && self.dispatch_deadline < now
    }
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub order_id: i64,
    pub team_id: i64,
    pub dispatch_deadline: DateTime<Utc>,
    pub locked_at: DateTime<Utc>,
}

impl NewAssignment {
    /// A fresh claim, locked at `now`, that must be confirmed within `window`.
    pub fn new(order_id: i64, team_id: i64, now: DateTime<Utc>, window: chrono::Duration) -> Self {
        Self { order_id, team_id, dispatch_deadline: now + window, locked_at: now }
    }
}

//--------------------------------------   AssignmentMember    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum MemberState {
    Pending,
    Confirmed,
    Declined,
}

string_enum!(MemberState { Pending, Confirmed, Declined });

/// A team member invited to take part in an assignment.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AssignmentMember {
    pub id: i64,
    pub assignment_id: i64,
    pub member_id: i64,
    pub state: MemberState,
    pub confirmed_at: Option<DateTime<Utc>>,
}

//--------------------------------------      PayoutPlan       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ProfitMode {
    /// Proceeds are split equally between participating members
    Default,
    /// Proceeds are split according to the plan's percentages
    Custom,
}

string_enum!(ProfitMode { Default, Custom });

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PayoutShare {
    pub member_id: i64,
    pub percent: i64,
}

impl PayoutShare {
    pub fn new(member_id: i64, percent: i64) -> Self {
        Self { member_id, percent }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPayoutPlan {
    pub id: i64,
    pub assignment_id: i64,
    pub profit_mode: ProfitMode,
    pub shares: Vec<PayoutShare>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayoutPlan {
    pub assignment_id: i64,
    pub profit_mode: ProfitMode,
    pub shares: Vec<PayoutShare>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      AuditEntry       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditEntity {
    Order,
    Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    AssignTeam,
    Release,
    Confirm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub entity_type: AuditEntity,
    pub entity_id: i64,
    pub action: AuditAction,
    pub actor_user_id: Option<i64>,
    pub reason: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl NewAuditEntry {
    pub fn new(entity_type: AuditEntity, entity_id: i64, action: AuditAction) -> Self {
        Self { entity_type, entity_id, action, actor_user_id: None, reason: None, metadata: None }
    }

    pub fn with_actor(mut self, user_id: i64) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_reason<S: Into<String>>(mut self, reason: S) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub entity_type: AuditEntity,
    pub entity_id: i64,
    pub action: AuditAction,
    pub actor_user_id: Option<i64>,
    pub reason: Option<String>,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}
