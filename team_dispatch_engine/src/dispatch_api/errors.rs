use thiserror::Error;

use crate::traits::{
    AssignmentStoreError,
    MembershipError,
    OrderGatewayError,
    PayoutPlanError,
    RosterError,
};

/// Every failure the dispatch APIs can report. None of them are retried by the engine itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Order is not eligible: {0}")]
    OrderNotEligible(String),
    #[error("Assignment conflict: {0}")]
    AssignmentConflict(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl DispatchError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AssignmentConflict(_))
    }
}

impl From<MembershipError> for DispatchError {
    fn from(e: MembershipError) -> Self {
        match e {
            MembershipError::DatabaseError(s) => Self::Persistence(s),
        }
    }
}

impl From<OrderGatewayError> for DispatchError {
    fn from(e: OrderGatewayError) -> Self {
        match e {
            OrderGatewayError::DatabaseError(s) => Self::Persistence(s),
            OrderGatewayError::OrderNotFound(id) => Self::NotFound(format!("Order #{id}")),
        }
    }
}

impl From<AssignmentStoreError> for DispatchError {
    fn from(e: AssignmentStoreError) -> Self {
        match e {
            AssignmentStoreError::DatabaseError(s) => Self::Persistence(s),
            AssignmentStoreError::ActiveAssignmentExists(order_id) => {
                Self::AssignmentConflict(format!("Order #{order_id} has already been claimed by a team"))
            },
            AssignmentStoreError::AssignmentNotFound(id) => Self::NotFound(format!("Assignment #{id}")),
        }
    }
}

impl From<RosterError> for DispatchError {
    fn from(e: RosterError) -> Self {
        match e {
            RosterError::DatabaseError(s) => Self::Persistence(s),
        }
    }
}

impl From<PayoutPlanError> for DispatchError {
    fn from(e: PayoutPlanError) -> Self {
        match e {
            PayoutPlanError::DatabaseError(s) => Self::Persistence(s),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn store_errors_map_onto_the_taxonomy() {
        let e: DispatchError = AssignmentStoreError::ActiveAssignmentExists(900).into();
        assert!(e.is_conflict());
        let e: DispatchError = OrderGatewayError::OrderNotFound(4).into();
        assert_eq!(e, DispatchError::NotFound("Order #4".into()));
        let e: DispatchError = PayoutPlanError::DatabaseError("disk full".into()).into();
        assert_eq!(e, DispatchError::Persistence("disk full".into()));
    }
}
