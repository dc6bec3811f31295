use thiserror::Error;

use crate::db_types::NewAuditEntry;

#[derive(Debug, Clone, Error)]
pub enum AuditLogError {
    #[error("Could not write audit entry: {0}")]
    WriteError(String),
}

impl From<sqlx::Error> for AuditLogError {
    fn from(e: sqlx::Error) -> Self {
        AuditLogError::WriteError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait AuditLogger {
    async fn append(&self, entry: NewAuditEntry) -> Result<(), AuditLogError>;
}
