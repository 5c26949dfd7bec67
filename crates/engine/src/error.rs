use specforge_core::error::CoreError;
use specforge_core::types::DbId;
use specforge_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed or invalid spec, surfaced synchronously to the submitter.
    #[error("invalid spec: {0}")]
    Spec(String),

    #[error("project {0} not found")]
    ProjectNotFound(DbId),

    #[error("run {0} not found")]
    RunNotFound(DbId),

    /// Ownership mismatch, rejected before any pipeline interaction.
    #[error("not the owner of this resource")]
    Forbidden,

    #[error("daily generation limit reached")]
    DailyCapExceeded,

    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<CoreError> for EngineError {
    fn from(error: CoreError) -> Self {
        Self::Spec(error.to_string())
    }
}
