#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Malformed spec text, a missing required section, or a violated
    /// spec invariant.
    #[error("Invalid spec: {0}")]
    Spec(String),
}
