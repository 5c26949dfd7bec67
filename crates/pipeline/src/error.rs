use crate::machine::PipelineState;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("No stage compiler registered for state {0:?}")]
    MissingCompiler(PipelineState),

    #[error("More than one stage compiler registered for state {0:?}")]
    DuplicateCompiler(PipelineState),

    #[error("Pipeline machine instances are single-use; this one already ran")]
    AlreadyStarted,
}
