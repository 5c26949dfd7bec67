//! The contract every pipeline stage compiler implements.

use async_trait::async_trait;

use crate::context::GenerationContext;

/// Explicit stage outcome. Expected failures are values, never unwinding.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub ok: bool,
    /// Key/value details the driver merges into the context on success.
    pub details: Vec<(String, String)>,
    pub error: Option<String>,
}

impl StageResult {
    pub fn success() -> Self {
        Self {
            ok: true,
            details: Vec::new(),
            error: None,
        }
    }

    /// Attach a detail entry to a success result.
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            details: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// One stage compiler, bound to exactly one pipeline state.
///
/// Side effects are confined to the context's working directory and the
/// returned detail map; executing twice against the same context writes
/// the same files again (idempotent).
#[async_trait]
pub trait StageCompiler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, ctx: &mut GenerationContext) -> StageResult;
}
