//! Pipeline execution for one claimed run.
//!
//! The queue worker drives executions through the [`RunExecutor`] trait so
//! tests can substitute a controllable implementation; production uses
//! [`PipelineExecutor`], which owns the working directory for the run's
//! lifetime and discards it wholesale afterwards.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use specforge_codegen::archive::zip_dir;
use specforge_codegen::deps::DependencyLookup;
use specforge_core::spec::parser::parse_spec;
use specforge_core::spec::ApplicationSpec;
use specforge_db::models::{Project, Run};
use specforge_pipeline::context::GenerationContext;
use specforge_pipeline::machine::{PipelineMachine, PipelineOutcome};
use specforge_pipeline::stages::standard_registry;

/// Executes one run to completion. Returns the produced archive bytes, or
/// the short failure message stored on the run.
#[async_trait]
pub trait RunExecutor: Send + Sync {
    async fn execute(&self, project: &Project, run: &Run) -> Result<Vec<u8>, String>;
}

/// The real executor: parse the project's spec, drive the stage machine
/// over a fresh working directory, zip the result.
pub struct PipelineExecutor {
    work_root: PathBuf,
    lookup: Arc<dyn DependencyLookup>,
}

impl PipelineExecutor {
    pub fn new(work_root: PathBuf, lookup: Arc<dyn DependencyLookup>) -> Self {
        Self { work_root, lookup }
    }

    async fn generate(&self, spec: ApplicationSpec, work_dir: PathBuf) -> Result<Vec<u8>, String> {
        let registry = standard_registry(Arc::clone(&self.lookup)).map_err(|e| e.to_string())?;
        let mut ctx = GenerationContext::new(work_dir, spec);
        let mut machine = PipelineMachine::new(registry);

        match machine.start(&mut ctx).await.map_err(|e| e.to_string())? {
            PipelineOutcome::Done => zip_dir(&ctx.work_dir).map_err(|e| e.to_string()),
            PipelineOutcome::Error => Err(ctx
                .error
                .unwrap_or_else(|| "generation failed".to_string())),
        }
    }
}

#[async_trait]
impl RunExecutor for PipelineExecutor {
    async fn execute(&self, project: &Project, run: &Run) -> Result<Vec<u8>, String> {
        // Validated at submission; a parse failure here means the stored
        // spec was tampered with out of band.
        let spec = parse_spec(&project.spec_text).map_err(|e| e.to_string())?;

        // Run ids are unique, so the directory name cannot collide.
        let work_dir = self.work_root.join(format!("run-{}", run.id));
        fs::create_dir_all(&work_dir).map_err(|e| e.to_string())?;

        let result = self.generate(spec, work_dir.clone()).await;

        // The working directory is discarded wholesale, success or not.
        if let Err(e) = fs::remove_dir_all(&work_dir) {
            tracing::warn!(run_id = run.id, error = %e, "Failed to remove working directory");
        }
        result
    }
}
