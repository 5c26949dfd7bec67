//! The pipeline state machine.
//!
//! One machine instance drives one run: a fixed linear sequence of compiler
//! stages over a shared [`GenerationContext`]. Each non-terminal state is
//! bound to exactly one [`StageCompiler`]; the binding is validated
//! exhaustively when the registry is built, so a missing stage fails at
//! startup rather than mid-run. The machine does not auto-start — the driver
//! seeds the context, then calls [`PipelineMachine::start`].

use tracing::{debug, info, warn};

use crate::context::GenerationContext;
use crate::error::PipelineError;
use crate::stage::StageCompiler;

/// Pipeline states in execution order, plus the two terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Dto,
    Enum,
    Entity,
    RestDoc,
    Rest,
    RuntimeConfig,
    AppFiles,
    ContainerFiles,
    Scaffold,
    Done,
    Error,
}

impl PipelineState {
    /// The non-terminal states, in the fixed order stages execute.
    pub const SEQUENCE: [PipelineState; 9] = [
        PipelineState::Dto,
        PipelineState::Enum,
        PipelineState::Entity,
        PipelineState::RestDoc,
        PipelineState::Rest,
        PipelineState::RuntimeConfig,
        PipelineState::AppFiles,
        PipelineState::ContainerFiles,
        PipelineState::Scaffold,
    ];

    /// The state entered after this one succeeds.
    pub fn next(self) -> PipelineState {
        match self {
            PipelineState::Dto => PipelineState::Enum,
            PipelineState::Enum => PipelineState::Entity,
            PipelineState::Entity => PipelineState::RestDoc,
            PipelineState::RestDoc => PipelineState::Rest,
            PipelineState::Rest => PipelineState::RuntimeConfig,
            PipelineState::RuntimeConfig => PipelineState::AppFiles,
            PipelineState::AppFiles => PipelineState::ContainerFiles,
            PipelineState::ContainerFiles => PipelineState::Scaffold,
            PipelineState::Scaffold => PipelineState::Done,
            PipelineState::Done | PipelineState::Error => self,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Error)
    }
}

/// Closed mapping from state to its stage compiler.
///
/// Built once per machine; construction fails if any non-terminal state
/// lacks a compiler or is bound twice.
pub struct StageRegistry {
    stages: Vec<(PipelineState, Box<dyn StageCompiler>)>,
}

impl StageRegistry {
    pub fn new(
        stages: Vec<(PipelineState, Box<dyn StageCompiler>)>,
    ) -> Result<Self, PipelineError> {
        for state in PipelineState::SEQUENCE {
            let count = stages.iter().filter(|(s, _)| *s == state).count();
            match count {
                0 => return Err(PipelineError::MissingCompiler(state)),
                1 => {}
                _ => return Err(PipelineError::DuplicateCompiler(state)),
            }
        }
        Ok(Self { stages })
    }

    fn compiler_for(&self, state: PipelineState) -> &dyn StageCompiler {
        // Construction guaranteed exactly one entry per non-terminal state.
        self.stages
            .iter()
            .find(|(s, _)| *s == state)
            .map(|(_, c)| c.as_ref())
            .expect("registry validated at construction")
    }
}

/// Hook invoked synchronously after every state change. The driver calls
/// hooks in registration order, so a persist hook registered before a
/// publish hook always observes the transition first.
pub trait TransitionHook: Send + Sync {
    fn after_transition(&self, from: PipelineState, to: PipelineState, ctx: &GenerationContext);
}

/// Outcome of a completed machine: the terminal state it halted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    Done,
    Error,
}

/// Single-use driver for one run's stage sequence.
pub struct PipelineMachine {
    registry: StageRegistry,
    hooks: Vec<Box<dyn TransitionHook>>,
    started: bool,
}

impl PipelineMachine {
    pub fn new(registry: StageRegistry) -> Self {
        Self {
            registry,
            hooks: Vec::new(),
            started: false,
        }
    }

    pub fn with_hook(mut self, hook: Box<dyn TransitionHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Run every stage in order until DONE, or until the first failure
    /// transitions to ERROR.
    ///
    /// A reported stage failure stores its message in the context error
    /// slot. Already-written files are not rolled back; the caller discards
    /// the working directory wholesale.
    pub async fn start(
        &mut self,
        ctx: &mut GenerationContext,
    ) -> Result<PipelineOutcome, PipelineError> {
        if self.started {
            return Err(PipelineError::AlreadyStarted);
        }
        self.started = true;

        let mut state = PipelineState::Dto;
        loop {
            let compiler = self.registry.compiler_for(state);
            debug!(stage = compiler.name(), "Executing pipeline stage");
            let result = compiler.execute(ctx).await;

            if result.ok {
                for (key, value) in result.details {
                    ctx.insert_detail(key, value);
                }
                let next = state.next();
                self.fire_hooks(state, next, ctx);
                if next == PipelineState::Done {
                    info!("Pipeline completed");
                    return Ok(PipelineOutcome::Done);
                }
                state = next;
            } else {
                let message = result
                    .error
                    .unwrap_or_else(|| format!("stage '{}' failed", compiler.name()));
                warn!(stage = compiler.name(), error = %message, "Pipeline stage failed");
                ctx.error = Some(message);
                self.fire_hooks(state, PipelineState::Error, ctx);
                return Ok(PipelineOutcome::Error);
            }
        }
    }

    fn fire_hooks(&self, from: PipelineState, to: PipelineState, ctx: &GenerationContext) {
        for hook in &self.hooks {
            hook.after_transition(from, to, ctx);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use specforge_core::spec::parser::parse_spec;

    use super::*;
    use crate::stage::StageResult;

    struct FixedStage {
        name: &'static str,
        result: fn() -> StageResult,
    }

    #[async_trait]
    impl StageCompiler for FixedStage {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn execute(&self, _ctx: &mut GenerationContext) -> StageResult {
            (self.result)()
        }
    }

    fn all_ok_registry() -> StageRegistry {
        let stages = PipelineState::SEQUENCE
            .into_iter()
            .map(|state| {
                let stage: Box<dyn StageCompiler> = Box::new(FixedStage {
                    name: "ok",
                    result: StageResult::success,
                });
                (state, stage)
            })
            .collect();
        StageRegistry::new(stages).unwrap()
    }

    fn context() -> GenerationContext {
        let spec = parse_spec("app: {}\n").unwrap();
        GenerationContext::new(std::path::PathBuf::from("/tmp/unused"), spec)
    }

    #[test]
    fn registry_rejects_missing_stage() {
        let err = StageRegistry::new(Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingCompiler(PipelineState::Dto)
        ));
    }

    #[test]
    fn registry_rejects_duplicate_stage() {
        let mut stages: Vec<(PipelineState, Box<dyn StageCompiler>)> = PipelineState::SEQUENCE
            .into_iter()
            .map(|state| {
                let stage: Box<dyn StageCompiler> = Box::new(FixedStage {
                    name: "ok",
                    result: StageResult::success,
                });
                (state, stage)
            })
            .collect();
        stages.push((
            PipelineState::Rest,
            Box::new(FixedStage {
                name: "extra",
                result: StageResult::success,
            }),
        ));
        let err = StageRegistry::new(stages).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DuplicateCompiler(PipelineState::Rest)
        ));
    }

    #[test]
    fn linear_order_ends_at_done() {
        let mut state = PipelineState::Dto;
        let mut visited = vec![state];
        while !state.is_terminal() {
            state = state.next();
            visited.push(state);
        }
        assert_eq!(state, PipelineState::Done);
        assert_eq!(visited.len(), PipelineState::SEQUENCE.len() + 1);
    }

    #[tokio::test]
    async fn all_stages_succeed_reaches_done() {
        let mut machine = PipelineMachine::new(all_ok_registry());
        let mut ctx = context();
        let outcome = machine.start(&mut ctx).await.unwrap();
        assert_eq!(outcome, PipelineOutcome::Done);
        assert!(ctx.error.is_none());
    }

    #[tokio::test]
    async fn machine_is_single_use() {
        let mut machine = PipelineMachine::new(all_ok_registry());
        let mut ctx = context();
        machine.start(&mut ctx).await.unwrap();
        let err = machine.start(&mut ctx).await.unwrap_err();
        assert!(matches!(err, PipelineError::AlreadyStarted));
    }

    #[tokio::test]
    async fn failing_stage_transitions_to_error_and_stops() {
        let stages: Vec<(PipelineState, Box<dyn StageCompiler>)> = PipelineState::SEQUENCE
            .into_iter()
            .map(|state| {
                let stage: Box<dyn StageCompiler> = if state == PipelineState::Entity {
                    Box::new(FixedStage {
                        name: "entity",
                        result: || StageResult::failure("bad relation"),
                    })
                } else {
                    Box::new(FixedStage {
                        name: "ok",
                        result: StageResult::success,
                    })
                };
                (state, stage)
            })
            .collect();
        let mut machine = PipelineMachine::new(StageRegistry::new(stages).unwrap());
        let mut ctx = context();
        let outcome = machine.start(&mut ctx).await.unwrap();
        assert_eq!(outcome, PipelineOutcome::Error);
        assert_eq!(ctx.error.as_deref(), Some("bad relation"));
    }

    #[tokio::test]
    async fn details_merge_into_context_on_success() {
        let stages: Vec<(PipelineState, Box<dyn StageCompiler>)> = PipelineState::SEQUENCE
            .into_iter()
            .map(|state| {
                let stage: Box<dyn StageCompiler> = if state == PipelineState::RuntimeConfig {
                    Box::new(FixedStage {
                        name: "runtime",
                        result: || StageResult::success().detail("actuator", "true"),
                    })
                } else {
                    Box::new(FixedStage {
                        name: "ok",
                        result: StageResult::success,
                    })
                };
                (state, stage)
            })
            .collect();
        let mut machine = PipelineMachine::new(StageRegistry::new(stages).unwrap());
        let mut ctx = context();
        machine.start(&mut ctx).await.unwrap();
        assert!(ctx.flag("actuator"));
    }

    struct RecordingHook {
        transitions: Arc<Mutex<Vec<(PipelineState, PipelineState)>>>,
    }

    impl TransitionHook for RecordingHook {
        fn after_transition(
            &self,
            from: PipelineState,
            to: PipelineState,
            _ctx: &GenerationContext,
        ) {
            self.transitions.lock().unwrap().push((from, to));
        }
    }

    #[tokio::test]
    async fn hooks_fire_after_every_transition() {
        let transitions = Arc::new(Mutex::new(Vec::new()));
        let mut machine = PipelineMachine::new(all_ok_registry()).with_hook(Box::new(
            RecordingHook {
                transitions: Arc::clone(&transitions),
            },
        ));
        let mut ctx = context();
        machine.start(&mut ctx).await.unwrap();

        let seen = transitions.lock().unwrap();
        assert_eq!(seen.len(), PipelineState::SEQUENCE.len());
        assert_eq!(seen[0], (PipelineState::Dto, PipelineState::Enum));
        assert_eq!(
            seen.last().copied(),
            Some((PipelineState::Scaffold, PipelineState::Done))
        );
    }
}
