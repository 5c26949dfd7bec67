//! The stage compilers bound to each pipeline state.
//!
//! Every stage delegates to a `specforge-codegen` compiler, writes the
//! rendered artifacts under the context's working directory, and reports
//! its outcome as an explicit [`StageResult`]. Compiler errors become
//! failure results, never unwinding.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use specforge_codegen::appfiles;
use specforge_codegen::buildfile::BuildFileCompiler;
use specforge_codegen::deps::DependencyLookup;
use specforge_codegen::dto::{validator_units, DtoCompiler};
use specforge_codegen::entity::{needs_sequence_listener, sequence_listener_unit, EntityCompiler};
use specforge_codegen::enums::EnumCompiler;
use specforge_codegen::error::CodegenError;
use specforge_codegen::mapper::MapperCompiler;
use specforge_codegen::renderer::{source_path, write_unit, Renderer};
use specforge_codegen::rest::{openapi_config_unit, support_unit, RestResourceCompiler};
use specforge_codegen::unit::GenerationUnit;

use crate::context::GenerationContext;
use crate::machine::{PipelineState, StageRegistry};
use crate::stage::{StageCompiler, StageResult};

/// Build the standard registry: every pipeline state bound to its stage,
/// all sharing one renderer.
pub fn standard_registry(
    lookup: Arc<dyn DependencyLookup>,
) -> Result<StageRegistry, crate::error::PipelineError> {
    let renderer = Arc::new(Renderer::new());
    StageRegistry::new(vec![
        (
            PipelineState::Dto,
            Box::new(DtoStage {
                renderer: Arc::clone(&renderer),
            }),
        ),
        (
            PipelineState::Enum,
            Box::new(EnumStage {
                renderer: Arc::clone(&renderer),
            }),
        ),
        (
            PipelineState::Entity,
            Box::new(EntityStage {
                renderer: Arc::clone(&renderer),
            }),
        ),
        (
            PipelineState::RestDoc,
            Box::new(RestDocStage {
                renderer: Arc::clone(&renderer),
            }),
        ),
        (
            PipelineState::Rest,
            Box::new(RestStage {
                renderer: Arc::clone(&renderer),
            }),
        ),
        (PipelineState::RuntimeConfig, Box::new(RuntimeConfigStage)),
        (
            PipelineState::AppFiles,
            Box::new(AppFilesStage {
                renderer: Arc::clone(&renderer),
            }),
        ),
        (PipelineState::ContainerFiles, Box::new(ContainerFilesStage)),
        (
            PipelineState::Scaffold,
            Box::new(ScaffoldStage { renderer, lookup }),
        ),
    ])
}

/// Write a text file at a forward-slash-relative path under the working
/// directory, creating parent directories.
fn write_text(work_dir: &Path, relative: &str, content: &str) -> Result<(), CodegenError> {
    let path = work_dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Render one unit into the source tree and fold its message-catalog
/// fragment into the context.
fn emit_unit(
    renderer: &Renderer,
    ctx: &mut GenerationContext,
    unit: &GenerationUnit,
) -> Result<(), CodegenError> {
    write_unit(
        renderer,
        &ctx.work_dir,
        &ctx.options.base_package,
        ctx.options.language,
        unit,
    )?;
    ctx.messages.extend(unit.messages.iter().cloned());
    Ok(())
}

fn fail(error: CodegenError) -> StageResult {
    StageResult::failure(error.to_string())
}

// ---------------------------------------------------------------------------
// DTO
// ---------------------------------------------------------------------------

/// Compiles the declared DTO classes, their cross-field validator helper
/// classes, and the declared mappers.
pub struct DtoStage {
    renderer: Arc<Renderer>,
}

#[async_trait]
impl StageCompiler for DtoStage {
    fn name(&self) -> &'static str {
        "dto"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> StageResult {
        let dtos = ctx.spec.dtos.clone();
        for dto in &dtos {
            let unit = match DtoCompiler::compile(dto, &ctx.options) {
                Ok(unit) => unit,
                Err(e) => return fail(e),
            };
            if let Err(e) = emit_unit(&self.renderer, ctx, &unit) {
                return fail(e);
            }
        }

        // Validator helpers are shared per base package: skip any that an
        // earlier artifact already wrote.
        for unit in validator_units(&dtos, &ctx.options) {
            let path = source_path(&ctx.work_dir, ctx.options.language, &unit);
            if path.exists() {
                continue;
            }
            if let Err(e) = emit_unit(&self.renderer, ctx, &unit) {
                return fail(e);
            }
        }

        let mappers = match MapperCompiler::compile_all(&ctx.spec, &ctx.options) {
            Ok(units) => units,
            Err(e) => return fail(e),
        };
        let mapper_count = mappers.len();
        for unit in &mappers {
            if let Err(e) = emit_unit(&self.renderer, ctx, unit) {
                return fail(e);
            }
        }

        StageResult::success()
            .detail("dtoClasses", dtos.len().to_string())
            .detail("mapperClasses", mapper_count.to_string())
    }
}

// ---------------------------------------------------------------------------
// Enum
// ---------------------------------------------------------------------------

pub struct EnumStage {
    renderer: Arc<Renderer>,
}

#[async_trait]
impl StageCompiler for EnumStage {
    fn name(&self) -> &'static str {
        "enum"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> StageResult {
        let enums = ctx.spec.enums.clone();
        for decl in &enums {
            let unit = match EnumCompiler::compile(decl, &ctx.options) {
                Ok(unit) => unit,
                Err(e) => return fail(e),
            };
            if let Err(e) = emit_unit(&self.renderer, ctx, &unit) {
                return fail(e);
            }
        }
        StageResult::success().detail("enumClasses", enums.len().to_string())
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

pub struct EntityStage {
    renderer: Arc<Renderer>,
}

#[async_trait]
impl StageCompiler for EntityStage {
    fn name(&self) -> &'static str {
        "entity"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> StageResult {
        let entities = ctx.spec.entities.clone();
        for entity in &entities {
            let unit = match EntityCompiler::compile(entity, &ctx.options) {
                Ok(unit) => unit,
                Err(e) => return fail(e),
            };
            if let Err(e) = emit_unit(&self.renderer, ctx, &unit) {
                return fail(e);
            }
        }

        if needs_sequence_listener(&entities, ctx.options.datastore) {
            let unit = sequence_listener_unit(&ctx.options);
            if let Err(e) = emit_unit(&self.renderer, ctx, &unit) {
                return fail(e);
            }
        }

        StageResult::success().detail("entityClasses", entities.len().to_string())
    }
}

// ---------------------------------------------------------------------------
// REST documentation (swagger)
// ---------------------------------------------------------------------------

/// Emits the OpenAPI configuration class and requests the springdoc
/// starter when the spec enables API documentation.
pub struct RestDocStage {
    renderer: Arc<Renderer>,
}

#[async_trait]
impl StageCompiler for RestDocStage {
    fn name(&self) -> &'static str {
        "rest-doc"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> StageResult {
        if !ctx.spec.openapi {
            return StageResult::success();
        }

        let unit = openapi_config_unit(&ctx.spec, &ctx.options);
        if let Err(e) = emit_unit(&self.renderer, ctx, &unit) {
            return fail(e);
        }
        ctx.extra_dependencies.push("openapi".to_string());
        StageResult::success().detail("openapi", "true")
    }
}

// ---------------------------------------------------------------------------
// REST resources
// ---------------------------------------------------------------------------

pub struct RestStage {
    renderer: Arc<Renderer>,
}

#[async_trait]
impl StageCompiler for RestStage {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> StageResult {
        let exposed: Vec<_> = ctx
            .spec
            .entities
            .iter()
            .filter(|e| e.rest)
            .cloned()
            .collect();
        for entity in &exposed {
            let units = match RestResourceCompiler::compile(entity, &ctx.options) {
                Ok(units) => units,
                Err(e) => return fail(e),
            };
            for unit in &units {
                if let Err(e) = emit_unit(&self.renderer, ctx, unit) {
                    return fail(e);
                }
            }
        }

        // The shared support artifact is written once, and only when some
        // resource needs it.
        if !exposed.is_empty() {
            let unit = support_unit(&ctx.options);
            if let Err(e) = emit_unit(&self.renderer, ctx, &unit) {
                return fail(e);
            }
        }

        StageResult::success().detail("restResources", exposed.len().to_string())
    }
}

// ---------------------------------------------------------------------------
// Runtime configuration (actuator)
// ---------------------------------------------------------------------------

/// Requests the management/ops starter; the app-files stage adds the
/// matching endpoint-exposure properties when it sees the detail flag.
pub struct RuntimeConfigStage;

#[async_trait]
impl StageCompiler for RuntimeConfigStage {
    fn name(&self) -> &'static str {
        "runtime-config"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> StageResult {
        ctx.extra_dependencies.push("actuator".to_string());
        StageResult::success().detail("actuator", "true")
    }
}

// ---------------------------------------------------------------------------
// Application files
// ---------------------------------------------------------------------------

pub struct AppFilesStage {
    renderer: Arc<Renderer>,
}

#[async_trait]
impl StageCompiler for AppFilesStage {
    fn name(&self) -> &'static str {
        "app-files"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> StageResult {
        let unit = appfiles::application_unit(&ctx.spec, &ctx.options);
        if let Err(e) = emit_unit(&self.renderer, ctx, &unit) {
            return fail(e);
        }

        let properties = appfiles::application_properties(&ctx.spec, ctx.flag("actuator"));
        if let Err(e) = write_text(
            &ctx.work_dir,
            "src/main/resources/application.properties",
            &properties,
        ) {
            return fail(e);
        }
        for (relative, content) in appfiles::profile_properties(&ctx.spec) {
            if let Err(e) = write_text(&ctx.work_dir, &relative, &content) {
                return fail(e);
            }
        }

        let catalog = appfiles::messages_properties(&ctx.messages);
        if let Err(e) = write_text(
            &ctx.work_dir,
            "src/main/resources/messages.properties",
            &catalog,
        ) {
            return fail(e);
        }

        if let Err(e) = write_text(&ctx.work_dir, "README.md", &appfiles::readme(&ctx.spec)) {
            return fail(e);
        }
        if let Err(e) = write_text(&ctx.work_dir, ".gitignore", &appfiles::gitignore()) {
            return fail(e);
        }

        StageResult::success()
    }
}

// ---------------------------------------------------------------------------
// Container files
// ---------------------------------------------------------------------------

pub struct ContainerFilesStage;

#[async_trait]
impl StageCompiler for ContainerFilesStage {
    fn name(&self) -> &'static str {
        "container-files"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> StageResult {
        if !ctx.spec.container_compose {
            return StageResult::success();
        }
        let Some(content) = appfiles::compose_file(&ctx.spec) else {
            // Selected datastore runs in-process; nothing to compose.
            return StageResult::success();
        };
        if let Err(e) = write_text(&ctx.work_dir, "compose.yaml", &content) {
            return fail(e);
        }
        StageResult::success().detail("compose", "true")
    }
}

// ---------------------------------------------------------------------------
// Scaffold (build descriptor + wrapper)
// ---------------------------------------------------------------------------

/// Resolves the dependency list and renders the build descriptor pair plus
/// wrapper files. Runs last so it sees every token earlier stages added.
pub struct ScaffoldStage {
    renderer: Arc<Renderer>,
    lookup: Arc<dyn DependencyLookup>,
}

#[async_trait]
impl StageCompiler for ScaffoldStage {
    fn name(&self) -> &'static str {
        "scaffold"
    }

    async fn execute(&self, ctx: &mut GenerationContext) -> StageResult {
        let files = match BuildFileCompiler::compile(
            &ctx.spec,
            &ctx.extra_dependencies,
            self.lookup.as_ref(),
            &self.renderer,
        )
        .await
        {
            Ok(files) => files,
            Err(e) => return fail(e),
        };

        for (relative, content) in &files {
            if let Err(e) = write_text(&ctx.work_dir, relative, content) {
                return fail(e);
            }
        }

        StageResult::success().detail("buildFiles", files.len().to_string())
    }
}
