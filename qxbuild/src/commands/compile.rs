//! `qxbuild compile`: regenerate the application when its inputs changed.

use std::time::Instant;

use anyhow::{Context, Result};
use qxbuild_core::generation::{check_staleness, GenerationMarker};
use tracing::{info, warn};

use super::toolchain::resolve_interpreter;
use crate::generator::GeneratorInvocation;
use crate::layout::ProjectLayout;

/// What a compile run ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    Skipped,
    Generated,
}

pub fn compile(layout: &ProjectLayout, force: bool, extra: &[String]) -> Result<CompileOutcome> {
    let app_target = layout.application_target();
    let previous = GenerationMarker::load(&app_target);
    let staleness = check_staleness(previous.as_ref(), &layout.source_roots(), &layout.job, force);
    if !staleness.is_stale() {
        info!("No qooxdoo sources or job changed, skipping application generation");
        return Ok(CompileOutcome::Skipped);
    }
    info!("Regenerating '{}': {}", layout.namespace, staleness.describe());

    // Stamped before the run so edits made while the generator works count next time.
    let marker = GenerationMarker::started_now(&layout.job);
    let started = Instant::now();

    let script_check = GeneratorInvocation::for_layout(layout, String::new(), extra);
    script_check.check_script()?;
    let interpreter = resolve_interpreter(layout)?;
    let invocation = GeneratorInvocation {
        interpreter,
        ..script_check
    };
    invocation
        .run()
        .with_context(|| format!("Generator job '{}' failed", layout.job))?;

    if let Err(e) = marker.store(&app_target) {
        warn!("Failed to record generation marker: {}", e);
    }
    info!("DONE in {} seconds", started.elapsed().as_secs());
    Ok(CompileOutcome::Generated)
}

/// `qxbuild compile [--force] [-- extra]`
pub fn cmd_compile(layout: &ProjectLayout, force: bool, extra: &[String]) -> Result<()> {
    compile(layout, force, extra).map(|_| ())
}
