//! `qxbuild toolchain`: interpreter resolution and the bundled archive table.

use anyhow::{Context, Result};
use qxbuild_toolchain::{table, Bootstrapper, HostPlatform};
use tracing::info;

use crate::layout::ProjectLayout;

/// Resolve the configured interpreter, provisioning the bundled one if asked for.
pub fn resolve_interpreter(layout: &ProjectLayout) -> Result<String> {
    let mut bootstrapper = Bootstrapper::new(&layout.bin_dir);
    let interpreter = bootstrapper
        .resolve(&layout.python)
        .with_context(|| format!("Failed to provision python interpreter '{}'", layout.python))?;
    info!("Using python interpreter: {}", interpreter);
    Ok(interpreter)
}

/// `qxbuild toolchain resolve`
pub fn cmd_resolve(layout: &ProjectLayout) -> Result<()> {
    let interpreter = resolve_interpreter(layout)?;
    println!("{}", interpreter);
    Ok(())
}

/// `qxbuild toolchain list`
pub fn cmd_list(layout: &ProjectLayout) -> Result<()> {
    let host = HostPlatform::detect();
    println!("Cache root: {}", layout.bin_dir.display());
    for (platform, spec) in table::entries() {
        let marker = if *platform == host { "*" } else { " " };
        let cached = spec.executable_path(&layout.bin_dir).is_file();
        println!(
            "{} {:<16} {}{}",
            marker,
            platform.to_string(),
            spec.download_url,
            if cached { "  (cached)" } else { "" }
        );
    }
    if table::lookup(host).is_none() {
        println!("No bundled interpreter for {}; 'use-bundled' falls back to python", host);
    }
    Ok(())
}
