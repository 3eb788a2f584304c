mod cli;
mod commands;
mod generator;
mod layout;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, ToolchainAction};
use layout::ProjectLayout;
use qxbuild_core::config::ProjectConfig;

fn main() -> Result<()> {
    qxbuild_core::observability::init_tracing();
    let cli = Cli::parse();
    let layout = ProjectLayout::resolve(&cli.project, &ProjectConfig::from_env());

    match cli.command {
        Commands::Compile { force, extra } => {
            commands::compile::cmd_compile(&layout, force, &extra)?;
        }
        Commands::GenerateConfig => {
            commands::generate_config::cmd_generate_config(&layout)?;
        }
        Commands::Status { json } => {
            commands::status::cmd_status(&layout, json)?;
        }
        Commands::Toolchain(action) => match action {
            ToolchainAction::Resolve => commands::toolchain::cmd_resolve(&layout)?,
            ToolchainAction::List => commands::toolchain::cmd_list(&layout)?,
        },
        Commands::Relpath {
            target,
            base,
            separator,
            base_is_file,
        } => {
            commands::relpath::cmd_relpath(&target, &base, separator, base_is_file)?;
        }
    }
    Ok(())
}
