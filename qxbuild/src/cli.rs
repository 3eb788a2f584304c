use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// qxbuild - incremental build driver for qooxdoo applications
#[derive(Parser, Debug)]
#[command(name = "qxbuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub project: ProjectArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Project layout overrides. Relative paths are taken from the project directory.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Project root (default: $QXBUILD_PROJECT_DIR or the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Application namespace (default: $QXBUILD_NAMESPACE or the project directory name)
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Class sources [default: src/main/qooxdoo/classes]
    #[arg(long, global = true, value_name = "DIR", env = "QXBUILD_SOURCES_DIR")]
    pub sources_dir: Option<PathBuf>,

    /// Resources [default: src/main/qooxdoo/resources]
    #[arg(long, global = true, value_name = "DIR", env = "QXBUILD_RESOURCES_DIR")]
    pub resources_dir: Option<PathBuf>,

    /// Test classes [default: src/test/qooxdoo]
    #[arg(long, global = true, value_name = "DIR", env = "QXBUILD_TEST_DIR")]
    pub test_dir: Option<PathBuf>,

    /// Translation files [default: src/main/qooxdoo/translation]
    #[arg(long, global = true, value_name = "DIR", env = "QXBUILD_TRANSLATION_DIR")]
    pub translation_dir: Option<PathBuf>,

    /// Parent of the per-namespace configuration directory [default: src/main/qooxdoo/configuration]
    #[arg(long, global = true, value_name = "DIR", env = "QXBUILD_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Parent of the application target [default: target/qooxdoo]
    #[arg(long, global = true, value_name = "DIR", env = "QXBUILD_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Generator cache [default: target/qooxdoo/cache]
    #[arg(long, global = true, value_name = "DIR", env = "QXBUILD_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Directory holding the unpacked qooxdoo-sdk [default: target]
    #[arg(long, global = true, value_name = "DIR", env = "QXBUILD_SDK_PARENT_DIR")]
    pub sdk_parent_dir: Option<PathBuf>,

    /// Generator config file name [default: config.json]
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<String>,

    /// Manifest file name [default: Manifest.json]
    #[arg(long, global = true, value_name = "FILE")]
    pub manifest: Option<String>,

    /// Generator job (default: $QXBUILD_JOB or "build")
    #[arg(long, global = true)]
    pub job: Option<String>,

    /// Python interpreter; "use-bundled" downloads PyPy (default: $QXBUILD_PYTHON or "python")
    #[arg(long, global = true)]
    pub python: Option<String>,

    /// Cache root for downloaded interpreters (default: $QXBUILD_BIN_DIR or the user cache dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub bin_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the generator job when sources or the job changed since the last run
    Compile {
        /// Rebuild even if nothing changed
        #[arg(long, default_value = "false")]
        force: bool,

        /// Extra arguments passed through to generator.py
        #[arg(last = true, value_name = "GENERATOR_ARGS")]
        extra: Vec<String>,
    },

    /// Filter the configuration directory into the application target
    GenerateConfig,

    /// Report whether a compile would regenerate, and why
    Status {
        /// Output as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Interpreter toolchain
    #[command(subcommand)]
    Toolchain(ToolchainAction),

    /// Print TARGET relative to BASE
    Relpath {
        #[arg(value_name = "TARGET")]
        target: String,

        #[arg(value_name = "BASE")]
        base: String,

        /// Separator used in the output, "/" or "\"
        #[arg(long, default_value = "/")]
        separator: char,

        /// Treat BASE as a file (true) or directory (false); probed when omitted
        #[arg(long)]
        base_is_file: Option<bool>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ToolchainAction {
    /// Print the interpreter a compile would use, downloading it if needed
    Resolve,
    /// List the bundled interpreter archives per platform
    List,
}
