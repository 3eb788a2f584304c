//! Resolved project layout: CLI overrides, then environment, then defaults.

use std::path::PathBuf;

use qxbuild_core::config::{CacheConfig, ProjectConfig};
use qxbuild_core::generation::SourceRootSet;

use crate::cli::ProjectArgs;

pub const DEFAULT_SOURCES_DIR: &str = "src/main/qooxdoo/classes";
pub const DEFAULT_RESOURCES_DIR: &str = "src/main/qooxdoo/resources";
pub const DEFAULT_TEST_DIR: &str = "src/test/qooxdoo";
pub const DEFAULT_TRANSLATION_DIR: &str = "src/main/qooxdoo/translation";
pub const DEFAULT_CONFIG_DIR: &str = "src/main/qooxdoo/configuration";
pub const DEFAULT_OUTPUT_DIR: &str = "target/qooxdoo";
pub const DEFAULT_CACHE_DIR: &str = "target/qooxdoo/cache";
pub const DEFAULT_SDK_PARENT_DIR: &str = "target";
pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_MANIFEST_FILE: &str = "Manifest.json";

const SDK_DIR_NAME: &str = "qooxdoo-sdk";
const SDK_VERSION_FILE: &str = "version.txt";
const FALLBACK_NAMESPACE: &str = "application";

#[derive(Debug, Clone)]
pub struct ProjectLayout {
    pub project_dir: PathBuf,
    pub namespace: String,
    pub sources_dir: PathBuf,
    pub resources_dir: PathBuf,
    pub test_dir: PathBuf,
    pub translation_dir: PathBuf,
    /// Parent of the per-namespace configuration directory.
    pub configuration_dir: PathBuf,
    pub output_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub sdk_parent_dir: PathBuf,
    pub config_file: String,
    pub manifest_file: String,
    pub job: String,
    pub python: String,
    pub source_encoding: String,
    pub bin_dir: PathBuf,
}

impl ProjectLayout {
    pub fn resolve(args: &ProjectArgs, env: &ProjectConfig) -> Self {
        let project_dir = absolute(args.project_dir.clone().unwrap_or_else(|| env.project_dir.clone()));
        let namespace = args
            .namespace
            .clone()
            .or_else(|| env.namespace.clone())
            .or_else(|| {
                project_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| FALLBACK_NAMESPACE.to_string());
        let rooted = |path: PathBuf| -> PathBuf {
            if path.is_absolute() {
                path
            } else {
                project_dir.join(path)
            }
        };
        let under = |value: &Option<PathBuf>, default: &str| -> PathBuf {
            rooted(value.clone().unwrap_or_else(|| PathBuf::from(default)))
        };
        let bin_dir = args
            .bin_dir
            .clone()
            .map(&rooted)
            .unwrap_or_else(|| CacheConfig::resolve_bin_dir(&project_dir));

        Self {
            namespace,
            sources_dir: under(&args.sources_dir, DEFAULT_SOURCES_DIR),
            resources_dir: under(&args.resources_dir, DEFAULT_RESOURCES_DIR),
            test_dir: under(&args.test_dir, DEFAULT_TEST_DIR),
            translation_dir: under(&args.translation_dir, DEFAULT_TRANSLATION_DIR),
            configuration_dir: under(&args.config_dir, DEFAULT_CONFIG_DIR),
            output_dir: under(&args.output_dir, DEFAULT_OUTPUT_DIR),
            cache_dir: under(&args.cache_dir, DEFAULT_CACHE_DIR),
            sdk_parent_dir: under(&args.sdk_parent_dir, DEFAULT_SDK_PARENT_DIR),
            config_file: args
                .config
                .clone()
                .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string()),
            manifest_file: args
                .manifest
                .clone()
                .unwrap_or_else(|| DEFAULT_MANIFEST_FILE.to_string()),
            job: args.job.clone().unwrap_or_else(|| env.job.clone()),
            python: args.python.clone().unwrap_or_else(|| env.python.clone()),
            source_encoding: env.source_encoding.clone(),
            bin_dir,
            project_dir,
        }
    }

    /// `<output>/<namespace>`: where the generated config and the marker live.
    pub fn application_target(&self) -> PathBuf {
        self.output_dir.join(&self.namespace)
    }

    /// `<configuration>/<namespace>`
    pub fn config_dir(&self) -> PathBuf {
        self.configuration_dir.join(&self.namespace)
    }

    pub fn sdk_dir(&self) -> PathBuf {
        self.sdk_parent_dir.join(SDK_DIR_NAME)
    }

    /// Trimmed contents of `<sdk>/version.txt`, when the SDK ships one.
    pub fn sdk_version(&self) -> Option<String> {
        let raw = std::fs::read_to_string(self.sdk_dir().join(SDK_VERSION_FILE)).ok()?;
        let version = raw.trim();
        (!version.is_empty()).then(|| version.to_string())
    }

    pub fn generator_script(&self) -> PathBuf {
        self.sdk_dir().join("tool").join("bin").join("generator.py")
    }

    /// Generated config file inside the application target.
    pub fn generated_config(&self) -> PathBuf {
        self.application_target().join(&self.config_file)
    }

    /// Directories whose changes invalidate a previous generation. The whole
    /// configuration directory is scanned, shared files and other namespaces
    /// included.
    pub fn source_roots(&self) -> SourceRootSet {
        SourceRootSet::new([
            self.sources_dir.clone(),
            self.resources_dir.clone(),
            self.test_dir.clone(),
            self.configuration_dir.clone(),
        ])
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}
