//! 按领域分组的配置结构体
//!
//! 从环境变量加载，统一 fallback 逻辑。CLI 参数在上层覆盖这些值。

use super::env_keys::{observability as obv_keys, project, toolchain};
use super::loader::{env_bool, env_optional, env_or};
use std::path::PathBuf;

/// 默认 generator job
pub const DEFAULT_JOB: &str = "build";
/// 默认解释器：直接使用系统 PATH 中的 python
pub const DEFAULT_PYTHON: &str = "python";

/// 可观测性配置：quiet、log_level、log_json
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            super::loader::load_dotenv();
            Self {
                quiet: env_bool(obv_keys::QXBUILD_QUIET, &[], false),
                log_level: env_or(obv_keys::QXBUILD_LOG_LEVEL, &[], || {
                    "qxbuild=info".to_string()
                }),
                log_json: env_bool(obv_keys::QXBUILD_LOG_JSON, &[], false),
            }
        })
    }
}

/// Toolchain 缓存目录配置
#[derive(Debug, Clone)]
pub struct CacheConfig;

impl CacheConfig {
    /// 显式配置的解释器缓存目录（`QXBUILD_BIN_DIR`）
    pub fn bin_dir() -> Option<String> {
        super::loader::load_dotenv();
        env_optional(toolchain::QXBUILD_BIN_DIR, toolchain::BIN_DIR_ALIASES)
    }

    /// 解释器缓存根目录：显式配置 → 用户缓存目录 → `<project>/.bin`
    pub fn resolve_bin_dir(project_dir: &std::path::Path) -> PathBuf {
        Self::bin_dir()
            .map(PathBuf::from)
            .or_else(|| dirs::cache_dir().map(|d| d.join("qxbuild").join("toolchains")))
            .unwrap_or_else(|| project_dir.join(".bin"))
    }
}

/// 项目级配置：项目根目录、namespace、job、解释器
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub project_dir: PathBuf,
    /// 未设置时由调用方使用项目目录名
    pub namespace: Option<String>,
    pub job: String,
    pub python: String,
    pub source_encoding: String,
}

impl ProjectConfig {
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        let project_dir = env_optional(project::QXBUILD_PROJECT_DIR, &[])
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        Self {
            project_dir,
            namespace: env_optional(project::QXBUILD_NAMESPACE, project::NAMESPACE_ALIASES),
            job: env_or(project::QXBUILD_JOB, project::JOB_ALIASES, || {
                DEFAULT_JOB.to_string()
            }),
            python: env_or(toolchain::QXBUILD_PYTHON, toolchain::PYTHON_ALIASES, || {
                DEFAULT_PYTHON.to_string()
            }),
            source_encoding: env_or(project::QXBUILD_SOURCE_ENCODING, &[], || {
                "UTF-8".to_string()
            }),
        }
    }
}
