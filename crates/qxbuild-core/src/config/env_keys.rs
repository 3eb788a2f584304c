//! 环境变量 key 常量与别名定义
//!
//! 主变量优先使用 `QXBUILD_*`，兼容旧插件的 `QOOXDOO_*` 命名。

/// 项目布局
pub mod project {
    pub const QXBUILD_PROJECT_DIR: &str = "QXBUILD_PROJECT_DIR";

    pub const QXBUILD_NAMESPACE: &str = "QXBUILD_NAMESPACE";
    pub const NAMESPACE_ALIASES: &[&str] = &["QOOXDOO_APPLICATION_NAMESPACE"];

    pub const QXBUILD_JOB: &str = "QXBUILD_JOB";
    pub const JOB_ALIASES: &[&str] = &["QOOXDOO_BUILD_JOB"];

    pub const QXBUILD_SOURCE_ENCODING: &str = "QXBUILD_SOURCE_ENCODING";
}

/// 解释器与 toolchain 缓存
pub mod toolchain {
    /// 解释器名称或完整路径；`use-bundled` 表示自动下载
    pub const QXBUILD_PYTHON: &str = "QXBUILD_PYTHON";
    pub const PYTHON_ALIASES: &[&str] = &["QOOXDOO_BUILD_PYTHON"];

    pub const QXBUILD_BIN_DIR: &str = "QXBUILD_BIN_DIR";
    pub const BIN_DIR_ALIASES: &[&str] = &["QOOXDOO_BUILD_BINDIR"];
}

/// 可观测性与日志
pub mod observability {
    pub const QXBUILD_QUIET: &str = "QXBUILD_QUIET";

    pub const QXBUILD_LOG_LEVEL: &str = "QXBUILD_LOG_LEVEL";

    pub const QXBUILD_LOG_JSON: &str = "QXBUILD_LOG_JSON";
}
