//! Error taxonomy shared by every qxbuild crate.
//!
//! Library code returns [`BuildResult`]; the CLI layer wraps these in
//! `anyhow` with command-level context.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for qxbuild library operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors raised by the build-orchestration core.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A required directory or file is missing, or an option is unusable.
    #[error("configuration error at '{}': {message}", path.display())]
    Configuration { path: PathBuf, message: String },

    /// Non-200 response or transport failure while downloading.
    #[error("download of {url} failed: {message}")]
    Network { url: String, message: String },

    /// Unknown, corrupt or unusable archive content.
    #[error("archive {archive}: {message}")]
    Archive { archive: String, message: String },

    /// Target and base share no common path prefix (or cannot be normalized).
    #[error("cannot relativize '{target}' against '{base}': {message}")]
    PathResolution {
        target: String,
        base: String,
        message: String,
    },

    /// The external generator exited with a non-zero status.
    #[error("'{command}' exited with {}\n{output}", code.map_or_else(|| "a signal".to_string(), |c| format!("code {}", c)))]
    ProcessExecution {
        command: String,
        code: Option<i32>,
        output: String,
    },

    /// Filesystem failure outside the categories above.
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub fn configuration(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Configuration {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn network(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn archive(archive: impl Into<String>, message: impl ToString) -> Self {
        Self::Archive {
            archive: archive.into(),
            message: message.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_display_names_path() {
        let err = BuildError::configuration("/p/config/app", "does not exist or is not a directory");
        assert_eq!(
            err.to_string(),
            "configuration error at '/p/config/app': does not exist or is not a directory"
        );
    }

    #[test]
    fn test_process_execution_display() {
        let err = BuildError::ProcessExecution {
            command: "python generator.py".into(),
            code: Some(2),
            output: "boom".into(),
        };
        assert_eq!(err.to_string(), "'python generator.py' exited with code 2\nboom");

        let killed = BuildError::ProcessExecution {
            command: "python".into(),
            code: None,
            output: String::new(),
        };
        assert!(killed.to_string().contains("a signal"));
    }
}
