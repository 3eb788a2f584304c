//! Launch the qooxdoo `generator.py` job.

use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use qxbuild_core::{BuildError, BuildResult};
use tracing::{debug, info};

use crate::layout::ProjectLayout;

#[derive(Debug, Clone)]
pub struct GeneratorInvocation {
    pub interpreter: String,
    pub script: PathBuf,
    pub config: PathBuf,
    pub job: String,
    pub extra: Vec<String>,
    pub working_dir: PathBuf,
}

impl GeneratorInvocation {
    pub fn for_layout(layout: &ProjectLayout, interpreter: String, extra: &[String]) -> Self {
        Self {
            interpreter,
            script: layout.generator_script(),
            config: layout.generated_config(),
            job: layout.job.clone(),
            extra: extra.to_vec(),
            working_dir: layout.application_target(),
        }
    }

    /// `<script> --no-progress-indicator --config <config> <job> [extra…]`
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            self.script.clone().into_os_string(),
            "--no-progress-indicator".into(),
            "--config".into(),
            self.config.clone().into_os_string(),
            self.job.clone().into(),
        ];
        args.extend(self.extra.iter().map(OsString::from));
        args
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.interpreter.clone())
            .chain(self.args().iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check the generator script is present before spending time on a run.
    pub fn check_script(&self) -> BuildResult<()> {
        if self.script.is_file() {
            Ok(())
        } else {
            Err(BuildError::configuration(
                &self.script,
                "generator script does not exist or is not readable",
            ))
        }
    }

    /// Run to completion, logging each output line as it arrives, and
    /// return the combined output. A non-zero exit becomes
    /// [`BuildError::ProcessExecution`].
    pub fn run(&self) -> BuildResult<String> {
        info!("Starting '{}' job using external Python interpreter...", self.job);
        debug!("Command line: '{}'", self.command_line());

        let start_failed = |detail: String| BuildError::ProcessExecution {
            command: self.command_line(),
            code: None,
            output: detail,
        };
        let mut child = Command::new(&self.interpreter)
            .args(self.args())
            .current_dir(existing_dir(&self.working_dir))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| start_failed(format!("failed to start: {}", e)))?;

        let stderr = child.stderr.take();
        let stderr_pump = thread::spawn(move || stderr.map(pump_lines).unwrap_or_default());
        let mut combined = child.stdout.take().map(pump_lines).unwrap_or_default();
        combined.push_str(&stderr_pump.join().unwrap_or_default());

        let status = child
            .wait()
            .map_err(|e| start_failed(format!("failed to wait for generator: {}", e)))?;
        if !status.success() {
            return Err(BuildError::ProcessExecution {
                command: self.command_line(),
                code: status.code(),
                output: combined,
            });
        }
        Ok(combined)
    }
}

/// Forward each line to the log at info level and keep a copy.
fn pump_lines<R: Read>(reader: R) -> String {
    let mut reader = BufReader::new(reader);
    let mut collected = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let trimmed = line.trim_end();
                if !trimmed.trim().is_empty() {
                    info!(target: "qxbuild::generator", "{}", trimmed);
                }
                collected.push_str(&line);
            }
            Err(e) => {
                debug!("generator output stream closed: {}", e);
                break;
            }
        }
    }
    collected
}

/// The application target may not exist yet on a first run.
fn existing_dir(dir: &Path) -> &Path {
    if dir.is_dir() {
        dir
    } else {
        Path::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(interpreter: &str, script: PathBuf, dir: &Path) -> GeneratorInvocation {
        GeneratorInvocation {
            interpreter: interpreter.to_string(),
            script,
            config: dir.join("config.json"),
            job: "build".to_string(),
            extra: vec!["-m".to_string(), "BUILD_PATH:out".to_string()],
            working_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn test_argument_order() {
        let inv = invocation("python", PathBuf::from("/sdk/tool/bin/generator.py"), Path::new("/app"));
        assert_eq!(
            inv.command_line(),
            "python /sdk/tool/bin/generator.py --no-progress-indicator --config /app/config.json build -m BUILD_PATH:out"
        );
    }

    #[test]
    fn test_missing_script_is_configuration_error() {
        let tmp = tempfile::tempdir().unwrap();
        let inv = invocation("python", tmp.path().join("generator.py"), tmp.path());
        let err = inv.check_script().unwrap_err();
        assert!(matches!(err, BuildError::Configuration { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_success_returns_output() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("generator.py");
        std::fs::write(&script, "echo \"args: $*\"\n").unwrap();
        let inv = invocation("sh", script, tmp.path());

        let out = inv.run().unwrap();
        assert!(out.contains("--no-progress-indicator --config"));
        assert!(out.contains("build -m BUILD_PATH:out"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_process_error() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("generator.py");
        std::fs::write(&script, "echo partial\necho broken >&2\nexit 3\n").unwrap();
        let inv = invocation("sh", script, tmp.path());

        match inv.run().unwrap_err() {
            BuildError::ProcessExecution { code, output, .. } => {
                assert_eq!(code, Some(3));
                assert!(output.contains("partial"));
                assert!(output.contains("broken"));
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_pump_lines_keeps_every_line() {
        let out = pump_lines(&b"Loading config\n\nGenerating\xff build\nno newline"[..]);
        assert_eq!(out, "Loading config\n\nGenerating\u{fffd} build\nno newline");
    }

    #[test]
    fn test_missing_interpreter_is_process_error() {
        let tmp = tempfile::tempdir().unwrap();
        let inv = invocation("qxbuild-no-such-interpreter", tmp.path().join("g.py"), tmp.path());
        let err = inv.run().unwrap_err();
        assert!(matches!(err, BuildError::ProcessExecution { code: None, .. }));
    }
}
