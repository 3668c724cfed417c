//! Execution sandbox - runs synthesized source and captures its output
//!
//! The engine only hands a source string to a [`Sandbox`] and reads back
//! what it printed. [`ProcessSandbox`] runs it through an external
//! interpreter; the runtime itself is never implemented here.

use std::process::{Command, Stdio};
use serde::Serialize;
use tracing::debug;
use crate::{Error, Result};

/// Captured result of one execution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Execution {
    pub stdout: String,
    /// Interpreter error output when the program failed
    pub error: Option<String>,
}

impl Execution {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

pub trait Sandbox {
    /// Run `source`; `Err` only when the sandbox itself could not run
    fn execute(&self, source: &str) -> Result<Execution>;
}

/// Runs source with `<interpreter> -c <source>`
#[derive(Debug, Clone)]
pub struct ProcessSandbox {
    interpreter: String,
}

impl Default for ProcessSandbox {
    fn default() -> Self {
        Self::new("python3")
    }
}

impl ProcessSandbox {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self { interpreter: interpreter.into() }
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// Whether the interpreter can be started at all
    pub fn is_available(&self) -> bool {
        Command::new(&self.interpreter)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }
}

impl Sandbox for ProcessSandbox {
    fn execute(&self, source: &str) -> Result<Execution> {
        debug!("Executing {} bytes with {}", source.len(), self.interpreter);
        let output = Command::new(&self.interpreter)
            .arg("-c")
            .arg(source)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| Error::Sandbox(format!("failed to start `{}`: {}", self.interpreter, err)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let error = if output.status.success() {
            None
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let code = output.status.code().unwrap_or(-1);
            Some(if stderr.is_empty() { format!("exit code {}", code) } else { stderr })
        };
        Ok(Execution { stdout, error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout() {
        let sandbox = ProcessSandbox::default();
        if !sandbox.is_available() {
            return;
        }
        let run = sandbox.execute("print(1 + 2)\n").unwrap();
        assert_eq!(run.stdout, "3\n");
        assert!(run.succeeded());
    }

    #[test]
    fn test_reports_runtime_error() {
        let sandbox = ProcessSandbox::default();
        if !sandbox.is_available() {
            return;
        }
        let run = sandbox.execute("print('before')\nraise ValueError('boom')\n").unwrap();
        assert_eq!(run.stdout, "before\n");
        assert!(run.error.unwrap().contains("ValueError: boom"));
    }

    #[test]
    fn test_missing_interpreter() {
        let sandbox = ProcessSandbox::new("worldgraph-no-such-interpreter");
        assert!(!sandbox.is_available());
        assert!(matches!(sandbox.execute("print(1)"), Err(Error::Sandbox(_))));
    }
}
