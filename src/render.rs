//! External renderer invocation.
//!
//! The renderer is run directly with an argument vector, never through a
//! shell, so caption text reaches it verbatim. On success it prints the path
//! of the file it produced.

use crate::config::RendererConfig;
use crate::error::{RenderError, Result};

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Parameters for one renderer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    input: PathBuf,
    words: String,
    /// Ordered options; `None` values are bare flags.
    options: Vec<(String, Option<String>)>,
}

impl RenderRequest {
    pub fn new(input: impl Into<PathBuf>, words: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            words: words.into(),
            options: Vec::new(),
        }
    }

    /// Append `name value`.
    pub fn option(mut self, name: &str, value: impl ToString) -> Self {
        self.options.push((name.to_string(), Some(value.to_string())));
        self
    }

    /// Append a bare `name` flag.
    pub fn flag(mut self, name: &str) -> Self {
        self.options.push((name.to_string(), None));
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn words(&self) -> &str {
        &self.words
    }

    /// Per-request arguments: input, words, then options in insertion order.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--input".to_string(),
            self.input.display().to_string(),
            "--words".to_string(),
            self.words.clone(),
        ];
        for (name, value) in &self.options {
            args.push(name.clone());
            if let Some(value) = value {
                args.push(value.clone());
            }
        }
        args
    }
}

/// Runs the renderer executable.
#[derive(Debug, Clone)]
pub struct Renderer {
    program: String,
    leading_args: Vec<String>,
    width: u32,
    output: PathBuf,
    timeout: Duration,
}

impl Renderer {
    pub fn new(config: &RendererConfig) -> Self {
        let mut command = config.command.iter().cloned();
        let program = command.next().unwrap_or_else(|| "gifmaker".into());
        Self {
            program,
            leading_args: command.collect(),
            width: config.width,
            output: config.output.clone(),
            timeout: config.timeout,
        }
    }

    /// Full argument vector after the program name.
    ///
    /// Common options come first so per-request options of the same name win.
    pub fn argv(&self, request: &RenderRequest) -> Vec<String> {
        let mut argv = self.leading_args.clone();
        argv.extend([
            "--width".to_string(),
            self.width.to_string(),
            "--output".to_string(),
            self.output.display().to_string(),
            "--nogrow".to_string(),
        ]);
        argv.extend(request.args());
        argv
    }

    /// Run the renderer and return the path it printed.
    pub async fn render(&self, request: &RenderRequest) -> Result<PathBuf> {
        let mut command = Command::new(&self.program);
        command
            .args(self.argv(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            program = %self.program,
            input = %request.input().display(),
            words = request.words(),
            "running renderer"
        );

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(output) => output.map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?,
            Err(_elapsed) => {
                return Err(RenderError::TimedOut {
                    seconds: self.timeout.as_secs(),
                }
                .into());
            }
        };

        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout.trim();
        if path.is_empty() {
            return Err(RenderError::EmptyOutput.into());
        }

        Ok(PathBuf::from(path))
    }
}
