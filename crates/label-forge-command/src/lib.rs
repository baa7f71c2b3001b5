//! Headless invocation of the external 3D tool.

use std::path::Path;
use std::process::Command;

use label_forge_types::RunResult;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("tool command is empty")]
    EmptyCommand,
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

// Split a command line on spaces, keeping double-quoted runs together
pub fn parse_command_with_quotes(cmd: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current_part = String::new();
    let mut in_quotes = false;

    for ch in cmd.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ' ' if !in_quotes => {
                if !current_part.is_empty() {
                    parts.push(std::mem::take(&mut current_part));
                }
            }
            _ => current_part.push(ch),
        }
    }

    if !current_part.is_empty() {
        parts.push(current_part);
    }

    parts
}

/// Runs `<tool> --background --python <script>` and captures its output.
#[derive(Clone, Debug)]
pub struct ToolRunner {
    program: String,
    leading_args: Vec<String>,
}

impl ToolRunner {
    pub fn from_command_line(cmd: &str) -> Result<Self, RunnerError> {
        let mut parts = parse_command_with_quotes(cmd.trim()).into_iter();
        let program = parts.next().ok_or(RunnerError::EmptyCommand)?;
        Ok(Self {
            program,
            leading_args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args_for(&self, script: &Path) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.push("--background".to_string());
        args.push("--python".to_string());
        args.push(script.display().to_string());
        args
    }

    /// Blocks until the tool exits. A non-zero exit is reported, not raised.
    pub fn run(&self, script: &Path) -> Result<RunResult, RunnerError> {
        let args = self.args_for(script);
        log::info!("Running {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| RunnerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let result = RunResult {
            exit_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !result.success {
            log::warn!(
                "{} exited with {:?}: {}",
                self.program,
                result.exit_code,
                result.stderr.lines().last().unwrap_or("")
            );
        }

        Ok(result)
    }
}
