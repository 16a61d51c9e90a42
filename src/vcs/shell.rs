//! Shell command runner backed by `tokio::process`

use crate::error::{BuildcError, BuildcResult};
use crate::vcs::Shell;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs commands as child processes of buildc
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

impl SystemShell {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Shell for SystemShell {
    async fn run_capturing_status(&self, command: &[String]) -> BuildcResult<i32> {
        let Some((program, args)) = command.split_first() else {
            return Err(BuildcError::User("empty command".to_string()));
        };

        let rendered = command.join(" ");
        debug!("Executing: {}", rendered);

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| BuildcError::command_failed(rendered, e))?;

        Ok(status.code().unwrap_or(-1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn command(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn reports_exit_status() {
        let shell = SystemShell::new();
        assert_eq!(shell.run_capturing_status(&command(&["true"])).await.unwrap(), 0);
        assert_ne!(shell.run_capturing_status(&command(&["false"])).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn removes_directories() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("lib").join("1.0");
        std::fs::create_dir_all(&target).unwrap();

        let status = SystemShell::new()
            .run_capturing_status(&command(&["rm", "-rf", target.to_str().unwrap()]))
            .await
            .unwrap();

        assert_eq!(status, 0);
        assert!(!target.exists());
        assert!(temp.path().join("lib").exists());
    }

    #[tokio::test]
    async fn empty_command_is_an_error() {
        assert!(SystemShell::new().run_capturing_status(&[]).await.is_err());
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let err = SystemShell::new()
            .run_capturing_status(&command(&["buildc-no-such-program"]))
            .await
            .unwrap_err();
        assert!(matches!(err, BuildcError::CommandFailed { .. }));
    }
}
