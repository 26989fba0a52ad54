#[cfg(feature = "host-command")]
use std::process::Command;

use tracing::{info, warn};

use crate::error::Result;
use crate::models::CommandStatus;
use crate::pipeline::CommandRunner;

pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;
#[cfg(feature = "host-command")]
const SIGNAL_EXIT_CODE_BASE: i32 = 128;

/// Runs the evaluation command through `sh -c`, inheriting stdio.
#[derive(Debug, Clone, Default)]
pub struct ShellCommandRunner {
    shell: Option<String>,
}

impl ShellCommandRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    fn shell(&self) -> &str {
        self.shell.as_deref().unwrap_or("sh")
    }
}

impl CommandRunner for ShellCommandRunner {
    fn run(&self, command: &str) -> Result<CommandStatus> {
        info!(shell = self.shell(), command, "running evaluation command");

        #[cfg(feature = "host-command")]
        {
            let status = match Command::new(self.shell()).arg("-c").arg(command).status() {
                Ok(status) => status,
                Err(err) => {
                    warn!(error = %err, "evaluation command could not be spawned");
                    return Ok(CommandStatus::exited(SPAWN_FAILURE_EXIT_CODE));
                }
            };
            Ok(status_from_exit(status))
        }

        #[cfg(not(feature = "host-command"))]
        {
            warn!("host-command feature disabled; evaluation command not executed");
            Ok(CommandStatus::exited(SPAWN_FAILURE_EXIT_CODE))
        }
    }
}

#[cfg(feature = "host-command")]
fn status_from_exit(status: std::process::ExitStatus) -> CommandStatus {
    if let Some(code) = status.code() {
        return CommandStatus::exited(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return CommandStatus {
                code: SIGNAL_EXIT_CODE_BASE + signal,
                signal: Some(signal_name(signal)),
            };
        }
    }
    CommandStatus::exited(1)
}

#[cfg(feature = "host-command")]
fn signal_name(signal: i32) -> String {
    match signal {
        1 => "SIGHUP".to_string(),
        2 => "SIGINT".to_string(),
        3 => "SIGQUIT".to_string(),
        6 => "SIGABRT".to_string(),
        9 => "SIGKILL".to_string(),
        13 => "SIGPIPE".to_string(),
        14 => "SIGALRM".to_string(),
        15 => "SIGTERM".to_string(),
        other => format!("SIG{other}"),
    }
}
