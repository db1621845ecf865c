//! Host command execution.
//!
//! Every interaction with host tools (systemctl, pidof, pkill, package
//! managers, kubectl) goes through the [`CommandExecutor`] trait so the
//! callers can be exercised without touching the host.

use std::process::Command;

use tracing::debug;

use crate::error::{InstallerError, InstallerResult};

/// Captured result of one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Command line, for error messages.
    pub command: String,
    /// Exit code; `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Standard output with the trailing newline removed.
    pub stdout: String,
    /// Standard error with the trailing newline removed.
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turn a non-zero exit into [`InstallerError::Execution`].
    pub fn check(self) -> InstallerResult<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(InstallerError::Execution {
                command: self.command,
                exit_code: self.exit_code,
                stderr: self.stderr,
            })
        }
    }
}

/// Runs host commands synchronously.
///
/// No timeout is applied; callers that need bounded execution must sandbox
/// the whole process.
pub trait CommandExecutor: Send + Sync {
    /// Run `program` with `args` directly, without a shell.
    fn run(&self, program: &str, args: &[&str]) -> InstallerResult<CommandOutput>;

    /// Run a script through the platform shell (`sh -c` / `cmd /C`).
    fn run_shell(&self, script: &str) -> InstallerResult<CommandOutput> {
        if cfg!(windows) {
            self.run("cmd", &["/C", script])
        } else {
            self.run("sh", &["-c", script])
        }
    }
}

/// Executor backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl SystemExecutor {
    /// Create a new system executor.
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> InstallerResult<CommandOutput> {
        let command = command_line(program, args);
        debug!(command = %command, "Running host command");

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| InstallerError::Spawn {
                command: command.clone(),
                source: e,
            })?;

        Ok(CommandOutput {
            command,
            exit_code: output.status.code(),
            stdout: trim_newline(&output.stdout),
            stderr: trim_newline(&output.stderr),
        })
    }
}

/// Render a program and its arguments as a single line.
pub fn command_line(program: &str, args: &[&str]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

fn trim_newline(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted executor for unit tests.

    use std::io;
    use std::sync::Mutex;

    use super::*;

    enum Reply {
        Exit(i32, String),
        SpawnError,
    }

    /// Records every command and answers by longest matching prefix.
    ///
    /// Unmatched commands succeed with empty output.
    #[derive(Default)]
    pub struct MockExecutor {
        replies: Mutex<Vec<(String, Reply)>>,
        calls: Mutex<Vec<String>>,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, prefix: &str, exit_code: i32, stdout: &str) -> Self {
            self.replies
                .lock()
                .unwrap()
                .push((prefix.to_string(), Reply::Exit(exit_code, stdout.to_string())));
            self
        }

        pub fn fail_spawn(self, prefix: &str) -> Self {
            self.replies
                .lock()
                .unwrap()
                .push((prefix.to_string(), Reply::SpawnError));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn called(&self, prefix: &str) -> bool {
            self.calls().iter().any(|c| c.starts_with(prefix))
        }
    }

    impl CommandExecutor for MockExecutor {
        fn run(&self, program: &str, args: &[&str]) -> InstallerResult<CommandOutput> {
            let command = command_line(program, args);
            self.calls.lock().unwrap().push(command.clone());

            let replies = self.replies.lock().unwrap();
            let best = replies
                .iter()
                .filter(|(prefix, _)| command.starts_with(prefix.as_str()))
                .max_by_key(|(prefix, _)| prefix.len());

            match best {
                Some((_, Reply::SpawnError)) => Err(InstallerError::Spawn {
                    command,
                    source: io::Error::new(io::ErrorKind::NotFound, "mock spawn failure"),
                }),
                Some((_, Reply::Exit(code, stdout))) => Ok(CommandOutput {
                    command,
                    exit_code: Some(*code),
                    stdout: stdout.clone(),
                    stderr: String::new(),
                }),
                None => Ok(CommandOutput {
                    command,
                    exit_code: Some(0),
                    stdout: String::new(),
                    stderr: String::new(),
                }),
            }
        }
    }
}
