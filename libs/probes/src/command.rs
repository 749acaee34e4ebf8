//! External command execution.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use fleetcheck_poll::{Probe, ProbeOutcome};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Errors from running an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The process could not be started or waited on.
    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The attempt exceeded its own timeout and the process was killed.
    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    /// The process exited unsuccessfully.
    #[error("{program} exited with {}: {stderr}", exit_label(.code))]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}

impl CommandError {
    /// Returns true if retrying the same invocation cannot help.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Io { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
            ),
            Self::TimedOut { .. } | Self::Exit { .. } => false,
        }
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,

    /// Exit code, `None` if killed by a signal.
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Returns true if the process exited with status 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

impl AsRef<str> for CommandOutput {
    fn as_ref(&self) -> &str {
        &self.stdout
    }
}

/// A program invocation that can be run repeatedly.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    attempt_timeout: Option<Duration>,
}

impl CommandSpec {
    /// Create an invocation of `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            attempt_timeout: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable on top of the inherited environment.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Kill the process if a single run takes longer than `timeout`.
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Run the command once and capture its output.
    ///
    /// A non-zero exit is not an error here; callers decide what it means.
    pub async fn run(&self) -> Result<CommandOutput, CommandError> {
        debug!(program = %self.program, args = ?self.args, "Running command");

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match self.attempt_timeout {
            Some(timeout) => tokio::time::timeout(timeout, command.output())
                .await
                .map_err(|_| CommandError::TimedOut {
                    program: self.program.clone(),
                    timeout,
                })?,
            None => command.output().await,
        }
        .map_err(|source| CommandError::Io {
            program: self.program.clone(),
            source,
        })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }
}

/// Probe running an external command once per attempt.
///
/// By default every finished process is a value for the predicate, whatever
/// its exit status. With [`CommandProbe::require_success`] a non-zero exit
/// becomes a transient failure instead.
#[derive(Debug, Clone)]
pub struct CommandProbe {
    spec: CommandSpec,
    require_success: bool,
}

impl CommandProbe {
    pub fn new(spec: CommandSpec) -> Self {
        Self {
            spec,
            require_success: false,
        }
    }

    /// Treat a non-zero exit as a retryable failure.
    pub fn require_success(mut self) -> Self {
        self.require_success = true;
        self
    }

    pub fn command(&self) -> &CommandSpec {
        &self.spec
    }
}

#[async_trait]
impl Probe for CommandProbe {
    type Output = CommandOutput;
    type Error = CommandError;

    async fn execute(&mut self) -> ProbeOutcome<CommandOutput, CommandError> {
        match self.spec.run().await {
            Ok(output) if self.require_success && !output.success() => {
                ProbeOutcome::Transient(CommandError::Exit {
                    program: self.spec.program.clone(),
                    code: output.code,
                    stderr: output.stderr,
                })
            }
            Ok(output) => ProbeOutcome::Success(output),
            Err(e) if e.is_fatal() => ProbeOutcome::Fatal(e),
            Err(e) => ProbeOutcome::Transient(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use fleetcheck_poll::{poll_until, PollOutcome, PollSpec};

    use super::*;
    use crate::predicate::{contains, exited_ok};

    fn shell(script: &str) -> CommandSpec {
        CommandSpec::new("sh").arg("-c").arg(script)
    }

    #[tokio::test]
    async fn test_captures_output_and_status() {
        let output = shell("echo out; echo err >&2; exit 3").run().await.unwrap();
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert_eq!(output.code, Some(3));
        assert!(!output.success());
        assert_eq!(output.combined(), "out\nerr\n");
    }

    #[tokio::test]
    async fn test_env_is_passed() {
        let output = shell("printf %s \"$FLEETCHECK_TEST\"")
            .env("FLEETCHECK_TEST", "downstream1")
            .run()
            .await
            .unwrap();
        assert_eq!(output.stdout, "downstream1");
    }

    #[tokio::test]
    async fn test_missing_program_is_fatal() {
        let mut probe = CommandProbe::new(CommandSpec::new("fleetcheck-no-such-binary"));
        assert!(probe.execute().await.is_fatal());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_a_value_by_default() {
        let mut probe = CommandProbe::new(shell("echo restarted; exit 1"));
        match probe.execute().await {
            ProbeOutcome::Success(output) => assert_eq!(output.code, Some(1)),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_require_success_makes_exit_transient() {
        let mut probe = CommandProbe::new(shell("echo nope >&2; exit 2")).require_success();
        match probe.execute().await {
            ProbeOutcome::Transient(CommandError::Exit { code, stderr, .. }) => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "nope\n");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_attempt_timeout_is_transient() {
        let mut probe =
            CommandProbe::new(shell("sleep 5").attempt_timeout(Duration::from_millis(100)));
        match probe.execute().await {
            ProbeOutcome::Transient(CommandError::TimedOut { timeout, .. }) => {
                assert_eq!(timeout, Duration::from_millis(100));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_polls_until_command_output_matches() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("count");
        // Prints "restarted" from the third run on.
        let script = format!(
            "n=$(cat {c} 2>/dev/null || echo 0); n=$((n+1)); echo $n > {c}; \
             if [ $n -ge 3 ]; then echo restarted; else echo pending; fi",
            c = counter.display()
        );

        let spec = PollSpec::new(Duration::from_secs(10), Duration::from_millis(20));
        let report = poll_until(
            CommandProbe::new(shell(&script)),
            contains::<CommandOutput>("restarted"),
            &spec,
            None,
        )
        .await
        .unwrap();

        assert!(report.outcome.is_satisfied());
        assert_eq!(report.attempts, 3);
    }

    #[tokio::test]
    async fn test_poll_times_out_on_failing_command() {
        let spec = PollSpec::new(Duration::from_millis(100), Duration::from_millis(20));
        let report = poll_until(CommandProbe::new(shell("exit 1")), exited_ok(), &spec, None)
            .await
            .unwrap();

        match report.outcome {
            PollOutcome::TimedOut { last_value, .. } => {
                assert_eq!(last_value.unwrap().code, Some(1));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
