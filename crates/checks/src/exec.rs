// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exec check executor: tokenize the command, inherit+overlay
//! environment, drop uid/gid if requested, capture combined
//! stdout+stderr into a bounded ring buffer, force-kill on
//! cancellation/timeout after a short grace window.

use crate::checker::{CheckContext, CheckLimits, Checker};
use crate::details::build_details;
use crate::lexer::tokenize;
use crate::ring_buffer::RingBuffer;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use warden_core::Error;
use warden_plan::ExecCheck;

const RING_BUFFER_CAPACITY: usize = 512;

pub struct ExecChecker {
    argv: Vec<String>,
    environment: HashMap<String, String>,
    user: Option<String>,
    user_id: Option<u32>,
    group: Option<String>,
    group_id: Option<u32>,
    working_dir: Option<String>,
    kill_grace: Duration,
    details_max_bytes: usize,
    details_max_lines: usize,
}

impl ExecChecker {
    pub fn new(cfg: &ExecCheck, limits: &CheckLimits) -> Result<Self, Error> {
        let tokenized = tokenize(&cfg.command)?;
        Ok(Self {
            argv: tokenized.argv(),
            environment: cfg.environment.clone(),
            user: cfg.user.clone(),
            user_id: cfg.user_id,
            group: cfg.group.clone(),
            group_id: cfg.group_id,
            working_dir: cfg.working_dir.clone(),
            kill_grace: limits.exec_kill_grace,
            details_max_bytes: limits.details_max_bytes,
            details_max_lines: limits.details_max_lines,
        })
    }

    fn build_command(&self) -> Result<Command, Error> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| Error::Internal("exec check has no argv".to_string()))?;

        let mut command = Command::new(program);
        command.args(args);
        // Inherit the daemon's environment; the check's own map overlays it,
        // later winning on key conflict.
        for (k, v) in &self.environment {
            command.env(k, v);
        }
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        self.apply_identity(&mut command)?;
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        // The manager's abort path cancels the token and aborts the
        // worker's task close together; if the task is torn down before
        // it reaches the cancellation branch below, this is what stops
        // the child from running on as an orphan.
        command.kill_on_drop(true);
        Ok(command)
    }

    #[cfg(unix)]
    fn apply_identity(&self, command: &mut Command) -> Result<(), Error> {
        use std::os::unix::process::CommandExt;

        let uid = match self.user_id {
            Some(uid) => Some(uid),
            None => self.user.as_deref().map(resolve_uid).transpose()?,
        };
        if let Some(uid) = uid {
            command.uid(uid);
        }

        let gid = match self.group_id {
            Some(gid) => Some(gid),
            None => self.group.as_deref().map(resolve_gid).transpose()?,
        };
        if let Some(gid) = gid {
            command.gid(gid);
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn apply_identity(&self, _command: &mut Command) -> Result<(), Error> {
        if self.user_id.is_some() || self.group_id.is_some() || self.user.is_some() || self.group.is_some() {
            return Err(Error::Internal("uid/gid checks require a unix target".to_string()));
        }
        Ok(())
    }
}

#[cfg(unix)]
fn resolve_uid(name: &str) -> Result<u32, Error> {
    nix::unistd::User::from_name(name)
        .map_err(|e| Error::Internal(format!("looking up user '{name}': {e}")))?
        .map(|user| user.uid.as_raw())
        .ok_or_else(|| Error::Internal(format!("unknown user '{name}'")))
}

#[cfg(unix)]
fn resolve_gid(name: &str) -> Result<u32, Error> {
    nix::unistd::Group::from_name(name)
        .map_err(|e| Error::Internal(format!("looking up group '{name}': {e}")))?
        .map(|group| group.gid.as_raw())
        .ok_or_else(|| Error::Internal(format!("unknown group '{name}'")))
}

#[async_trait]
impl Checker for ExecChecker {
    async fn check(&self, ctx: &CheckContext) -> Result<(), Error> {
        let mut command = self.build_command()?;
        let mut child = command
            .spawn()
            .map_err(|e| Error::CheckFailure { message: e.to_string(), details: None })?;

        let ring = Arc::new(Mutex::new(RingBuffer::new(RING_BUFFER_CAPACITY)));
        spawn_reader(child.stdout.take(), ring.clone());
        spawn_reader(child.stderr.take(), ring.clone());

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| Error::CheckFailure { message: e.to_string(), details: None })?;
                self.interpret_status(status, &ring)
            }
            _ = tokio::time::sleep(ctx.timeout) => {
                kill_with_grace(&mut child, self.kill_grace).await;
                Err(Error::CheckTimeout(ctx.timeout))
            }
            _ = ctx.cancel.cancelled() => {
                kill_with_grace(&mut child, self.kill_grace).await;
                Err(Error::Cancelled)
            }
        }
    }
}

impl ExecChecker {
    fn interpret_status(
        &self,
        status: std::process::ExitStatus,
        ring: &Arc<Mutex<RingBuffer>>,
    ) -> Result<(), Error> {
        if status.success() {
            return Ok(());
        }
        let code = status.code().unwrap_or(-1);
        let details = build_details(&ring.lock().as_bytes(), self.details_max_bytes, self.details_max_lines);
        Err(Error::CheckFailure {
            message: format!("exit status {code}"),
            details: Some(details),
        })
    }
}

fn spawn_reader<R>(reader: Option<R>, ring: Arc<Mutex<RingBuffer>>)
where
    R: AsyncReadExt + Unpin + Send + 'static,
{
    let Some(mut reader) = reader else { return };
    tokio::spawn(async move {
        let mut buf = [0u8; 256];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => ring.lock().push(&buf[..n]),
            }
        }
    });
}

async fn kill_with_grace(child: &mut Child, grace: Duration) {
    let _ = child.start_kill();
    if tokio::time::timeout(grace, child.wait()).await.is_err() {
        let _ = child.kill().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    fn cfg(command: &str) -> ExecCheck {
        ExecCheck {
            command: command.to_string(),
            environment: HashMap::new(),
            user: None,
            user_id: None,
            group: None,
            group_id: None,
            working_dir: None,
            service_context: None,
        }
    }

    #[tokio::test]
    async fn succeeds_on_zero_exit() {
        let checker = ExecChecker::new(&cfg("true"), &CheckLimits::default()).unwrap();
        let ctx = CheckContext { timeout: Duration::from_secs(1), cancel: CancellationToken::new() };
        assert!(checker.check(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn fails_on_nonzero_exit_with_captured_output() {
        let checker = ExecChecker::new(&cfg("sh -c 'echo boom; exit 1'"), &CheckLimits::default()).unwrap();
        let ctx = CheckContext { timeout: Duration::from_secs(1), cancel: CancellationToken::new() };
        let err = checker.check(&ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "exit status 1");
        assert_eq!(err.details(), Some("boom"));
    }

    #[tokio::test]
    async fn times_out_and_kills_the_child() {
        let checker = ExecChecker::new(&cfg("sh -c 'sleep 5'"), &CheckLimits::default()).unwrap();
        let ctx = CheckContext { timeout: Duration::from_millis(50), cancel: CancellationToken::new() };
        let err = checker.check(&ctx).await.unwrap_err();
        assert!(matches!(err, Error::CheckTimeout(_)));
    }

    #[tokio::test]
    async fn cancellation_is_reported_as_cancelled_not_a_failure() {
        let checker = ExecChecker::new(&cfg("sh -c 'sleep 5'"), &CheckLimits::default()).unwrap();
        let cancel = CancellationToken::new();
        let ctx = CheckContext { timeout: Duration::from_secs(5), cancel: cancel.clone() };
        let handle = tokio::spawn(async move { checker.check(&ctx).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        let err = handle.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn default_args_group_is_appended_to_base_command() {
        let checker = ExecChecker::new(&cfg("sh -c [ 'exit 0' ]"), &CheckLimits::default()).unwrap();
        let ctx = CheckContext { timeout: Duration::from_secs(1), cancel: CancellationToken::new() };
        assert!(checker.check(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn unresolvable_user_name_is_a_hard_error_not_a_silent_noop() {
        let mut c = cfg("true");
        c.user = Some("definitely-not-a-real-user-warden-test".to_string());
        let checker = ExecChecker::new(&c, &CheckLimits::default()).unwrap();
        let ctx = CheckContext { timeout: Duration::from_secs(1), cancel: CancellationToken::new() };
        let err = checker.check(&ctx).await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[tokio::test]
    async fn a_shorter_kill_grace_is_honored() {
        let limits = CheckLimits { exec_kill_grace: Duration::from_millis(10), ..CheckLimits::default() };
        let checker = ExecChecker::new(&cfg("sh -c 'trap \"\" TERM; sleep 5'"), &limits).unwrap();
        let ctx = CheckContext { timeout: Duration::from_millis(50), cancel: CancellationToken::new() };
        let start = std::time::Instant::now();
        let err = checker.check(&ctx).await.unwrap_err();
        assert!(matches!(err, Error::CheckTimeout(_)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
