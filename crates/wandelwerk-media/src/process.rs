// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Child process supervision: spawn, drain stderr, enforce a deadline.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use wandelwerk_core::error::{EngineError, Result};

/// Number of trailing stderr lines kept for diagnostics.
pub const STDERR_TAIL_LINES: usize = 20;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How a supervised process ended.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub status: ExitStatus,
    /// Last [`STDERR_TAIL_LINES`] lines written to stderr.
    pub stderr_tail: String,
}

/// Run `program` with `args` in `work_dir`, killing it after `timeout`.
///
/// A process that cannot be started or outlives its deadline is a
/// `TranscodeFailed`; a non-zero exit is returned as an outcome for the
/// caller to judge.
pub fn run_with_timeout(
    program: &Path,
    args: &[OsString],
    work_dir: &Path,
    timeout: Duration,
) -> Result<ProcessOutcome> {
    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    debug!(command = ?command, "spawning transcoder");

    let mut child = command.spawn().map_err(|e| {
        EngineError::transcode(format!("failed to start {}: {e}", program.display()))
    })?;

    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| EngineError::transcode("transcoder stderr was not captured"))?;
    let reader = thread::spawn(move || {
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        for line in BufReader::new(stderr).lines().map_while(|line| line.ok()) {
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
        Vec::from(tail).join("\n")
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) if started.elapsed() >= timeout => break None,
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(EngineError::transcode(format!(
                    "error waiting for transcoder: {e}"
                )));
            }
        }
    };

    let Some(status) = status else {
        warn!(timeout_secs = timeout.as_secs_f64(), "transcoder timed out, killing it");
        let _ = child.kill();
        let _ = child.wait();
        let stderr = reader.join().unwrap_or_default();
        return Err(EngineError::TranscodeFailed {
            reason: format!("timed out after {:.1}s", timeout.as_secs_f64()),
            stderr,
        });
    };

    let stderr_tail = reader.join().unwrap_or_default();
    Ok(ProcessOutcome { status, stderr_tail })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str, timeout: Duration) -> Result<ProcessOutcome> {
        let dir = tempfile::tempdir().unwrap();
        run_with_timeout(
            Path::new("/bin/sh"),
            &["-c".into(), script.into()],
            dir.path(),
            timeout,
        )
    }

    #[test]
    fn captures_exit_status_and_stderr() {
        let outcome = sh("echo broken >&2; exit 3", Duration::from_secs(10)).unwrap();
        assert_eq!(outcome.status.code(), Some(3));
        assert_eq!(outcome.stderr_tail, "broken");
    }

    #[test]
    fn keeps_only_the_stderr_tail() {
        let outcome = sh(
            "i=1; while [ $i -le 50 ]; do echo line$i >&2; i=$((i+1)); done",
            Duration::from_secs(10),
        )
        .unwrap();
        let lines: Vec<&str> = outcome.stderr_tail.lines().collect();
        assert_eq!(lines.len(), STDERR_TAIL_LINES);
        assert_eq!(lines.first(), Some(&"line31"));
        assert_eq!(lines.last(), Some(&"line50"));
    }

    #[test]
    fn kills_processes_past_their_deadline() {
        let started = Instant::now();
        let err = sh("exec sleep 30", Duration::from_millis(200)).unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(10));
        match err {
            EngineError::TranscodeFailed { reason, .. } => assert!(reason.contains("timed out")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_fails_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_with_timeout(
            Path::new("/nonexistent/ffmpeg"),
            &[],
            dir.path(),
            Duration::from_secs(1),
        )
        .unwrap_err();
        match err {
            EngineError::TranscodeFailed { reason, .. } => {
                assert!(reason.starts_with("failed to start"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
