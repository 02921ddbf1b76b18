// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The run orchestrator: subprocess lifecycle, line folding, cancellation.
//!
//! One orchestrator owns at most one outstanding subprocess and one pending
//! result at a time; a second run request while one is outstanding is
//! rejected synchronously rather than queued. Output lines are folded in
//! strict arrival order, since free-text messages are attributed to the
//! next completed test in stream order.

use crate::errors::{InsertError, RunnerError};
use crate::list::{SuiteInfo, TestDataMap, tests_root};
use crate::test_command::{ElmBinaries, build_args, with_report};
use camino::{Utf8Path, Utf8PathBuf};
use elmtest_metadata::{Event, Output, parse_error_output, parse_output, tests_ran};
use smol_str::SmolStr;
use std::future::Future;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// The terminal state of a test run.
#[derive(Clone, Debug)]
pub enum RunOutcome {
    /// The run completed: the built tree plus the per-leaf event data.
    Completed {
        /// The suite tree built from the run's output.
        suite: SuiteInfo,
        /// The side table mapping leaf ids to their completed events.
        data: TestDataMap,
    },

    /// The run failed; `message` replaces the tree display.
    Failed {
        /// A user-facing description: a compile-error report, a
        /// process-start failure, or a tool-level failure.
        message: String,
    },

    /// The run was cancelled. Not an error: callers must not display this
    /// as a failure.
    Cancelled,
}

/// Creates a linked cancel handle/receiver pair for one or more runs.
pub fn cancellation() -> (CancelHandle, CancelReceiver) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelReceiver { rx })
}

/// The requesting side of run cancellation.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Requests cancellation. Idempotent; the pending run resolves with
    /// [`RunOutcome::Cancelled`] exactly once.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// The listening side of run cancellation, passed into a run.
#[derive(Clone, Debug)]
pub struct CancelReceiver {
    rx: watch::Receiver<bool>,
}

impl CancelReceiver {
    /// A receiver that can never fire. Useful for hosts without a cancel
    /// surface and for tests.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        CancelReceiver { rx }
    }

    async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // The handle is gone; cancellation can never fire.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// A host-provided visible console for the optional two-phase mode.
///
/// elm-test cannot emit human-readable and machine-readable output in one
/// invocation, so the orchestrator first runs it through a visible console
/// (an editor task, a pass-through terminal) and only re-runs it silently
/// for the JSON stream if the first pass's exit code says the tests ran.
pub trait Console {
    /// Runs the visible pass and resolves with its exit code.
    fn run_task(
        &self,
        args: &[String],
        cwd: &Utf8Path,
    ) -> impl Future<Output = std::io::Result<i32>> + Send;
}

/// Drives elm-test over one Elm project and aggregates its results.
#[derive(Debug)]
pub struct TestRunner {
    project_folder: Utf8PathBuf,
    project_name: SmolStr,
    binaries: ElmBinaries,
    running: AtomicBool,
}

impl TestRunner {
    /// Creates a runner for the project at `project_folder`.
    pub fn new(project_folder: impl Into<Utf8PathBuf>, binaries: ElmBinaries) -> Self {
        let project_folder = project_folder.into();
        let project_name = SmolStr::from(project_folder.file_name().unwrap_or("project"));
        TestRunner {
            project_folder,
            project_name,
            binaries,
            running: AtomicBool::new(false),
        }
    }

    /// The project name, used as the synthetic root id of built trees.
    pub fn project_name(&self) -> &SmolStr {
        &self.project_name
    }

    /// Runs the tests headlessly, narrowed to `files` when non-empty.
    ///
    /// Fails fast with [`RunnerError::AlreadyRunning`] if a run is
    /// outstanding. All other failures resolve as
    /// [`RunOutcome::Failed`] rather than errors.
    pub async fn run(
        &self,
        files: &[Utf8PathBuf],
        cancel: &mut CancelReceiver,
    ) -> Result<RunOutcome, RunnerError> {
        let _guard = self.acquire()?;
        Ok(self.run_report(files, cancel).await)
    }

    /// Runs the tests in two phases: visibly through `console` for
    /// human-readable output, then headlessly for the JSON stream.
    ///
    /// An exit code outside the tests-ran range short-circuits to
    /// [`RunOutcome::Failed`] without the second invocation.
    pub async fn run_with_console<C: Console>(
        &self,
        console: &C,
        files: &[Utf8PathBuf],
        cancel: &mut CancelReceiver,
    ) -> Result<RunOutcome, RunnerError> {
        let _guard = self.acquire()?;

        let args = build_args(&self.binaries, files);
        info!("running elm-test visibly: {args:?}");
        let code = tokio::select! {
            code = console.run_task(&args, &self.project_folder) => code,
            _ = cancel.cancelled() => {
                info!("test run cancelled during the visible pass");
                return Ok(RunOutcome::Cancelled);
            }
        };
        match code {
            Ok(code) if tests_ran(code) => Ok(self.run_report(files, cancel).await),
            Ok(code) => {
                warn!("elm-test failed with exit code {code}");
                Ok(RunOutcome::Failed {
                    message: format!(
                        "elm-test failed (exit code {code}).\n\
                         Check for Elm errors in the visible run's output."
                    ),
                })
            }
            Err(error) => Ok(RunOutcome::Failed {
                message: spawn_failure_message(&args[0], &error),
            }),
        }
    }

    fn acquire(&self) -> Result<RunGuard<'_>, RunnerError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(RunnerError::AlreadyRunning);
        }
        Ok(RunGuard(&self.running))
    }

    async fn run_report(&self, files: &[Utf8PathBuf], cancel: &mut CancelReceiver) -> RunOutcome {
        let args = with_report(build_args(&self.binaries, files));
        debug!("running elm-test: {args:?}");

        let mut command = Command::new(&args[0]);
        command
            .args(&args[1..])
            .current_dir(&self.project_folder)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(error) => {
                let message = spawn_failure_message(&args[0], &error);
                warn!("{message}");
                return RunOutcome::Failed { message };
            }
        };

        let output = tokio::select! {
            output = child.wait_with_output() => output,
            _ = cancel.cancelled() => {
                // Dropping the wait future kills the child; anything it
                // writes after this point is discarded.
                info!("test run cancelled");
                return RunOutcome::Cancelled;
            }
        };
        let output = match output {
            Ok(output) => output,
            Err(error) => {
                return RunOutcome::Failed {
                    message: format!("failed to collect elm-test output: {error}"),
                };
            }
        };

        // A non-empty stderr always supersedes whatever stdout produced:
        // it is the compile-error channel.
        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = parse_error_output(&stderr).build_message();
            return RunOutcome::Failed { message };
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match self.build_suite(&stdout) {
            Ok((suite, data)) => {
                debug!("test run finished with {} tests", data.len());
                RunOutcome::Completed { suite, data }
            }
            Err(error) => RunOutcome::Failed {
                message: error.to_string(),
            },
        }
    }

    /// Folds the report stream into a suite tree and its side table.
    ///
    /// The pending-message accumulator is explicit: free-text lines are
    /// attributed to the next completed test, then cleared.
    fn build_suite(&self, stdout: &str) -> Result<(SuiteInfo, TestDataMap), InsertError> {
        let tests_root = tests_root(&self.project_folder);
        let mut suite = SuiteInfo::new_root(self.project_name.clone());
        let mut data = TestDataMap::new();
        let mut pending: Vec<String> = Vec::new();

        for line in stdout.lines().filter(|line| !line.is_empty()) {
            match parse_output(line) {
                Ok(Output::Message(text)) => pending.push(text),
                Ok(Output::Event(Event::TestCompleted(mut event))) => {
                    event.messages = std::mem::take(&mut pending);
                    let id = suite.insert(&event, &tests_root)?;
                    data.insert(id, event);
                }
                Ok(Output::Event(event)) => debug!("run event: {event:?}"),
                // Version-skewed lines are skipped, not fatal: the run
                // still resolves with whatever was parsed.
                Err(error) => warn!("skipping unparsable report line: {error}"),
            }
        }
        Ok((suite, data))
    }
}

struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn spawn_failure_message(program: &str, error: &std::io::Error) -> String {
    format!("Failed to run elm-test, is it installed at `{program}`? ({error})")
}
