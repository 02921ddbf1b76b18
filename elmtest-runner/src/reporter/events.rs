// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::list::SuiteInfo;
use smol_str::SmolStr;

/// A tree-loading event for the UI collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadEvent {
    /// Loading started.
    Started,
    /// Loading finished with either the loaded tree or an error message
    /// that replaces the tree display.
    Finished(Result<SuiteInfo, String>),
}

/// A run-progress event for the UI collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunEvent {
    /// A run started over the given leaf ids.
    Started {
        /// Every test id covered by the run, including ids pulled in by
        /// file-level narrowing.
        test_ids: Vec<SmolStr>,
    },
    /// A per-test state transition.
    Test(TestRunUpdate),
    /// The run finished.
    Finished,
}

/// A per-test state transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestRunUpdate {
    /// The test leaf id.
    pub id: SmolStr,
    /// The new state.
    pub state: TestState,
    /// An optional human-readable message (failure detail, todo comment).
    pub message: Option<String>,
    /// An optional short description, e.g. the duration.
    pub description: Option<String>,
    /// Line-anchored decorations for failures; empty when the test did not
    /// fail or its line is unknown.
    pub decorations: Vec<TestDecoration>,
}

/// The state a test transitions to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestState {
    /// The test is running.
    Running,
    /// The test passed.
    Passed,
    /// The test was skipped (a `Test.todo`).
    Skipped,
    /// The test failed.
    Failed,
}

/// An inline, line-anchored annotation shown next to a failing test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestDecoration {
    /// The 0-based line to anchor at.
    pub line: u32,
    /// The annotation text, abbreviated to one line.
    pub message: String,
}

/// A signal that previously computed results should no longer be trusted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetireEvent {
    /// Retire the given ids.
    Ids(Vec<SmolStr>),
    /// Retire everything.
    All,
}
