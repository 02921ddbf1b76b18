// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `elm-test` invocations.
///
/// elm-test distinguishes "the tests ran" (even with failures) from "the
/// tool itself could not run the tests". The orchestrator's two-phase mode
/// relies on this: a visible first run whose exit code is within the
/// tests-ran range is followed by a silent `--report json` re-run, while
/// anything above the range short-circuits to a failed run.
pub enum ElmTestExitCode {}

impl ElmTestExitCode {
    /// All tests passed.
    pub const OK: i32 = 0;

    /// The run completed and at least one test failed.
    pub const TESTS_FAILED: i32 = 2;

    /// The largest exit code that still means the tests were run.
    ///
    /// Codes above this indicate a tool-level failure (bad arguments,
    /// compile errors, missing test directory), for which no JSON report
    /// will be produced.
    pub const MAX_TESTS_RAN: i32 = 3;
}

/// Returns true if `code` means elm-test actually ran the tests.
pub fn tests_ran(code: i32) -> bool {
    (0..=ElmTestExitCode::MAX_TESTS_RAN).contains(&code)
}
