// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the elm-test runner.

use camino::Utf8PathBuf;
use smol_str::SmolStr;
use thiserror::Error;

/// An error raised while inserting a completed test into the suite tree.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InsertError {
    /// The same full label path was produced twice within one run's output.
    ///
    /// Silently overwriting the earlier leaf would corrupt every id-based
    /// lookup downstream, so the tree builder fails fast instead.
    #[error("duplicate test id `{id}`")]
    DuplicateTestId {
        /// The offending id.
        id: SmolStr,
    },

    /// The event carried no labels at all.
    #[error("test completed event with an empty label path")]
    EmptyLabelPath,
}

/// An error returned by [`TestRunner`](crate::runner::TestRunner) run
/// requests.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// A run was requested while another run was still outstanding.
    ///
    /// The runner holds at most one subprocess and one pending result at a
    /// time; concurrent requests are rejected, not queued.
    #[error("a test run is already in progress")]
    AlreadyRunning,
}

/// An error that occurred while reading runner settings.
#[derive(Debug, Error)]
pub enum ConfigReadError {
    /// The settings file could not be read.
    #[error("failed to read settings at `{path}`")]
    Read {
        /// The settings file path.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file was not valid TOML.
    #[error("failed to parse settings at `{path}`")]
    Parse {
        /// The settings file path.
        path: Utf8PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}
