// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core engine for driving [elm-test](https://github.com/rtfeldman/node-test-runner)
//! and aggregating its results.
//!
//! The engine invokes elm-test as a subprocess, parses its JSON report
//! stream via [`elmtest-metadata`](elmtest_metadata), folds completed tests
//! into a suite tree keyed by nested labels, merges partial runs into a
//! previously loaded tree without losing known source locations, and
//! locates best-guess source offsets for failure decorations. Editor glue
//! (commands, tree views, file watchers) is the host's job; this crate only
//! produces the data and events a host needs.

pub mod config;
pub mod errors;
pub mod find_tests;
pub mod list;
pub mod locate;
pub mod reporter;
pub mod runner;
mod test_command;

pub use test_command::{ElmBinaries, resolve_binaries};
