// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Structured access to the machine-readable output produced by
//! `elm-test --report json`.
//!
//! elm-test writes one JSON object per line to standard output while a run
//! is in progress, and a single JSON compile-error report to standard error
//! when the suite fails to build. This crate defines typed models for both
//! streams, lenient parsers that degrade gracefully on the free-form text
//! the tool interleaves with its JSON, and the human-readable renderings
//! used by downstream consumers such as
//! [`elmtest-runner`](https://crates.io/crates/elmtest-runner).

mod compile_errors;
mod errors;
mod events;
mod exit_codes;

pub use compile_errors::*;
pub use errors::*;
pub use events::*;
pub use exit_codes::*;
