// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The suite tree: nodes keyed by nested label paths, the builder that
//! folds completed tests into it, and the merge that reconciles a fresh
//! (possibly partial) run with a previously loaded tree.

mod merge;
mod tree;

pub use merge::*;
pub use tree::*;
