// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};

/// The external binaries a run depends on: the elm-test tool itself and,
/// optionally, the compiler to hand it via `--compiler`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElmBinaries {
    /// The elm-test binary. `None` falls back to `elm-test` on the PATH.
    pub elm_test: Option<Utf8PathBuf>,
    /// The elm compiler to pass via `--compiler`, if any.
    pub elm: Option<Utf8PathBuf>,
}

/// Resolves binaries: explicitly configured paths win, otherwise each root
/// is probed for a local npm installation under `node_modules/.bin`.
pub fn resolve_binaries(configured: ElmBinaries, roots: &[&Utf8Path]) -> ElmBinaries {
    ElmBinaries {
        elm_test: configured
            .elm_test
            .or_else(|| find_local_npm_binary("elm-test", roots)),
        elm: configured.elm.or_else(|| find_local_npm_binary("elm", roots)),
    }
}

fn find_local_npm_binary(binary: &str, roots: &[&Utf8Path]) -> Option<Utf8PathBuf> {
    roots.iter().find_map(|root| {
        let path = root.join("node_modules/.bin").join(binary);
        path.is_file().then_some(path)
    })
}

/// Builds the elm-test command line: the configured-or-default binary, an
/// optional `--compiler`, and an optional list of files to narrow the run.
pub(crate) fn build_args(binaries: &ElmBinaries, files: &[Utf8PathBuf]) -> Vec<String> {
    let mut args = vec![
        binaries
            .elm_test
            .as_ref()
            .map_or_else(|| "elm-test".to_owned(), ToString::to_string),
    ];
    if let Some(elm) = &binaries.elm {
        args.push("--compiler".to_owned());
        args.push(elm.to_string());
    }
    args.extend(files.iter().map(ToString::to_string));
    args
}

/// Appends the flags that force the machine-readable report stream.
pub(crate) fn with_report(mut args: Vec<String>) -> Vec<String> {
    args.push("--report".to_owned());
    args.push("json".to_owned());
    args
}
