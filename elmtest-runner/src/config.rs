// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runner settings.
//!
//! Hosts embed these however they like (editor settings, a CLI); the
//! standalone form is an `elmtest.toml` next to the project's
//! `elm.json`.

use crate::errors::ConfigReadError;
use crate::test_command::ElmBinaries;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

/// Settings controlling how runs are executed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunnerSettings {
    /// An explicit elm compiler path, passed via `--compiler`.
    #[serde(default)]
    pub elm_path: Option<Utf8PathBuf>,

    /// An explicit elm-test binary path.
    #[serde(default)]
    pub elm_test_path: Option<Utf8PathBuf>,

    /// Run a visible pass first for human-readable output, then re-run
    /// silently for the JSON report.
    #[serde(default)]
    pub show_output: bool,
}

impl RunnerSettings {
    /// Reads settings from a TOML file. A missing file yields defaults.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigReadError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigReadError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&text).map_err(|source| ConfigReadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The binaries these settings configure, before local-npm resolution.
    pub fn binaries(&self) -> ElmBinaries {
        ElmBinaries {
            elm_test: self.elm_test_path.clone(),
            elm: self.elm_path.clone(),
        }
    }
}
