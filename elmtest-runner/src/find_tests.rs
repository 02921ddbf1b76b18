// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The upstream "find tests" contract.
//!
//! Before any run has executed, the initially loaded tree is seeded from a
//! language-server request that statically discovers test definitions.
//! This module defines the request/response shapes and the conversion into
//! a [`SuiteInfo`] tree.

use crate::list::{SuiteInfo, SuiteNode, TestInfo, child_id};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Parameters of the find-tests request.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindTestsParams {
    /// The project folder to discover tests in.
    pub project_folder: String,
}

/// The find-tests response: the statically discovered suites.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindTestsResponse {
    /// Discovered top-level suites, if any.
    #[serde(default)]
    pub suites: Option<Vec<FoundTestSuite>>,
}

/// A statically discovered suite or test.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundTestSuite {
    /// The suite or test label. Entries without a label are skipped.
    #[serde(default)]
    pub label: Option<SmolStr>,

    /// Child tests; absent or empty means this entry is a test leaf.
    #[serde(default)]
    pub tests: Option<Vec<FoundTestSuite>>,

    /// The file the definition lives in.
    pub file: Utf8PathBuf,

    /// The definition's position (0-based, editor-native).
    pub position: FoundPosition,
}

/// A 0-based position within a file.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FoundPosition {
    /// 0-based line.
    pub line: u32,
    /// 0-based character.
    pub character: u32,
}

/// Builds the initially loaded tree from a find-tests response, under a
/// synthetic root named after the project.
pub fn seed_suite(project_name: &str, response: &FindTestsResponse) -> SuiteInfo {
    let mut root = SuiteInfo::new_root(project_name);
    root.children = response
        .suites
        .iter()
        .flatten()
        .filter_map(|found| from_found_suite(found, &root.id))
        .collect();
    root
}

fn from_found_suite(found: &FoundTestSuite, prefix_id: &str) -> Option<SuiteNode> {
    let label = found.label.as_ref()?;
    let id = child_id(prefix_id, label);
    let node = match found.tests.as_deref() {
        Some(tests) if !tests.is_empty() => SuiteNode::Suite(SuiteInfo {
            children: tests
                .iter()
                .filter_map(|child| from_found_suite(child, &id))
                .collect(),
            id,
            label: label.clone(),
            file: Some(found.file.clone()),
            line: Some(found.position.line),
        }),
        _ => SuiteNode::Test(TestInfo {
            id,
            label: label.clone(),
            file: Some(found.file.clone()),
            line: Some(found.position.line),
        }),
    };
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn seeds_a_tree_from_a_response() {
        let response: FindTestsResponse = serde_json::from_str(
            r#"{
                "suites": [{
                    "label": "Module",
                    "file": "/proj/tests/Module.elm",
                    "position": {"line": 3, "character": 0},
                    "tests": [{
                        "label": "works",
                        "file": "/proj/tests/Module.elm",
                        "position": {"line": 5, "character": 8}
                    }]
                }]
            }"#,
        )
        .unwrap();

        let suite = seed_suite("proj", &response);
        assert_eq!(suite.id, "proj");
        let module = suite.children[0].as_suite().unwrap();
        assert_eq!(module.id, "proj/Module");
        assert_eq!(module.line, Some(3));
        let test = module.children[0].as_test().unwrap();
        assert_eq!(test.id, "proj/Module/works");
        assert_eq!(test.line, Some(5));
    }

    #[test]
    fn unlabeled_entries_are_skipped() {
        let response: FindTestsResponse = serde_json::from_str(
            r#"{"suites": [{"file": "F.elm", "position": {"line": 0, "character": 0}}]}"#,
        )
        .unwrap();
        let suite = seed_suite("proj", &response);
        assert!(suite.children.is_empty());
    }

    #[test]
    fn empty_response_seeds_an_empty_root() {
        let suite = seed_suite("proj", &FindTestsResponse::default());
        assert!(suite.children.is_empty());
    }
}
