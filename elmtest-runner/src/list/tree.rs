// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::InsertError;
use camino::{Utf8Path, Utf8PathBuf};
use elmtest_metadata::TestCompleted;
use itertools::Itertools;
use smol_str::SmolStr;
use std::collections::HashMap;

/// A node in the suite tree: a named grouping or a single test case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SuiteNode {
    /// A suite: a module or nested `describe` block, owning its children.
    Suite(SuiteInfo),
    /// A test leaf. Its completed-run data lives in the per-run
    /// [`TestDataMap`] side table, keyed by id.
    Test(TestInfo),
}

/// A suite node and its children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuiteInfo {
    /// The node id: ancestor labels joined with `/`. Synthetic roots use
    /// the project name as their id.
    pub id: SmolStr,
    /// The raw leaf name.
    pub label: SmolStr,
    /// The associated source file, if known.
    pub file: Option<Utf8PathBuf>,
    /// The associated 0-based source line, if known.
    pub line: Option<u32>,
    /// Children, in insertion order.
    pub children: Vec<SuiteNode>,
}

/// A test leaf node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestInfo {
    /// The node id: ancestor labels joined with `/`.
    pub id: SmolStr,
    /// The raw test name.
    pub label: SmolStr,
    /// The associated source file, if known.
    pub file: Option<Utf8PathBuf>,
    /// The associated 0-based source line, if known.
    pub line: Option<u32>,
}

impl SuiteNode {
    /// The node id.
    pub fn id(&self) -> &SmolStr {
        match self {
            SuiteNode::Suite(suite) => &suite.id,
            SuiteNode::Test(test) => &test.id,
        }
    }

    /// The raw leaf name.
    pub fn label(&self) -> &SmolStr {
        match self {
            SuiteNode::Suite(suite) => &suite.label,
            SuiteNode::Test(test) => &test.label,
        }
    }

    /// The associated source file, if known.
    pub fn file(&self) -> Option<&Utf8Path> {
        match self {
            SuiteNode::Suite(suite) => suite.file.as_deref(),
            SuiteNode::Test(test) => test.file.as_deref(),
        }
    }

    /// The associated 0-based source line, if known.
    pub fn line(&self) -> Option<u32> {
        match self {
            SuiteNode::Suite(suite) => suite.line,
            SuiteNode::Test(test) => test.line,
        }
    }

    /// Returns the contained suite, if this is a suite node.
    pub fn as_suite(&self) -> Option<&SuiteInfo> {
        match self {
            SuiteNode::Suite(suite) => Some(suite),
            SuiteNode::Test(_) => None,
        }
    }

    /// Returns the contained test, if this is a test leaf.
    pub fn as_test(&self) -> Option<&TestInfo> {
        match self {
            SuiteNode::Suite(_) => None,
            SuiteNode::Test(test) => Some(test),
        }
    }

    /// Walks this node and all descendants, preorder.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

/// Preorder iterator over a subtree. Created by [`SuiteNode::walk`] and
/// [`SuiteInfo::walk`].
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<&'a SuiteNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a SuiteNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let SuiteNode::Suite(suite) = node {
            self.stack.extend(suite.children.iter().rev());
        }
        Some(node)
    }
}

impl SuiteInfo {
    /// Creates an empty synthetic root. Its id and label are the project
    /// name rather than a joined label path.
    pub fn new_root(name: impl Into<SmolStr>) -> Self {
        let name = name.into();
        SuiteInfo {
            id: name.clone(),
            label: name,
            file: None,
            line: None,
            children: Vec::new(),
        }
    }

    /// Walks every descendant of this suite, preorder. The suite itself is
    /// not yielded; root fields are handled by the callers that care.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// Inserts a completed test under this suite, creating intermediate
    /// suites along its label path as needed, and returns the leaf id.
    ///
    /// Intermediate labels find-or-create a child suite; the final label
    /// always creates a new test leaf, and a duplicate leaf label among
    /// siblings is an [`InsertError::DuplicateTestId`]. Newly created nodes
    /// are associated with the file derived from the outermost label
    /// (dot-separated module path under `tests_root`).
    pub fn insert(
        &mut self,
        event: &TestCompleted,
        tests_root: &Utf8Path,
    ) -> Result<SmolStr, InsertError> {
        let file = event
            .labels
            .first()
            .map(|module| module_file(tests_root, module));
        self.insert_at(&event.labels, file.as_deref())
    }

    fn insert_at(
        &mut self,
        labels: &[SmolStr],
        file: Option<&Utf8Path>,
    ) -> Result<SmolStr, InsertError> {
        match labels {
            [] => Err(InsertError::EmptyLabelPath),
            [leaf] => {
                let id = child_id(&self.id, leaf);
                if self.children.iter().any(|child| child.label() == leaf) {
                    return Err(InsertError::DuplicateTestId { id });
                }
                self.children.push(SuiteNode::Test(TestInfo {
                    id: id.clone(),
                    label: leaf.clone(),
                    file: file.map(Utf8Path::to_path_buf),
                    line: None,
                }));
                Ok(id)
            }
            [label, rest @ ..] => {
                for child in &mut self.children {
                    if child.label() == label {
                        return match child {
                            SuiteNode::Suite(suite) => suite.insert_at(rest, file),
                            // A test leaf already owns this label; a suite
                            // with the same label would break sibling
                            // uniqueness.
                            SuiteNode::Test(test) => Err(InsertError::DuplicateTestId {
                                id: test.id.clone(),
                            }),
                        };
                    }
                }
                let mut suite = SuiteInfo {
                    id: child_id(&self.id, label),
                    label: label.clone(),
                    file: file.map(Utf8Path::to_path_buf),
                    line: None,
                    children: Vec::new(),
                };
                let id = suite.insert_at(rest, file)?;
                self.children.push(SuiteNode::Suite(suite));
                Ok(id)
            }
        }
    }

    /// Returns the ids of every node associated with `file`.
    pub fn test_ids_for_file(&self, file: &Utf8Path) -> Vec<SmolStr> {
        self.walk()
            .filter(|node| node.file() == Some(file))
            .map(|node| node.id().clone())
            .collect()
    }

    /// Expands a selection of node ids to the files those nodes live in,
    /// plus every node id associated with any of those files.
    ///
    /// This drives partial runs: elm-test narrows a run by file, so
    /// selecting one test re-runs its whole file and the caller needs to
    /// know which ids that covers.
    pub fn files_and_all_test_ids(
        &self,
        selected_ids: &[SmolStr],
    ) -> (Vec<Utf8PathBuf>, Vec<SmolStr>) {
        let files: Vec<Utf8PathBuf> = self
            .walk()
            .filter(|node| selected_ids.contains(node.id()))
            .filter_map(|node| node.file())
            .unique()
            .map(Utf8Path::to_path_buf)
            .collect();
        let all_ids = self
            .walk()
            .filter(|node| {
                node.file()
                    .is_some_and(|file| files.iter().any(|f| f == file))
            })
            .map(|node| node.id().clone())
            .collect();
        (files, all_ids)
    }

    /// Returns an id-to-line map over every node with a known line.
    pub fn line_lookup(&self) -> HashMap<SmolStr, u32> {
        self.walk()
            .filter_map(|node| Some((node.id().clone(), node.line()?)))
            .collect()
    }
}

/// The per-run side table mapping test leaf ids to their completed events.
///
/// Fully rebuilt on every run; never persisted across runs.
#[derive(Clone, Debug, Default)]
pub struct TestDataMap {
    map: HashMap<SmolStr, TestCompleted>,
}

impl TestDataMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the event for a leaf id.
    pub fn insert(&mut self, id: SmolStr, event: TestCompleted) {
        self.map.insert(id, event);
    }

    /// Looks up the event for a leaf id.
    pub fn get(&self, id: &str) -> Option<&TestCompleted> {
        self.map.get(id)
    }

    /// The number of recorded events.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no events were recorded.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// The conventional test-source root of an Elm project.
pub fn tests_root(project_folder: &Utf8Path) -> Utf8PathBuf {
    project_folder.join("tests")
}

/// Derives the source file for a dot-separated module path, e.g.
/// `Nested.Module` becomes `<tests_root>/Nested/Module.elm`.
pub fn module_file(tests_root: &Utf8Path, module: &str) -> Utf8PathBuf {
    tests_root.join(format!("{}.elm", module.replace('.', "/")))
}

pub(crate) fn child_id(parent_id: &str, label: &str) -> SmolStr {
    SmolStr::from(format!("{parent_id}/{label}"))
}
