// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Projection of run results into the events an editor UI consumes.
//!
//! The engine itself never talks to an editor; it produces the event
//! values defined in [`events`] and leaves delivery to the host.

pub mod events;

use crate::list::{SuiteInfo, SuiteNode, TestDataMap, tests_root};
use camino::Utf8Path;
use elmtest_metadata::{Failure, TestStatus};
use events::{RetireEvent, TestDecoration, TestRunUpdate, TestState};
use smol_str::SmolStr;
use std::collections::HashMap;

/// Builds the per-leaf state transitions for a completed run.
///
/// Walks the run tree's leaves in order; `lines` (typically
/// [`SuiteInfo::line_lookup`] over the merged tree) anchors failure
/// decorations. Leaves without recorded data are skipped.
pub fn test_updates(
    suite: &SuiteInfo,
    data: &TestDataMap,
    lines: &HashMap<SmolStr, u32>,
) -> Vec<TestRunUpdate> {
    suite
        .walk()
        .filter_map(SuiteNode::as_test)
        .filter_map(|test| {
            let event = data.get(&test.id)?;
            let message = Some(event.build_message()).filter(|m| !m.is_empty());
            let update = match &event.status {
                TestStatus::Pass => TestRunUpdate {
                    id: test.id.clone(),
                    state: TestState::Passed,
                    message,
                    description: Some(format!("{}s", event.duration)),
                    decorations: Vec::new(),
                },
                TestStatus::Todo { .. } => TestRunUpdate {
                    id: test.id.clone(),
                    state: TestState::Skipped,
                    message,
                    description: None,
                    decorations: Vec::new(),
                },
                TestStatus::Fail { failures } => {
                    let decorations = lines
                        .get(&test.id)
                        .map(|&line| decorations(failures, line))
                        .unwrap_or_default();
                    TestRunUpdate {
                        id: test.id.clone(),
                        state: TestState::Failed,
                        message,
                        description: None,
                        decorations,
                    }
                }
            };
            Some(update)
        })
        .collect()
}

/// Builds one decoration per failure, anchored at `line`.
pub fn decorations(failures: &[Failure], line: u32) -> Vec<TestDecoration> {
    failures
        .iter()
        .map(|failure| {
            let message = match failure {
                Failure::Comparison {
                    comparison,
                    actual,
                    expected,
                } => format!(
                    "{comparison} {} {}",
                    abbreviate_to_one_line(expected),
                    abbreviate_to_one_line(actual)
                ),
                Failure::Message(message) => message.clone(),
                Failure::Data(data) => data
                    .iter()
                    .map(|(key, value)| format!("{key}: {value}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            };
            TestDecoration { line, message }
        })
        .collect()
}

/// Classifies a saved file into the retire signal it warrants: a save
/// under the tests root retires that file's ids, any other save inside the
/// project retires everything, and unrelated saves retire nothing.
pub fn retire_for_save(
    saved: &Utf8Path,
    project_folder: &Utf8Path,
    suite: &SuiteInfo,
) -> Option<RetireEvent> {
    if saved.starts_with(tests_root(project_folder)) {
        Some(RetireEvent::Ids(suite.test_ids_for_file(saved)))
    } else if saved.starts_with(project_folder) {
        Some(RetireEvent::All)
    } else {
        None
    }
}

/// Collapses text to a single line of at most 20 characters, appending
/// ` ...` when truncated.
pub fn abbreviate_to_one_line(text: &str) -> String {
    let one_line = text.split('\n').collect::<Vec<_>>().join(" ");
    if one_line.chars().count() > 20 {
        let prefix: String = one_line.chars().take(20).collect();
        format!("{prefix} ...")
    } else {
        one_line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elmtest_metadata::TestCompleted;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("short", "short" ; "short text is untouched")]
    #[test_case("two\nlines", "two lines" ; "newlines collapse to spaces")]
    #[test_case(
        "a very long single line of text",
        "a very long single l ..."
        ; "long text is truncated"
    )]
    fn abbreviates(input: &str, expected: &str) {
        assert_eq!(abbreviate_to_one_line(input), expected);
    }

    fn run_fixture() -> (SuiteInfo, TestDataMap) {
        let mut suite = SuiteInfo::new_root("proj");
        let tests_root = Utf8Path::new("/proj/tests");
        let mut data = TestDataMap::new();

        let pass = TestCompleted {
            labels: vec!["Module".into(), "passes".into()],
            messages: vec![],
            duration: 13,
            status: TestStatus::Pass,
        };
        let id = suite.insert(&pass, tests_root).unwrap();
        data.insert(id, pass);

        let fail = TestCompleted {
            labels: vec!["Module".into(), "fails".into()],
            messages: vec![],
            duration: 2,
            status: TestStatus::Fail {
                failures: vec![Failure::Comparison {
                    comparison: "Expect.equal".to_owned(),
                    actual: "1".to_owned(),
                    expected: "2".to_owned(),
                }],
            },
        };
        let id = suite.insert(&fail, tests_root).unwrap();
        data.insert(id, fail);

        (suite, data)
    }

    #[test]
    fn updates_follow_leaf_order() {
        let (suite, data) = run_fixture();
        let lines = HashMap::from([(SmolStr::from("proj/Module/fails"), 7)]);
        let updates = test_updates(&suite, &data, &lines);

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].id, "proj/Module/passes");
        assert_eq!(updates[0].state, TestState::Passed);
        assert_eq!(updates[0].description.as_deref(), Some("13s"));

        assert_eq!(updates[1].id, "proj/Module/fails");
        assert_eq!(updates[1].state, TestState::Failed);
        assert_eq!(
            updates[1].decorations,
            [TestDecoration {
                line: 7,
                message: "Expect.equal 2 1".to_owned()
            }]
        );
    }

    #[test]
    fn failures_without_a_line_get_no_decorations() {
        let (suite, data) = run_fixture();
        let updates = test_updates(&suite, &data, &HashMap::new());
        assert!(updates[1].decorations.is_empty());
        assert!(updates[1].message.as_deref().unwrap().contains("| Expect.equal"));
    }

    #[test]
    fn saves_under_the_tests_root_retire_that_file() {
        let (suite, _) = run_fixture();
        let retire = retire_for_save(
            Utf8Path::new("/proj/tests/Module.elm"),
            Utf8Path::new("/proj"),
            &suite,
        );
        assert_eq!(
            retire,
            Some(RetireEvent::Ids(vec![
                "proj/Module".into(),
                "proj/Module/passes".into(),
                "proj/Module/fails".into(),
            ]))
        );
    }

    #[test]
    fn source_saves_retire_everything() {
        let (suite, _) = run_fixture();
        let retire = retire_for_save(
            Utf8Path::new("/proj/src/Main.elm"),
            Utf8Path::new("/proj"),
            &suite,
        );
        assert_eq!(retire, Some(RetireEvent::All));
    }

    #[test]
    fn unrelated_saves_are_ignored() {
        let (suite, _) = run_fixture();
        let retire = retire_for_save(
            Utf8Path::new("/other/file.elm"),
            Utf8Path::new("/proj"),
            &suite,
        );
        assert_eq!(retire, None);
    }
}
