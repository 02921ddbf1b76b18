// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::EventParseError;
use serde::Deserialize;
use serde_json::Value;
use smol_str::SmolStr;
use std::collections::BTreeMap;

/// The result of parsing one line of elm-test standard output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    /// The line was not JSON: free-form diagnostic text, passed through
    /// verbatim.
    Message(String),

    /// The line was a structured protocol event.
    Event(Event),
}

/// A structured event from the elm-test JSON report stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The run started.
    RunStart {
        /// The number of tests that will be run.
        test_count: u64,
    },

    /// A single test finished.
    TestCompleted(TestCompleted),

    /// The run finished.
    RunComplete {
        /// The number of tests that passed.
        passed: u64,
        /// The number of tests that failed.
        failed: u64,
        /// Wall-clock duration of the run in milliseconds.
        duration: u64,
    },
}

/// A completed test, with its label path and outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCompleted {
    /// The label path from the outermost module or `describe` down to the
    /// test name itself.
    pub labels: Vec<SmolStr>,

    /// Free-form output lines attributed to this test.
    ///
    /// elm-test does not put these on the event itself: they arrive as
    /// plain-text lines preceding it in the stream, and the consumer is
    /// responsible for attaching them (see the runner's line fold).
    pub messages: Vec<String>,

    /// Duration of this test in milliseconds.
    pub duration: u64,

    /// The test outcome.
    pub status: TestStatus,
}

/// The outcome of a completed test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestStatus {
    /// The test passed.
    Pass,

    /// The test is a `Test.todo` placeholder.
    Todo {
        /// The todo comment.
        comment: String,
    },

    /// The test failed.
    Fail {
        /// The individual failures, in report order.
        failures: Vec<Failure>,
    },
}

/// A single failure within a failed test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    /// A plain failure message.
    Message(String),

    /// A structured comparison failure, e.g. from `Expect.equal`.
    Comparison {
        /// The comparison operator, e.g. `"Expect.equal"`.
        comparison: String,
        /// The actual value, decoded from its wire representation.
        actual: String,
        /// The expected value, decoded from its wire representation.
        expected: String,
    },

    /// An arbitrary key/value diagnostic payload.
    Data(BTreeMap<String, String>),
}

/// Parses one line of elm-test standard output.
///
/// Lines that are not JSON at all come back as [`Output::Message`]; the
/// subprocess freely interleaves diagnostic text with its event stream, so
/// this is not an error. A line that *is* JSON but does not match the known
/// protocol is a hard [`EventParseError`], since it signals a protocol
/// version mismatch the caller should surface.
pub fn parse_output(line: &str) -> Result<Output, EventParseError> {
    let Ok(value) = serde_json::from_str::<Value>(line) else {
        return Ok(Output::Message(line.to_owned()));
    };
    parse_event(value, line).map(Output::Event)
}

fn parse_event(value: Value, line: &str) -> Result<Event, EventParseError> {
    let raw: RawEvent =
        serde_json::from_value(value).map_err(|source| EventParseError::UnknownEvent {
            line: line.to_owned(),
            source,
        })?;
    match raw {
        RawEvent::RunStart { test_count } => Ok(Event::RunStart {
            test_count: parse_int("testCount", &test_count)?,
        }),
        RawEvent::RunComplete {
            passed,
            failed,
            duration,
        } => Ok(Event::RunComplete {
            passed: parse_int("passed", &passed)?,
            failed: parse_int("failed", &failed)?,
            duration: parse_int("duration", &duration)?,
        }),
        RawEvent::TestCompleted {
            labels,
            messages,
            duration,
            status,
            failures,
        } => {
            let status = parse_status(&status, failures)?;
            Ok(Event::TestCompleted(TestCompleted {
                labels,
                messages,
                duration: parse_int("duration", &duration)?,
                status,
            }))
        }
    }
}

fn parse_status(status: &str, failures: Vec<RawFailure>) -> Result<TestStatus, EventParseError> {
    match status {
        "pass" => Ok(TestStatus::Pass),
        "todo" => {
            let comment = failures
                .into_iter()
                .next()
                .map(|failure| match failure {
                    RawFailure::Text(text) => text,
                    RawFailure::Entry(entry) => entry.message.unwrap_or_default(),
                })
                .unwrap_or_default();
            Ok(TestStatus::Todo { comment })
        }
        "fail" => {
            let failures = failures
                .into_iter()
                .map(parse_failure)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TestStatus::Fail { failures })
        }
        other => Err(EventParseError::UnknownStatus {
            status: other.to_owned(),
        }),
    }
}

fn parse_failure(raw: RawFailure) -> Result<Failure, EventParseError> {
    let entry = match raw {
        // A bare string in `failures` is only meaningful for `todo`.
        RawFailure::Text(text) => {
            return Err(EventParseError::UnknownFailure { failure: text });
        }
        RawFailure::Entry(entry) => entry,
    };
    match entry.reason.and_then(|reason| reason.data) {
        Some(Value::Object(data)) => {
            if data.contains_key("comparison") {
                let field = |key: &str| {
                    data.get(key)
                        .map(value_to_string)
                        .unwrap_or_default()
                };
                Ok(Failure::Comparison {
                    comparison: field("comparison"),
                    actual: eval_string_literal(field("actual")),
                    expected: eval_string_literal(field("expected")),
                })
            } else {
                let data = data
                    .iter()
                    .map(|(key, value)| (key.clone(), value_to_string(value)))
                    .collect();
                Ok(Failure::Data(data))
            }
        }
        Some(Value::Null) | None => match entry.message {
            Some(message) => Ok(Failure::Message(message)),
            None => Err(EventParseError::UnknownFailure {
                failure: "{}".to_owned(),
            }),
        },
        Some(data) => Ok(Failure::Message(value_to_string(&data))),
    }
}

fn parse_int(field: &'static str, value: &str) -> Result<u64, EventParseError> {
    value
        .parse()
        .map_err(|_| EventParseError::InvalidInteger {
            field,
            value: value.to_owned(),
        })
}

/// Decodes a JSON-string-encoded literal, e.g. `"\"1\""` to `1`.
///
/// elm-test double-encodes string values in comparison failures; values
/// that are not string literals pass through unchanged.
fn eval_string_literal(value: String) -> String {
    if value.starts_with('"') {
        serde_json::from_str::<String>(&value).unwrap_or(value)
    } else {
        value
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl TestCompleted {
    /// Builds the human-readable failure message for this test.
    ///
    /// For failed tests this is the attributed free-text output followed by
    /// a rendering of each failure; otherwise just the free-text output.
    pub fn build_message(&self) -> String {
        let mut lines: Vec<String> = self.messages.clone();
        if let TestStatus::Fail { failures } = &self.status {
            for failure in failures {
                match failure {
                    Failure::Comparison {
                        comparison,
                        actual,
                        expected,
                    } => {
                        lines.push(actual.clone());
                        lines.push(format!("| {comparison}"));
                        lines.push(expected.clone());
                    }
                    Failure::Data(data) => {
                        lines.extend(data.iter().map(|(key, value)| format!("{key}: {value}")));
                    }
                    Failure::Message(message) => lines.push(message.clone()),
                }
            }
        }
        lines.join("\n")
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum RawEvent {
    RunStart {
        test_count: String,
    },
    RunComplete {
        passed: String,
        failed: String,
        duration: String,
    },
    TestCompleted {
        labels: Vec<SmolStr>,
        #[serde(default)]
        messages: Vec<String>,
        duration: String,
        status: String,
        #[serde(default)]
        failures: Vec<RawFailure>,
    },
}

// `failures` entries are either bare strings (todo comments) or
// message/reason records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawFailure {
    Text(String),
    Entry(RawFailureEntry),
}

#[derive(Debug, Deserialize)]
struct RawFailureEntry {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    reason: Option<RawReason>,
}

#[derive(Debug, Deserialize)]
struct RawReason {
    #[serde(default)]
    data: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn parses_run_start() {
        let line = r#"{"event":"runStart","testCount":"9","fuzzRuns":"100","paths":[],"initialSeed":"1448022641"}"#;
        let output = parse_output(line).unwrap();
        assert_eq!(output, Output::Event(Event::RunStart { test_count: 9 }));
    }

    #[test]
    fn parses_run_complete() {
        let line = r#"{"event":"runComplete","passed":"8","failed":"1","duration":"142","autoFail":null}"#;
        let output = parse_output(line).unwrap();
        assert_eq!(
            output,
            Output::Event(Event::RunComplete {
                passed: 8,
                failed: 1,
                duration: 142,
            })
        );
    }

    #[test]
    fn parses_passed_test() {
        let line = r#"{"event":"testCompleted","status":"pass","labels":["Module","works"],"failures":[],"duration":"13"}"#;
        let output = parse_output(line).unwrap();
        assert_eq!(
            output,
            Output::Event(Event::TestCompleted(TestCompleted {
                labels: vec!["Module".into(), "works".into()],
                messages: vec![],
                duration: 13,
                status: TestStatus::Pass,
            }))
        );
    }

    #[test]
    fn parses_todo_test() {
        let line = r#"{"event":"testCompleted","status":"todo","labels":["Module"],"failures":["write this later"],"duration":"0"}"#;
        let output = parse_output(line).unwrap();
        let Output::Event(Event::TestCompleted(event)) = output else {
            panic!("expected testCompleted, got {output:?}");
        };
        assert_eq!(
            event.status,
            TestStatus::Todo {
                comment: "write this later".to_owned()
            }
        );
    }

    #[test]
    fn parses_comparison_failure() {
        let line = r#"{"event":"testCompleted","status":"fail","labels":["Module","fails"],"failures":[{"given":null,"message":"Expect.equal","reason":{"type":"custom","data":{"comparison":"Expect.equal","actual":"\"1\"","expected":"\"2\""}}}],"duration":"1"}"#;
        let output = parse_output(line).unwrap();
        let Output::Event(Event::TestCompleted(event)) = output else {
            panic!("expected testCompleted, got {output:?}");
        };
        assert_eq!(
            event.status,
            TestStatus::Fail {
                failures: vec![Failure::Comparison {
                    comparison: "Expect.equal".to_owned(),
                    // String literals are double-encoded on the wire.
                    actual: "1".to_owned(),
                    expected: "2".to_owned(),
                }]
            }
        );
    }

    #[test]
    fn parses_data_failure() {
        let line = r#"{"event":"testCompleted","status":"fail","labels":["M","t"],"failures":[{"reason":{"data":{"first":"one","second":"two"}}}],"duration":"1"}"#;
        let output = parse_output(line).unwrap();
        let Output::Event(Event::TestCompleted(event)) = output else {
            panic!("expected testCompleted, got {output:?}");
        };
        let expected: BTreeMap<String, String> = [
            ("first".to_owned(), "one".to_owned()),
            ("second".to_owned(), "two".to_owned()),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            event.status,
            TestStatus::Fail {
                failures: vec![Failure::Data(expected)]
            }
        );
    }

    #[test]
    fn parses_string_reason_as_message() {
        let line = r#"{"event":"testCompleted","status":"fail","labels":["M","t"],"failures":[{"reason":{"data":"boom"}}],"duration":"1"}"#;
        let Output::Event(Event::TestCompleted(event)) = parse_output(line).unwrap() else {
            panic!("expected testCompleted");
        };
        assert_eq!(
            event.status,
            TestStatus::Fail {
                failures: vec![Failure::Message("boom".to_owned())]
            }
        );
    }

    #[test_case("" ; "empty line")]
    #[test_case("Compiling ..." ; "progress text")]
    #[test_case(r#"{"event": "runStart""# ; "truncated JSON")]
    #[test_case("[1, 2" ; "truncated array")]
    fn non_json_degrades_to_message(line: &str) {
        let output = parse_output(line).unwrap();
        assert_eq!(output, Output::Message(line.to_owned()));
    }

    #[test]
    fn unknown_event_is_an_error() {
        let line = r#"{"event":"runPaused"}"#;
        let err = parse_output(line).unwrap_err();
        assert!(matches!(err, EventParseError::UnknownEvent { .. }), "{err}");
    }

    #[test]
    fn unknown_status_is_an_error() {
        let line = r#"{"event":"testCompleted","status":"flaky","labels":["M"],"duration":"1"}"#;
        let err = parse_output(line).unwrap_err();
        assert!(
            matches!(err, EventParseError::UnknownStatus { ref status } if status == "flaky"),
            "{err}"
        );
    }

    #[test]
    fn non_numeric_duration_is_an_error() {
        let line = r#"{"event":"testCompleted","status":"pass","labels":["M"],"duration":"fast"}"#;
        let err = parse_output(line).unwrap_err();
        assert!(
            matches!(err, EventParseError::InvalidInteger { field: "duration", .. }),
            "{err}"
        );
    }

    #[test]
    fn builds_comparison_message() {
        let event = TestCompleted {
            labels: vec!["Module".into(), "fails".into()],
            messages: vec!["hello".to_owned(), "world".to_owned()],
            duration: 1,
            status: TestStatus::Fail {
                failures: vec![Failure::Comparison {
                    comparison: "Expect.equal".to_owned(),
                    actual: "1".to_owned(),
                    expected: "2".to_owned(),
                }],
            },
        };
        assert_eq!(event.build_message(), "hello\nworld\n1\n| Expect.equal\n2");
    }

    #[test]
    fn builds_data_message() {
        let data: BTreeMap<String, String> = [
            ("first".to_owned(), "one".to_owned()),
            ("second".to_owned(), "two".to_owned()),
        ]
        .into_iter()
        .collect();
        let event = TestCompleted {
            labels: vec!["M".into(), "t".into()],
            messages: vec![],
            duration: 1,
            status: TestStatus::Fail {
                failures: vec![Failure::Data(data)],
            },
        };
        assert_eq!(event.build_message(), "first: one\nsecond: two");
    }

    #[test]
    fn builds_plain_message_for_passes() {
        let event = TestCompleted {
            labels: vec!["M".into(), "t".into()],
            messages: vec!["left over".to_owned()],
            duration: 1,
            status: TestStatus::Pass,
        };
        assert_eq!(event.build_message(), "left over");
    }
}
