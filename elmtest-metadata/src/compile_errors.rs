// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use serde::Deserialize;

/// The result of parsing the stderr payload of an elm-test run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorOutput {
    /// The payload was not a compile-error report: raw text, passed through
    /// verbatim.
    Message(String),

    /// A structured compile-error report.
    CompileErrors(CompileErrorReport),
}

/// A compile-error report, as emitted by the Elm compiler via elm-test.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CompileErrorReport {
    /// The per-file errors, in report order.
    pub errors: Vec<CompileError>,
}

/// All problems reported for a single source file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CompileError {
    /// The path of the offending file.
    pub path: Utf8PathBuf,
    /// The module name.
    pub name: String,
    /// The problems found in the file.
    pub problems: Vec<Problem>,
}

/// A single compiler problem.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Problem {
    /// A short problem title, e.g. `TYPE MISMATCH`.
    pub title: String,
    /// The source region the problem points at.
    pub region: Region,
    /// The problem explanation, as a sequence of plain and styled parts.
    pub message: Vec<MessagePart>,
}

/// A source region, spanning `start` to `end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Region {
    /// The start of the region.
    pub start: Position,
    /// The end of the region (inclusive, compiler-native).
    pub end: Position,
}

/// A 1-based source position, as reported by the compiler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Position {
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

/// A fragment of a problem explanation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MessagePart {
    /// A plain text fragment.
    Plain(String),
    /// A fragment with terminal styling attached.
    Styled(StyledString),
}

/// A styled text fragment within a problem explanation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct StyledString {
    /// Whether the fragment is bold.
    #[serde(default)]
    pub bold: bool,
    /// Whether the fragment is underlined.
    #[serde(default)]
    pub underline: bool,
    /// An optional color name.
    #[serde(default)]
    pub color: Option<String>,
    /// The text itself.
    pub string: String,
}

/// Parses the whole stderr buffer of an elm-test run.
///
/// Unlike the stdout stream this is a single JSON document, not
/// line-oriented. Anything that is not a `{"type": "compile-errors"}`
/// payload degrades to [`ErrorOutput::Message`] carrying the raw text.
pub fn parse_error_output(text: &str) -> ErrorOutput {
    match serde_json::from_str::<RawErrorOutput>(text) {
        Ok(RawErrorOutput::CompileErrors { errors }) => {
            ErrorOutput::CompileErrors(CompileErrorReport { errors })
        }
        Err(_) => ErrorOutput::Message(text.to_owned()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawErrorOutput {
    #[serde(rename = "compile-errors")]
    CompileErrors { errors: Vec<CompileError> },
}

impl ErrorOutput {
    /// Builds the human-readable message for this payload.
    pub fn build_message(&self) -> String {
        match self {
            ErrorOutput::Message(text) => text.clone(),
            ErrorOutput::CompileErrors(report) => report.build_message(),
        }
    }
}

impl CompileErrorReport {
    /// Renders the report the way the extension shows it: per file, the
    /// path followed by each problem's `line:col-line:col TITLE` header and
    /// explanation text (styling stripped).
    pub fn build_message(&self) -> String {
        self.errors
            .iter()
            .map(CompileError::build_message)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl CompileError {
    fn build_message(&self) -> String {
        std::iter::once(self.path.to_string())
            .chain(self.problems.iter().map(Problem::build_message))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Problem {
    fn build_message(&self) -> String {
        let mut message = format!("{} {}\n", self.region, self.title);
        for part in &self.message {
            message.push_str(part.text());
        }
        message
    }
}

impl MessagePart {
    /// The text of this fragment, without styling.
    pub fn text(&self) -> &str {
        match self {
            MessagePart::Plain(text) => text,
            MessagePart::Styled(styled) => &styled.string,
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}
