// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// An error that occurs while interpreting a well-formed JSON line from the
/// elm-test event stream.
///
/// Malformed JSON never produces this error: a line that fails to parse as
/// JSON at all is assumed to be free-form diagnostic text and is returned as
/// [`Output::Message`](crate::Output::Message). This error only fires when a
/// line parses as JSON but does not match the known protocol, which
/// indicates a version skew between the tool and this crate rather than
/// ordinary noise.
#[derive(Debug, Error)]
pub enum EventParseError {
    /// The `event` discriminator was missing or had an unrecognized value.
    #[error("unknown event in `{line}`")]
    UnknownEvent {
        /// The offending line.
        line: String,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The `status` field had an unrecognized value.
    #[error("unknown status `{status}`")]
    UnknownStatus {
        /// The unrecognized status value.
        status: String,
    },

    /// A `failures` entry could not be interpreted.
    #[error("unknown failure `{failure}`")]
    UnknownFailure {
        /// The uninterpretable failure entry, re-serialized.
        failure: String,
    },

    /// A string-encoded integer field did not parse as an integer.
    #[error("invalid integer `{value}` for field `{field}`")]
    InvalidInteger {
        /// The field name.
        field: &'static str,
        /// The value that failed to parse.
        value: String,
    },
}
