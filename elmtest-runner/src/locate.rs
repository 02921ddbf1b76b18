// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort location of a test definition inside raw source text.
//!
//! This is a heuristic, not a parser: it matches defining keywords with a
//! regex and breaks ties between same-named definitions with indentation.
//! It does not understand Elm scoping and can misfire on pathological
//! files; callers treat a miss (or a wrong hit) as absence of a decoration,
//! never as an error.

use regex::Regex;
use smol_str::SmolStr;
use tracing::debug;

/// Finds the text offset most likely corresponding to the test definition
/// named by `labels` (outermost first).
///
/// The outermost label is matched against every
/// `describe`/`test`/`fuzz ...` definition carrying that string; among the
/// matches the least-indented one wins (top-level definitions are less
/// indented than nested ones), with `indent_of` mapping an offset to its
/// indentation. Each subsequent label is then located by a forward search
/// for its quoted form after the previous hit. Any miss returns `None`
/// rather than guessing.
pub fn find_offset(
    labels: &[SmolStr],
    text: &str,
    indent_of: impl Fn(usize) -> usize,
) -> Option<usize> {
    let top_level = labels.first()?;
    let pattern = format!(
        r#"(describe|test|fuzz\s+.*?)\s+"{}""#,
        regex::escape(top_level)
    );
    let regex = match Regex::new(&pattern) {
        Ok(regex) => regex,
        Err(error) => {
            debug!("failed to build locator pattern for `{top_level}`: {error}");
            return None;
        }
    };

    // Least-indented match wins; ties keep the earliest.
    let anchor = regex
        .find_iter(text)
        .map(|m| (m.start(), indent_of(m.start())))
        .reduce(|best, next| if next.1 < best.1 { next } else { best })
        .map(|(offset, _)| offset)?;

    labels.iter().try_fold(anchor, |from, label| {
        let needle = format!("\"{label}\"");
        text[from..].find(&needle).map(|index| from + index)
    })
}

/// Returns the indentation of the line containing `offset`: the column of
/// its first non-whitespace character.
pub fn indent_at(text: &str, offset: usize) -> usize {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    text[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .count()
}

/// Returns the 0-based line containing `offset`.
pub fn line_of_offset(text: &str, offset: usize) -> u32 {
    text[..offset.min(text.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count() as u32
}
