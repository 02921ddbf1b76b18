// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::list::{SuiteInfo, SuiteNode};
use camino::Utf8Path;
use smol_str::SmolStr;
use std::collections::HashMap;

type Location<'a> = (Option<&'a Utf8Path>, Option<u32>);

/// Copies every known `file`/`line` in `source` onto the matching ids in
/// `dest`, returning the enriched tree.
///
/// Matching is by full id, independent of subtree shape. Locations already
/// known in `dest` are kept; absent values in `source` never erase them.
/// Pure: neither input is mutated.
pub fn copy_locations(source: &SuiteInfo, dest: &SuiteInfo) -> SuiteInfo {
    let by_id = locations_by_id(source);
    enrich_suite(dest, &by_id)
}

/// Merges a freshly observed (possibly partial) tree into a previously
/// known tree with the same root identity.
///
/// If the root ids differ, `fresh` becomes a new top-level child of
/// `stale`: two unrelated projects coexisting. Otherwise the result is
/// shaped by the fresh run but never regresses known source locations:
/// `fresh` is location-enriched from `stale` first, then the merged child
/// list takes `stale`'s children in their original order, replaces those
/// whose id also appears in `fresh` with the fresh version, and appends the
/// fresh-only children. Stable ordering for untouched branches keeps
/// editor list rendering continuous.
pub fn merge_top_level(fresh: SuiteInfo, stale: &SuiteInfo) -> SuiteInfo {
    if fresh.id != stale.id {
        let mut merged = stale.clone();
        merged.children.push(SuiteNode::Suite(fresh));
        return merged;
    }

    let fresh = copy_locations(stale, &fresh);
    let mut fresh_children: Vec<Option<SuiteNode>> = fresh.children.into_iter().map(Some).collect();
    let index: HashMap<SmolStr, usize> = fresh_children
        .iter()
        .enumerate()
        .filter_map(|(i, child)| Some((child.as_ref()?.id().clone(), i)))
        .collect();

    let mut children: Vec<SuiteNode> = stale
        .children
        .iter()
        .map(|stale_child| {
            index
                .get(stale_child.id())
                .and_then(|&i| fresh_children[i].take())
                .unwrap_or_else(|| stale_child.clone())
        })
        .collect();
    children.extend(fresh_children.into_iter().flatten());

    SuiteInfo {
        id: stale.id.clone(),
        label: stale.label.clone(),
        file: fresh.file,
        line: fresh.line,
        children,
    }
}

fn locations_by_id(source: &SuiteInfo) -> HashMap<&str, Location<'_>> {
    let mut by_id: HashMap<&str, Location<'_>> = source
        .walk()
        .map(|node| (node.id().as_str(), (node.file(), node.line())))
        .collect();
    by_id.insert(source.id.as_str(), (source.file.as_deref(), source.line));
    by_id
}

fn enrich_suite(suite: &SuiteInfo, by_id: &HashMap<&str, Location<'_>>) -> SuiteInfo {
    let (file, line) = enriched_location(suite.id.as_str(), suite.file.as_deref(), suite.line, by_id);
    SuiteInfo {
        id: suite.id.clone(),
        label: suite.label.clone(),
        file,
        line,
        children: suite
            .children
            .iter()
            .map(|child| enrich_node(child, by_id))
            .collect(),
    }
}

fn enrich_node(node: &SuiteNode, by_id: &HashMap<&str, Location<'_>>) -> SuiteNode {
    match node {
        SuiteNode::Suite(suite) => SuiteNode::Suite(enrich_suite(suite, by_id)),
        SuiteNode::Test(test) => {
            let (file, line) =
                enriched_location(test.id.as_str(), test.file.as_deref(), test.line, by_id);
            let mut test = test.clone();
            test.file = file;
            test.line = line;
            SuiteNode::Test(test)
        }
    }
}

fn enriched_location(
    id: &str,
    file: Option<&Utf8Path>,
    line: Option<u32>,
    by_id: &HashMap<&str, Location<'_>>,
) -> (Option<camino::Utf8PathBuf>, Option<u32>) {
    let found = by_id.get(id);
    let file = file
        .or_else(|| found.and_then(|(file, _)| *file))
        .map(Utf8Path::to_path_buf);
    let line = line.or_else(|| found.and_then(|(_, line)| *line));
    (file, line)
}
