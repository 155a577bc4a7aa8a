// SPDX-License-Identifier: Apache-2.0

use uxgate_adapters::normalize_route;

pub(crate) fn wildcard_matches(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == value;
    }
    let mut cursor = 0usize;
    for (idx, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if idx == 0 && !pattern.starts_with('*') {
            if !value[cursor..].starts_with(part) {
                return false;
            }
            cursor += part.len();
            continue;
        }
        if idx == parts.len() - 1 && !pattern.ends_with('*') {
            return value.ends_with(part) && value[cursor..].contains(part);
        }
        if let Some(pos) = value[cursor..].find(part) {
            cursor += pos + part.len();
        } else {
            return false;
        }
    }
    true
}

/// Query strings and trailing slashes are ignored on both sides.
#[must_use]
pub fn route_matches(expected: &str, actual: &str) -> bool {
    wildcard_matches(&normalize_route(expected), &normalize_route(actual))
}

fn split_method(raw: &str) -> (Option<&str>, &str) {
    let raw = raw.trim();
    match raw.split_once(' ') {
        Some((method, path))
            if !method.is_empty() && method.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            (Some(method), path.trim())
        }
        _ => (None, raw),
    }
}

/// `expected` is `[METHOD ]path`, path may use `*`; observed requests are
/// `METHOD path`. A method-less expectation matches any method.
#[must_use]
pub fn request_matches(expected: &str, observed: &str) -> bool {
    let (want_method, want_path) = split_method(expected);
    let (seen_method, seen_path) = split_method(observed);
    if let Some(want) = want_method {
        if !seen_method.is_some_and(|seen| seen.eq_ignore_ascii_case(want)) {
            return false;
        }
    }
    route_matches(want_path, seen_path)
}

pub fn any_request_matches(expected: &str, observed: &[String]) -> bool {
    observed.iter().any(|row| request_matches(expected, row))
}
