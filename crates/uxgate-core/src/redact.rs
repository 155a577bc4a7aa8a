// SPDX-License-Identifier: Apache-2.0

use regex::Regex;
use uxgate_model::AuditResult;
use uxgate_policies::{PolicyValidationError, RedactionPolicy};

const BUILTIN_PATTERNS: &[(&str, &str)] = &[
    ("jwt", r"eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]*"),
    ("bearer", r"(?i)\bbearer\s+[A-Za-z0-9._~+/=-]+"),
    ("email", r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}"),
    ("card", r"\b\d(?:[ -]?\d){12,18}\b"),
    (
        "phone_international",
        r"\+\d{1,3}[\s.-]?(?:\(?\d{1,4}\)?[\s.-]?){1,4}\d{2,4}\b",
    ),
    (
        "phone",
        r"(?:\(\d{2,4}\)|\b\d{2,5})[\s.-]?\d{3,4}[\s.-]?\d{3,4}\b",
    ),
];

/// Passes until the text stops changing.
const MAX_PASSES: usize = 4;

/// PII filter applied to every free-text string before it reaches a report or a log.
#[derive(Debug, Clone)]
pub struct Redactor {
    patterns: Vec<(String, Regex)>,
    marker: String,
}

impl Redactor {
    pub fn new(policy: &RedactionPolicy) -> Result<Self, PolicyValidationError> {
        let marker = policy.marker.trim().to_string();
        if marker.is_empty() {
            return Err(PolicyValidationError(
                "redaction.marker must not be empty".to_string(),
            ));
        }
        let mut patterns = Vec::with_capacity(BUILTIN_PATTERNS.len() + policy.extra_patterns.len());
        for (name, raw) in BUILTIN_PATTERNS {
            let compiled = Regex::new(raw).map_err(|e| {
                PolicyValidationError(format!("builtin redaction pattern {name} failed: {e}"))
            })?;
            patterns.push(((*name).to_string(), compiled));
        }
        for (idx, raw) in policy.extra_patterns.iter().enumerate() {
            let compiled = Regex::new(raw).map_err(|e| {
                PolicyValidationError(format!("redaction.extra_patterns[{idx}] failed: {e}"))
            })?;
            patterns.push((format!("extra_{idx}"), compiled));
        }
        if let Some((name, _)) = patterns.iter().find(|(_, re)| re.is_match(&marker)) {
            return Err(PolicyValidationError(format!(
                "redaction marker `{marker}` is matched by pattern {name}"
            )));
        }
        Ok(Self { patterns, marker })
    }

    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        let mut current = text.to_string();
        for _ in 0..MAX_PASSES {
            let mut next = current.clone();
            for (_, re) in &self.patterns {
                next = re.replace_all(&next, self.marker.as_str()).into_owned();
            }
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    #[must_use]
    pub fn redact_result(&self, mut result: AuditResult) -> AuditResult {
        result.error = result.error.map(|e| self.redact(&e));
        result.skip_reason = result.skip_reason.map(|r| self.redact(&r));
        result.matched_locator = result.matched_locator.map(|l| self.redact(&l));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uxgate_policies::published_policy;

    fn redactor() -> Redactor {
        Redactor::new(&published_policy().redaction).expect("redactor")
    }

    #[test]
    fn common_pii_shapes_are_replaced() {
        let r = redactor();
        let cases = [
            "request for jane.doe@example.co.uk failed",
            "call +44 20 7946 0958 now",
            "call (555) 123-4567 now",
            "phone 555-123-4567",
            "card 4111 1111 1111 1111 declined",
            "Authorization: Bearer abc.DEF-123_x",
            "token eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxIn0.c2ln leaked",
        ];
        for text in cases {
            let out = r.redact(text);
            assert!(out.contains("[REDACTED]"), "{text} -> {out}");
            assert_eq!(out.chars().filter(char::is_ascii_digit).count(), 0, "{out}");
        }
        let out = r.redact("request for jane.doe@example.co.uk failed");
        assert!(!out.contains("jane.doe"));
        assert!(!out.contains("example.co.uk"));
    }

    #[test]
    fn ordinary_error_text_is_left_alone() {
        let r = redactor();
        for text in [
            "timed out after 15000ms: navigate /incidents",
            "HTTP 404",
            "generated 2026-01-26T10:29:42Z",
            "SecurityError: blocked a frame with origin",
        ] {
            assert_eq!(r.redact(text), text);
        }
    }

    #[test]
    fn redaction_is_idempotent() {
        let r = redactor();
        let once = r.redact("mail bob@example.com or call 555-123-4567");
        assert_eq!(r.redact(&once), once);
    }

    #[test]
    fn marker_matching_a_pattern_is_rejected() {
        let mut policy = published_policy().redaction;
        policy.marker = "x@example.com".to_string();
        assert!(Redactor::new(&policy).is_err());
    }

    #[test]
    fn extra_patterns_apply_after_builtins() {
        let mut policy = published_policy().redaction;
        policy.extra_patterns = vec![r"EMP-\d{4}".to_string()];
        let r = Redactor::new(&policy).expect("redactor");
        assert_eq!(r.redact("employee EMP-1234 missing"), "employee [REDACTED] missing");
    }
}
