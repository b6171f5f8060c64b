//! Test-number and prescription-number recovery from "bulk name" cells.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Identifier pair carried by one bulk-name cell. Unmatched fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifiers {
    pub test_number: String,
    pub prescription_number: String,
}

/// How a test number was recognized, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestNumberRule {
    Exact,
    OneForI,
    DroppedI,
    WordBreak,
}

static I_BEFORE_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[!|](\d)").unwrap());
static DASH_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-+\s*").unwrap());
static WS_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static TEST_EXACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{2}[A-L]\d{2}I\d{2,3})\b").unwrap());
static TEST_ONE_FOR_I: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{2}[A-L]\d{2})1(\d{2,3})\b").unwrap());
static TEST_DROPPED_I: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{2}[A-L]\d{2})(\d{2,3})\b").unwrap());
static TEST_WORD_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{2}[A-L]\d)\s+(\d)I?(\d{2,3})\b").unwrap());

/// Prescription shapes from most specific to most general.
static PRESCRIPTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"M-[A-Z]{2,4}\d{4,5}-[A-Z]{1,4}\d?",
        r"[A-Z]{2,4}\d{4,5}[A-Z]?-[A-Z]{1,5}\d?",
        r"[A-Z]{3}\d{5}-[A-Z]{2,4}",
        r"[A-Z]{2,4}\d{3,6}-[A-Z]{1,5}",
        r"[A-Z]{2,5}\d{4}-[A-Z]{1,3}\d{0,2}",
        r"[A-Z]{1,3}\d{4,5}-[A-Z]{2,4}[A-Z]?",
        r"[A-Z]{2,4}\d{4}-[A-Z]\d[A-Z]{1,3}",
        r"[A-Z]{2,4}\d{3,4}[A-Z]?-[A-Z]{1,4}\d*",
        // digit-led suffix: WC1820-11F
        r"[A-Z]{2,4}\d{4}-\d{1,2}[A-Z]{1,2}",
        r"[A-Z]{2,4}\d{4,5}[A-Z]?-\s*[A-Z]{1,5}\d?",
        // embedded digit in suffix: RZ9A, OZ2A
        r"[A-Z]{2,4}\d{4,5}[A-Z]?-\s*[A-Z]+\d+[A-Z]+",
        r"[A-Z]{2,4}\d{4,5}[A-Z]?-[A-Z]{1,5}\d[A-Z]+",
        r"[A-Z]{2,4}\d{3,5}-[A-Z]{1,4}\d{1,2}",
        r"[A-Z]{2,5}\d{3,5}-[A-Z]{2,5}[A-Z\d]*",
    ]
    .iter()
    .map(|p| Regex::new(&format!(r"\b({p})\b")).unwrap())
    .collect()
});

/// Uppercase, repair `!`/`|` read for `I` before digits, tighten dashes and whitespace.
pub fn preprocess(text: &str) -> String {
    let upper = text.to_uppercase();
    let s = I_BEFORE_DIGIT.replace_all(&upper, "I$1");
    let s = DASH_RUN.replace_all(&s, "-");
    let s = WS_RUN.replace_all(&s, " ");
    s.trim().to_string()
}

/// Scan already preprocessed text for a test number. The first rule that
/// matches wins; lower-priority rules are not consulted after that.
pub fn match_test_number(pre: &str) -> Option<(String, TestNumberRule)> {
    if let Some(c) = TEST_EXACT.captures(pre) {
        return Some((c[1].to_string(), TestNumberRule::Exact));
    }
    if let Some(c) = TEST_ONE_FOR_I.captures(pre) {
        return Some((format!("{}I{}", &c[1], &c[2]), TestNumberRule::OneForI));
    }
    if let Some(c) = TEST_DROPPED_I.captures(pre) {
        return Some((format!("{}I{}", &c[1], &c[2]), TestNumberRule::DroppedI));
    }
    if let Some(c) = TEST_WORD_BREAK.captures(pre) {
        let tail = &c[3];
        // a three-digit tail led by 1 is the I read as a digit
        let tail = if tail.len() == 3 && tail.starts_with('1') { &tail[1..] } else { tail };
        return Some((format!("{}{}I{}", &c[1], &c[2], tail), TestNumberRule::WordBreak));
    }
    None
}

pub fn match_prescription_number(pre: &str) -> Option<String> {
    PRESCRIPTION_PATTERNS.iter().find_map(|re| re.captures(pre)).map(|c| {
        let compact: String = c[1].chars().filter(|ch| !ch.is_whitespace()).collect();
        DASH_RUN.replace_all(&compact, "-").into_owned()
    })
}

pub fn extract_test_number(text: &str) -> String {
    match_test_number(&preprocess(text)).map(|(t, _)| t).unwrap_or_default()
}

pub fn extract_prescription_number(text: &str) -> String {
    match_prescription_number(&preprocess(text)).unwrap_or_default()
}

/// Recover both identifiers from free bulk-name text. Never fails.
pub fn extract_identifiers(text: &str) -> Identifiers {
    if text.trim().is_empty() {
        return Identifiers::default();
    }
    let pre = preprocess(text);
    let test_number = match match_test_number(&pre) {
        Some((t, rule)) => {
            if rule != TestNumberRule::Exact {
                tracing::debug!(text, test_number = %t, ?rule, "test number repaired");
            }
            t
        }
        None => String::new(),
    };
    let prescription_number = match_prescription_number(&pre).unwrap_or_default();
    Identifiers { test_number, prescription_number }
}
