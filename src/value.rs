//! CFU cell normalization.
//!
//! A raw cell passes through four stages in fixed order: merged-cell split,
//! noise stripping, the column-dependent detection-limit correction and the
//! scientific-notation rewrite. Every stage leaves already-clean text alone,
//! so normalizing twice gives the same answer as normalizing once.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::strain::Strain;

pub const LIMIT_10: &str = "<10";
pub const LIMIT_10_2: &str = "<10^2";
pub const LIMIT_10_3: &str = "<10^3";

/// Sampling day a CFU column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayColumn {
    Day0,
    Day7,
    Day14,
    Day28,
}

impl DayColumn {
    pub const ALL: [DayColumn; 4] = [DayColumn::Day0, DayColumn::Day7, DayColumn::Day14, DayColumn::Day28];

    pub fn days(self) -> i64 {
        match self {
            DayColumn::Day0 => 0,
            DayColumn::Day7 => 7,
            DayColumn::Day14 => 14,
            DayColumn::Day28 => 28,
        }
    }
}

impl fmt::Display for DayColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day-{}", self.days())
    }
}

/// What to do with a day-7 `<10` that was recovered from an ambiguous misread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Day7Policy {
    /// Read it as `<10^2`, the usual 7-day acceptance limit.
    #[default]
    PromoteAmbiguous,
    /// Keep `<10` exactly as corrected.
    KeepAsRead,
}

/// Canonical result of a detection-limit correction rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    Limit10,
    Limit10Squared,
    Limit10Cubed,
    /// Placeholder glyphs with no measurement behind them.
    Blank,
}

impl Correction {
    pub fn as_str(self) -> &'static str {
        match self {
            Correction::Limit10 => LIMIT_10,
            Correction::Limit10Squared => LIMIT_10_2,
            Correction::Limit10Cubed => LIMIT_10_3,
            Correction::Blank => "",
        }
    }
}

pub enum Matcher {
    Exact(&'static [&'static str]),
    Pattern(Regex),
}

impl Matcher {
    fn matches(&self, value: &str) -> bool {
        match self {
            Matcher::Exact(list) => list.contains(&value),
            Matcher::Pattern(re) => re.is_match(value),
        }
    }
}

pub struct CorrectionRule {
    pub name: &'static str,
    pub matcher: Matcher,
    pub output: Correction,
}

fn exact(name: &'static str, list: &'static [&'static str], output: Correction) -> CorrectionRule {
    CorrectionRule { name, matcher: Matcher::Exact(list), output }
}

fn pattern(name: &'static str, re: &str, output: Correction) -> CorrectionRule {
    CorrectionRule { name, matcher: Matcher::Pattern(Regex::new(re).unwrap()), output }
}

/// Detection-limit misreads seen on day-7/14/28 cells, evaluated top to bottom;
/// the first matching rule decides. Inputs are already noise-stripped, so no
/// entry carries quotes, degree or currency glyphs.
pub static DETECTION_LIMIT_RULES: Lazy<Vec<CorrectionRule>> = Lazy::new(|| {
    use Correction::*;
    vec![
        exact("ellipsis", &["...", "....", "…"], Blank),
        exact(
            "lt10_glyph_misread",
            &[
                "40", "CIO", "CIÒ", "C10", "410", "90", "Lio", "LIO", "Clo", "CLO", "CO", "cio", "clo", "L10",
                "L 10", "010", "(10)", "(10", "10)", "(1)", "(1", "1)", "2 <10", "LION", "LION,", "Lion", "lion",
                "zion", "Zion", "ZION", "40L", "10L", "400", "4100", "610", "Cle", "CLE", "Cia", "CIA", "CCO",
                "cco", "00", "COL", "Col",
            ],
            Limit10,
        ),
        pattern("lt10_trailing_punct", r"^<\s*10[?\-)]+$", Limit10),
        pattern("lt10_cion", r"(?i)^<\s*[czs]ion", Limit10),
        pattern("lt10_bare_digit", r"^\d$", Limit10),
        pattern("lt10_2_plain", r"^<\s*10\^?2,?$", Limit10Squared),
        pattern("lt10_2_spaced", r"^<\s*10\s+2$", Limit10Squared),
        exact(
            "lt10_2_glyph_misread",
            &[
                "4102", "5102", "6102", "512", "<12", "<62", "<1.2", "GIO2", "GI02", "CIS2", "C12", "C102", "CIO2",
                "Clo2", "CI02", "ClO2",
            ],
            Limit10Squared,
        ),
        pattern("lt10_2_si", r"(?i)^[SC]I0?2,?$", Limit10Squared),
        pattern("lt10_2_slash", r"^[5C6]/0?2$", Limit10Squared),
        pattern("lt10_2_paren", r"^\(\s*10?2,?$", Limit10Squared),
        pattern("lt10_2_si_noise", r"(?i)^[SC]I0?2\s+2$", Limit10Squared),
        pattern("lt10_2_noise_prefix", r"^\d+[45]102$", Limit10Squared),
        exact("lt10_dropped_lt", &["110", "210", "2103", "510", "<1>", "LU", "/10"], Limit10),
        pattern("lt10_noise_prefix", r"^\d+\s*<\s*10\s*$", Limit10),
        exact("lt10_3_dropped_lt", &["103"], Limit10Cubed),
        pattern("lt10_literal", r"^<\s*10[\s?\-)]*$", Limit10),
    ]
});

static SCI_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[<≤]\s*)?\d+\.?\d*\s*[×xX]\s*10\^?\d+").unwrap());
// a limit token carries its exponent tail: "< 10 2" is one value, not "< 10" plus noise
static LT_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<\s*10(?:\s*\^?\s*\d+)?|<\s*\d+").unwrap());
static SCI_PARSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+\.?\d*)\s*×\s*10\s*\^?\s*(\d*)").unwrap());

const NOISE: &[&str] = &[":selected:", ":unselected:", "\"", "'", "“", "”", "‘", "’", "°", "€"];

/// Original spellings that can only mean `<10`.
const UNAMBIGUOUS_LT10: &[&str] = &["<10", "< 10", "<10\"", "< 10\"", "<10'", "< 10'"];

/// Misreads that may stand for either `<10` or `<10^2`.
const AMBIGUOUS_LT10: &[&str] = &["40", "CIO", "CIÒ", "C10", "410", "90"];

/// Normalized value plus the decisions taken on the way.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Normalized {
    pub value: String,
    pub merged_split: bool,
    pub rule: Option<&'static str>,
    pub day7_promoted: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValueNormalizer {
    pub day7_policy: Day7Policy,
}

impl ValueNormalizer {
    pub fn new(day7_policy: Day7Policy) -> Self {
        Self { day7_policy }
    }

    pub fn normalize(&self, raw: &str, strain: Strain, day: DayColumn) -> String {
        self.normalize_detailed(raw, strain, day).value
    }

    pub fn normalize_detailed(&self, raw: &str, strain: Strain, day: DayColumn) -> Normalized {
        let mut out = Normalized::default();
        if raw.trim().is_empty() {
            return out;
        }

        let (first, merged) = split_merged_cell(raw);
        out.merged_split = merged;
        if merged {
            tracing::warn!(%strain, %day, raw, kept = first, "merged cell, keeping first value");
        }

        let mut value = strip_noise(first);
        if day != DayColumn::Day0 {
            if let Some(rule) = match_detection_limit(&value) {
                tracing::debug!(%strain, %day, raw, rule = rule.name, "detection limit corrected");
                out.rule = Some(rule.name);
                value = rule.output.as_str().to_string();
            }
        }
        value = normalize_scientific(&value);

        if day == DayColumn::Day7 && self.day7_policy == Day7Policy::PromoteAmbiguous && is_ambiguous_day7(&value, raw) {
            tracing::info!(%strain, raw, "ambiguous day-7 <10 read as <10^2");
            out.day7_promoted = true;
            value = LIMIT_10_2.to_string();
        }

        out.value = value;
        out
    }
}

/// Normalize with the default day-7 policy.
pub fn normalize_value(raw: &str, strain: Strain, day: DayColumn) -> String {
    ValueNormalizer::default().normalize(raw, strain, day)
}

/// Keep only the first value when OCR fused two neighbouring cells into one string.
/// Returns the kept text and whether a split happened.
pub fn split_merged_cell(raw: &str) -> (&str, bool) {
    for re in [&*SCI_TOKEN, &*LT_TOKEN] {
        let mut it = re.find_iter(raw);
        if let (Some(first), Some(_)) = (it.next(), it.next()) {
            return (first.as_str(), true);
        }
    }
    (raw, false)
}

pub fn strip_noise(value: &str) -> String {
    let mut s = value.replace(|c: char| c == '\r' || c == '\n', " ");
    for n in NOISE {
        s = s.replace(n, "");
    }
    s.trim().to_string()
}

pub fn match_detection_limit(value: &str) -> Option<&'static CorrectionRule> {
    DETECTION_LIMIT_RULES.iter().find(|r| r.matcher.matches(value))
}

/// Rewrite `<mantissa> x 10 <exp>` into `<prefix><mantissa>×10^<exp>`.
/// Text without a recognizable pattern comes back unchanged.
pub fn normalize_scientific(value: &str) -> String {
    let value = value.trim();
    let unified = value.replace(|c: char| c == 'x' || c == 'X', "×");
    let Some(caps) = SCI_PARSE.captures(&unified) else {
        return value.to_string();
    };
    let base = &caps[1];
    let exponent = match &caps[2] {
        "" => "0",
        e => e,
    };
    let prefix = if unified.starts_with('<') {
        "<"
    } else if unified.starts_with('≤') {
        "≤"
    } else {
        ""
    };
    format!("{prefix}{base}×10^{exponent}")
}

fn is_ambiguous_day7(value: &str, original: &str) -> bool {
    if value != LIMIT_10 {
        return false;
    }
    let original = original.trim();
    if UNAMBIGUOUS_LT10.contains(&original) {
        return false;
    }
    AMBIGUOUS_LT10.iter().any(|p| original.contains(p))
}
