//! Best-effort classification of the price-filter trigger label.
//!
//! The pill text is the only externally observable encoding of the
//! filter state: "Price", "$300K +", "Up to $500K" or "$300K - $5000K".
//! This is a classifier over those rendered shapes, not a strict
//! grammar; anything unrecognized classifies as `None` and callers fall
//! back to pattern assertions.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::locate::normalize;

/// Parsed form of the pill label. Amounts are in dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PillState {
    Unset,
    MinOnly(u64),
    MaxOnly(u64),
    Range(u64, u64),
}

fn amount_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\$\s*([\d.,]+)\s*([km])?$").expect("static amount pattern")
    })
}

fn unset_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^price$").expect("static unset pattern"))
}

fn min_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(\$[\d.,]+\s*[km]?)\s*\+$").expect("static min pattern"))
}

fn max_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^up\s+to\s+(\$[\d.,]+\s*[km]?)$").expect("static max pattern")
    })
}

fn range_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(\$[\d.,]+\s*[km]?)\s*-\s*(\$[\d.,]+\s*[km]?)$")
            .expect("static range pattern")
    })
}

/// Parse a dollar amount in either full ("$500,000") or shorthand
/// ("$500K", "$1.5M") notation.
pub fn parse_amount(text: &str) -> Option<u64> {
    let caps = amount_pattern().captures(text.trim())?;
    let digits = caps[1].replace(',', "");
    let number: f64 = digits.parse().ok()?;
    let factor = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
        Some(suffix) if suffix == "k" => 1_000.0,
        Some(suffix) if suffix == "m" => 1_000_000.0,
        _ => 1.0,
    };
    let value = number * factor;
    (value.is_finite() && value >= 0.0).then_some(value.round() as u64)
}

/// Classify a rendered pill label, if it has one of the known shapes.
pub fn classify(label: &str) -> Option<PillState> {
    let label = normalize(label);
    if unset_pattern().is_match(&label) {
        return Some(PillState::Unset);
    }
    if let Some(caps) = max_pattern().captures(&label) {
        return parse_amount(&caps[1]).map(PillState::MaxOnly);
    }
    if let Some(caps) = min_pattern().captures(&label) {
        return parse_amount(&caps[1]).map(PillState::MinOnly);
    }
    if let Some(caps) = range_pattern().captures(&label) {
        let lo = parse_amount(&caps[1])?;
        let hi = parse_amount(&caps[2])?;
        return Some(PillState::Range(lo, hi));
    }
    None
}

impl PillState {
    /// Whether this state is consistent with the bounds a scenario set.
    /// Comparison is against the *labels* that were selected, because
    /// the label is the only thing that ever reached the UI; a
    /// scenario's numeric `value` field plays no part here.
    pub fn matches_selection(&self, min_label: Option<&str>, max_label: Option<&str>) -> bool {
        match (self, min_label, max_label) {
            (PillState::Unset, None, None) => true,
            (PillState::MinOnly(v), Some(min), None) => parse_amount(min) == Some(*v),
            (PillState::MaxOnly(v), None, Some(max)) => parse_amount(max) == Some(*v),
            (PillState::Range(lo, hi), Some(min), Some(max)) => {
                parse_amount(min) == Some(*lo) && parse_amount(max) == Some(*hi)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_unset() {
        assert_eq!(classify("Price"), Some(PillState::Unset));
        assert_eq!(classify("  price "), Some(PillState::Unset));
    }

    #[test]
    fn classifies_min_only() {
        assert_eq!(classify("$300K +"), Some(PillState::MinOnly(300_000)));
        assert_eq!(classify("$100k +"), Some(PillState::MinOnly(100_000)));
    }

    #[test]
    fn classifies_max_only() {
        assert_eq!(classify("Up to $500K"), Some(PillState::MaxOnly(500_000)));
        assert_eq!(classify("up to  $1.5M"), Some(PillState::MaxOnly(1_500_000)));
    }

    #[test]
    fn classifies_range() {
        assert_eq!(
            classify("$100K - $5M"),
            Some(PillState::Range(100_000, 5_000_000))
        );
        assert_eq!(
            classify("$300K - $5000K"),
            Some(PillState::Range(300_000, 5_000_000))
        );
    }

    #[test]
    fn unknown_shapes_classify_as_none() {
        assert_eq!(classify("Beds"), None);
        assert_eq!(classify("$ +"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn parses_full_and_shorthand_amounts() {
        assert_eq!(parse_amount("$500,000"), Some(500_000));
        assert_eq!(parse_amount("$500K"), Some(500_000));
        assert_eq!(parse_amount("$5m"), Some(5_000_000));
        assert_eq!(parse_amount("$1.5M"), Some(1_500_000));
        assert_eq!(parse_amount("500000"), None);
    }

    #[test]
    fn selection_consistency_uses_labels_not_values() {
        // A min-only state rendered as "$100K +" is consistent with the
        // "$100,000" label regardless of any numeric value a scenario
        // carried alongside it.
        let state = classify("$100K +").unwrap();
        assert!(state.matches_selection(Some("$100,000"), None));
        assert!(!state.matches_selection(Some("$300,000"), None));
        assert!(!state.matches_selection(None, Some("$100,000")));
    }

    #[test]
    fn range_consistency_checks_both_bounds() {
        let state = classify("$100K - $5M").unwrap();
        assert!(state.matches_selection(Some("$100,000"), Some("$5,000,000")));
        assert!(!state.matches_selection(Some("$100,000"), Some("$4,000,000")));
    }
}
