//! Locator resolution: semantic UI roles mapped to live elements by
//! accessible role and name, never by structural position. The two
//! listing text blocks are the only structural (CSS) locators, because
//! raw text content has no role to match on.
//!
//! Matching rules shared by every backend:
//! - only visible elements participate;
//! - the first match in document order wins;
//! - zero matches is not an error (callers wait with a timeout).

use regex::RegexBuilder;
use std::fmt;

/// The ARIA roles this suite interacts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AriaRole {
    Button,
    Combobox,
    Option,
    Searchbox,
    Textbox,
}

impl AriaRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AriaRole::Button => "button",
            AriaRole::Combobox => "combobox",
            AriaRole::Option => "option",
            AriaRole::Searchbox => "searchbox",
            AriaRole::Textbox => "textbox",
        }
    }
}

/// How an accessible name is matched.
///
/// `Exact` is trimmed, whitespace-normalized, case-sensitive equality,
/// used for typeahead suggestions where "Houston, TX" must not match
/// "Houston Heights, Houston, TX". `Full` is the case-insensitive
/// normalized full match used for dropdown option labels. `Pattern` is a
/// case-insensitive regex; patterns must stay valid for both the `regex`
/// crate and JS `RegExp`, since Chrome evaluates them in-page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    Exact(String),
    Full(String),
    Pattern(String),
}

impl NameMatch {
    /// Rust-side evaluation of the same rules the in-page finder applies.
    pub fn matches(&self, name: &str) -> bool {
        let name = normalize(name);
        match self {
            NameMatch::Exact(want) => name == normalize(want),
            NameMatch::Full(want) => name.to_lowercase() == normalize(want).to_lowercase(),
            NameMatch::Pattern(pattern) => RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map(|re| re.is_match(&name))
                .unwrap_or(false),
        }
    }

    fn js_predicate(&self) -> String {
        match self {
            NameMatch::Exact(want) => {
                format!("norm(acc(el)) === {}", js_string(&normalize(want)))
            }
            NameMatch::Full(want) => format!(
                "norm(acc(el)).toLowerCase() === {}",
                js_string(&normalize(want).to_lowercase())
            ),
            NameMatch::Pattern(pattern) => {
                format!("new RegExp({}, 'i').test(acc(el))", js_string(pattern))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Role {
        role: AriaRole,
        name: Option<NameMatch>,
    },
    Css(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub strategy: Strategy,
}

impl Locator {
    pub fn role(role: AriaRole) -> Self {
        Self {
            strategy: Strategy::Role { role, name: None },
        }
    }

    pub fn named(role: AriaRole, name: NameMatch) -> Self {
        Self {
            strategy: Strategy::Role {
                role,
                name: Some(name),
            },
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::Css(selector.into()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.strategy {
            Strategy::Role { role, name } => {
                write!(f, "role={}", role.as_str())?;
                match name {
                    Some(NameMatch::Exact(s)) => write!(f, " name=\"{s}\""),
                    Some(NameMatch::Full(s)) => write!(f, " name~=\"{s}\""),
                    Some(NameMatch::Pattern(p)) => write!(f, " name=/{p}/i"),
                    None => Ok(()),
                }
            }
            Strategy::Css(selector) => write!(f, "css=\"{selector}\""),
        }
    }
}

/// Collapse whitespace runs and trim, the way accessible names are
/// compared everywhere in this suite.
pub fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// JSON-escape a string into a JS string literal.
pub(crate) fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

// --- Well-known locators -------------------------------------------------
//
// One constructor per semantic role the flows touch. Patterns are wide on
// purpose: the price trigger's label changes with filter state, so a
// single pattern covers "Price", "$300K +", "Up to $500K" and
// "$300K - $5000K" alike.

/// The location typeahead input.
pub fn location_input() -> Locator {
    Locator::named(
        AriaRole::Combobox,
        NameMatch::Pattern("location|search|city|address".to_string()),
    )
}

/// The affordance that clears a committed search, when one exists.
pub fn clear_search() -> Locator {
    Locator::named(AriaRole::Button, NameMatch::Full("Clear".to_string()))
}

/// A typeahead option whose rendered text equals `text` exactly.
pub fn suggestion(text: &str) -> Locator {
    Locator::named(AriaRole::Option, NameMatch::Exact(text.to_string()))
}

/// The price-filter trigger in any of its four label states.
pub fn price_trigger() -> Locator {
    Locator::named(
        AriaRole::Button,
        NameMatch::Pattern(r"price|up to|\$\d".to_string()),
    )
}

pub fn min_price_control() -> Locator {
    Locator::named(
        AriaRole::Combobox,
        NameMatch::Pattern("minimum price|min".to_string()),
    )
}

pub fn max_price_control() -> Locator {
    Locator::named(
        AriaRole::Combobox,
        NameMatch::Pattern("maximum price|max".to_string()),
    )
}

/// A price dropdown option by its visible label, e.g. "$100,000".
pub fn price_option(label: &str) -> Locator {
    Locator::named(AriaRole::Option, NameMatch::Full(label.to_string()))
}

pub fn apply_button() -> Locator {
    Locator::named(AriaRole::Button, NameMatch::Pattern("apply".to_string()))
}

/// "Clear", "Reset" and "Remove" are synonyms across filter popovers.
pub fn clear_filter_button() -> Locator {
    Locator::named(
        AriaRole::Button,
        NameMatch::Pattern("clear|reset|remove".to_string()),
    )
}

/// Listing address text blocks. Structural on purpose: raw text has no
/// role, and the hashed class suffix varies per build.
pub fn listing_address_blocks() -> Locator {
    Locator::css(r#"div[class*="listingItem__address"]"#)
}

/// Listing price text blocks.
pub fn listing_price_blocks() -> Locator {
    Locator::css(r#"div[class*="listingItem__price"]"#)
}

// --- In-page finder compilation ------------------------------------------

/// Build a self-contained JS expression that resolves `locator` to the
/// array `els` of visible matches in document order, then runs
/// `epilogue` (which must `return` a JSON-serializable value). Element
/// handles cannot cross the evaluation boundary, so every interaction is
/// compiled as one script: find, act, report.
pub fn script_for(locator: &Locator, epilogue: &str) -> String {
    let finder = match &locator.strategy {
        Strategy::Role { role, name } => {
            let name_pred = name
                .as_ref()
                .map(|n| n.js_predicate())
                .unwrap_or_else(|| "true".to_string());
            format!(
                "Array.from(document.querySelectorAll('*')).filter((el) => vis(el) && roleOf(el) === {role} && ({name_pred}))",
                role = js_string(role.as_str()),
            )
        }
        Strategy::Css(selector) => format!(
            "Array.from(document.querySelectorAll({})).filter((el) => vis(el))",
            js_string(selector)
        ),
    };
    format!(
        r#"(function() {{
  const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
  const vis = (el) => {{
    const r = el.getBoundingClientRect();
    if (!(r.width > 0 && r.height > 0)) return false;
    const st = window.getComputedStyle(el);
    return st.visibility !== 'hidden' && st.display !== 'none';
  }};
  const acc = (el) => {{
    const aria = el.getAttribute('aria-label');
    if (aria) return aria;
    const refs = el.getAttribute('aria-labelledby');
    if (refs) {{
      const t = refs.split(/\s+/)
        .map((id) => {{ const n = document.getElementById(id); return n ? n.textContent : ''; }})
        .join(' ');
      if (norm(t)) return t;
    }}
    if (el.labels && el.labels.length) {{
      const t = Array.from(el.labels).map((l) => l.textContent).join(' ');
      if (norm(t)) return t;
    }}
    const text = norm(el.innerText !== undefined ? el.innerText : el.textContent);
    if (text) return text;
    return el.getAttribute('placeholder') || el.getAttribute('title') || '';
  }};
  const roleOf = (el) => {{
    const explicit = el.getAttribute('role');
    if (explicit) return explicit.trim().split(/\s+/)[0];
    const tag = el.tagName.toLowerCase();
    if (tag === 'button') return 'button';
    if (tag === 'option') return 'option';
    if (tag === 'select') return 'combobox';
    if (tag === 'textarea') return 'textbox';
    if (tag === 'input') {{
      const type = (el.getAttribute('type') || 'text').toLowerCase();
      if (type === 'button' || type === 'submit' || type === 'reset') return 'button';
      if (el.getAttribute('aria-autocomplete') || el.hasAttribute('aria-expanded') || el.getAttribute('list')) return 'combobox';
      if (type === 'search') return 'searchbox';
      return 'textbox';
    }}
    return '';
  }};
  const els = {finder};
  {epilogue}
}})()"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_case_sensitive() {
        let m = NameMatch::Exact("Houston, TX".to_string());
        assert!(m.matches("Houston, TX"));
        assert!(m.matches("  Houston,   TX  "));
        assert!(!m.matches("houston, tx"));
        assert!(!m.matches("Houston Heights, Houston, TX"));
    }

    #[test]
    fn full_match_normalizes_and_ignores_case() {
        let m = NameMatch::Full("$100,000".to_string());
        assert!(m.matches(" $100,000 "));
        assert!(!m.matches("$100,000 - $200,000"));
    }

    #[test]
    fn pattern_match_is_case_insensitive() {
        let m = NameMatch::Pattern(r"price|up to|\$\d".to_string());
        assert!(m.matches("Price"));
        assert!(m.matches("$300K +"));
        assert!(m.matches("Up to $500K"));
        assert!(m.matches("$100K - $5M"));
        assert!(!m.matches("Beds"));
    }

    #[test]
    fn invalid_pattern_matches_nothing() {
        let m = NameMatch::Pattern("([unclosed".to_string());
        assert!(!m.matches("anything"));
    }

    #[test]
    fn trigger_pattern_covers_all_pill_shapes() {
        let trigger = price_trigger();
        let Strategy::Role {
            name: Some(name), ..
        } = &trigger.strategy
        else {
            panic!("price trigger should be a named role locator");
        };
        for label in ["Price", "$300K +", "Up to $500K", "$300K - $5000K"] {
            assert!(name.matches(label), "trigger pattern should match {label:?}");
        }
    }

    #[test]
    fn display_names_role_and_pattern() {
        assert_eq!(
            suggestion("Houston, TX").to_string(),
            "role=option name=\"Houston, TX\""
        );
        assert_eq!(
            price_trigger().to_string(),
            r"role=button name=/price|up to|\$\d/i"
        );
        assert_eq!(
            listing_address_blocks().to_string(),
            r#"css="div[class*="listingItem__address"]""#
        );
    }

    #[test]
    fn role_script_embeds_role_and_epilogue() {
        let script = script_for(&min_price_control(), "return els.length;");
        assert!(script.contains("\"combobox\""));
        assert!(script.contains("minimum price|min"));
        assert!(script.contains("return els.length;"));
    }

    #[test]
    fn css_script_uses_query_selector_all() {
        let script = script_for(&listing_price_blocks(), "return els.length;");
        assert!(script.contains(r#"document.querySelectorAll("div[class*=\"listingItem__price\"]")"#));
    }

    #[test]
    fn exact_predicate_compares_normalized_literal() {
        let script = script_for(&suggestion("Houston, TX"), "return els.length;");
        assert!(script.contains(r#"norm(acc(el)) === "Houston, TX""#));
    }
}
