//! Test support: a scripted, in-process model of the search site
//! implementing [`PageDriver`], so workflows and scenarios can run end
//! to end without a browser. The model covers exactly the surface the
//! suite touches: the location typeahead, the price popover with its
//! two option menus, the listing cards, and the state-dependent trigger
//! pill. Behavior flags reproduce the site's known quirks (popover
//! auto-close after a min-only selection, presence or absence of an
//! Apply button) so both workflow branches stay covered.

use crate::driver::PageDriver;
use crate::errors::{E2eError, Result};
use crate::listings::parse_price;
use crate::locate::{AriaRole, Locator, Strategy};
use crate::pill;
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct MockListing {
    pub address: String,
    pub price_text: String,
}

impl MockListing {
    pub fn new(address: &str, price_text: &str) -> Self {
        Self {
            address: address.to_string(),
            price_text: price_text.to_string(),
        }
    }

    fn price(&self) -> Option<u64> {
        parse_price(&self.price_text)
    }
}

/// Interaction targets the model exposes, one per UI element.
#[derive(Debug, Clone, PartialEq)]
enum Target {
    LocationInput,
    Suggestion(String),
    PriceTrigger,
    MinControl,
    MaxControl,
    MinOption(String),
    MaxOption(String),
    Apply,
    ResetFilter,
    ClearSearch,
}

#[derive(Debug)]
struct SiteState {
    url: Option<String>,
    query: String,
    committed: Option<String>,
    last_keystroke: Option<Instant>,
    popover_open: bool,
    min_menu_open: bool,
    max_menu_open: bool,
    pending_min: Option<u64>,
    pending_max: Option<u64>,
    applied_min: Option<u64>,
    applied_max: Option<u64>,
    trigger_clicks: u32,
    apply_clicks: u32,
    option_clicks: Vec<String>,
}

impl SiteState {
    fn fresh() -> Self {
        Self {
            url: None,
            query: String::new(),
            committed: None,
            last_keystroke: None,
            popover_open: false,
            min_menu_open: false,
            max_menu_open: false,
            pending_min: None,
            pending_max: None,
            applied_min: None,
            applied_max: None,
            trigger_clicks: 0,
            apply_clicks: 0,
            option_clicks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct Behavior {
    candidates: Vec<String>,
    inventory: Vec<MockListing>,
    min_options: Vec<String>,
    max_options: Vec<String>,
    has_apply_button: bool,
    auto_close_after_min: bool,
    suggestion_delay: Duration,
    suppress_suggestions: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            // Longer candidate first: a substring matcher would pick it
            // over the exact suggestion.
            candidates: vec![
                "Houston, TX 77002".to_string(),
                "Houston, TX".to_string(),
                "Houston Heights, Houston, TX".to_string(),
            ],
            inventory: default_inventory(),
            min_options: vec![
                "No Min".to_string(),
                "$100,000".to_string(),
                "$300,000".to_string(),
                "$500,000".to_string(),
            ],
            max_options: vec![
                "No Max".to_string(),
                "$500,000".to_string(),
                "$1,000,000".to_string(),
                "$5,000,000".to_string(),
            ],
            has_apply_button: false,
            auto_close_after_min: false,
            suggestion_delay: Duration::from_millis(0),
            suppress_suggestions: false,
        }
    }
}

fn default_inventory() -> Vec<MockListing> {
    vec![
        MockListing::new("1211 Caroline St, Houston, TX 77002", "$325,000"),
        MockListing::new("814 Heights Blvd, Houston, TX 77007", "$95,000"),
        MockListing::new("5505 Memorial Dr, Houston, TX 77007", "$1,250,000"),
        MockListing::new("2121 Allen Pkwy, Houston, TX 77019", "$449,900"),
        MockListing::new("9302 Bassoon Dr, Houston, TX 77025", "$5,750,000"),
        MockListing::new("418 Travis St, Houston, TX 77002", "Contact agent"),
        MockListing::new("6007 Milart St, Houston, TX 77021", "$250,000"),
        MockListing::new("1500 Andrews St, Houston, TX 77019", "$4,900,000"),
    ]
}

/// Price pill rendering the way the site abbreviates amounts.
fn short_amount(value: u64) -> String {
    if value >= 1_000_000 {
        let millions = value as f64 / 1_000_000.0;
        if millions.fract() == 0.0 {
            format!("${}M", millions as u64)
        } else {
            format!("${millions}M")
        }
    } else {
        format!("${}K", value / 1_000)
    }
}

pub struct MockPage {
    behavior: Behavior,
    state: Mutex<SiteState>,
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPage {
    pub fn new() -> Self {
        Self {
            behavior: Behavior::default(),
            state: Mutex::new(SiteState::fresh()),
        }
    }

    /// The popover gets an explicit Apply button; selections stay
    /// pending until it is clicked.
    pub fn with_apply_button(mut self) -> Self {
        self.behavior.has_apply_button = true;
        self
    }

    /// Reproduce the flaky transition: the popover closes itself right
    /// after a minimum-price selection.
    pub fn with_auto_close_after_min(mut self) -> Self {
        self.behavior.auto_close_after_min = true;
        self
    }

    /// Suggestions only appear this long after the last keystroke.
    pub fn with_suggestion_delay(mut self, delay: Duration) -> Self {
        self.behavior.suggestion_delay = delay;
        self
    }

    /// The typeahead never produces suggestions; searches time out.
    pub fn without_suggestions(mut self) -> Self {
        self.behavior.suppress_suggestions = true;
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.behavior.candidates = candidates;
        self
    }

    pub fn with_inventory(mut self, inventory: Vec<MockListing>) -> Self {
        self.behavior.inventory = inventory;
        self
    }

    // --- Instrumentation for tests ---------------------------------

    pub fn committed_location(&self) -> Option<String> {
        self.lock().committed.clone()
    }

    pub fn applied_bounds(&self) -> (Option<u64>, Option<u64>) {
        let state = self.lock();
        (state.applied_min, state.applied_max)
    }

    pub fn popover_open(&self) -> bool {
        self.lock().popover_open
    }

    pub fn trigger_clicks(&self) -> u32 {
        self.lock().trigger_clicks
    }

    pub fn apply_clicks(&self) -> u32 {
        self.lock().apply_clicks
    }

    pub fn clicked_option_labels(&self) -> Vec<String> {
        self.lock().option_clicks.clone()
    }

    // --- Model internals --------------------------------------------

    fn lock(&self) -> MutexGuard<'_, SiteState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn suggestions_visible(&self, state: &SiteState) -> bool {
        if self.behavior.suppress_suggestions
            || state.committed.is_some()
            || state.query.is_empty()
        {
            return false;
        }
        match state.last_keystroke {
            Some(at) => at.elapsed() >= self.behavior.suggestion_delay,
            None => true,
        }
    }

    fn suggestions(&self, state: &SiteState) -> Vec<String> {
        let query = state.query.to_lowercase();
        self.behavior
            .candidates
            .iter()
            .filter(|candidate| candidate.to_lowercase().starts_with(&query))
            .cloned()
            .collect()
    }

    fn pill_label(&self, state: &SiteState) -> String {
        match (state.applied_min, state.applied_max) {
            (None, None) => "Price".to_string(),
            (Some(min), None) => format!("{} +", short_amount(min)),
            (None, Some(max)) => format!("Up to {}", short_amount(max)),
            (Some(min), Some(max)) => {
                format!("{} - {}", short_amount(min), short_amount(max))
            }
        }
    }

    fn visible_listings(&self, state: &SiteState) -> Vec<MockListing> {
        if state.committed.is_none() {
            return Vec::new();
        }
        let filter_active = state.applied_min.is_some() || state.applied_max.is_some();
        self.behavior
            .inventory
            .iter()
            .filter(|listing| {
                if !filter_active {
                    return true;
                }
                match listing.price() {
                    Some(price) => {
                        state.applied_min.map_or(true, |min| price >= min)
                            && state.applied_max.map_or(true, |max| price <= max)
                    }
                    None => false,
                }
            })
            .cloned()
            .collect()
    }

    /// Visible elements in document order. The clear-search affordance
    /// renders after the results list, so while the popover is open its
    /// Reset button is the first match for the clear/reset pattern.
    fn elements(&self, state: &SiteState) -> Vec<(AriaRole, String, Target)> {
        let mut els = vec![(
            AriaRole::Combobox,
            "Search by city, neighborhood, or address".to_string(),
            Target::LocationInput,
        )];
        if self.suggestions_visible(state) {
            for candidate in self.suggestions(state) {
                els.push((
                    AriaRole::Option,
                    candidate.clone(),
                    Target::Suggestion(candidate),
                ));
            }
        }
        els.push((AriaRole::Button, self.pill_label(state), Target::PriceTrigger));
        if state.popover_open {
            els.push((
                AriaRole::Combobox,
                "Minimum Price".to_string(),
                Target::MinControl,
            ));
            if state.min_menu_open {
                for label in &self.behavior.min_options {
                    els.push((
                        AriaRole::Option,
                        label.clone(),
                        Target::MinOption(label.clone()),
                    ));
                }
            }
            els.push((
                AriaRole::Combobox,
                "Maximum Price".to_string(),
                Target::MaxControl,
            ));
            if state.max_menu_open {
                for label in &self.behavior.max_options {
                    els.push((
                        AriaRole::Option,
                        label.clone(),
                        Target::MaxOption(label.clone()),
                    ));
                }
            }
            if self.behavior.has_apply_button {
                els.push((AriaRole::Button, "Apply".to_string(), Target::Apply));
            }
            els.push((AriaRole::Button, "Reset".to_string(), Target::ResetFilter));
        }
        if !state.query.is_empty() || state.committed.is_some() {
            els.push((AriaRole::Button, "Clear".to_string(), Target::ClearSearch));
        }
        els
    }

    fn resolve(&self, state: &SiteState, locator: &Locator) -> Option<(String, Target)> {
        match &locator.strategy {
            Strategy::Role { role, name } => self
                .elements(state)
                .into_iter()
                .find(|(el_role, el_name, _)| {
                    el_role == role && name.as_ref().map_or(true, |m| m.matches(el_name))
                })
                .map(|(_, el_name, target)| (el_name, target)),
            Strategy::Css(_) => None,
        }
    }

    fn css_texts(&self, state: &SiteState, selector: &str) -> Option<Vec<String>> {
        if selector.contains("listingItem__address") {
            Some(
                self.visible_listings(state)
                    .into_iter()
                    .map(|l| l.address)
                    .collect(),
            )
        } else if selector.contains("listingItem__price") {
            Some(
                self.visible_listings(state)
                    .into_iter()
                    .map(|l| l.price_text)
                    .collect(),
            )
        } else {
            None
        }
    }

    fn apply_click(&self, state: &mut SiteState, target: Target) {
        match target {
            Target::LocationInput => {}
            Target::Suggestion(text) => {
                state.committed = Some(text.clone());
                state.query = text;
                state.last_keystroke = None;
            }
            Target::PriceTrigger => {
                state.trigger_clicks += 1;
                state.popover_open = !state.popover_open;
                if !state.popover_open {
                    state.min_menu_open = false;
                    state.max_menu_open = false;
                }
            }
            Target::MinControl => {
                state.min_menu_open = true;
                state.max_menu_open = false;
            }
            Target::MaxControl => {
                state.max_menu_open = true;
                state.min_menu_open = false;
            }
            Target::MinOption(label) => {
                state.option_clicks.push(label.clone());
                state.pending_min = pill::parse_amount(&label);
                state.min_menu_open = false;
                if !self.behavior.has_apply_button {
                    state.applied_min = state.pending_min;
                }
                if self.behavior.auto_close_after_min {
                    state.popover_open = false;
                    state.max_menu_open = false;
                }
            }
            Target::MaxOption(label) => {
                state.option_clicks.push(label.clone());
                state.pending_max = pill::parse_amount(&label);
                state.max_menu_open = false;
                if !self.behavior.has_apply_button {
                    state.applied_max = state.pending_max;
                }
            }
            Target::Apply => {
                state.apply_clicks += 1;
                state.applied_min = state.pending_min;
                state.applied_max = state.pending_max;
            }
            Target::ResetFilter => {
                state.pending_min = None;
                state.pending_max = None;
                state.applied_min = None;
                state.applied_max = None;
            }
            Target::ClearSearch => {
                state.query.clear();
                state.committed = None;
                state.last_keystroke = None;
            }
        }
    }

    fn render(&self, state: &SiteState) -> String {
        let mut html =
            String::from("<html><body><div class=\"searchResults__list___w4Jda\">");
        for listing in self.visible_listings(state) {
            html.push_str(&format!(
                "<div class=\"listingItem__item___q8Zx1\">\
                 <div class=\"listingItem__price___Zx12a\">{}</div>\
                 <div class=\"listingItem__address___CKkGl\">{}</div>\
                 </div>",
                listing.price_text, listing.address
            ));
        }
        html.push_str("</div></body></html>");
        html
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.lock();
        *state = SiteState::fresh();
        state.url = Some(url.to_string());
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.lock().url.clone().unwrap_or_default())
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        let state = self.lock();
        match &locator.strategy {
            Strategy::Css(selector) => {
                Ok(self.css_texts(&state, selector).map_or(0, |texts| texts.len()))
            }
            Strategy::Role { role, name } => Ok(self
                .elements(&state)
                .iter()
                .filter(|(el_role, el_name, _)| {
                    el_role == role && name.as_ref().map_or(true, |m| m.matches(el_name))
                })
                .count()),
        }
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        Ok(self.count(locator).await? > 0)
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let mut state = self.lock();
        match self.resolve(&state, locator) {
            Some((_, target)) => {
                self.apply_click(&mut state, target);
                Ok(())
            }
            None => Err(E2eError::ElementNotFound(locator.to_string())),
        }
    }

    async fn clear_text(&self, locator: &Locator) -> Result<()> {
        let mut state = self.lock();
        match self.resolve(&state, locator) {
            Some((_, Target::LocationInput)) => {
                state.query.clear();
                state.last_keystroke = None;
                Ok(())
            }
            Some(_) => Err(E2eError::ElementNotFound(format!(
                "{locator} is not a text input"
            ))),
            None => Err(E2eError::ElementNotFound(locator.to_string())),
        }
    }

    async fn type_text(&self, locator: &Locator, text: &str, key_delay: Duration) -> Result<()> {
        for ch in text.chars() {
            {
                let mut state = self.lock();
                match self.resolve(&state, locator) {
                    Some((_, Target::LocationInput)) => {
                        state.query.push(ch);
                        state.last_keystroke = Some(Instant::now());
                    }
                    _ => return Err(E2eError::ElementNotFound(locator.to_string())),
                }
            }
            tokio::time::sleep(key_delay).await;
        }
        Ok(())
    }

    async fn text(&self, locator: &Locator) -> Result<Option<String>> {
        let state = self.lock();
        match &locator.strategy {
            Strategy::Css(selector) => Ok(self
                .css_texts(&state, selector)
                .and_then(|texts| texts.into_iter().next())),
            Strategy::Role { .. } => {
                Ok(self.resolve(&state, locator).map(|(name, _)| name))
            }
        }
    }

    async fn page_html(&self) -> Result<String> {
        Ok(self.render(&self.lock()))
    }

    async fn wait_for_network_idle(&self, _quiet: Duration, _budget: Duration) -> Result<()> {
        // The model settles synchronously.
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }
}
