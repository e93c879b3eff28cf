//! Listing extraction from a full-page HTML snapshot.
//!
//! Addresses and prices are raw text blocks with no accessible role, so
//! they are pulled out structurally: the `listingItem__address` /
//! `listingItem__price` class stems are stable across builds while the
//! hashed suffix is not. The page renders one address and one price per
//! card, in card order, which is what lets the two lists be paired.

use crate::locate::normalize;
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const ADDRESS_SELECTOR: &str = r#"div[class*="listingItem__address"]"#;
const PRICE_SELECTOR: &str = r#"div[class*="listingItem__price"]"#;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingResult {
    pub address: String,
    /// Dollars, when the rendered text carried a parsable "$x,xxx"
    /// figure. Unparsable price text ("Contact agent") stays `None`.
    pub price: Option<u64>,
}

fn price_pattern() -> &'static Regex {
    static PRICE_RE: OnceLock<Regex> = OnceLock::new();
    PRICE_RE.get_or_init(|| Regex::new(r"\$([\d,]+)").expect("static price pattern"))
}

/// First "$x,xxx" occurrence in `text`, commas stripped. Anything that
/// does not parse yields `None`, never zero.
pub fn parse_price(text: &str) -> Option<u64> {
    let caps = price_pattern().captures(text)?;
    caps[1].replace(',', "").parse().ok()
}

fn select_texts(html: &str, selector_str: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut texts = Vec::new();
    if let Ok(selector) = Selector::parse(selector_str) {
        for element in document.select(&selector) {
            texts.push(normalize(&element.text().collect::<String>()));
        }
    }
    texts
}

pub fn addresses(html: &str) -> Vec<String> {
    select_texts(html, ADDRESS_SELECTOR)
}

pub fn price_texts(html: &str) -> Vec<String> {
    select_texts(html, PRICE_SELECTOR)
}

/// Numeric prices in card order; entries that fail to parse are
/// excluded rather than recorded as zero, so they never count toward
/// range assertions.
pub fn prices(html: &str) -> Vec<u64> {
    price_texts(html)
        .iter()
        .filter_map(|text| parse_price(text))
        .collect()
}

/// Address/price pairs in card order, for reports and demo output.
pub fn listings(html: &str) -> Vec<ListingResult> {
    let addresses = addresses(html);
    let mut price_texts = price_texts(html).into_iter();
    addresses
        .into_iter()
        .map(|address| ListingResult {
            address,
            price: price_texts.next().as_deref().and_then(parse_price),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <html><body>
          <div class="listingItem__item___q8Zx1">
            <div class="listingItem__price___Zx12a">$325,000</div>
            <div class="listingItem__address___CKkGl">1211 Caroline St, Houston, TX 77002</div>
          </div>
          <div class="listingItem__item___q8Zx1">
            <div class="listingItem__price___Zx12a">Contact agent</div>
            <div class="listingItem__address___CKkGl">814 Heights Blvd, Houston, TX 77007</div>
          </div>
          <div class="listingItem__item___q8Zx1">
            <div class="listingItem__price___Zx12a">$1,250,000</div>
            <div class="listingItem__address___CKkGl">5505 Memorial Dr, Houston, TX 77007</div>
          </div>
        </body></html>
    "#;

    #[test]
    fn parses_dollar_amounts() {
        assert_eq!(parse_price("$325,000"), Some(325000));
        assert_eq!(parse_price("$1,250,000"), Some(1250000));
        assert_eq!(parse_price("From $89,900 (est.)"), Some(89900));
        assert_eq!(parse_price("$900/mo"), Some(900));
    }

    #[test]
    fn unparsable_price_yields_none() {
        assert_eq!(parse_price("Contact agent"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("$,"), None);
        assert_eq!(parse_price("325000"), None);
    }

    #[test]
    fn extracts_addresses_in_card_order() {
        let addresses = addresses(SAMPLE);
        assert_eq!(addresses.len(), 3);
        assert_eq!(addresses[0], "1211 Caroline St, Houston, TX 77002");
        assert_eq!(addresses[2], "5505 Memorial Dr, Houston, TX 77007");
    }

    #[test]
    fn numeric_prices_exclude_unparsable_entries() {
        assert_eq!(prices(SAMPLE), vec![325000, 1250000]);
    }

    #[test]
    fn listings_pair_addresses_with_prices() {
        let listings = listings(SAMPLE);
        assert_eq!(listings.len(), 3);
        assert_eq!(listings[0].price, Some(325000));
        assert_eq!(listings[1].price, None);
        assert_eq!(listings[1].address, "814 Heights Blvd, Houston, TX 77007");
    }

    #[test]
    fn empty_page_yields_nothing() {
        assert!(addresses("<html></html>").is_empty());
        assert!(prices("<html></html>").is_empty());
    }
}
