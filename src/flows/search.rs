//! The location-search workflow over the home page:
//! `idle → typing → suggesting → selected → results-loaded`.

use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::errors::Result;
use crate::flows::PriceFilter;
use crate::listings::{self, ListingResult};
use crate::locate;
use crate::wait;
use tracing::{debug, info};

/// Page object for the search page. Borrows the session's driver; one
/// instance per test case.
pub struct HomePage<'a, D: PageDriver> {
    driver: &'a D,
    config: &'a SuiteConfig,
}

impl<'a, D: PageDriver> HomePage<'a, D> {
    pub fn new(driver: &'a D, config: &'a SuiteConfig) -> Self {
        Self { driver, config }
    }

    /// Navigate to the search page and wait for it to be ready. The
    /// location input becoming visible is the page-ready signal.
    pub async fn open(&self) -> Result<()> {
        self.driver.goto(&self.config.base_url).await?;
        wait::until_visible(
            self.driver,
            &locate::location_input(),
            self.config.waits.page_ready(),
            self.config.waits.poll_interval(),
            "Location input should be visible when search page is ready",
        )
        .await
    }

    /// Drive a full location search. Typing is incremental so the
    /// suggestion engine sees the query build up; the suggestion must
    /// match the typed text exactly, and at least one listing becoming
    /// visible is the sole "search completed" signal.
    pub async fn search_for_location(&self, location: &str) -> Result<()> {
        info!(location, "searching for location");

        // idle → typing: reset any committed search first.
        let clear = locate::clear_search();
        if self.driver.is_visible(&clear).await.unwrap_or(false) {
            debug!("clearing previous search");
            self.driver.click(&clear).await?;
        }

        let input = locate::location_input();
        self.driver.click(&input).await?;
        self.driver.clear_text(&input).await?;
        self.driver
            .type_text(&input, location, self.config.waits.key_delay())
            .await?;

        // typing → suggesting → selected.
        let option = locate::suggestion(location);
        wait::until_visible(
            self.driver,
            &option,
            self.config.waits.suggestion(),
            self.config.waits.poll_interval(),
            &format!("Exact suggestion \"{location}\" should appear ({option})"),
        )
        .await?;
        self.driver.click(&option).await?;

        // selected → results-loaded. No network-idle wait here: the
        // selection triggers a re-render that is better detected by
        // result presence.
        let blocks = locate::listing_address_blocks();
        wait::until_count_at_least(
            self.driver,
            &blocks,
            1,
            self.config.waits.results(),
            self.config.waits.poll_interval(),
            &format!("At least one listing should be visible after search for \"{location}\" ({blocks})"),
        )
        .await
    }

    /// Visible listing addresses, in card order.
    pub async fn addresses(&self) -> Result<Vec<String>> {
        Ok(listings::addresses(&self.driver.page_html().await?))
    }

    /// Parsed listing prices; entries without a parsable price are
    /// excluded, not zeroed.
    pub async fn result_prices(&self) -> Result<Vec<u64>> {
        Ok(listings::prices(&self.driver.page_html().await?))
    }

    /// Address/price pairs for reporting.
    pub async fn results(&self) -> Result<Vec<ListingResult>> {
        Ok(listings::listings(&self.driver.page_html().await?))
    }

    /// Rendered label of the price-filter trigger, whatever state it is
    /// in, or `None` when the trigger is not on the page.
    pub async fn price_pill_label(&self) -> Result<Option<String>> {
        self.driver.text(&locate::price_trigger()).await
    }

    pub fn price_filter(&self) -> PriceFilter<'a, D> {
        PriceFilter::new(self.driver, self.config)
    }
}
