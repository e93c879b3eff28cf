//! The price-filter workflow: open a popover whose trigger label
//! depends on filter state, set min/max bounds by visible label, and
//! commit or reset.

use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::errors::Result;
use crate::locate::{self, Locator};
use crate::wait;
use tracing::{debug, info};

pub struct PriceFilter<'a, D: PageDriver> {
    driver: &'a D,
    config: &'a SuiteConfig,
}

impl<'a, D: PageDriver> PriceFilter<'a, D> {
    pub fn new(driver: &'a D, config: &'a SuiteConfig) -> Self {
        Self { driver, config }
    }

    /// Open the popover. The minimum control becoming visible is the
    /// authoritative open signal (the popover's own transition is not
    /// otherwise observable). Already-open popovers are left alone, so
    /// opening is idempotent and never toggles the popover shut.
    pub async fn open(&self) -> Result<()> {
        let min_control = locate::min_price_control();
        if self.driver.is_visible(&min_control).await.unwrap_or(false) {
            debug!("price popover already open");
            return Ok(());
        }
        self.driver.click(&locate::price_trigger()).await?;
        wait::until_visible(
            self.driver,
            &min_control,
            self.config.waits.control(),
            self.config.waits.poll_interval(),
            &format!("minimum price control after opening the price filter ({min_control})"),
        )
        .await
    }

    /// Select the minimum-price option whose visible text equals
    /// `label`. The UI only exposes discrete pre-labeled options; no
    /// numeric value is ever typed.
    pub async fn set_min_by_label(&self, label: &str) -> Result<()> {
        info!(label, "setting minimum price");
        let control = locate::min_price_control();
        wait::until_visible(
            self.driver,
            &control,
            self.config.waits.control(),
            self.config.waits.poll_interval(),
            &format!("minimum price control ({control})"),
        )
        .await?;
        self.driver.click(&control).await?;
        self.choose_option(label).await
    }

    /// Select the maximum-price option by label, recovering first if
    /// the popover has closed (it may auto-close after a min-only
    /// selection in some flows).
    pub async fn set_max_by_label(&self, label: &str) -> Result<()> {
        info!(label, "setting maximum price");
        let control = locate::max_price_control();
        self.ensure_control_visible(&control, "maximum price control")
            .await?;
        self.driver.click(&control).await?;
        self.choose_option(label).await
    }

    /// Click "Apply" when it is present; UIs that auto-apply on
    /// selection have no such button and this is a no-op. Returns
    /// whether anything was clicked.
    pub async fn apply_if_visible(&self) -> Result<bool> {
        self.click_and_settle_if_visible(&locate::apply_button(), "apply")
            .await
    }

    /// Click "Clear"/"Reset"/"Remove" when one is present.
    pub async fn clear_if_visible(&self) -> Result<bool> {
        self.click_and_settle_if_visible(&locate::clear_filter_button(), "clear")
            .await
    }

    /// One state-check-then-recover step: if `control` is not visible,
    /// re-read the current pill label, click the trigger to reopen the
    /// popover, and wait for the control. One recovery attempt only;
    /// after that the bounded wait is the failure.
    async fn ensure_control_visible(&self, control: &Locator, what: &str) -> Result<()> {
        if self.driver.is_visible(control).await.unwrap_or(false) {
            return Ok(());
        }
        let pill = self
            .driver
            .text(&locate::price_trigger())
            .await
            .unwrap_or(None);
        debug!(
            what,
            pill = pill.as_deref().unwrap_or("<no trigger>"),
            "control not visible; reopening popover via trigger"
        );
        self.driver.click(&locate::price_trigger()).await?;
        wait::until_visible(
            self.driver,
            control,
            self.config.waits.control(),
            self.config.waits.poll_interval(),
            &format!("{what} after reopening the price filter ({control})"),
        )
        .await
    }

    async fn choose_option(&self, label: &str) -> Result<()> {
        let option = locate::price_option(label);
        wait::until_visible(
            self.driver,
            &option,
            self.config.waits.control(),
            self.config.waits.poll_interval(),
            &format!("price option \"{label}\" ({option})"),
        )
        .await?;
        self.driver.click(&option).await
    }

    /// Probe-then-click for optional controls. Absence (including a
    /// probe error) reads as "control not present" and is never
    /// propagated; a real click is followed by a network-idle wait,
    /// since applying or clearing a filter issues a backend request
    /// with no other completion signal.
    async fn click_and_settle_if_visible(&self, trigger: &Locator, action: &str) -> Result<bool> {
        if !self.driver.is_visible(trigger).await.unwrap_or(false) {
            debug!(action, "trigger not visible, skipping");
            return Ok(false);
        }
        self.driver.click(trigger).await?;
        self.driver
            .wait_for_network_idle(
                self.config.waits.network_quiet(),
                self.config.waits.network_budget(),
            )
            .await?;
        Ok(true)
    }
}
