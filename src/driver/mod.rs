pub mod chrome;

pub use chrome::ChromeDriver;

use crate::errors::Result;
use crate::locate::Locator;
use async_trait::async_trait;
use std::time::Duration;

/// The automation-engine seam: the primitive operations the workflows
/// need from a browser, and nothing more. One implementation speaks to a
/// real Chrome ([`ChromeDriver`]); the scripted page in
/// [`crate::testing`] implements the same contract in-process so the
/// workflows can be exercised without a browser.
///
/// Locator semantics are uniform across implementations (see
/// [`crate::locate`]): visible elements only, first match in document
/// order, zero matches is not an error for probes like `count` and
/// `is_visible`.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to `url` and wait for the document to load.
    async fn goto(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// Number of visible elements matching `locator`.
    async fn count(&self, locator: &Locator) -> Result<usize>;

    /// Whether at least one visible element matches `locator`.
    async fn is_visible(&self, locator: &Locator) -> Result<bool>;

    /// Click the first visible match; errors if there is none.
    async fn click(&self, locator: &Locator) -> Result<()>;

    /// Erase the value of the first visible matching input.
    async fn clear_text(&self, locator: &Locator) -> Result<()>;

    /// Type into the first visible matching input one character at a
    /// time, pausing `key_delay` between keystrokes so a suggestion
    /// engine sees incremental queries rather than one pasted string.
    async fn type_text(&self, locator: &Locator, text: &str, key_delay: Duration) -> Result<()>;

    /// Rendered text of the first visible match, if any.
    async fn text(&self, locator: &Locator) -> Result<Option<String>>;

    /// Full-page HTML snapshot for structural extraction.
    async fn page_html(&self) -> Result<String>;

    /// Wait until no network activity has been observed for `quiet`,
    /// giving up after `budget`.
    async fn wait_for_network_idle(&self, quiet: Duration, budget: Duration) -> Result<()>;

    /// PNG screenshot of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>>;
}
