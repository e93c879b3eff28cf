//! Bounded polling waits. Every blocking step in the workflows goes
//! through these: probe, sleep, re-probe, and give up with a timeout
//! error that names the awaited condition.

use crate::driver::PageDriver;
use crate::errors::{E2eError, Result};
use crate::locate::Locator;
use std::future::Future;
use std::time::{Duration, Instant};

/// Poll `probe` every `poll` until it reports true, for at most
/// `budget`. The probe always runs at least once, so a zero budget
/// still observes an already-satisfied condition.
pub async fn until<F, Fut>(budget: Duration, poll: Duration, what: &str, mut probe: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();
    loop {
        if probe().await? {
            return Ok(());
        }
        if start.elapsed() >= budget {
            return Err(E2eError::timeout(what, budget.as_millis() as u64));
        }
        tokio::time::sleep(poll).await;
    }
}

/// Wait for at least one visible match of `locator`. Evaluation errors
/// during a re-render count as "not visible yet"; the budget is the
/// backstop.
pub async fn until_visible<D: PageDriver + ?Sized>(
    driver: &D,
    locator: &Locator,
    budget: Duration,
    poll: Duration,
    what: &str,
) -> Result<()> {
    until(budget, poll, what, || async {
        Ok(driver.is_visible(locator).await.unwrap_or(false))
    })
    .await
}

/// Wait until `locator` has at least `min_count` visible matches.
pub async fn until_count_at_least<D: PageDriver + ?Sized>(
    driver: &D,
    locator: &Locator,
    min_count: usize,
    budget: Duration,
    poll: Duration,
    what: &str,
) -> Result<()> {
    until(budget, poll, what, || async {
        Ok(driver.count(locator).await.unwrap_or(0) >= min_count)
    })
    .await
}
