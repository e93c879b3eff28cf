//! Runs against the real search deployment. Ignored by default: they
//! need a local Chrome install and network access.
//!
//! Run with `cargo test --test live -- --ignored --test-threads=1`.

use homestory_e2e::{scenarios, ChromeDriver, ScenarioRunner, SuiteConfig};

async fn run_price_scenario(index: usize) {
    let config = SuiteConfig::default();
    let driver = ChromeDriver::launch(&config.browser).expect("chrome launches");
    let runner = ScenarioRunner::new(&driver, &config);
    let table = scenarios();
    let scenario = &table[index];

    let report = runner
        .run(scenario)
        .await
        .unwrap_or_else(|e| panic!("scenario {:?} failed against the live site: {e}", scenario.name));
    assert!(report.prices_after >= 1);
}

#[tokio::test]
#[ignore = "needs Chrome and network access to the live site"]
async fn live_location_search_returns_matching_addresses() {
    let config = SuiteConfig::default();
    let driver = ChromeDriver::launch(&config.browser).expect("chrome launches");
    let runner = ScenarioRunner::new(&driver, &config);

    let report = runner
        .run_location_search()
        .await
        .expect("location search passes against the live site");
    assert!(report.prices_before >= 1);
}

#[tokio::test]
#[ignore = "needs Chrome and network access to the live site"]
async fn live_min_only_filter() {
    run_price_scenario(0).await;
}

#[tokio::test]
#[ignore = "needs Chrome and network access to the live site"]
async fn live_max_only_filter() {
    run_price_scenario(1).await;
}

#[tokio::test]
#[ignore = "needs Chrome and network access to the live site"]
async fn live_min_and_max_filter() {
    run_price_scenario(2).await;
}
