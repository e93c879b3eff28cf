use clap::Parser;
use homestory_e2e::scenario::write_failure_artifact;
use homestory_e2e::{
    scenarios, ChromeDriver, E2eError, FilterScenario, PageDriver, ScenarioReport,
    ScenarioRunner, SuiteConfig,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "homestory-e2e",
    version,
    about = "End-to-end search and price-filter checks for the HomeStory listing site"
)]
struct Cli {
    /// Base URL of the site under test.
    #[arg(long)]
    base_url: Option<String>,

    /// Location typed into the search box, e.g. "Houston, TX".
    #[arg(long)]
    location: Option<String>,

    /// Run a single price scenario by name instead of the whole table.
    #[arg(long)]
    scenario: Option<String>,

    /// Show the browser window while the suite runs.
    #[arg(long)]
    headed: bool,

    /// Print each report as a JSON line on stdout.
    #[arg(long)]
    json: bool,

    /// Directory failure screenshots are written to.
    #[arg(long, default_value = "artifacts")]
    artifacts: PathBuf,

    /// Skip the plain location-search case.
    #[arg(long)]
    skip_search: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = suite_config(&cli)?;
    info!(base_url = %config.base_url, location = %config.location, "starting suite");

    let mut failures = 0usize;

    if !cli.skip_search {
        match run_location_search(&cli, &config).await {
            Ok(report) => emit(&cli, &report)?,
            Err(err) => {
                failures += 1;
                error!(case = "location search", error = %err, "case failed");
            }
        }
    }

    for scenario in selected_scenarios(&cli)? {
        match run_scenario(&cli, &config, &scenario).await {
            Ok(report) => emit(&cli, &report)?,
            Err(err) => {
                failures += 1;
                error!(case = scenario.name, error = %err, "case failed");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} case(s) failed");
    }
    info!("all cases passed");
    Ok(())
}

fn suite_config(cli: &Cli) -> anyhow::Result<SuiteConfig> {
    let mut config = SuiteConfig::default();
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(location) = &cli.location {
        config.location = location.clone();
    }
    config.browser.headless = !cli.headed;
    Ok(config.validated()?)
}

fn selected_scenarios(cli: &Cli) -> anyhow::Result<Vec<FilterScenario>> {
    let table = scenarios();
    match &cli.scenario {
        None => Ok(table),
        Some(name) => {
            let wanted: Vec<FilterScenario> = table
                .into_iter()
                .filter(|s| s.name.eq_ignore_ascii_case(name))
                .collect();
            if wanted.is_empty() {
                anyhow::bail!("unknown scenario {name:?}; known: min only, max only, min and max");
            }
            Ok(wanted)
        }
    }
}

/// Each case gets its own browser so no state leaks between cases.
async fn run_location_search(cli: &Cli, config: &SuiteConfig) -> Result<ScenarioReport, E2eError> {
    let driver = ChromeDriver::launch(&config.browser)?;
    let runner = ScenarioRunner::new(&driver, config);
    let outcome = runner.run_location_search().await;
    if outcome.is_err() {
        save_failure_screenshot(&cli.artifacts, &driver, "location-search").await;
    }
    outcome
}

async fn run_scenario(
    cli: &Cli,
    config: &SuiteConfig,
    scenario: &FilterScenario,
) -> Result<ScenarioReport, E2eError> {
    let driver = ChromeDriver::launch(&config.browser)?;
    let runner = ScenarioRunner::new(&driver, config);
    let outcome = runner.run(scenario).await;
    if outcome.is_err() {
        save_failure_screenshot(&cli.artifacts, &driver, scenario.name).await;
    }
    outcome
}

/// Best effort: a failed screenshot never masks the case failure.
async fn save_failure_screenshot(dir: &Path, driver: &ChromeDriver, case: &str) {
    match capture(dir, driver, case).await {
        Ok(path) => info!(path = %path.display(), "saved failure screenshot"),
        Err(err) => error!(error = %err, "could not save failure screenshot"),
    }
}

async fn capture(dir: &Path, driver: &ChromeDriver, case: &str) -> Result<PathBuf, E2eError> {
    let bytes = driver.screenshot().await?;
    write_failure_artifact(dir, case, &bytes)
}

fn emit(cli: &Cli, report: &ScenarioReport) -> anyhow::Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string(report)?);
    } else {
        info!(
            case = %report.scenario,
            elapsed_ms = report.elapsed_ms,
            pill = %report.pill_label,
            prices_before = report.prices_before,
            prices_after = report.prices_after,
            "case passed"
        );
    }
    Ok(())
}
