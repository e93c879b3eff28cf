pub mod config;
pub mod driver;
pub mod errors;
pub mod flows;
pub mod listings;
pub mod locate;
pub mod pill;
pub mod scenario;
pub mod testing;
pub mod wait;

pub use config::{BrowserConfig, SuiteConfig, Viewport, WaitBudgets};
pub use driver::{ChromeDriver, PageDriver};
pub use errors::{E2eError, Result};
pub use flows::{HomePage, PriceFilter};
pub use listings::ListingResult;
pub use pill::PillState;
pub use scenario::{scenarios, FilterScenario, PriceSelection, ScenarioReport, ScenarioRunner};
