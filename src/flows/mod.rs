pub mod price;
pub mod search;

pub use price::PriceFilter;
pub use search::HomePage;
