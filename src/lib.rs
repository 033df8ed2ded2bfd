pub mod calendar;
pub mod parser;
pub mod pipeline;
pub mod scraper;
pub mod types;

pub use scraper::WebScraper;

pub(crate) const BASE_URL: &str = "https://tnb.liga.nu";
