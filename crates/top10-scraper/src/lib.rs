pub mod bulk;
pub mod client;
pub mod error;
pub mod orchestrator;
pub mod per_item;
mod rate_limit;
pub mod scope;

pub use bulk::{fetch_bulk, parse_bulk_export, BulkExport};
pub use client::Top10Client;
pub use error::ScraperError;
pub use orchestrator::{fetch_current_period, FetchOutcome, SourceEndpoints};
pub use per_item::{fetch_per_item, page_url, parse_ranking_page, PerItemFetch};
pub use scope::FetchScope;
