pub mod fetch;
pub mod localities;
pub mod search;

// Re-export common types
pub use fetch::{http_client, HttpFetcher, PageFetcher};
pub use localities::{find_state, MunicipalityDirectory, STATES};
pub use search::{DuckDuckGoSearch, SearchProvider};
