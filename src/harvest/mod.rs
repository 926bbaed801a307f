pub mod context;
pub mod error;
pub mod flags;
pub mod pipeline;
pub mod processor;
pub mod result;

// Re-export common types
pub use context::{RunEvent, RunProgress};
pub use error::HarvestError;
pub use flags::{Category, ExtractionFlags};
pub use pipeline::{Pipeline, SearchRequest, DEFAULT_MAX_SITES};
pub use result::{PageResult, RunOutcome, RunStatus};
