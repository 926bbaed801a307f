pub mod export;

// Re-export common types
pub use export::{export, ExportFormat};
