pub mod address;
pub mod email;
pub mod links;
pub mod phone;
pub mod structured;
pub mod text;

use thiserror::Error;

// Re-export common types
pub use text::ParsedPage;

/// A fault that stopped one category's extraction early
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFault {
    #[error("could not decode {scheme} link '{href}': {reason}")]
    UndecodableLink {
        scheme: &'static str,
        href: String,
        reason: String,
    },
}

/// Values found for one category, plus the first link that had to be
/// skipped (if any). A skipped link never costs the other findings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub values: Vec<String>,
    pub fault: Option<ExtractionFault>,
}

impl Extraction {
    /// Extraction where every input was usable
    pub fn complete(values: Vec<String>) -> Self {
        Self { values, fault: None }
    }

    pub fn new(values: Vec<String>, fault: Option<ExtractionFault>) -> Self {
        Self { values, fault }
    }
}
