use thiserror::Error;

/// Problems that stop a run before it starts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarvestError {
    #[error("type what you want to search for")]
    NoQuery,

    #[error("select at least one category to extract")]
    NoCategory,

    #[error("unknown state code '{0}'")]
    UnknownState(String),
}
