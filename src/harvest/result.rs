use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::context::RunProgress;
use super::flags::Category;
use crate::utils::FetchStats;

/// Contacts harvested from one candidate site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// URL of the site
    pub site: String,

    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub addresses: Vec<String>,
    pub outbound_links: Vec<String>,
    pub social_links: Vec<String>,
}

/// Results of one run, in candidate order
pub type ResultSet = Vec<PageResult>;

impl PageResult {
    /// Record with every category empty, used for sites that failed to load
    pub fn empty(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            ..Default::default()
        }
    }

    pub fn values(&self, category: Category) -> &[String] {
        match category {
            Category::Email => &self.emails,
            Category::Phone => &self.phones,
            Category::Address => &self.addresses,
            Category::OutboundLinks => &self.outbound_links,
            Category::SocialLinks => &self.social_links,
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|category| self.values(*category).is_empty())
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Cancelled,
    NoSitesFound,
}

/// Everything the presentation layer receives when a run ends
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub results: ResultSet,
    pub progress: RunProgress,
    pub stats: FetchStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}
