use std::fmt;

use serde::{Deserialize, Serialize};

/// Fetch and parse are counted for every site
const BASE_STEPS: usize = 2;

/// What to extract from each page. Fixed for the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionFlags {
    pub email: bool,
    pub phone: bool,
    pub address: bool,
    pub outbound_links: bool,
    pub social_links: bool,
}

/// One extraction target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Email,
    Phone,
    Address,
    OutboundLinks,
    SocialLinks,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Email,
        Category::Phone,
        Category::Address,
        Category::OutboundLinks,
        Category::SocialLinks,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Email => "email",
            Category::Phone => "phone",
            Category::Address => "address",
            Category::OutboundLinks => "outbound links",
            Category::SocialLinks => "social links",
        };
        f.write_str(name)
    }
}

impl ExtractionFlags {
    pub const fn all() -> Self {
        Self {
            email: true,
            phone: true,
            address: true,
            outbound_links: true,
            social_links: true,
        }
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        match category {
            Category::Email => self.email,
            Category::Phone => self.phone,
            Category::Address => self.address,
            Category::OutboundLinks => self.outbound_links,
            Category::SocialLinks => self.social_links,
        }
    }

    pub fn enabled(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|category| self.is_enabled(*category))
            .collect()
    }

    pub fn any(&self) -> bool {
        Category::ALL.iter().any(|category| self.is_enabled(*category))
    }

    /// Outbound and social links share one anchor pass
    pub fn scans_links(&self) -> bool {
        self.outbound_links || self.social_links
    }

    /// Progress units one site can take: fetch, parse, one per enabled
    /// content category and one for the link pass
    pub fn steps_per_site(&self) -> usize {
        BASE_STEPS
            + usize::from(self.email)
            + usize::from(self.phone)
            + usize::from(self.address)
            + usize::from(self.scans_links())
    }

    pub fn total_steps(&self, sites: usize) -> usize {
        self.steps_per_site() * sites
    }
}
