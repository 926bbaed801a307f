pub mod commands;
pub mod config;
pub mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::harvest::{ExtractionFlags, SearchRequest};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to a file (the data directory when no path is given)
    #[arg(long, global = true, num_args = 0..=1, value_name = "PATH")]
    pub log_file: Option<Option<PathBuf>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the web and harvest contacts from the resulting sites
    Search(SearchArgs),

    /// List the Brazilian states
    States,

    /// List the municipalities of one state
    Municipalities {
        /// Two-letter state code
        #[arg(required = true)]
        state: String,
    },

    /// Manage configuration profiles
    Config {
        /// Profile name to manage
        #[arg(required = false)]
        profile: Option<String>,

        /// List all available profiles
        #[arg(short, long)]
        list: bool,
    },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// What to search for
    #[arg(required = true)]
    pub query: String,

    /// Neighbourhood or other locality text added to the query
    #[arg(short, long)]
    pub locality: Option<String>,

    /// Two-letter state code
    #[arg(short, long)]
    pub state: Option<String>,

    /// Municipality inside --state
    #[arg(short, long, requires = "state")]
    pub city: Option<String>,

    /// Extract email addresses
    #[arg(long)]
    pub email: bool,

    /// Extract phone numbers
    #[arg(long)]
    pub phone: bool,

    /// Extract street addresses
    #[arg(long)]
    pub address: bool,

    /// Extract outbound links
    #[arg(long)]
    pub links: bool,

    /// Extract social media links
    #[arg(long)]
    pub social: bool,

    /// Extract every category
    #[arg(short, long)]
    pub all: bool,

    /// Export the results to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export format (csv, json), taken from the output extension when omitted
    #[arg(short, long)]
    pub format: Option<String>,

    /// Configuration profile to use
    #[arg(short, long)]
    pub profile: Option<String>,
}

impl SearchArgs {
    /// Categories for this run. Passing any category flag replaces the defaults.
    pub fn flags(&self, defaults: ExtractionFlags) -> ExtractionFlags {
        if self.all {
            return ExtractionFlags::all();
        }

        let requested = ExtractionFlags {
            email: self.email,
            phone: self.phone,
            address: self.address,
            outbound_links: self.links,
            social_links: self.social,
        };

        if requested.any() {
            requested
        } else {
            defaults
        }
    }

    pub fn request(&self) -> SearchRequest {
        SearchRequest {
            locality: self.locality.clone(),
            state: self.state.clone(),
            city: self.city.clone(),
            ..SearchRequest::new(self.query.clone())
        }
    }
}

/// Parse command line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Process the command
pub async fn process_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Search(args) => {
            info!("Starting search for '{}'", args.query);
            commands::search(args).await
        }
        Commands::States => commands::states(),
        Commands::Municipalities { state } => {
            info!("Listing municipalities of {}", state);
            commands::municipalities(state).await
        }
        Commands::Config { profile, list } => {
            if list {
                info!("Listing all configuration profiles");
                commands::list_profiles()
            } else if let Some(profile_name) = profile {
                info!("Managing configuration profile: {}", profile_name);
                commands::manage_profile(profile_name)
            } else {
                info!("Showing current configuration");
                commands::show_config()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_args(args: &[&str]) -> SearchArgs {
        let cli = Cli::try_parse_from(["harvester", "search"].iter().chain(args)).unwrap();
        match cli.command {
            Commands::Search(args) => args,
            _ => panic!("expected the search command"),
        }
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert()
    }

    #[test]
    fn test_category_flags_replace_defaults() {
        let defaults = ExtractionFlags {
            email: true,
            phone: true,
            ..Default::default()
        };

        assert_eq!(search_args(&["padaria"]).flags(defaults), defaults);
        assert_eq!(
            search_args(&["padaria", "--social"]).flags(defaults),
            ExtractionFlags {
                social_links: true,
                ..Default::default()
            }
        );
        assert_eq!(search_args(&["padaria", "--all"]).flags(defaults), ExtractionFlags::all());
    }

    #[test]
    fn test_search_request_from_args() {
        let args = search_args(&["padaria", "-l", "Centro", "-s", "SP", "-c", "Campinas"]);
        let request = args.request();
        assert_eq!(request.compose_query(), "padaria Centro Campinas - SP");
    }

    #[test]
    fn test_city_requires_state() {
        assert!(Cli::try_parse_from(["harvester", "search", "padaria", "--city", "Campinas"]).is_err());
    }

    #[test]
    fn test_log_file_value_is_optional() {
        let cli = Cli::try_parse_from(["harvester", "states", "--log-file"]).unwrap();
        assert_eq!(cli.log_file, Some(None));

        let cli = Cli::try_parse_from(["harvester", "--log-file", "run.log", "states"]).unwrap();
        assert_eq!(cli.log_file, Some(Some(PathBuf::from("run.log"))));
    }
}
