use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::config::HarvesterConfig;
use super::render;
use super::SearchArgs;
use crate::harvest::{Pipeline, RunEvent};
use crate::net::localities::state_label;
use crate::net::{http_client, DuckDuckGoSearch, HttpFetcher, MunicipalityDirectory, STATES};
use crate::storage::{self, ExportFormat};

/// Run a search and harvest contacts from the resulting sites
pub async fn search(args: SearchArgs) -> Result<()> {
    let config = HarvesterConfig::load(args.profile.as_deref())
        .context("Failed to load configuration")?;

    let flags = args.flags(config.extraction);
    let request = args.request();
    request.validate(flags)?;

    // Decided up front so a bad format fails before any request is sent
    let export_target = match &args.output {
        Some(path) => Some(export_target(path, args.format.as_deref())?),
        None => None,
    };

    let client = http_client(&config.http.user_agent, config.http.timeout())?;

    if let (Some(state), Some(city)) = (&request.state, &request.city) {
        check_city(
            MunicipalityDirectory::new(client.clone(), config.localities.endpoint.clone()),
            state,
            city,
        )
        .await;
    }

    let pipeline = Pipeline::new(
        Arc::new(DuckDuckGoSearch::new(client.clone(), config.search.endpoint.clone())),
        Arc::new(HttpFetcher::new(client)),
    )
    .with_max_sites(config.search.max_sites);

    let mut handle = pipeline.spawn(request, flags)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = handle.events.recv() => match event {
                Some(RunEvent::Searching { query }) => eprintln!("Searching for '{}'...", query),
                Some(RunEvent::Started { sites, total_steps }) => {
                    eprintln!("Found {} sites, {} steps to go", sites, total_steps)
                }
                Some(RunEvent::Step(progress)) => eprint!("\r{:<72}", render::progress_line(&progress)),
                None => break,
            },
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                warn!("Interrupted, stopping after the current step");
                handle.cancel.cancel();
            }
        }
    }
    eprintln!();

    let outcome = handle.task.await.context("Search task failed")?;

    print!("{}", render::render_results(&outcome.results, flags));
    println!("{}", render::status_message(&outcome));
    println!("{}", render::stats_summary(&outcome));

    if let Some((path, format)) = export_target {
        storage::export(&outcome.results, format, &path)?;
        println!("Results exported to: {}", path.display());
    }

    Ok(())
}

/// Format from `--format`, else from the extension, else CSV. A path
/// without an extension gets the format's.
fn export_target(path: &Path, format: Option<&str>) -> Result<(PathBuf, ExportFormat)> {
    let format = match format {
        Some(format) => format.parse()?,
        None => ExportFormat::from_path(path).unwrap_or(ExportFormat::Csv),
    };

    let path = if path.extension().is_none() {
        path.with_extension(format.extension())
    } else {
        path.to_path_buf()
    };

    Ok((path, format))
}

/// Only warns: an unlisted city still narrows the search text
async fn check_city(mut directory: MunicipalityDirectory, state: &str, city: &str) {
    match directory.contains(state, city).await {
        Ok(true) => {}
        // Failed lookups are never cached
        Ok(false) if !directory.is_cached(state) => {
            warn!("Could not load the municipalities of {}, city not checked", state)
        }
        Ok(false) => warn!("'{}' is not a municipality of {}", city, state.to_uppercase()),
        Err(e) => warn!("City not checked: {:#}", e),
    }
}

/// List the federative units
pub fn states() -> Result<()> {
    for (code, name) in STATES {
        println!("{}", state_label(code, name));
    }
    Ok(())
}

/// List the municipalities of one state
pub async fn municipalities(state: String) -> Result<()> {
    let config = HarvesterConfig::load_default()?;
    let client = http_client(&config.http.user_agent, config.http.timeout())?;
    let mut directory = MunicipalityDirectory::new(client, config.localities.endpoint);

    let names = directory.municipalities(&state).await?;
    if names.is_empty() {
        println!("No municipalities available for {}", state.to_uppercase());
    }
    for name in names {
        println!("{}", name);
    }
    info!("Listed {} municipalities", names.len());

    Ok(())
}

/// List all available configuration profiles
pub fn list_profiles() -> Result<()> {
    let profiles = HarvesterConfig::list_profiles()?;

    println!("Available configuration profiles:");
    for profile in profiles {
        println!("  - {}", profile);
    }

    Ok(())
}

/// Show a configuration profile, creating it from the defaults when missing
pub fn manage_profile(profile_name: String) -> Result<()> {
    match HarvesterConfig::load_profile(&profile_name) {
        Ok(config) => {
            println!("Profile: {}", profile_name);
            print!("{}", serde_yaml::to_string(&config)?);
        }
        Err(_) => {
            warn!("Profile '{}' does not exist. Creating a default profile.", profile_name);
            HarvesterConfig::default().save_as_profile(&profile_name)?;
            println!("Created default profile: {}", profile_name);
        }
    }

    Ok(())
}

/// Show the current configuration
pub fn show_config() -> Result<()> {
    let config = HarvesterConfig::load_default()?;
    println!("Current configuration:");
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_target() {
        assert_eq!(
            export_target(Path::new("out.json"), None).unwrap(),
            (PathBuf::from("out.json"), ExportFormat::Json)
        );
        assert_eq!(
            export_target(Path::new("out"), None).unwrap(),
            (PathBuf::from("out.csv"), ExportFormat::Csv)
        );
        assert_eq!(
            export_target(Path::new("contatos"), Some("json")).unwrap(),
            (PathBuf::from("contatos.json"), ExportFormat::Json)
        );
        assert_eq!(
            export_target(Path::new("out.json"), Some("csv")).unwrap(),
            (PathBuf::from("out.json"), ExportFormat::Csv)
        );
        assert!(export_target(Path::new("out.xlsx"), Some("xlsx")).is_err());
    }
}
