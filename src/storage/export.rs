use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::debug;

use crate::harvest::{Category, PageResult};

/// Header row, one column per category after the site
pub const COLUMNS: [&str; 6] = [
    "Site",
    "Emails",
    "Phones",
    "Addresses",
    "Outbound links",
    "Social links",
];

/// Output format for exported results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// Format implied by a file extension, if it is one we write
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => anyhow::bail!("Unsupported export format: {}", other),
        }
    }
}

/// Write `results` to `path`, one record per site
pub fn export(results: &[PageResult], format: ExportFormat, path: &Path) -> Result<()> {
    if results.is_empty() {
        anyhow::bail!("nothing to export, run a search first");
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .context(format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut file = fs::File::create(path)
        .context(format!("Failed to create output file: {}", path.display()))?;

    match format {
        ExportFormat::Csv => write_csv(results, &mut file)?,
        ExportFormat::Json => write_json(results, &mut file)?,
    }

    debug!("Exported {} records to {}", results.len(), path.display());
    Ok(())
}

pub fn write_csv<W: Write>(results: &[PageResult], writer: &mut W) -> Result<()> {
    writeln!(writer, "{}", COLUMNS.join(",")).context("Failed to write CSV header")?;

    for result in results {
        let mut fields = vec![quote(&result.site)];
        for category in Category::ALL {
            fields.push(quote(&result.values(category).join(separator(category))));
        }
        writeln!(writer, "{}", fields.join(",")).context("Failed to write CSV row")?;
    }

    Ok(())
}

pub fn write_json<W: Write>(results: &[PageResult], writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, results).context("Failed to serialize results")?;
    writeln!(writer).context("Failed to write JSON output")?;
    Ok(())
}

/// Addresses contain commas of their own
fn separator(category: Category) -> &'static str {
    match category {
        Category::Address => " | ",
        _ => ", ",
    }
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
