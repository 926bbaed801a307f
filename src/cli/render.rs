use std::fmt::Write;

use crate::harvest::{Category, ExtractionFlags, PageResult, RunOutcome, RunProgress, RunStatus};

/// `Searching (n/total - pct%) - domain`
pub fn progress_line(progress: &RunProgress) -> String {
    let mut line = format!(
        "Searching ({}/{} - {}%)",
        progress.completed_steps,
        progress.total_steps,
        progress.percent()
    );
    if !progress.domain.is_empty() {
        line.push_str(" - ");
        line.push_str(&progress.domain);
    }
    line
}

fn heading(category: Category) -> &'static str {
    match category {
        Category::Email => "Emails",
        Category::Phone => "Phones",
        Category::Address => "Addresses",
        Category::OutboundLinks => "Outbound links",
        Category::SocialLinks => "Social links",
    }
}

/// One block per site, enabled categories only
pub fn render_results(results: &[PageResult], flags: ExtractionFlags) -> String {
    let mut out = String::new();

    for result in results {
        let _ = writeln!(out, "Site: {}", result.site);
        for category in flags.enabled() {
            let values = result.values(category);
            if values.is_empty() {
                let _ = writeln!(out, "  {}: none found", heading(category));
            } else {
                let _ = writeln!(out, "  {}:", heading(category));
                for value in values {
                    let _ = writeln!(out, "    - {}", value);
                }
            }
        }
        out.push('\n');
    }

    out
}

pub fn status_message(outcome: &RunOutcome) -> String {
    let processed = outcome.results.len();
    let with_contacts = outcome.results.iter().filter(|result| !result.is_empty()).count();

    match outcome.status {
        RunStatus::Completed => format!(
            "Search completed: {} sites processed, {} with contacts",
            processed, with_contacts
        ),
        RunStatus::Cancelled => format!(
            "Search cancelled: {} sites processed before stopping, {} with contacts",
            processed, with_contacts
        ),
        RunStatus::NoSitesFound => "No sites found for this search".to_string(),
    }
}

pub fn stats_summary(outcome: &RunOutcome) -> String {
    let stats = &outcome.stats;
    let elapsed = outcome.finished_at - outcome.started_at;
    let mut summary = format!(
        "Run {}: {}/{} steps, {} requests ({} ok, {} failed), {} KB downloaded in {:.1}s",
        outcome.run_id,
        outcome.progress.completed_steps,
        outcome.progress.total_steps,
        stats.total_requests,
        stats.successful_requests,
        stats.failed_requests,
        stats.bytes_downloaded / 1024,
        elapsed.num_milliseconds() as f64 / 1000.0
    );
    if let Some(avg) = stats.average_duration_ms() {
        let _ = write!(summary, ", {} ms per request", avg);
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::FetchStats;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn outcome(status: RunStatus, results: Vec<PageResult>) -> RunOutcome {
        let started_at = Utc::now();
        RunOutcome {
            run_id: Uuid::new_v4(),
            status,
            results,
            progress: RunProgress::default(),
            stats: FetchStats::new(),
            started_at,
            finished_at: started_at + Duration::milliseconds(1500),
        }
    }

    #[test]
    fn test_progress_line() {
        let progress = RunProgress {
            completed_steps: 3,
            total_steps: 12,
            domain: "padaria.com.br".to_string(),
        };
        assert_eq!(progress_line(&progress), "Searching (3/12 - 25%) - padaria.com.br");
        assert_eq!(progress_line(&RunProgress::default()), "Searching (0/0 - 0%)");
    }

    #[test]
    fn test_render_results_lists_enabled_categories() {
        let result = PageResult {
            site: "https://padaria.com.br".to_string(),
            emails: vec!["contato@padaria.com.br".to_string()],
            phones: vec!["ignored".to_string()],
            ..Default::default()
        };
        let flags = ExtractionFlags {
            email: true,
            address: true,
            ..Default::default()
        };

        assert_eq!(
            render_results(&[result], flags),
            "Site: https://padaria.com.br\n  Emails:\n    - contato@padaria.com.br\n  Addresses: none found\n\n"
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            status_message(&outcome(RunStatus::NoSitesFound, Vec::new())),
            "No sites found for this search"
        );
        assert_eq!(
            status_message(&outcome(RunStatus::Cancelled, vec![PageResult::empty("a")])),
            "Search cancelled: 1 sites processed before stopping, 0 with contacts"
        );

        let found = PageResult {
            site: "b".to_string(),
            phones: vec!["(11) 3333-4444".to_string()],
            ..Default::default()
        };
        assert_eq!(
            status_message(&outcome(RunStatus::Completed, vec![found, PageResult::empty("c")])),
            "Search completed: 2 sites processed, 1 with contacts"
        );
    }

    #[test]
    fn test_stats_summary_reports_run_and_steps() {
        let mut done = outcome(RunStatus::Completed, Vec::new());
        done.progress = RunProgress {
            completed_steps: 9,
            total_steps: 12,
            domain: "b.example".to_string(),
        };
        done.stats.record_request("https://b.example", true, 40, Some(200), 4096);

        assert_eq!(
            stats_summary(&done),
            format!(
                "Run {}: 9/12 steps, 1 requests (1 ok, 0 failed), 4 KB downloaded in 1.5s, 40 ms per request",
                done.run_id
            )
        );
    }
}
