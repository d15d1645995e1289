//! Output control for quiet mode and result rendering
//!
//! Provides a global quiet mode flag to suppress non-essential output,
//! plus the text and JSON renderers used by the CLI.

use anyhow::Result;
use colored::Colorize;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::batch::RerankResponse;
use crate::error::RerankError;
use crate::rerank::ScoredCandidate;
use crate::signals::BehaviorSummary;

/// Global quiet mode flag
static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Enable quiet mode (suppresses informational output)
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::SeqCst);
}

/// Check if quiet mode is enabled
pub fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::SeqCst)
}

/// Print a message only if not in quiet mode
#[macro_export]
macro_rules! info_print {
    ($($arg:tt)*) => {
        if !$crate::output::is_quiet() {
            println!($($arg)*);
        }
    };
}

/// Print to stderr only if not in quiet mode (for warnings)
#[macro_export]
macro_rules! warn_print {
    ($($arg:tt)*) => {
        if !$crate::output::is_quiet() {
            eprintln!($($arg)*);
        }
    };
}

const TITLE_WIDTH: usize = 32;

fn fit_title(title: &str) -> String {
    if title.chars().count() > TITLE_WIDTH {
        let cut: String = title.chars().take(TITLE_WIDTH - 3).collect();
        format!("{}...", cut)
    } else {
        title.to_string()
    }
}

/// Render ranked rows as an aligned table
pub fn format_ranked(results: &[ScoredCandidate]) -> String {
    let id_width = results
        .iter()
        .map(|r| r.activity_id.as_str().len())
        .max()
        .unwrap_or(0)
        .max("activity_id".len());

    let mut out = format!(
        "{:<id_width$}  {:<title_width$}  {:>6}  {:>7}  {:>7}  {:>6}\n",
        "activity_id",
        "title",
        "sim",
        "f_dwell",
        "g_click",
        "score",
        id_width = id_width,
        title_width = TITLE_WIDTH,
    );
    for r in results {
        out.push_str(&format!(
            "{:<id_width$}  {:<title_width$}  {:>6.3}  {:>7.3}  {:>7.3}  {:>6.3}\n",
            r.activity_id.as_str(),
            fit_title(&r.title),
            r.sim,
            r.f_dwell,
            r.g_click,
            r.score,
            id_width = id_width,
            title_width = TITLE_WIDTH,
        ));
    }
    out
}

/// Render batch responses as one table per request, failures inline
pub fn format_batch(responses: &[std::result::Result<RerankResponse, RerankError>]) -> String {
    let mut out = String::new();
    for (idx, response) in responses.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        match response {
            Ok(response) => {
                let label = response.query.as_deref().unwrap_or("(no query)");
                out.push_str(&format!("# {} {}\n", idx, label));
                if response.results.is_empty() {
                    out.push_str("(no results)\n");
                } else {
                    out.push_str(&format_ranked(&response.results));
                }
            }
            Err(e) => out.push_str(&format!("# {} error: {}\n", idx, e)),
        }
    }
    out
}

pub fn print_ranked(results: &[ScoredCandidate], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("{}", "No candidates to rank.".dimmed());
        return Ok(());
    }

    info_print!("{}", "Ranked activities".bright_cyan().bold());
    print!("{}", format_ranked(results));
    Ok(())
}

pub fn print_signals(summaries: &[BehaviorSummary], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("{}", "No events in log.".dimmed());
        return Ok(());
    }

    info_print!("{}", "Behavior summaries".bright_cyan().bold());
    println!("{:<16}  {:>9}  {:>5}  {:>6}  {:>10}", "activity_id", "dwell_sec", "click", "events", "click_rate");
    for s in summaries {
        println!(
            "{:<16}  {:>9.2}  {:>5}  {:>6}  {:>10.3}",
            s.activity_id.as_str(),
            s.dwell_sec,
            s.click,
            s.events,
            s.click_rate
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityId;

    #[test]
    fn test_format_ranked_columns() {
        let rows = vec![ScoredCandidate {
            activity_id: ActivityId::new("1"),
            title: "Fushimi Inari sunrise hike with a local guide".to_string(),
            sim: 0.9,
            dwell_sec: 10.0,
            click: 1.0,
            f_dwell: 1.0,
            g_click: 1.0,
            score: 0.94,
        }];

        let table = format_ranked(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("activity_id"));
        assert!(lines[0].ends_with("score"));
        assert!(lines[1].contains("..."));
        assert!(lines[1].ends_with("0.940"));
    }

    #[test]
    fn test_format_batch() {
        let responses = vec![
            Ok(RerankResponse {
                query: Some("kyoto temples".to_string()),
                results: vec![ScoredCandidate {
                    activity_id: ActivityId::new("7"),
                    title: "Kinkaku-ji".to_string(),
                    sim: 0.5,
                    dwell_sec: 0.0,
                    click: 0.0,
                    f_dwell: 0.0,
                    g_click: 0.0,
                    score: 0.3,
                }],
            }),
            Ok(RerankResponse {
                query: None,
                results: Vec::new(),
            }),
            Err(RerankError::DuplicateCandidate("9".to_string())),
        ];

        let text = format_batch(&responses);
        assert!(text.contains("# 0 kyoto temples"));
        assert!(text.contains("Kinkaku-ji"));
        assert!(text.contains("# 1 (no query)\n(no results)"));
        assert!(text.contains("# 2 error: duplicate candidate id '9'"));
    }
}
