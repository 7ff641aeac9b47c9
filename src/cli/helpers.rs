//! Shared helpers for command implementations

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::catalog::BaseCatalog;
use crate::cli::GlobalOpts;
use crate::core::Project;
use crate::engagement::Engagement;
use crate::persist::FileStore;

/// Resolve the project from --project or by walking up from the cwd
pub fn resolve_project(global: &GlobalOpts) -> Result<Project> {
    let project = match &global.project {
        Some(path) => Project::discover_from(path),
        None => Project::discover(),
    };
    project.map_err(|e| miette::miette!("{}", e))
}

/// Open the engagement backed by the project's state file
pub fn open_engagement(global: &GlobalOpts) -> Result<Engagement> {
    let project = resolve_project(global)?;
    open_engagement_at(project.state_path().as_path())
}

pub fn open_engagement_at(state_path: &Path) -> Result<Engagement> {
    let base = BaseCatalog::load_embedded().map_err(|e| miette::miette!("{}", e))?;
    let store = FileStore::new(state_path);
    Engagement::open(base, Box::new(store)).map_err(|e| miette::miette!("{}", e))
}

/// Report a best-effort save failure left behind by the last mutation.
/// The in-memory mutation already happened; the warning is all there is.
pub fn warn_on_save_error(engagement: &mut Engagement, quiet: bool) {
    if let Some(e) = engagement.take_save_error() {
        if !quiet {
            eprintln!(
                "{} state not saved: {}",
                style("warning:").yellow().bold(),
                e
            );
        }
    }
}

/// Ask for confirmation unless --yes was passed
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    print!("{} [y/N] ", prompt);
    std::io::Write::flush(&mut std::io::stdout()).into_diagnostic()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input).into_diagnostic()?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Format a money amount with its currency, without decimals
pub fn fmt_money(value: f64, currency: &str) -> String {
    format!("{:.0} {}", value, currency)
}

/// Truncate a string for table display
pub fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Parse a comma-separated list flag into trimmed items
pub fn parse_list(raw: &Option<String>) -> Option<Vec<String>> {
    raw.as_ref().map(|s| {
        s.split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("a rather long title", 10), "a rathe...");
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list(&None), None);
        assert_eq!(
            parse_list(&Some("a, b,,c".to_string())),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn test_fmt_money() {
        assert_eq!(fmt_money(12500.4, "EUR"), "12500 EUR");
    }
}
