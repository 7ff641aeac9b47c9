//! Follow-up commands: the per-problem remediation timeline

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;
use crate::tracking::FollowUpKind;

#[derive(Subcommand)]
pub enum FollowupCommands {
    /// Add a follow-up entry to a problem's timeline
    Add {
        /// Problem id
        id: String,

        /// Entry text
        content: String,

        /// note, update, blocker, resolution, decision, or milestone
        #[arg(long, default_value = "note")]
        kind: FollowUpKind,

        /// Author (default from config)
        #[arg(long)]
        author: Option<String>,
    },

    /// List a problem's follow-ups, newest first
    List {
        /// Problem id
        id: String,
    },

    /// Delete a follow-up entry
    Delete {
        /// Problem id
        id: String,

        /// Follow-up id as shown by `followup list`
        followup_id: String,
    },
}

pub fn run(cmd: FollowupCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        FollowupCommands::Add {
            id,
            content,
            kind,
            author,
        } => add(&id, &content, kind, author, global),
        FollowupCommands::List { id } => list(&id, global),
        FollowupCommands::Delete { id, followup_id } => delete(&id, &followup_id, global),
    }
}

fn add(
    id: &str,
    content: &str,
    kind: FollowUpKind,
    author: Option<String>,
    global: &GlobalOpts,
) -> Result<()> {
    let mut engagement = helpers::open_engagement(global)?;
    let author = author.unwrap_or_else(|| Config::load().author());

    let follow_up = engagement
        .add_follow_up(id, kind, content, &author)
        .map_err(|e| miette::miette!("{}", e))?;
    helpers::warn_on_save_error(&mut engagement, global.quiet);

    println!(
        "{} Added {} {} to {}",
        style("✓").green().bold(),
        follow_up.kind,
        style(&follow_up.id).dim(),
        style(id).cyan()
    );
    Ok(())
}

fn list(id: &str, global: &GlobalOpts) -> Result<()> {
    let engagement = helpers::open_engagement(global)?;
    engagement
        .resolve_problem(id)
        .ok_or_else(|| miette::miette!("No problem found with id '{}'", id))?;

    let follow_ups = engagement
        .tracking(id)
        .map(|t| t.follow_ups.clone())
        .unwrap_or_default();

    if global.format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&follow_ups).map_err(|e| miette::miette!("{}", e))?
        );
        return Ok(());
    }

    if follow_ups.is_empty() {
        println!("No follow-ups for {}", id);
        return Ok(());
    }

    for f in &follow_ups {
        println!(
            "{} [{}] {} {}",
            f.created_at.format("%Y-%m-%d %H:%M"),
            f.kind,
            style(&f.author).dim(),
            style(&f.id).dim()
        );
        println!("    {}", f.content);
    }
    Ok(())
}

fn delete(id: &str, followup_id: &str, global: &GlobalOpts) -> Result<()> {
    let mut engagement = helpers::open_engagement(global)?;

    if engagement.delete_follow_up(id, followup_id) {
        helpers::warn_on_save_error(&mut engagement, global.quiet);
        println!(
            "{} Deleted follow-up {}",
            style("✓").green().bold(),
            style(followup_id).dim()
        );
    } else if !global.quiet {
        println!("No follow-up '{}' on '{}'", followup_id, id);
    }
    Ok(())
}
