//! Tracking commands: status, progress, assignee, priority, dates, cost

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::engagement::Engagement;
use crate::tracking::{CustomCost, DatePatch, InternalPriority, ProblemTracking, Status};

#[derive(Subcommand)]
pub enum TrackCommands {
    /// Show the tracking record of a problem (creates it on first access)
    Show {
        /// Problem id
        id: String,
    },

    /// Set the remediation status
    Status {
        /// Problem id
        id: String,

        /// pending, analyzing, in_progress, blocked, completed, or discarded
        status: Status,
    },

    /// Set completion progress (clamped to 0..=100)
    Progress {
        /// Problem id
        id: String,

        /// Percent complete
        value: i64,
    },

    /// Assign the problem to someone (empty clears the assignee)
    Assign {
        /// Problem id
        id: String,

        /// Assignee name; omit to clear
        assignee: Option<String>,
    },

    /// Set the internal working priority
    Priority {
        /// Problem id
        id: String,

        /// critical, high, medium, or low
        priority: InternalPriority,
    },

    /// Set or clear tracking dates
    Dates {
        /// Problem id
        id: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_start")]
        start: Option<NaiveDate>,

        /// Clear the start date
        #[arg(long)]
        clear_start: bool,

        /// Target date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_target")]
        target: Option<NaiveDate>,

        /// Clear the target date
        #[arg(long)]
        clear_target: bool,

        /// Completion date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_completed")]
        completed: Option<NaiveDate>,

        /// Clear the completion date
        #[arg(long)]
        clear_completed: bool,
    },

    /// Record a cost override observed during remediation
    Cost {
        /// Problem id
        id: String,

        /// Minimum actual cost
        #[arg(long, requires = "max")]
        min: Option<f64>,

        /// Maximum actual cost
        #[arg(long, requires = "min")]
        max: Option<f64>,

        /// Free-form notes on the override
        #[arg(long)]
        notes: Option<String>,

        /// Remove the override and fall back to the catalog cost
        #[arg(long, conflicts_with_all = ["min", "max", "notes"])]
        clear: bool,
    },
}

pub fn run(cmd: TrackCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        TrackCommands::Show { id } => show(&id, global),
        TrackCommands::Status { id, status } => {
            mutate(global, &id, "status", |eng| eng.set_status(&id, status))
        }
        TrackCommands::Progress { id, value } => {
            mutate(global, &id, "progress", |eng| eng.set_progress(&id, value))
        }
        TrackCommands::Assign { id, assignee } => mutate(global, &id, "assignee", |eng| {
            eng.set_assignee(&id, assignee.clone())
        }),
        TrackCommands::Priority { id, priority } => {
            mutate(global, &id, "priority", |eng| eng.set_priority(&id, priority))
        }
        TrackCommands::Dates {
            id,
            start,
            clear_start,
            target,
            clear_target,
            completed,
            clear_completed,
        } => {
            let patch = DatePatch {
                start_date: date_field(start, clear_start),
                target_date: date_field(target, clear_target),
                completed_date: date_field(completed, clear_completed),
            };
            if patch.is_empty() {
                return Err(miette::miette!(
                    "Nothing to change. Pass --start/--target/--completed or a --clear-* flag"
                ));
            }
            mutate(global, &id, "dates", |eng| eng.set_dates(&id, patch.clone()))
        }
        TrackCommands::Cost {
            id,
            min,
            max,
            notes,
            clear,
        } => {
            let cost = match (clear, min, max) {
                (true, _, _) => None,
                (false, Some(min), Some(max)) => Some(CustomCost { min, max, notes }),
                _ => {
                    return Err(miette::miette!(
                        "Pass both --min and --max, or --clear to remove the override"
                    ))
                }
            };
            mutate(global, &id, "cost override", |eng| {
                eng.set_custom_cost(&id, cost.clone())
            })
        }
    }
}

fn date_field(set: Option<NaiveDate>, clear: bool) -> Option<Option<NaiveDate>> {
    if clear {
        Some(None)
    } else {
        set.map(Some)
    }
}

fn mutate<F>(global: &GlobalOpts, id: &str, what: &str, op: F) -> Result<()>
where
    F: FnOnce(&mut Engagement) -> Result<ProblemTracking, crate::engagement::EngagementError>,
{
    let mut engagement = helpers::open_engagement(global)?;
    let record = op(&mut engagement).map_err(|e| miette::miette!("{}", e))?;
    helpers::warn_on_save_error(&mut engagement, global.quiet);

    println!(
        "{} Updated {} of {}",
        style("✓").green().bold(),
        what,
        style(id).cyan()
    );
    if !global.quiet {
        print_record(id, &record, &engagement);
    }
    Ok(())
}

fn show(id: &str, global: &GlobalOpts) -> Result<()> {
    let mut engagement = helpers::open_engagement(global)?;
    let record = engagement
        .tracking_record(id)
        .map_err(|e| miette::miette!("{}", e))?;
    helpers::warn_on_save_error(&mut engagement, global.quiet);

    if global.format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&record).map_err(|e| miette::miette!("{}", e))?
        );
        return Ok(());
    }

    print_record(id, &record, &engagement);
    Ok(())
}

fn print_record(id: &str, record: &ProblemTracking, engagement: &Engagement) {
    let title = engagement
        .resolve_problem(id)
        .map(|p| p.title)
        .unwrap_or_default();
    println!("{} {}", style(id).cyan().bold(), style(&title).bold());
    println!("  Status:   {} ({}%)", record.status, record.progress);
    println!("  Priority: {}", record.internal_priority);
    if let Some(assignee) = &record.assignee {
        println!("  Assignee: {}", assignee);
    }
    if let Some(d) = record.start_date {
        println!("  Started:   {}", d);
    }
    if let Some(d) = record.target_date {
        println!("  Target:    {}", d);
    }
    if let Some(d) = record.completed_date {
        println!("  Completed: {}", d);
    }
    if let Some(cost) = &record.custom_cost {
        println!("  Cost override: {:.0} - {:.0}", cost.min, cost.max);
        if let Some(notes) = &cost.notes {
            println!("    {}", notes);
        }
    }
    if let Ok(eff) = engagement.effective_roi(id) {
        if eff.is_adjusted {
            println!("  Effective ROI: {:.1}% - {:.1}% (cost-adjusted)", eff.min, eff.max);
        } else {
            println!("  Effective ROI: {:.1}% - {:.1}%", eff.min, eff.max);
        }
    }
    if !record.follow_ups.is_empty() {
        println!("  Follow-ups: {}", record.follow_ups.len());
    }
    println!("  Last updated: {}", record.last_updated.format("%Y-%m-%d %H:%M"));
}
