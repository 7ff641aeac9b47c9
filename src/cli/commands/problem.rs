//! Problem commands: list, show, create, edit, delete

use clap::Subcommand;
use console::style;
use miette::Result;
use tabled::settings::Style;

use crate::catalog::{CostRange, Horizon, Impact, Problem, RoiRange};
use crate::cli::helpers;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;
use crate::engagement::Engagement;
use crate::overlay::{NewProblem, ProblemPatch};
use crate::tracking::Status;

#[derive(Subcommand)]
pub enum ProblemCommands {
    /// List problems across the resolved catalog
    List {
        /// Only problems in this area
        #[arg(long)]
        area: Option<String>,

        /// Filter by impact: high, medium, or low
        #[arg(long)]
        impact: Option<Impact>,

        /// Filter by urgency: short, medium, or long
        #[arg(long)]
        urgency: Option<Horizon>,

        /// Filter by tracking status (untracked problems count as pending)
        #[arg(long)]
        status: Option<Status>,

        /// Filter by tag
        #[arg(long)]
        tag: Option<String>,

        /// Print only the number of matches
        #[arg(long)]
        count: bool,
    },

    /// Show one problem in full
    Show {
        /// Problem id (e.g. PROC-1)
        id: String,
    },

    /// Create a custom problem in an area
    New {
        /// Owning area id
        #[arg(long)]
        area: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Impact: high, medium, or low
        #[arg(long)]
        impact: Option<Impact>,

        /// Urgency: short, medium, or long
        #[arg(long)]
        urgency: Option<Horizon>,

        /// Minimum implementation cost
        #[arg(long)]
        cost_min: Option<f64>,

        /// Maximum implementation cost
        #[arg(long)]
        cost_max: Option<f64>,

        /// Currency (default from config, usually EUR)
        #[arg(long)]
        currency: Option<String>,

        /// Minimum expected ROI in percent
        #[arg(long)]
        roi_min: Option<f64>,

        /// Maximum expected ROI in percent
        #[arg(long)]
        roi_max: Option<f64>,

        #[arg(long)]
        solution: Option<String>,

        /// Comma-separated causes
        #[arg(long)]
        causes: Option<String>,

        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,

        /// Comma-separated problem ids this one depends on
        #[arg(long)]
        depends_on: Option<String>,

        /// Explicit id instead of the generated <CODE>-<n>
        #[arg(long)]
        id: Option<String>,
    },

    /// Edit a problem (base problems get an overlay edit record)
    Edit {
        /// Problem id
        id: String,

        /// Move to another area (custom problems only take effect on resolve)
        #[arg(long)]
        area: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Impact: high, medium, or low
        #[arg(long)]
        impact: Option<Impact>,

        /// Urgency: short, medium, or long
        #[arg(long)]
        urgency: Option<Horizon>,

        #[arg(long)]
        cost_min: Option<f64>,

        #[arg(long)]
        cost_max: Option<f64>,

        #[arg(long)]
        currency: Option<String>,

        #[arg(long)]
        roi_min: Option<f64>,

        #[arg(long)]
        roi_max: Option<f64>,

        #[arg(long)]
        solution: Option<String>,

        /// Comma-separated causes (replaces the whole list)
        #[arg(long)]
        causes: Option<String>,

        /// Comma-separated tags (replaces the whole list)
        #[arg(long)]
        tags: Option<String>,

        /// Comma-separated dependencies (replaces the whole list)
        #[arg(long)]
        depends_on: Option<String>,
    },

    /// Delete a custom problem or revert a base problem's edits
    Delete {
        /// Problem id
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

pub fn run(cmd: ProblemCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ProblemCommands::List {
            area,
            impact,
            urgency,
            status,
            tag,
            count,
        } => list(area, impact, urgency, status, tag, count, global),
        ProblemCommands::Show { id } => show(&id, global),
        ProblemCommands::New {
            area,
            title,
            description,
            impact,
            urgency,
            cost_min,
            cost_max,
            currency,
            roi_min,
            roi_max,
            solution,
            causes,
            tags,
            depends_on,
            id,
        } => {
            let flags = NewFlags {
                area,
                title,
                description,
                impact,
                urgency,
                cost_min,
                cost_max,
                currency,
                roi_min,
                roi_max,
                solution,
                causes,
                tags,
                depends_on,
                id,
            };
            create(flags, global)
        }
        ProblemCommands::Edit {
            id,
            area,
            title,
            description,
            impact,
            urgency,
            cost_min,
            cost_max,
            currency,
            roi_min,
            roi_max,
            solution,
            causes,
            tags,
            depends_on,
        } => {
            let flags = EditFlags {
                area,
                title,
                description,
                impact,
                urgency,
                cost_min,
                cost_max,
                currency,
                roi_min,
                roi_max,
                solution,
                causes,
                tags,
                depends_on,
            };
            edit(&id, flags, global)
        }
        ProblemCommands::Delete { id, yes } => delete(&id, yes, global),
    }
}

struct NewFlags {
    area: Option<String>,
    title: Option<String>,
    description: Option<String>,
    impact: Option<Impact>,
    urgency: Option<Horizon>,
    cost_min: Option<f64>,
    cost_max: Option<f64>,
    currency: Option<String>,
    roi_min: Option<f64>,
    roi_max: Option<f64>,
    solution: Option<String>,
    causes: Option<String>,
    tags: Option<String>,
    depends_on: Option<String>,
    id: Option<String>,
}

struct EditFlags {
    area: Option<String>,
    title: Option<String>,
    description: Option<String>,
    impact: Option<Impact>,
    urgency: Option<Horizon>,
    cost_min: Option<f64>,
    cost_max: Option<f64>,
    currency: Option<String>,
    roi_min: Option<f64>,
    roi_max: Option<f64>,
    solution: Option<String>,
    causes: Option<String>,
    tags: Option<String>,
    depends_on: Option<String>,
}

#[allow(clippy::too_many_arguments)]
fn list(
    area: Option<String>,
    impact: Option<Impact>,
    urgency: Option<Horizon>,
    status: Option<Status>,
    tag: Option<String>,
    count: bool,
    global: &GlobalOpts,
) -> Result<()> {
    let engagement = helpers::open_engagement(global)?;

    if let Some(area_id) = &area {
        if engagement.resolve_area(area_id).is_none() {
            return Err(miette::miette!("No area found with id '{}'", area_id));
        }
    }

    let mut problems: Vec<Problem> = engagement
        .resolve()
        .into_iter()
        .filter(|a| area.as_deref().map(|id| a.id() == id).unwrap_or(true))
        .flat_map(|a| a.problems)
        .collect();

    if let Some(impact) = impact {
        problems.retain(|p| p.impact == impact);
    }
    if let Some(urgency) = urgency {
        problems.retain(|p| p.urgency == urgency);
    }
    if let Some(tag) = &tag {
        problems.retain(|p| p.tags.iter().any(|t| t == tag));
    }
    if let Some(status) = status {
        problems.retain(|p| {
            engagement
                .tracking(&p.id)
                .map(|t| t.status)
                .unwrap_or_default()
                == status
        });
    }

    if count {
        println!("{}", problems.len());
        return Ok(());
    }

    if global.format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&problems).map_err(|e| miette::miette!("{}", e))?
        );
        return Ok(());
    }

    let mut builder = tabled::builder::Builder::default();
    builder.push_record(vec!["ID", "Title", "Impact", "Urgency", "Status", "Cost"]);
    for p in &problems {
        let status = engagement
            .tracking(&p.id)
            .map(|t| t.status)
            .unwrap_or_default();
        builder.push_record(vec![
            p.id.clone(),
            helpers::truncate_str(&p.title, 40),
            p.impact.to_string(),
            p.urgency.to_string(),
            status.to_string(),
            format!(
                "{} - {}",
                helpers::fmt_money(p.cost.min, &p.cost.currency),
                helpers::fmt_money(p.cost.max, &p.cost.currency)
            ),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::markdown());
    println!("{}", table);

    if !global.quiet {
        println!();
        println!("{} problems", problems.len());
    }
    Ok(())
}

fn show(id: &str, global: &GlobalOpts) -> Result<()> {
    let engagement = helpers::open_engagement(global)?;
    let problem = engagement
        .resolve_problem(id)
        .ok_or_else(|| miette::miette!("No problem found with id '{}'", id))?;

    if global.format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&problem).map_err(|e| miette::miette!("{}", e))?
        );
        return Ok(());
    }

    print_problem(&engagement, &problem);
    Ok(())
}

fn print_problem(engagement: &Engagement, p: &Problem) {
    println!("{} {}", style(&p.id).cyan().bold(), style(&p.title).bold());
    println!("  Area:    {}", p.area_id);
    println!("  Impact:  {}", p.impact);
    println!("  Urgency: {}", p.urgency);
    if !p.description.is_empty() {
        println!();
        println!("  {}", p.description);
    }
    if !p.causes.is_empty() {
        println!();
        println!("  Causes:");
        for cause in &p.causes {
            println!("    - {}", cause);
        }
    }
    if !p.evidence.is_empty() {
        println!();
        println!("  Evidence:");
        for item in &p.evidence {
            println!("    - {}", item);
        }
    }
    if !p.proposed_solution.is_empty() {
        println!();
        println!("  Proposed solution:");
        println!("    {}", p.proposed_solution);
    }
    if !p.implementation_steps.is_empty() {
        println!();
        println!("  Implementation steps:");
        for (i, step) in p.implementation_steps.iter().enumerate() {
            println!("    {}. {}", i + 1, step);
        }
    }
    println!();
    println!(
        "  Cost: {} - {}",
        helpers::fmt_money(p.cost.min, &p.cost.currency),
        helpers::fmt_money(p.cost.max, &p.cost.currency)
    );
    println!("  ROI:  {:.0}% - {:.0}%", p.roi.min, p.roi.max);
    if !p.roi.justification.is_empty() {
        println!("        {}", p.roi.justification);
    }
    if !p.dependencies.is_empty() {
        println!("  Depends on: {}", p.dependencies.join(", "));
    }
    if !p.tags.is_empty() {
        println!("  Tags: {}", p.tags.join(", "));
    }
    if let Some(t) = engagement.tracking(&p.id) {
        println!();
        println!("  Status: {} ({}%)", t.status, t.progress);
        if let Some(assignee) = &t.assignee {
            println!("  Assignee: {}", assignee);
        }
    }
}

fn create(flags: NewFlags, global: &GlobalOpts) -> Result<()> {
    let mut engagement = helpers::open_engagement(global)?;
    let config = Config::load();
    let currency = flags.currency.unwrap_or_else(|| config.currency());

    let interactive = flags.area.is_none() && flags.title.is_none();
    let (area_id, title, description) = if interactive {
        let areas = engagement.resolve();
        let labels: Vec<String> = areas
            .iter()
            .map(|a| format!("{} ({})", a.core.name, a.id()))
            .collect();
        let selected = dialoguer::Select::new()
            .with_prompt("Area")
            .items(&labels)
            .default(0)
            .interact()
            .map_err(|e| miette::miette!("{}", e))?;
        let area_id = areas[selected].id().to_string();
        let title: String = dialoguer::Input::new()
            .with_prompt("Title")
            .interact_text()
            .map_err(|e| miette::miette!("{}", e))?;
        let description: String = dialoguer::Input::new()
            .with_prompt("Description")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| miette::miette!("{}", e))?;
        (area_id, title, description)
    } else {
        let area_id = flags
            .area
            .ok_or_else(|| miette::miette!("--area is required with --title"))?;
        let title = flags
            .title
            .ok_or_else(|| miette::miette!("--title is required with --area"))?;
        (area_id, title, flags.description.unwrap_or_default())
    };

    let new = NewProblem {
        id: flags.id,
        area_id,
        title,
        description,
        impact: flags.impact.unwrap_or_default(),
        urgency: flags.urgency.unwrap_or_default(),
        causes: helpers::parse_list(&flags.causes).unwrap_or_default(),
        evidence: Vec::new(),
        proposed_solution: flags.solution.unwrap_or_default(),
        implementation_steps: Vec::new(),
        cost: CostRange {
            min: flags.cost_min.unwrap_or(0.0),
            max: flags.cost_max.or(flags.cost_min).unwrap_or(0.0),
            currency,
        },
        roi: RoiRange {
            min: flags.roi_min.unwrap_or(0.0),
            max: flags.roi_max.or(flags.roi_min).unwrap_or(0.0),
            justification: String::new(),
        },
        dependencies: helpers::parse_list(&flags.depends_on).unwrap_or_default(),
        tags: helpers::parse_list(&flags.tags).unwrap_or_default(),
    };

    let created_id = engagement
        .create_problem(new, &config.author())
        .map_err(|e| miette::miette!("{}", e))?;
    helpers::warn_on_save_error(&mut engagement, global.quiet);

    println!(
        "{} Created problem {}",
        style("✓").green().bold(),
        style(&created_id).cyan()
    );
    Ok(())
}

fn edit(id: &str, flags: EditFlags, global: &GlobalOpts) -> Result<()> {
    let mut engagement = helpers::open_engagement(global)?;
    let config = Config::load();

    let current = engagement
        .resolve_problem(id)
        .ok_or_else(|| miette::miette!("No problem found with id '{}'", id))?;

    let cost = if flags.cost_min.is_some() || flags.cost_max.is_some() || flags.currency.is_some() {
        Some(CostRange {
            min: flags.cost_min.unwrap_or(current.cost.min),
            max: flags.cost_max.unwrap_or(current.cost.max),
            currency: flags.currency.unwrap_or(current.cost.currency),
        })
    } else {
        None
    };
    let roi = if flags.roi_min.is_some() || flags.roi_max.is_some() {
        Some(RoiRange {
            min: flags.roi_min.unwrap_or(current.roi.min),
            max: flags.roi_max.unwrap_or(current.roi.max),
            justification: current.roi.justification,
        })
    } else {
        None
    };

    let patch = ProblemPatch {
        area_id: flags.area,
        title: flags.title,
        description: flags.description,
        impact: flags.impact,
        urgency: flags.urgency,
        causes: helpers::parse_list(&flags.causes),
        evidence: None,
        proposed_solution: flags.solution,
        implementation_steps: None,
        cost,
        roi,
        dependencies: helpers::parse_list(&flags.depends_on),
        tags: helpers::parse_list(&flags.tags),
    };
    if patch.is_empty() {
        return Err(miette::miette!(
            "Nothing to change. Pass at least one field flag, e.g. --title or --cost-min"
        ));
    }

    engagement
        .update_problem(id, patch, &config.author())
        .map_err(|e| miette::miette!("{}", e))?;
    helpers::warn_on_save_error(&mut engagement, global.quiet);

    println!(
        "{} Updated problem {}",
        style("✓").green().bold(),
        style(id).cyan()
    );
    Ok(())
}

fn delete(id: &str, yes: bool, global: &GlobalOpts) -> Result<()> {
    let mut engagement = helpers::open_engagement(global)?;

    let problem = engagement
        .resolve_problem(id)
        .ok_or_else(|| miette::miette!("No problem found with id '{}'", id))?;

    let prompt = format!("Delete problem '{}' ({})?", id, problem.title);
    if !helpers::confirm(&prompt, yes)? {
        println!("Aborted.");
        return Ok(());
    }

    if engagement.delete_problem(id) {
        helpers::warn_on_save_error(&mut engagement, global.quiet);
        println!("{} Deleted {}", style("✓").green().bold(), style(id).cyan());
    } else if !global.quiet {
        println!("Nothing to delete for '{}'", id);
    }
    Ok(())
}
