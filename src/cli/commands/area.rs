//! Area commands: list, show, create, edit, delete

use clap::Subcommand;
use console::style;
use miette::Result;
use tabled::settings::Style;

use crate::catalog::{Area, AreaPriority};
use crate::cli::helpers;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;
use crate::overlay::{AreaPatch, NewArea};

#[derive(Subcommand)]
pub enum AreaCommands {
    /// List all areas with their aggregates
    List,

    /// Show one area with its problems
    Show {
        /// Area id (e.g. process, custom-1)
        id: String,
    },

    /// Create a custom area
    New {
        /// Short code used as the id prefix of new problems (e.g. SEC)
        #[arg(long)]
        code: Option<String>,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Priority: high, medium, or low
        #[arg(long)]
        priority: Option<AreaPriority>,

        /// Explicit id instead of the generated custom-<n>
        #[arg(long)]
        id: Option<String>,
    },

    /// Edit an area (base areas get an overlay edit record)
    Edit {
        /// Area id
        id: String,

        #[arg(long)]
        code: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Priority: high, medium, or low
        #[arg(long)]
        priority: Option<AreaPriority>,
    },

    /// Delete a custom area (with its problems) or revert a base area's edits
    Delete {
        /// Area id
        id: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

pub fn run(cmd: AreaCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        AreaCommands::List => list(global),
        AreaCommands::Show { id } => show(&id, global),
        AreaCommands::New {
            code,
            name,
            description,
            priority,
            id,
        } => create(code, name, description, priority, id, global),
        AreaCommands::Edit {
            id,
            code,
            name,
            description,
            priority,
        } => edit(&id, code, name, description, priority, global),
        AreaCommands::Delete { id, yes } => delete(&id, yes, global),
    }
}

fn list(global: &GlobalOpts) -> Result<()> {
    let engagement = helpers::open_engagement(global)?;
    let areas = engagement.resolve();

    if global.format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&areas).map_err(|e| miette::miette!("{}", e))?
        );
        return Ok(());
    }

    let mut builder = tabled::builder::Builder::default();
    builder.push_record(vec![
        "ID",
        "Code",
        "Name",
        "Priority",
        "Problems",
        "Investment",
        "Savings",
    ]);

    for area in &areas {
        let currency = area
            .problems
            .first()
            .map(|p| p.cost.currency.clone())
            .unwrap_or_else(|| "EUR".to_string());
        builder.push_record(vec![
            area.id().to_string(),
            area.code().to_string(),
            helpers::truncate_str(&area.core.name, 30),
            area.core.priority.to_string(),
            area.summary.problem_count.to_string(),
            format!(
                "{} - {}",
                helpers::fmt_money(area.summary.investment_min, &currency),
                helpers::fmt_money(area.summary.investment_max, &currency)
            ),
            format!(
                "{} - {}",
                helpers::fmt_money(area.summary.savings_min, &currency),
                helpers::fmt_money(area.summary.savings_max, &currency)
            ),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::markdown());
    println!("{}", table);

    if !global.quiet {
        println!();
        println!("{} areas", areas.len());
    }
    Ok(())
}

fn show(id: &str, global: &GlobalOpts) -> Result<()> {
    let engagement = helpers::open_engagement(global)?;
    let area = engagement
        .resolve_area(id)
        .ok_or_else(|| miette::miette!("No area found with id '{}'", id))?;

    if global.format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&area).map_err(|e| miette::miette!("{}", e))?
        );
        return Ok(());
    }

    print_area(&area);
    Ok(())
}

fn print_area(area: &Area) {
    let origin = if area.is_custom { " (custom)" } else { "" };
    println!(
        "{} {}{}",
        style(area.id()).cyan().bold(),
        style(&area.core.name).bold(),
        origin
    );
    println!("  Code:     {}", area.code());
    println!("  Priority: {}", area.core.priority);
    if !area.core.description.is_empty() {
        println!("  {}", area.core.description);
    }

    let currency = area
        .problems
        .first()
        .map(|p| p.cost.currency.clone())
        .unwrap_or_else(|| "EUR".to_string());
    println!();
    println!(
        "  Investment: {} - {}",
        helpers::fmt_money(area.summary.investment_min, &currency),
        helpers::fmt_money(area.summary.investment_max, &currency)
    );
    println!(
        "  Savings:    {} - {}",
        helpers::fmt_money(area.summary.savings_min, &currency),
        helpers::fmt_money(area.summary.savings_max, &currency)
    );

    if area.problems.is_empty() {
        println!();
        println!("  No problems in this area.");
        return;
    }

    println!();
    let mut builder = tabled::builder::Builder::default();
    builder.push_record(vec!["ID", "Title", "Impact", "Urgency", "Cost"]);
    for p in &area.problems {
        builder.push_record(vec![
            p.id.clone(),
            helpers::truncate_str(&p.title, 40),
            p.impact.to_string(),
            p.urgency.to_string(),
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
}

fn create(
    code: Option<String>,
    name: Option<String>,
    description: Option<String>,
    priority: Option<AreaPriority>,
    id: Option<String>,
    global: &GlobalOpts,
) -> Result<()> {
    let mut engagement = helpers::open_engagement(global)?;
    let config = Config::load();

    let interactive = code.is_none() && name.is_none();
    let (code, name, description, priority) = if interactive {
        let code: String = dialoguer::Input::new()
            .with_prompt("Area code (short, e.g. SEC)")
            .interact_text()
            .map_err(|e| miette::miette!("{}", e))?;
        let name: String = dialoguer::Input::new()
            .with_prompt("Area name")
            .interact_text()
            .map_err(|e| miette::miette!("{}", e))?;
        let description: String = dialoguer::Input::new()
            .with_prompt("Description")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| miette::miette!("{}", e))?;
        let priorities = ["high", "medium", "low"];
        let selected = dialoguer::Select::new()
            .with_prompt("Priority")
            .items(&priorities)
            .default(1)
            .interact()
            .map_err(|e| miette::miette!("{}", e))?;
        let priority: AreaPriority = priorities[selected]
            .parse()
            .map_err(|e: String| miette::miette!("{}", e))?;
        (code, name, description, priority)
    } else {
        (
            code.unwrap_or_default(),
            name.unwrap_or_default(),
            description.unwrap_or_default(),
            priority.unwrap_or_default(),
        )
    };

    let new = NewArea {
        id,
        code,
        name,
        description,
        priority,
    };
    let created_id = engagement
        .create_area(new, &config.author())
        .map_err(|e| miette::miette!("{}", e))?;
    helpers::warn_on_save_error(&mut engagement, global.quiet);

    println!("{} Created area {}", style("✓").green().bold(), style(&created_id).cyan());
    Ok(())
}

fn edit(
    id: &str,
    code: Option<String>,
    name: Option<String>,
    description: Option<String>,
    priority: Option<AreaPriority>,
    global: &GlobalOpts,
) -> Result<()> {
    let mut engagement = helpers::open_engagement(global)?;
    let config = Config::load();

    let patch = AreaPatch {
        code,
        name,
        description,
        priority,
    };
    if patch.is_empty() {
        return Err(miette::miette!(
            "Nothing to change. Pass at least one of --code, --name, --description, --priority"
        ));
    }

    engagement
        .update_area(id, patch, &config.author())
        .map_err(|e| miette::miette!("{}", e))?;
    helpers::warn_on_save_error(&mut engagement, global.quiet);

    println!("{} Updated area {}", style("✓").green().bold(), style(id).cyan());
    Ok(())
}

fn delete(id: &str, yes: bool, global: &GlobalOpts) -> Result<()> {
    let mut engagement = helpers::open_engagement(global)?;

    let area = engagement
        .resolve_area(id)
        .ok_or_else(|| miette::miette!("No area found with id '{}'", id))?;

    let prompt = if area.is_custom {
        format!(
            "Delete custom area '{}' and its {} problem(s)?",
            id,
            area.problems.len()
        )
    } else {
        format!("Revert all edits to base area '{}'?", id)
    };
    if !helpers::confirm(&prompt, yes)? {
        println!("Aborted.");
        return Ok(());
    }

    if engagement.delete_area(id) {
        helpers::warn_on_save_error(&mut engagement, global.quiet);
        println!("{} Deleted {}", style("✓").green().bold(), style(id).cyan());
    } else if !global.quiet {
        println!("Nothing to delete for '{}'", id);
    }
    Ok(())
}
