//! ROI commands: effective figures and the saved scenario log

use clap::Subcommand;
use console::style;
use miette::Result;
use tabled::settings::Style;

use crate::cli::helpers;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::tracking::RoiScenario;

#[derive(Subcommand)]
pub enum RoiCommands {
    /// Show a problem's catalog ROI with any cost override applied
    Effective {
        /// Problem id
        id: String,
    },

    /// Save a what-if scenario against a problem
    Save {
        /// Problem id
        id: String,

        /// One-off investment amount
        #[arg(long)]
        investment: f64,

        /// Expected annual savings
        #[arg(long)]
        savings: f64,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List a problem's saved scenarios, newest first
    List {
        /// Problem id
        id: String,
    },

    /// Delete a saved scenario
    Delete {
        /// Problem id
        id: String,

        /// Scenario id as shown by `roi list`
        scenario_id: String,
    },
}

pub fn run(cmd: RoiCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        RoiCommands::Effective { id } => effective(&id, global),
        RoiCommands::Save {
            id,
            investment,
            savings,
            notes,
        } => save(&id, investment, savings, notes, global),
        RoiCommands::List { id } => list(&id, global),
        RoiCommands::Delete { id, scenario_id } => delete(&id, &scenario_id, global),
    }
}

fn effective(id: &str, global: &GlobalOpts) -> Result<()> {
    let engagement = helpers::open_engagement(global)?;
    let problem = engagement
        .resolve_problem(id)
        .ok_or_else(|| miette::miette!("No problem found with id '{}'", id))?;
    let eff = engagement
        .effective_roi(id)
        .map_err(|e| miette::miette!("{}", e))?;

    if global.format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&eff).map_err(|e| miette::miette!("{}", e))?
        );
        return Ok(());
    }

    println!("{} {}", style(id).cyan().bold(), style(&problem.title).bold());
    println!(
        "  Catalog cost: {} - {}",
        helpers::fmt_money(problem.cost.min, &problem.cost.currency),
        helpers::fmt_money(problem.cost.max, &problem.cost.currency)
    );
    println!("  Catalog ROI:  {:.1}% - {:.1}%", problem.roi.min, problem.roi.max);
    if eff.is_adjusted {
        let tracked = engagement
            .tracking(id)
            .and_then(|t| t.custom_cost.clone());
        if let Some(cost) = tracked {
            println!("  Cost override: {:.0} - {:.0}", cost.min, cost.max);
        }
        println!(
            "  Effective ROI: {:.1}% - {:.1}% {}",
            eff.min,
            eff.max,
            style("(cost-adjusted)").yellow()
        );
    } else {
        println!("  Effective ROI: {:.1}% - {:.1}%", eff.min, eff.max);
    }
    Ok(())
}

fn save(
    id: &str,
    investment: f64,
    savings: f64,
    notes: Option<String>,
    global: &GlobalOpts,
) -> Result<()> {
    if investment < 0.0 || savings < 0.0 {
        return Err(miette::miette!(
            "Investment and savings must be non-negative"
        ));
    }

    let mut engagement = helpers::open_engagement(global)?;
    let scenario = engagement
        .save_scenario(id, RoiScenario::new(investment, savings, notes))
        .map_err(|e| miette::miette!("{}", e))?;
    helpers::warn_on_save_error(&mut engagement, global.quiet);

    println!(
        "{} Saved scenario {} for {}",
        style("✓").green().bold(),
        style(&scenario.id).dim(),
        style(id).cyan()
    );
    println!("  ROI: {:.1}%", scenario.roi_pct);
    match scenario.payback_months {
        Some(months) => println!("  Payback: {:.1} months", months),
        None => println!("  Payback: never (no savings)"),
    }
    Ok(())
}

fn list(id: &str, global: &GlobalOpts) -> Result<()> {
    let engagement = helpers::open_engagement(global)?;
    engagement
        .resolve_problem(id)
        .ok_or_else(|| miette::miette!("No problem found with id '{}'", id))?;

    let scenarios = engagement.scenarios(id);

    if global.format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&scenarios).map_err(|e| miette::miette!("{}", e))?
        );
        return Ok(());
    }

    if scenarios.is_empty() {
        println!("No scenarios for {}", id);
        return Ok(());
    }

    let mut builder = tabled::builder::Builder::default();
    builder.push_record(vec!["ID", "Investment", "Savings/yr", "ROI", "Payback", "Notes"]);
    for s in scenarios {
        builder.push_record(vec![
            s.id.clone(),
            format!("{:.0}", s.investment),
            format!("{:.0}", s.annual_savings),
            format!("{:.1}%", s.roi_pct),
            s.payback_months
                .map(|m| format!("{:.1} mo", m))
                .unwrap_or_else(|| "-".to_string()),
            helpers::truncate_str(s.notes.as_deref().unwrap_or(""), 30),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::markdown());
    println!("{}", table);
    Ok(())
}

fn delete(id: &str, scenario_id: &str, global: &GlobalOpts) -> Result<()> {
    let mut engagement = helpers::open_engagement(global)?;

    if engagement.delete_scenario(id, scenario_id) {
        helpers::warn_on_save_error(&mut engagement, global.quiet);
        println!(
            "{} Deleted scenario {}",
            style("✓").green().bold(),
            style(scenario_id).dim()
        );
    } else if !global.quiet {
        println!("No scenario '{}' on '{}'", scenario_id, id);
    }
    Ok(())
}
