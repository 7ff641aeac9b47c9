//! Reports over the resolved catalog and tracking state

use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;
use tabled::settings::Style;

use crate::cli::helpers;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::tracking::Status;

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Engagement summary: per-area investment, savings, and progress
    Summary,
}

#[derive(Serialize)]
struct SummaryRow {
    area_id: String,
    name: String,
    problem_count: usize,
    investment_min: f64,
    investment_max: f64,
    savings_min: f64,
    savings_max: f64,
    completed: usize,
    in_progress: usize,
}

#[derive(Serialize)]
struct Summary {
    areas: Vec<SummaryRow>,
    total_problems: usize,
    total_investment_min: f64,
    total_investment_max: f64,
    total_savings_min: f64,
    total_savings_max: f64,
    completed: usize,
}

pub fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::Summary => summary(global),
    }
}

fn summary(global: &GlobalOpts) -> Result<()> {
    let engagement = helpers::open_engagement(global)?;
    let areas = engagement.resolve();

    let mut report = Summary {
        areas: Vec::with_capacity(areas.len()),
        total_problems: 0,
        total_investment_min: 0.0,
        total_investment_max: 0.0,
        total_savings_min: 0.0,
        total_savings_max: 0.0,
        completed: 0,
    };

    for area in &areas {
        let mut completed = 0;
        let mut in_progress = 0;
        for p in &area.problems {
            match engagement.tracking(&p.id).map(|t| t.status) {
                Some(Status::Completed) => completed += 1,
                Some(Status::InProgress) => in_progress += 1,
                _ => {}
            }
        }

        report.total_problems += area.summary.problem_count;
        report.total_investment_min += area.summary.investment_min;
        report.total_investment_max += area.summary.investment_max;
        report.total_savings_min += area.summary.savings_min;
        report.total_savings_max += area.summary.savings_max;
        report.completed += completed;

        report.areas.push(SummaryRow {
            area_id: area.id().to_string(),
            name: area.core.name.clone(),
            problem_count: area.summary.problem_count,
            investment_min: area.summary.investment_min,
            investment_max: area.summary.investment_max,
            savings_min: area.summary.savings_min,
            savings_max: area.summary.savings_max,
            completed,
            in_progress,
        });
    }

    if global.format == OutputFormat::Json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).map_err(|e| miette::miette!("{}", e))?
        );
        return Ok(());
    }

    println!("{}", style("Engagement Summary").bold().underlined());
    println!();

    let mut builder = tabled::builder::Builder::default();
    builder.push_record(vec![
        "Area",
        "Problems",
        "Done",
        "Active",
        "Investment",
        "Savings",
    ]);
    for row in &report.areas {
        builder.push_record(vec![
            helpers::truncate_str(&row.name, 30),
            row.problem_count.to_string(),
            row.completed.to_string(),
            row.in_progress.to_string(),
            format!(
                "{:.0} - {:.0}",
                row.investment_min, row.investment_max
            ),
            format!("{:.0} - {:.0}", row.savings_min, row.savings_max),
        ]);
    }
    builder.push_record(vec![
        "Total".to_string(),
        report.total_problems.to_string(),
        report.completed.to_string(),
        String::new(),
        format!(
            "{:.0} - {:.0}",
            report.total_investment_min, report.total_investment_max
        ),
        format!(
            "{:.0} - {:.0}",
            report.total_savings_min, report.total_savings_max
        ),
    ]);

    let mut table = builder.build();
    table.with(Style::markdown());
    println!("{}", table);

    if !global.quiet && report.total_problems > 0 {
        let pct = report.completed as f64 / report.total_problems as f64 * 100.0;
        println!();
        println!(
            "{} of {} problems completed ({:.0}%)",
            report.completed, report.total_problems, pct
        );
    }
    Ok(())
}
