//! Export, import, and reset of all custom data

use clap::Args;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers;
use crate::cli::GlobalOpts;

#[derive(Args)]
pub struct ExportArgs {
    /// Write the bundle to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Bundle file to import; replaces all custom data and tracking state
    pub input: PathBuf,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args)]
pub struct ResetArgs {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let engagement = helpers::open_engagement(global)?;
    let json = engagement
        .export_json()
        .map_err(|e| miette::miette!("{}", e))?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &json).into_diagnostic()?;
            println!(
                "{} Exported to {}",
                style("✓").green().bold(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let raw = std::fs::read_to_string(&args.input)
        .map_err(|e| miette::miette!("Cannot read {}: {}", args.input.display(), e))?;

    let prompt = "Importing replaces all custom areas, problems, edits, and tracking state. Continue?";
    if !helpers::confirm(prompt, args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    let mut engagement = helpers::open_engagement(global)?;
    engagement
        .import_json(&raw)
        .map_err(|e| miette::miette!("{}", e))?;
    helpers::warn_on_save_error(&mut engagement, global.quiet);

    let areas = engagement.resolve();
    let problems: usize = areas.iter().map(|a| a.problems.len()).sum();
    println!(
        "{} Imported bundle ({} areas, {} problems resolved)",
        style("✓").green().bold(),
        areas.len(),
        problems
    );
    Ok(())
}

pub fn run_reset(args: ResetArgs, global: &GlobalOpts) -> Result<()> {
    let prompt = "Discard ALL custom areas, problems, edits, tracking state, and scenarios?";
    if !helpers::confirm(prompt, args.yes)? {
        println!("Aborted.");
        return Ok(());
    }

    let mut engagement = helpers::open_engagement(global)?;
    engagement.reset().map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{} Reset complete. The base catalog is untouched.",
        style("✓").green().bold()
    );
    Ok(())
}
