//! `remtrack init` command - create a new project

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::core::Project;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    pub path: Option<PathBuf>,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = args.path.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&path).map_err(|e| miette::miette!("{}", e))?;

    let project = Project::init(&path).map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{} Initialized remtrack project at {}",
        style("✓").green().bold(),
        project.root().display()
    );
    println!("  Edit {} to set your author name.", project.remtrack_dir().join("config.yaml").display());
    Ok(())
}
