use clap::Parser;
use miette::Result;
use remtrack::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => remtrack::cli::commands::init::run(args),
        Commands::Area(cmd) => remtrack::cli::commands::area::run(cmd, &global),
        Commands::Problem(cmd) => remtrack::cli::commands::problem::run(cmd, &global),
        Commands::Track(cmd) => remtrack::cli::commands::track::run(cmd, &global),
        Commands::Followup(cmd) => remtrack::cli::commands::followup::run(cmd, &global),
        Commands::Roi(cmd) => remtrack::cli::commands::roi::run(cmd, &global),
        Commands::Report(cmd) => remtrack::cli::commands::report::run(cmd, &global),
        Commands::Export(args) => remtrack::cli::commands::data::run_export(args, &global),
        Commands::Import(args) => remtrack::cli::commands::data::run_import(args, &global),
        Commands::Reset(args) => remtrack::cli::commands::data::run_reset(args, &global),
        Commands::Completions(args) => remtrack::cli::commands::completions::run(args),
    }
}
