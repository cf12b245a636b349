//! autodeps CLI - infer build dependencies from include directives

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use autodeps::core::BuildFileError;
use autodeps::ops::ApplyError;
use autodeps::resolver::ResolveError;
use autodeps::util::diagnostic::{emit, render_report, Diagnostic};
use autodeps::util::{GlobalContext, Shell};
use cli::{Cli, Commands, OutputFormat};

/// Options shared by every command.
pub struct GlobalOptions {
    pub shell: Shell,
    pub ctx: GlobalContext,
}

fn main() {
    let cli = Cli::parse();
    let color = Shell::from_flags(false, cli.no_color, false).use_color();

    if let Err(e) = run(cli) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn report(e: &anyhow::Error, color: bool) {
    // Syntax errors point into the build file
    if let Some(BuildFileError::Parse(err)) = e.downcast_ref::<BuildFileError>() {
        eprint!("{}", render_report(&**err, color));
        return;
    }
    match diagnostic_for(e) {
        Some(diag) => emit(&diag, color),
        None => eprintln!("error: {:#}", e),
    }
}

/// Domain errors render as full diagnostics; anything else as a chain.
fn diagnostic_for(e: &anyhow::Error) -> Option<Diagnostic> {
    if let Some(err) = e.downcast_ref::<ResolveError>() {
        return Some(err.to_diagnostic());
    }
    if let Some(err) = e.downcast_ref::<BuildFileError>() {
        return Some(err.to_diagnostic());
    }
    e.downcast_ref::<ApplyError>().map(ApplyError::to_diagnostic)
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("autodeps=debug")
    } else {
        EnvFilter::new("autodeps=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let mut ctx = GlobalContext::new()?;
    ctx.set_build_file(cli.build_file);
    ctx.set_config_file(cli.config);

    let json = match &cli.command {
        Some(Commands::Fix(args)) => args.format == OutputFormat::Json,
        Some(Commands::Classify(args)) => args.format == OutputFormat::Json,
        Some(Commands::Completions(_)) => false,
        None => cli.fix.format == OutputFormat::Json,
    };
    let opts = GlobalOptions {
        shell: Shell::from_flags(cli.verbose, cli.no_color, json),
        ctx,
    };

    // Execute command
    match cli.command {
        Some(Commands::Fix(args)) => commands::fix::execute(args, &opts),
        Some(Commands::Classify(args)) => commands::classify::execute(args, &opts),
        Some(Commands::Completions(args)) => commands::completions::execute(args),
        None => commands::fix::execute(cli.fix, &opts),
    }
}
