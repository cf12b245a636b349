//! `autodeps fix` command, also the default when no subcommand is given.

use std::path::Path;

use anyhow::Result;

use crate::cli::{FixArgs, OutputFormat};
use crate::GlobalOptions;
use autodeps::core::BuildFile;
use autodeps::ops::apply::{Applier, ExternalApplier, TomlApplier};
use autodeps::ops::fix_deps::{eligible_targets, fix_and_apply, fix_deps, TargetOutcome};
use autodeps::ops::render;
use autodeps::util::fs::display_path;
use autodeps::util::{Config, Status};

pub fn execute(args: FixArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let ctx = &global_opts.ctx;

    let build_path = ctx.find_build_file()?;
    let build = BuildFile::load(&build_path)?;
    let config = ctx.load_config(&build_path);

    let tables = config.mapping_tables();
    let mut opts = config.fix_options();
    opts.targets = args.targets;
    if let Some(score) = args.score {
        opts.strategy = score;
    }

    tracing::debug!(
        "{} of {} libraries eligible, scoring with {}",
        eligible_targets(&build, &opts).len(),
        build.len(),
        opts.strategy
    );

    let report = if args.dry_run {
        fix_deps(&build, &tables, &opts)?
    } else {
        let applier = applier_for(&config, &build_path);
        fix_and_apply(&build, &tables, &opts, applier.as_ref())?
    };
    let commands = report.commands();

    match args.format {
        OutputFormat::Json => shell.print_json(&commands)?,
        OutputFormat::Text if args.dry_run => {
            if !commands.is_empty() {
                println!("{}", render(&commands));
            }
        }
        OutputFormat::Text => {}
    }

    if shell.is_verbose() {
        for target in &report.targets {
            if let TargetOutcome::Skipped { reason } = &target.outcome {
                shell.status(Status::Skipped, format!("{} ({:?})", target.target, reason));
            }
        }
    }

    let changed = report
        .targets
        .iter()
        .filter(|target| !target.outcome.commands().is_empty())
        .count();
    if !args.dry_run && !commands.is_empty() {
        shell.status(
            Status::Applied,
            format!(
                "{} commands for {} libraries to {}",
                commands.len(),
                changed,
                display_path(&build_path)
            ),
        );
    }
    shell.status(
        Status::Finished,
        format!(
            "{} libraries checked, {} need changes",
            report.targets.len(),
            changed
        ),
    );

    match report.error() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// The external program from `[apply]`, or the native editor.
fn applier_for(config: &Config, build_path: &Path) -> Box<dyn Applier> {
    let root = build_path.parent().unwrap_or(Path::new("."));
    match &config.apply.program {
        Some(program) => Box::new(
            ExternalApplier::new(program, config.apply.args.clone(), root)
                .with_accepted_statuses(config.apply.accepted_statuses()),
        ),
        None => Box::new(TomlApplier::new(build_path)),
    }
}
