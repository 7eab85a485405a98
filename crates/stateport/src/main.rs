use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use stateport_core::config::{ResolvedSettings, SettingOverrides, resolve_settings};
use stateport_core::migrate::{MigrateOptions, MigrateReport, migrate_directory};
use stateport_core::store::FsStore;

#[derive(Debug, Parser)]
#[command(
    name = "stateport",
    version,
    about = "Migrate component-local useState declarations to URL-synchronized state"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Print resolved settings and their sources")]
    diagnostics: bool,
    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,
    #[arg(short, long, global = true, help = "Only log errors")]
    quiet: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Rewrite matching declarations in place")]
    Migrate(MigrateArgs),
    #[command(about = "Exit non-zero if any file would be migrated (nothing is written)")]
    Check(TargetArgs),
}

#[derive(Debug, Args)]
struct MigrateArgs {
    #[command(flatten)]
    target: TargetArgs,
    #[arg(long, help = "Report changes without writing files")]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct TargetArgs {
    #[arg(value_name = "DIR")]
    directory: PathBuf,
    #[arg(short, long, help = "Descend into subdirectories")]
    recursive: bool,
    #[arg(long, help = "Print a unified diff for every touched file")]
    diff: bool,
    #[arg(long, help = "Print the report as JSON")]
    json: bool,
    #[arg(long = "ext", value_name = "EXT", help = "Component file extension (repeatable)")]
    extensions: Vec<String>,
    #[arg(long, value_name = "NAME")]
    target_hook: Option<String>,
    #[arg(long, value_name = "MODULE")]
    target_module: Option<String>,
}

impl TargetArgs {
    fn overrides(&self) -> SettingOverrides {
        SettingOverrides {
            target_hook: self.target_hook.clone(),
            target_module: self.target_module.clone(),
            extensions: (!self.extensions.is_empty()).then(|| self.extensions.clone()),
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::Migrate(args)) => {
            run_migrate(cli.config.as_deref(), cli.diagnostics, &args.target, args.dry_run)?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Check(args)) => {
            let report = run_migrate(cli.config.as_deref(), cli.diagnostics, &args, true)?;
            if report.touched_count() > 0 {
                Ok(ExitCode::from(1))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_migrate(
    config: Option<&Path>,
    diagnostics: bool,
    args: &TargetArgs,
    dry_run: bool,
) -> Result<MigrateReport> {
    let resolved = resolve_runtime_settings(config, &args.directory, &args.overrides())?;
    if diagnostics {
        eprintln!("[diagnostics]\n{}", resolved.diagnostics());
    }

    let report = migrate_directory(
        &FsStore,
        &args.directory,
        &resolved.settings,
        &MigrateOptions {
            dry_run,
            recursive: args.recursive,
            include_diff: args.diff,
        },
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(report)
}

fn print_report(report: &MigrateReport) {
    println!("migrate");
    println!("directory: {}", report.directory);
    println!("mode: {}", if report.dry_run { "dry-run" } else { "write" });
    println!("scanned: {}", report.scanned_files);
    for file in &report.touched {
        println!("touched: {}", file.name);
    }
    println!("touched.count: {}", report.touched_count());
    for file in &report.touched {
        if let Some(diff) = &file.diff {
            println!();
            print!("{diff}");
        }
    }
}

fn resolve_runtime_settings(
    config: Option<&Path>,
    directory: &Path,
    overrides: &SettingOverrides,
) -> Result<ResolvedSettings> {
    dotenvy::dotenv().ok();
    let project_env = directory.join(".env");
    if project_env.exists() {
        let _ = dotenvy::from_path_override(&project_env);
    }
    resolve_settings(config, directory, overrides)
}

fn setup_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
