mod adapters;
mod cli;
mod config;
mod core;

use clap::Parser;

use cli::commands::record::RecordArgs;
use cli::{Cli, Commands};

fn main() {
    let args = Cli::parse();

    init_tracing(args.quiet, args.verbose);
    cli::context::init(args.dir.as_deref());

    let result = match &args.command {
        Commands::Init => cli::commands::init::execute(args.verbose),
        Commands::Record {
            actor,
            action,
            entity,
            entity_id,
            description,
            module,
            severity,
            previous,
            new,
            failed,
            error,
            duration,
            meta,
            request,
        } => cli::commands::record::execute(RecordArgs {
            actor,
            action,
            entity,
            entity_id: entity_id.as_deref(),
            description,
            module,
            severity: severity.as_deref(),
            previous: previous.as_deref(),
            new: new.as_deref(),
            failed: *failed,
            error: error.as_deref(),
            duration: *duration,
            meta,
            request,
        }),
        Commands::Auth {
            action,
            actor,
            failed,
            error,
            request,
        } => cli::commands::auth::execute(action, actor, *failed, error.as_deref(), request),
        Commands::Bulk {
            operation,
            actor,
            entity,
            ids,
            description,
            module,
            request,
        } => cli::commands::bulk::execute(
            operation,
            actor,
            entity,
            ids,
            description,
            module,
            request,
        ),
        Commands::Log {
            filters,
            limit,
            skip,
            json,
        } => {
            let limit = usize::try_from(*limit).unwrap_or(usize::MAX);
            cli::commands::log::execute(filters, limit, *skip, *json)
        }
        Commands::Summary { since, until, json } => {
            cli::commands::summary::execute(since.as_deref(), until.as_deref(), *json)
        }
        Commands::Export {
            filters,
            format,
            output,
        } => cli::commands::export::execute(filters, format, output.as_deref()),
        Commands::Import { file } => cli::commands::import::execute(file),
        Commands::Diff { before, after } => cli::commands::diff::execute(before, after),
        Commands::Status => cli::commands::status::execute(),
    };

    if let Err(e) = result {
        cli::output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}

/// Operational logs go to stderr. `CLAIR_LOG` overrides the level chosen
/// by `--quiet` / `--verbose`.
fn init_tracing(quiet: bool, verbose: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("CLAIR_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
