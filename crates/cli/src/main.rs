use anyhow::{bail, Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use dirview_indexer::{IndexStats, IndexUpdate};
use dirview_listing::{DirectoryService, Listing, ServiceConfig};
use dirview_policy::{Caller, PolicyDefaults};
use dirview_protocol::{check_filename, format_size};
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser)]
#[command(name = "dirview")]
#[command(about = "Index, search and list a directory tree with per-directory access policies", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Allow uploads where no override file says otherwise
    #[arg(long, global = true)]
    upload: bool,

    /// Allow deletes where no override file says otherwise
    #[arg(long, global = true)]
    delete: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the tree once and report what was indexed
    Index(IndexArgs),

    /// List a directory, or search beneath it
    Ls(LsArgs),

    /// Show the effective policy of a directory
    Policy(PolicyArgs),

    /// Keep the index fresh in the background and log every rebuild
    Watch(WatchArgs),

    /// Validate an upload file name
    #[command(name = "check-name")]
    CheckName(CheckNameArgs),
}

#[derive(Args)]
struct IndexArgs {
    /// Served root directory
    root: PathBuf,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct LsArgs {
    /// Served root directory
    root: PathBuf,

    /// Directory to list, relative to the root
    #[arg(default_value = "")]
    dir: String,

    /// Search query: whitespace separated tokens, `-token` excludes
    #[arg(short, long)]
    search: Option<String>,

    #[command(flatten)]
    caller: CallerArgs,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PolicyArgs {
    /// Served root directory
    root: PathBuf,

    /// Directory (or file) to resolve, relative to the root
    #[arg(default_value = "")]
    dir: String,

    #[command(flatten)]
    caller: CallerArgs,
}

#[derive(Args)]
struct WatchArgs {
    /// Served root directory
    root: PathBuf,
}

#[derive(Args)]
struct CheckNameArgs {
    name: String,
}

#[derive(Args)]
struct CallerArgs {
    /// Resolve as the caller with this email
    #[arg(long, conflicts_with = "token")]
    email: Option<String>,

    /// Resolve as the caller presenting this upload token
    #[arg(long)]
    token: Option<String>,
}

impl CallerArgs {
    fn caller(&self) -> Option<Caller> {
        match (&self.email, &self.token) {
            (Some(email), _) => Some(Caller::Email(email.clone())),
            (None, Some(token)) => Some(Caller::Token(token.clone())),
            (None, None) => None,
        }
    }
}

#[derive(Serialize)]
struct IndexOutput {
    root: PathBuf,
    generation: u64,
    built_at_unix_ms: u64,
    stats: IndexStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let json_output = match &cli.command {
        Commands::Index(args) => args.json,
        Commands::Ls(args) => args.json,
        Commands::Policy(_) => true,
        _ => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let defaults = PolicyDefaults {
        upload: cli.upload,
        delete: cli.delete,
    };

    match cli.command {
        Commands::Index(args) => run_index(args, defaults)?,
        Commands::Ls(args) => run_ls(args, defaults)?,
        Commands::Policy(args) => run_policy(args, defaults)?,
        Commands::Watch(args) => run_watch(args, defaults).await?,
        Commands::CheckName(args) => run_check_name(&args)?,
    }

    Ok(())
}

fn open_service(root: PathBuf, defaults: PolicyDefaults) -> Result<DirectoryService> {
    let config = ServiceConfig::new(&root)
        .with_defaults(defaults)
        .with_env_overrides();
    DirectoryService::new(config)
        .with_context(|| format!("Cannot serve {}", root.display()))
}

fn run_index(args: IndexArgs, defaults: PolicyDefaults) -> Result<()> {
    let service = open_service(args.root, defaults)?;
    let (snapshot, stats) = service.indexer().rebuild();

    if args.json {
        let output = IndexOutput {
            root: service.root().to_path_buf(),
            generation: snapshot.generation(),
            built_at_unix_ms: snapshot.built_at_unix_ms(),
            stats,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Indexed {}", service.root().display());
    println!("  generation: {}", snapshot.generation());
    println!("  files:      {}", stats.files);
    println!("  size:       {}", format_size(stats.total_bytes));
    println!("  skipped:    {}", stats.skipped_dirs);
    println!("  time:       {} ms", stats.time_ms);
    for err in &stats.errors {
        println!("  ! {err}");
    }
    Ok(())
}

fn run_ls(args: LsArgs, defaults: PolicyDefaults) -> Result<()> {
    let service = open_service(args.root, defaults)?;
    service.indexer().rebuild();

    let caller = args.caller.caller();
    let listing = service
        .list(&args.dir, args.search.as_deref(), caller.as_ref())
        .with_context(|| format!("Cannot list '{}'", args.dir))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        print_listing(&listing);
    }
    Ok(())
}

fn print_listing(listing: &Listing) {
    let name_width = listing
        .entries
        .iter()
        .map(|e| e.name.len())
        .max()
        .unwrap_or(0);

    for entry in &listing.entries {
        let kind = if entry.is_dir() { "dir " } else { "file" };
        println!(
            "{kind}  {:<name_width$}  {:>10}",
            entry.name,
            format_size(entry.size)
        );
    }
    println!(
        "{} entries (upload: {}, delete: {})",
        listing.entries.len(),
        listing.policy.upload,
        listing.policy.delete
    );
}

fn run_policy(args: PolicyArgs, defaults: PolicyDefaults) -> Result<()> {
    let service = open_service(args.root, defaults)?;
    let caller = args.caller.caller();
    let policy = service
        .resolve(&args.dir, caller.as_ref())
        .with_context(|| format!("Cannot resolve policy for '{}'", args.dir))?;
    println!("{}", serde_json::to_string_pretty(&policy)?);
    Ok(())
}

async fn run_watch(args: WatchArgs, defaults: PolicyDefaults) -> Result<()> {
    let service = open_service(args.root, defaults)?;
    let schedule = service.config().schedule;
    log::info!(
        "Watching {} (first rebuild in {:?}, then every {:?})",
        service.root().display(),
        schedule.startup_delay,
        schedule.interval
    );

    let scheduler = service.start_scheduler();
    let mut updates = scheduler.subscribe_updates();

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => log_update(&update),
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Missed {skipped} index updates");
                }
                Err(RecvError::Closed) => bail!("Rebuild loop stopped unexpectedly"),
            },
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for shutdown signal")?;
                log::info!("Shutting down");
                break;
            }
        }
    }

    let health = scheduler.health_snapshot();
    log::info!(
        "Completed {} rebuilds, last generation {:?}",
        health.rebuilds,
        health.last_generation
    );
    Ok(())
}

fn log_update(update: &IndexUpdate) {
    log::info!(
        "Generation {} ready after {} ({} files, {}, {} ms)",
        update.generation,
        update.reason,
        update.stats.files,
        format_size(update.stats.total_bytes),
        update.duration_ms
    );
}

fn run_check_name(args: &CheckNameArgs) -> Result<()> {
    check_filename(&args.name).with_context(|| format!("Rejected name {:?}", args.name))?;
    println!("ok");
    Ok(())
}
