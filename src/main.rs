use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use product_reconcile::io::excel_read::XlsxSheetReader;
use product_reconcile::run::reconcile;
use product_reconcile::{LookupPolicy, ReconcileConfig, ReconcileError, Result, TracingObserver};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose)?;
    match cli.command {
        Command::Run(args) => execute_run(args),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ReconcileError::Logging(error.to_string()))
}

fn execute_run(args: RunArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let summary = reconcile(&config, &XlsxSheetReader, &TracingObserver)?;

    info!(
        identifiers = summary.identifiers,
        matched = summary.matched,
        unmatched = summary.unmatched.len(),
        report = %summary.report_path.display(),
        "reconciliation finished"
    );
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Reconcile master product identifiers against source workbooks."
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the report and the patched master copy.
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// JSON file with run settings; flags below take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Master workbook providing the identifiers.
    #[arg(long)]
    master: Option<PathBuf>,

    /// Directory holding the source workbooks.
    #[arg(long)]
    sources: Option<PathBuf>,

    /// Directory receiving the report and the patched copy.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Sheet read from every workbook.
    #[arg(long)]
    sheet: Option<String>,

    /// How identifiers without any source record are handled.
    #[arg(long, value_enum)]
    lookup_policy: Option<LookupPolicyKind>,

    /// Only write the report; leave the master untouched.
    #[arg(long)]
    no_patch: bool,

    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LookupPolicyKind {
    SkipNotFound,
    FailFast,
}

impl From<LookupPolicyKind> for LookupPolicy {
    fn from(kind: LookupPolicyKind) -> Self {
        match kind {
            LookupPolicyKind::SkipNotFound => LookupPolicy::SkipNotFound,
            LookupPolicyKind::FailFast => LookupPolicy::FailFast,
        }
    }
}

impl RunArgs {
    fn resolve_config(&self) -> Result<ReconcileConfig> {
        let mut config = match &self.config {
            Some(path) => ReconcileConfig::from_json_file(path)?,
            None => ReconcileConfig::default(),
        };

        if let Some(master) = &self.master {
            config.master_path = master.clone();
        }
        if let Some(sources) = &self.sources {
            config.sources_dir = sources.clone();
        }
        if let Some(work_dir) = &self.work_dir {
            config.work_dir = work_dir.clone();
        }
        if let Some(sheet) = &self.sheet {
            config.sheet_name = sheet.clone();
        }
        if let Some(policy) = self.lookup_policy {
            config.lookup_policy = policy.into();
        }
        if self.no_patch {
            config.skip_patch = true;
        }
        Ok(config)
    }
}
