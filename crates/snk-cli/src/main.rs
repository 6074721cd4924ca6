use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};

mod commands;

#[derive(Parser)]
#[command(name = "snapkeep")]
#[command(about = "Snapshot retention and cleanup for Elasticsearch repositories", long_about = None)]
struct Cli {
    /// Layered config paths in merge order (base -> env -> site). Env vars
    /// such as SNAPSHOT_HOSTS and MAX_SNAPSHOTS are applied on top.
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    /// Log line format on stderr.
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the effective config hash + print canonical JSON
    ConfigHash,

    /// List every snapshot in the repository
    List,

    /// Show what a rotation pass would keep, delete and skip
    Plan {
        #[command(flatten)]
        knobs: commands::RetentionArgs,
    },

    /// Apply the retention policy: delete snapshots beyond the count or age limit
    Rotate {
        #[command(flatten)]
        knobs: commands::RetentionArgs,

        /// Report planned deletions without deleting.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Print the result as JSON instead of key=value lines.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Delete an explicit selection of snapshots. Exactly one selector is required.
    #[command(group(
        ArgGroup::new("selector")
            .required(true)
            .args(["names", "all", "pattern", "older_than"]),
    ))]
    Cleanup {
        /// Snapshot names to delete.
        names: Vec<String>,

        /// Every snapshot in the repository.
        #[arg(long, default_value_t = false)]
        all: bool,

        /// Glob pattern; `*` matches any run of characters.
        #[arg(long)]
        pattern: Option<String>,

        /// Snapshots dated strictly before this day (YYYY-MM-DD).
        #[arg(long)]
        older_than: Option<String>,

        /// Match --pattern with the prefix/regex semantics of older releases.
        #[arg(long, default_value_t = false, requires = "pattern")]
        legacy_pattern: bool,

        /// Resolve and print targets without deleting.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Acknowledge that snapshots will be deleted.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

fn init_tracing(format: LogFormat) {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Plain => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let paths = cli.config_paths;

    match cli.cmd {
        Commands::ConfigHash => {
            let loaded = commands::load_config(&paths)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::List => commands::list::run_list(&paths).await?,

        Commands::Plan { knobs } => commands::list::run_plan(&paths, knobs).await?,

        Commands::Rotate {
            knobs,
            dry_run,
            json,
        } => commands::rotate::run_rotate(&paths, knobs, dry_run, json).await?,

        Commands::Cleanup {
            names,
            all,
            pattern,
            older_than,
            legacy_pattern,
            dry_run,
            yes,
        } => {
            let args = commands::cleanup::CleanupArgs {
                names,
                all,
                pattern,
                older_than,
                legacy_pattern,
                dry_run,
                yes,
            };
            commands::cleanup::run_cleanup(&paths, args).await?
        }
    }

    Ok(())
}
