use clap::{Args, Parser, Subcommand};
use cli::{focus_objects, load_runs, segment_and_focus, segment_runs, write_report};
use color_eyre::eyre::Result;
use focus::{DEFAULT_KERNEL_SIZE, FocusSettings};
use stack_common::SettingsFile;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Segment focal stacks into per-object crops and focus them with Fiji",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FocusArgs {
    /// Odd kernel size for Stack Focuser's height map
    #[arg(long, default_value_t = DEFAULT_KERNEL_SIZE)]
    kernel_size: u32,
    /// Java heap handed to Fiji
    #[arg(long, default_value = "1000m")]
    memory: String,
    /// Fiji launcher to use instead of the per-platform default
    #[arg(long)]
    executable: Option<PathBuf>,
}

impl From<FocusArgs> for FocusSettings {
    fn from(args: FocusArgs) -> Self {
        Self {
            kernel_size: args.kernel_size,
            memory: args.memory,
            executable: args.executable,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Detect objects and extract every plane for each configured run
    Segment {
        /// Path to the TOML or JSON settings file
        #[arg(short, long)]
        settings: PathBuf,
        /// Write a JSON report of every run
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Focus-stack every object directory under a segmentation output directory
    Focus {
        /// Directory containing the `*_obj*` object directories
        #[arg(short, long)]
        objects: PathBuf,
        #[command(flatten)]
        focus: FocusArgs,
        /// Write a JSON report of the batch
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Segment, then focus the output of every `final` run
    Run {
        /// Path to the TOML or JSON settings file
        #[arg(short, long)]
        settings: PathBuf,
        #[command(flatten)]
        focus: FocusArgs,
        /// Write a JSON report of every run
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the JSON schema of the settings file
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Segment { settings, report } => {
            let runs = load_runs(&settings)?;
            let reports = segment_runs(&runs)?;
            if let Some(path) = report {
                write_report(&path, &reports)?;
            }
            info!("Segmentation finished for {} run(s)", reports.len());
        }
        Commands::Focus { objects, focus, report } => {
            let batch = focus_objects(&objects, &focus.into())?;
            if let Some(path) = report {
                write_report(&path, &batch)?;
            }
        }
        Commands::Run { settings, focus, report } => {
            let runs = load_runs(&settings)?;
            let jobs = segment_and_focus(&runs, &focus.into())?;
            if let Some(path) = report {
                write_report(&path, &jobs)?;
            }
            info!("Processed {} run(s)", jobs.len());
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&SettingsFile::schema())?);
        }
    }

    Ok(())
}
