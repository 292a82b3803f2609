use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use restprobe::artifacts::Artifacts;
use restprobe::config::AnalysisConfig;
use restprobe::context::AnalysisContext;
use restprobe::error::AnalysisResult;
use restprobe::logging::{init_logging, LoggingConfig};
use restprobe::resolver::{report, AnalysisReport};

#[derive(Parser, Debug)]
#[command(name = "restprobe")]
#[command(version)]
#[command(about = "Derive the failure responses of REST endpoints from compiled class files")]
struct Cli {
    /// Suppress all logging
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short, action = ArgAction::Count, global = true, conflicts_with = "quiet")]
    verbose: u8,

    /// Configuration file (TOML)
    #[arg(long, short, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze class files and print every endpoint's responses as JSON
    Analyze {
        /// Compiled class files to load
        #[arg(required = true, value_name = "FILES")]
        files: Vec<PathBuf>,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,

        /// Resolve handler methods in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Show the knowledge-base status for an exception type
    Lookup {
        /// Qualified or simple exception type name
        #[arg(value_name = "TYPE")]
        exception_type: String,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

fn load_config(path: Option<&PathBuf>) -> AnalysisResult<AnalysisConfig> {
    let config = match path {
        Some(p) => AnalysisConfig::load(p)?,
        None => AnalysisConfig::from_env()?,
    };
    Ok(config)
}

fn print_report(report: &AnalysisReport, pretty: bool) -> Result<(), Box<dyn std::error::Error>> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    println!("{json}");
    Ok(())
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_verbosity(cli.verbose, cli.quiet));

    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Analyze {
            files,
            pretty,
            parallel,
        } => {
            config.parallel |= parallel;
            let artifacts = Artifacts::read(&files);
            let ctx = AnalysisContext::load(&artifacts.buffers, config);
            let mut report = report(&ctx);
            report.skipped_artifacts = artifacts.skipped(&report.skipped_artifacts);
            print_report(&report, pretty)?;
            if let Some(notice) = report.notice() {
                eprintln!("{notice}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Lookup { exception_type } => {
            let ctx = AnalysisContext::new(Default::default(), config);
            match ctx.knowledge.lookup(&exception_type) {
                Some(entry) => {
                    println!("{} {} {}", entry.exception_type, entry.status, entry.description);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("no knowledge-base entry for {exception_type}; resolves to 500");
                    Ok(ExitCode::from(1))
                }
            }
        }
        Commands::ShowConfig => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
