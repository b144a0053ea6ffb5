//! BeSec command line
//!
//! Thin wrapper over the library:
//! - `practices check|list` loads and validates definitions
//! - `plan maturity` scores a responses document
//! - `version next` names the next practices version

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use besec::{versioning, EngineConfig, PlanResponses, Practice, PracticeLoader};

// ──────────────────────────────────────────────────────────────────────────────
// ARGUMENTS
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "besec")]
#[command(about = "Security practice maturity engine")]
struct Cli {
    /// Base practice definitions (overrides BESEC_PRACTICES_DIR)
    #[arg(long, global = true)]
    practices_dir: Option<PathBuf>,
    /// Local practice deltas (overrides BESEC_DELTA_DIR)
    #[arg(long, global = true)]
    delta_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the practice definitions
    Practices {
        #[command(subcommand)]
        command: PracticesCommand,
    },
    /// Score plan responses
    Plan {
        #[command(subcommand)]
        command: PlanCommand,
    },
    /// Practices version naming
    Version {
        #[command(subcommand)]
        command: VersionCommand,
    },
}

#[derive(Subcommand)]
enum PracticesCommand {
    /// Load every definition and report problems
    Check,
    /// Print each practice with the levels it defines
    List,
}

#[derive(Subcommand)]
enum PlanCommand {
    /// Print the maturity map and readiness issues for a responses document
    Maturity {
        /// JSON or YAML PlanResponses
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum VersionCommand {
    /// Print the version name a publish today would use
    Next { existing: Vec<String> },
}

// ──────────────────────────────────────────────────────────────────────────────
// MAIN ENTRY POINT
// ──────────────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("besec=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::from_env();
    if let Some(dir) = cli.practices_dir {
        config.practices_dir = dir;
    }
    if let Some(dir) = cli.delta_dir {
        config.delta_dir = Some(dir);
    }

    match cli.command {
        Commands::Practices { command } => {
            let practices = load_practices(&config)?;
            match command {
                PracticesCommand::Check => {
                    println!("{} practices OK", practices.len());
                }
                PracticesCommand::List => {
                    for p in &practices {
                        let levels: Vec<String> =
                            p.levels_present().iter().map(|l| l.to_string()).collect();
                        println!("{}\t{}\t{}", p.id, p.name, levels.join(","));
                    }
                }
            }
        }
        Commands::Plan {
            command: PlanCommand::Maturity { file },
        } => {
            let practices = load_practices(&config)?;
            let responses = read_responses(&file)?;
            print_maturity(&responses, &practices)?;
        }
        Commands::Version {
            command: VersionCommand::Next { existing },
        } => {
            let today = chrono::Local::now().date_naive();
            let (version, suffixed) = versioning::next_version(&existing, today)?;
            if suffixed {
                info!("There is already at least one version with today's date, using {}", version);
            }
            println!("{}", version);
        }
    }

    Ok(())
}

fn load_practices(config: &EngineConfig) -> Result<Vec<Practice>> {
    PracticeLoader::from_config(config)
        .load()
        .with_context(|| format!("Failed to load practices from {:?}", config.practices_dir))
}

fn read_responses(path: &Path) -> Result<PlanResponses> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let responses = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&raw).context("Invalid responses JSON")?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&raw).context("Invalid responses YAML")?,
        _ => bail!("Responses file must be .json or .yaml: {:?}", path),
    };
    Ok(responses)
}

fn print_maturity(responses: &PlanResponses, practices: &[Practice]) -> Result<()> {
    let maturity = besec::calculate_maturity(responses, practices);
    println!("{}", serde_json::to_string_pretty(&maturity)?);

    let (ready, issues) = responses.ready_to_commit(practices);
    if ready {
        println!("Ready to commit");
    } else {
        println!("Not ready to commit:");
        for issue in issues {
            println!("  - {}", issue);
        }
    }
    Ok(())
}
