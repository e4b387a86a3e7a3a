use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use story::StoryConfig;
use tools::walk;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and replay scroll-story configurations")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the built-in story configuration as JSON
    Config,

    /// Check a configuration file for broken references
    Validate {
        /// Path to a story JSON file
        file: PathBuf,
    },

    /// Replay a reading path and print the map state after each step
    Walk {
        /// Story JSON file (defaults to the built-in story)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Section ids in reading order; `click:<toggle-id>` clicks a legend button
        #[arg(required = true)]
        steps: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main(Args::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        Command::Config => {
            println!("{}", StoryConfig::builtin().to_json_pretty()?);
        }
        Command::Validate { file } => {
            let config = load(&file)?;
            let registry = config.registry()?;
            let sections = config.section_table()?;
            println!(
                "ok: {} sections, {} layers, {} toggles, {} exit rules",
                sections.len(),
                registry.layers().len(),
                registry.toggles().len(),
                sections.exit_rules().len()
            );
        }
        Command::Walk {
            config,
            json,
            steps,
        } => {
            let config = match config {
                Some(path) => load(&path)?,
                None => StoryConfig::builtin(),
            };
            let report = walk(&config, &steps)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render());
            }
        }
    }
    Ok(())
}

fn load(path: &PathBuf) -> Result<StoryConfig, Box<dyn std::error::Error>> {
    info!(path = %path.display(), "loading story config");
    let text = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    Ok(StoryConfig::from_json_str(&text)?)
}
