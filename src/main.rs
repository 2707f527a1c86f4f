use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use log::info;
use std::io::{self, Write};
use std::path::PathBuf;

use ultiorganizer_stats::{
    fix_halftime, load_document, save_document, scrape, write_csv_folder, write_report,
    HalftimeOptions, HttpFetcher, PageCache, ScrapeOptions,
};

const DEFAULT_OUTPUT_FILE: &str = "output.json";

#[derive(Parser, Debug)]
#[command(name = "ultiorganizer_stats", version, about = "Scrape Ultiorganizer events and analyse their games")]
struct Cli {
    /// Log every fetched URL
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scrape an Ultiorganizer instance into a JSON document
    Scrape {
        /// URL of the event homepage listing teams by division
        url: String,

        /// Cache fetched HTML on disk for a day
        #[arg(long, action = ArgAction::Set, num_args = 0..=1, default_value_t = true, default_missing_value = "true")]
        cache: bool,

        /// Where cached pages are kept
        #[arg(long, default_value = "cache")]
        cache_dir: PathBuf,

        /// Output file
        #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
        file: PathBuf,

        /// Names of divisions to skip
        #[arg(short, long)]
        skip: Vec<String>,

        /// Skip games whose page cannot be parsed instead of aborting
        #[arg(long)]
        skip_malformed: bool,
    },

    /// Add a halftime to games that don't have one
    FixHalftime {
        /// JSON document to fix in place
        #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
        file: PathBuf,

        /// Halftime score
        #[arg(short, long, default_value_t = 8)]
        score: u32,

        /// Halftime time limit in minutes
        #[arg(short, long, default_value_t = 50)]
        time: u32,
    },

    /// Print best comebacks and fewest breaks per division
    GenerateStats {
        /// JSON document to analyse
        #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
        file: PathBuf,
    },

    /// Convert the JSON document into a set of CSV files
    ToCsv {
        /// JSON document to convert
        #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
        file: PathBuf,

        /// Destination folder for the CSV files
        #[arg(long, default_value = "csv")]
        folder: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Scrape {
            url,
            cache,
            cache_dir,
            file,
            skip,
            skip_malformed,
        } => {
            let fetcher = HttpFetcher::new(cache.then(|| PageCache::new(cache_dir)));
            let options = ScrapeOptions {
                skip_divisions: skip,
                skip_malformed_games: skip_malformed,
            };

            let doc = scrape(&fetcher, &url, &options)
                .await
                .with_context(|| format!("Failed to scrape {}", url))?;

            save_document(&file, &doc)
                .with_context(|| format!("Failed to write {}", file.display()))?;
            println!("Results written to {}", file.display());
        }

        Command::FixHalftime { file, score, time } => {
            let mut doc = load_document(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let inserted = fix_halftime(&mut doc, &HalftimeOptions::new(score, time));
            for insertion in &inserted {
                println!(
                    "Game {}: halftime at {}-{}",
                    insertion.game_id, insertion.score.home, insertion.score.away
                );
            }
            info!("Added {} halftime markers", inserted.len());

            save_document(&file, &doc)
                .with_context(|| format!("Failed to write {}", file.display()))?;
        }

        Command::GenerateStats { file } => {
            let doc = load_document(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_report(&mut out, &doc)?;
            out.flush()?;
        }

        Command::ToCsv { file, folder } => {
            let doc = load_document(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let written = write_csv_folder(&doc, &folder)
                .with_context(|| format!("Failed to write CSV files to {}", folder.display()))?;
            for path in written {
                println!("Written {}", path.display());
            }
        }
    }

    Ok(())
}
