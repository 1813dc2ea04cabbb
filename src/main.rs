use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use doctor_etl::collector::repair::Repairer;
use doctor_etl::settings::Settings;
use doctor_etl::store::{read_records, CsvStore};
use doctor_etl::{stats, CleanRecord, Collector, Normalizer, NormalizerConfig, Population, RawRecord};

#[derive(Parser)]
#[command(name = "doctor_etl", about = "Scrape and clean sasthyaseba.com doctor profiles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the doctor listing and append new profiles to the raw store
    Collect {
        /// Raw store (created or resumed)
        #[arg(short, long, default_value = "doctors_data.csv")]
        output: PathBuf,
        /// all, bangladesh or india
        #[arg(short, long, default_value = "all")]
        country: Population,
        /// Stop after this many new profiles
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Walk at most this many listing pages
        #[arg(long)]
        max_pages: Option<u32>,
    },
    /// Re-visit profiles missing specialty/hospital/location into a new store
    Repair {
        /// Raw store to read (left unchanged)
        #[arg(short, long, default_value = "doctors_data.csv")]
        input: PathBuf,
        /// Repaired copy
        #[arg(short, long, default_value = "doctors_data_fixed.csv")]
        output: PathBuf,
    },
    /// Normalize a raw store into the clean dataset
    Clean {
        #[arg(short, long, default_value = "doctors_data.csv")]
        input: PathBuf,
        #[arg(short, long, default_value = "doctors_cleaned.csv")]
        output: PathBuf,
        /// Keep only the allowed countries (Bangladesh, India by default)
        #[arg(long)]
        restrict_countries: bool,
    },
    /// Column completeness of a raw or clean store
    Stats {
        #[arg(default_value = "doctors_cleaned.csv")]
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load().context("loading settings")?;

    let result = match cli.command {
        Commands::Collect {
            output,
            country,
            limit,
            max_pages,
        } => {
            println!("Collecting '{}' doctors into {}...", country, output.display());
            let mut collector = Collector::open(&output, country, &settings.collector)?
                .with_limit(limit)
                .with_max_pages(max_pages);
            let stats = collector
                .run()
                .with_context(|| format!("collecting into {}", output.display()))?;
            print!("{}", stats.render());
            Ok(())
        }
        Commands::Repair { input, output } => {
            if input == output {
                bail!("repair output must differ from its input ({})", input.display());
            }
            let repairer = Repairer::open(&settings.collector)?;
            let source = CsvStore::new(&input);
            let mut target = CsvStore::new(&output);
            let s = repairer.run(&source, &mut target)?;
            println!(
                "Repaired {} of {} incomplete records ({} failed) -> {}",
                s.repaired,
                s.candidates,
                s.failed,
                output.display()
            );
            println!(
                "  filled: specialty {}, hospital {}, location {}",
                s.specialty_filled, s.hospital_filled, s.location_filled
            );
            Ok(())
        }
        Commands::Clean {
            input,
            output,
            restrict_countries,
        } => {
            let normalizer = Normalizer::new(NormalizerConfig::from_settings(&settings.normalizer));
            let outcome = normalizer
                .run(&input, &output, restrict_countries)
                .with_context(|| format!("normalizing {}", input.display()))?;
            println!("{}", outcome.before.render("Initial dataset"));
            print!("{}", outcome.tracker.render());
            println!("\n{}", outcome.after.render("Clean dataset"));
            println!("Wrote {} records to {}", outcome.records.len(), output.display());
            Ok(())
        }
        Commands::Stats { input } => {
            let title = input.display().to_string();
            let profile = if is_clean_store(&input)? {
                stats::profile_clean(&read_records::<CleanRecord>(&input)?)
            } else {
                stats::profile_raw(&read_records::<RawRecord>(&input)?)
            };
            print!("{}", profile.render(&title));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Clean stores carry the standardized columns; raw ones do not.
fn is_clean_store(path: &std::path::Path) -> anyhow::Result<bool> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let header = text.trim_start_matches('\u{feff}').lines().next().unwrap_or_default();
    Ok(header.split(',').any(|c| c.trim() == "specialty_normalized"))
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
