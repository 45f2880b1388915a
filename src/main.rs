use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use stopfrisk::{
    load_file_with, BiasColumn, BiasRow, ColumnLayout, Dataset, LoadOptions, MalformedRows,
};

#[derive(Parser, Debug)]
#[command(name = "stopfrisk")]
#[command(about = "Aggregate queries over NYPD stop-and-frisk records")]
#[command(version)]
struct Cli {
    /// Input file (.csv, .json or .parquet)
    file: PathBuf,

    /// JSON file overriding the CSV column positions
    #[arg(short, long)]
    layout: Option<PathBuf>,

    /// Skip and count malformed rows instead of failing the load
    #[arg(long)]
    skip_malformed: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Years loaded and record counts
    Summary,
    /// Stops of one race code in a year
    Population {
        #[arg(short, long)]
        year: i32,
        #[arg(short, long)]
        race: String,
    },
    /// Frisk and arrest rates for a year
    Rates {
        #[arg(short, long)]
        year: i32,
    },
    /// Female/male split of Black and White stops
    GenderBias {
        #[arg(short, long)]
        year: i32,
    },
    /// Change in share of stops matching a crime description
    CrimeIncrease {
        #[arg(short, long)]
        description: String,
        #[arg(long)]
        from: i32,
        #[arg(long)]
        to: i32,
    },
    /// Borough with the most stops in a year
    Borough {
        #[arg(short, long)]
        year: i32,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let layout = match &cli.layout {
        Some(path) => ColumnLayout::from_json_file(path)?,
        None => ColumnLayout::default(),
    };
    let options = LoadOptions {
        layout,
        malformed: if cli.skip_malformed {
            MalformedRows::Skip
        } else {
            MalformedRows::Reject
        },
    };

    let loaded = load_file_with(&cli.file, &options)
        .with_context(|| format!("loading {}", cli.file.display()))?;
    if loaded.rows_skipped > 0 {
        log::warn!("{} malformed rows skipped", loaded.rows_skipped);
    }

    run(&cli.command, &loaded.dataset, cli.json)
}

fn run(command: &Command, dataset: &Dataset, as_json: bool) -> Result<()> {
    match command {
        Command::Summary => {
            let years: Vec<_> = dataset
                .years()
                .into_iter()
                .filter_map(|y| dataset.year(y).map(|g| (y, g.len())))
                .collect();
            if as_json {
                let rows: Vec<_> = years
                    .iter()
                    .map(|(year, records)| json!({ "year": year, "records": records }))
                    .collect();
                print_json(&rows)?;
            } else {
                for (year, records) in &years {
                    println!("{year}: {records} records");
                }
                println!("total: {} records", dataset.record_count());
            }
        }
        Command::Population { year, race } => {
            let records = dataset.population_stopped(*year, race);
            if as_json {
                print_json(&records)?;
            } else {
                for r in &records {
                    println!(
                        "{:<40} {:<16} {} arrested={} frisked={}",
                        r.description,
                        r.location,
                        r.gender.code(),
                        r.arrested,
                        r.frisked
                    );
                }
                println!("{} records", records.len());
            }
        }
        Command::Rates { year } => {
            let rates = dataset.frisked_vs_arrested(*year);
            if as_json {
                print_json(&rates)?;
            } else {
                println!("frisked:  {:.2}%", rates.frisked);
                println!("arrested: {:.2}%", rates.arrested);
            }
        }
        Command::GenderBias { year } => {
            let bias = dataset.gender_bias(*year);
            if as_json {
                print_json(&bias)?;
            } else {
                println!("{:<8} {:>8} {:>8} {:>8}", "", "Black", "White", "Total");
                for (label, row) in [("Female", BiasRow::Female), ("Male", BiasRow::Male)] {
                    println!(
                        "{label:<8} {:>8.2} {:>8.2} {:>8.2}",
                        bias.cell(row, BiasColumn::Black),
                        bias.cell(row, BiasColumn::White),
                        bias.cell(row, BiasColumn::Combined)
                    );
                }
            }
        }
        Command::CrimeIncrease {
            description,
            from,
            to,
        } => {
            let change = dataset.crime_increase(description, *from, *to);
            if as_json {
                print_json(&json!({
                    "description": description,
                    "from": from,
                    "to": to,
                    "change": change,
                }))?;
            } else {
                println!("{description}: {change:+.2} percentage points ({from} → {to})");
            }
        }
        Command::Borough { year } => {
            let borough = dataset.most_common_borough(*year);
            if as_json {
                print_json(&json!({ "year": year, "borough": borough }))?;
            } else {
                match borough {
                    Some(b) => println!("{b}"),
                    None => println!("no borough stops recorded for {year}"),
                }
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
