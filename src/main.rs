use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use gaode_distance::sdk::{
    batch::{build_route_table, BatchRunner, DEFAULT_CHECKPOINT_EVERY},
    config::AmapConfig,
    geocode::{geocode_all, read_city_list, write_lookup, GeocodeResolver},
    routing::{DrivingApi, RemoteAmapProvider},
    table::Table,
    util::{log::init_logging, rate_limit::Pacer},
};

/// Batch driving-distance fetcher for the Gaode/Amap web service
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch pending routes in the working table, checkpointing as it goes
    Fetch {
        /// Route table (origin,destination,gaode_map_distance,duration[,toll][,status])
        #[arg(long)]
        routes: PathBuf,

        /// Coordinate lookup table (city,longitude,latitude)
        #[arg(long)]
        coords: PathBuf,

        /// Driving-direction API version
        #[arg(long, value_enum, default_value_t = DrivingApi::V3)]
        api: DrivingApi,

        /// Save the table after this many fetched rows
        #[arg(long, default_value_t = DEFAULT_CHECKPOINT_EVERY)]
        checkpoint_every: usize,
    },
    /// Geocode a city list into a fresh coordinate lookup table
    Geocode {
        /// City list (single `city` column)
        #[arg(long)]
        cities: PathBuf,

        /// Where to write the lookup table
        #[arg(long)]
        output: PathBuf,
    },
    /// Generate an empty route table from a city list (all ordered pairs)
    Prepare {
        /// City list (single `city` column)
        #[arg(long)]
        cities: PathBuf,

        /// Where to write the route table
        #[arg(long)]
        output: PathBuf,

        /// Include a toll column
        #[arg(long)]
        with_toll: bool,
    },
}

fn main() -> anyhow::Result<()> {
    init_logging();
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Fetch {
            routes,
            coords,
            api,
            checkpoint_every,
        } => fetch(&routes, &coords, api, checkpoint_every),
        Command::Geocode { cities, output } => geocode(&cities, &output),
        Command::Prepare {
            cities,
            output,
            with_toll,
        } => prepare(&cities, &output, with_toll),
    }
}

fn fetch(
    routes: &Path,
    coords: &Path,
    api: DrivingApi,
    checkpoint_every: usize,
) -> anyhow::Result<()> {
    let config = AmapConfig::from_env()?;
    let resolver = GeocodeResolver::load(coords)
        .with_context(|| format!("loading coordinate lookup {}", coords.display()))?;
    let mut table = Table::load(routes)
        .with_context(|| format!("loading route table {}", routes.display()))?;
    log::info!(
        "{} rows in {}, {} cities in the lookup",
        table.len(),
        routes.display(),
        resolver.len()
    );

    let provider = RemoteAmapProvider::new(config, api, Pacer::default())?;
    let report = BatchRunner::new(&mut table, routes, &resolver, &provider)
        .checkpoint_every(checkpoint_every)
        .run()?;

    log::info!(
        "done: {} fetched, {} skipped, {} checkpoints",
        report.fetched,
        report.skipped,
        report.checkpoints
    );
    Ok(())
}

fn geocode(cities: &Path, output: &Path) -> anyhow::Result<()> {
    let config = AmapConfig::from_env()?;
    let names = read_city_list(cities)?;
    log::info!("geocoding {} cities", names.len());

    let entries = geocode_all(&names, &config, &Pacer::default())?;
    write_lookup(&entries, output)?;
    log::info!("wrote {} coordinates to {}", entries.len(), output.display());
    Ok(())
}

fn prepare(cities: &Path, output: &Path, with_toll: bool) -> anyhow::Result<()> {
    let names = read_city_list(cities)?;
    let table = build_route_table(&names, with_toll)?;
    table.save(output)?;
    log::info!("wrote {} city pairs to {}", table.len(), output.display());
    Ok(())
}
