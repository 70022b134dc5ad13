//! gpx-summary CLI
//!
//! Usage:
//!   gpx-summary-cli summarize --gazetteer places.zip ride.gpx
//!   gpx-summary-cli summarize --gazetteer places.bin --dir rides/
//!   gpx-summary-cli condense --min-dist 2.0 --max-poi 5 ride.json
//!   gpx-summary-cli build-cache places.zip places.bin
//!   gpx-summary-cli fetch --gazetteer places.bin 12345   (feature "http")
//!
//! Summaries are written as pretty JSON, to stdout for a single file and to
//! a `.json` sibling per track when scanning a directory.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use gpx_summary::{
    condense, gazetteer, stops_from_cafe_json, stops_from_waypoints, CondenseOptions, PlaceIndex,
    PlanarGrid, StopIndex, SummaryConfig, SummaryError, TrackSummarizer, TrackSummary,
};

#[derive(Parser)]
#[command(name = "gpx-summary-cli")]
#[command(about = "Trip summaries from GPS tracks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Local planar grid parameters shared by the summarizing subcommands.
#[derive(Args)]
struct GridArgs {
    /// Longitude of the grid origin
    #[arg(long, default_value = "-2.0", allow_hyphen_values = true)]
    origin_lon: f64,

    /// Latitude of the grid origin
    #[arg(long, default_value = "49.0")]
    origin_lat: f64,

    /// False easting added to projected coordinates
    #[arg(long, default_value = "400000")]
    false_easting: f64,

    /// False northing added to projected coordinates
    #[arg(long, default_value = "-100000", allow_hyphen_values = true)]
    false_northing: f64,
}

impl GridArgs {
    fn grid(&self) -> PlanarGrid {
        PlanarGrid::with_false_origin(
            self.origin_lon,
            self.origin_lat,
            self.false_easting,
            self.false_northing,
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize one GPX file or every GPX file in a directory
    Summarize {
        /// Gazetteer archive (.zip) or binary cache built with build-cache
        #[arg(long)]
        gazetteer: PathBuf,

        /// GPX file to summarize
        gpx: Option<PathBuf>,

        /// Directory to scan for GPX files
        #[arg(long, conflicts_with = "gpx")]
        dir: Option<PathBuf>,

        /// GPX waypoint file of refreshment stops
        #[arg(long)]
        stops_waypoints: Option<PathBuf>,

        /// JSON cafe feed of refreshment stops
        #[arg(long, conflicts_with = "stops_waypoints")]
        stops_cafes: Option<PathBuf>,

        /// Skip the start-in-range check
        #[arg(long)]
        no_start_check: bool,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Reduce a summary's place list for a short trip title
    Condense {
        /// Summary JSON produced by the summarize subcommand
        summary: PathBuf,

        /// Minimum distance (km) between points of interest
        #[arg(long)]
        min_dist: Option<f64>,

        /// Maximum number of points of interest
        #[arg(long)]
        max_poi: Option<usize>,
    },

    /// Parse a gazetteer zip archive into a binary cache
    BuildCache {
        /// Gazetteer zip archive
        input: PathBuf,

        /// Cache file to write
        output: PathBuf,
    },

    /// Fetch a RideWithGPS route and summarize it
    #[cfg(feature = "http")]
    Fetch {
        /// RideWithGPS route id
        route_id: u64,

        /// Gazetteer archive (.zip) or binary cache
        #[arg(long)]
        gazetteer: PathBuf,

        /// Refreshment stop source (ctccambridge or cyclingmaps)
        #[arg(long)]
        stops: Option<String>,

        #[command(flatten)]
        grid: GridArgs,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Summarize {
            gazetteer,
            gpx,
            dir,
            stops_waypoints,
            stops_cafes,
            no_start_check,
            grid,
        } => run_summarize(
            &gazetteer,
            gpx.as_deref(),
            dir.as_deref(),
            stops_waypoints.as_deref(),
            stops_cafes.as_deref(),
            no_start_check,
            &grid,
        ),
        Commands::Condense {
            summary,
            min_dist,
            max_poi,
        } => run_condense(&summary, min_dist, max_poi),
        Commands::BuildCache { input, output } => run_build_cache(&input, &output),
        #[cfg(feature = "http")]
        Commands::Fetch {
            route_id,
            gazetteer,
            stops,
            grid,
        } => run_fetch(route_id, &gazetteer, stops.as_deref(), &grid),
    };

    if let Err(e) = outcome {
        log::error!("{e}");
        std::process::exit(1);
    }
}

/// Load a gazetteer by extension: `.zip` archives are parsed, anything else
/// is treated as a binary cache.
fn load_place_index(path: &Path) -> gpx_summary::Result<PlaceIndex> {
    let regions = if path.extension().is_some_and(|ext| ext == "zip") {
        gazetteer::load_zip(path)?
    } else {
        gazetteer::load_cache(path)?
    };
    Ok(PlaceIndex::from_regions(regions))
}

fn load_stop_index(
    waypoints: Option<&Path>,
    cafes: Option<&Path>,
    grid: &PlanarGrid,
) -> gpx_summary::Result<Option<StopIndex>> {
    let open = |path: &Path| {
        File::open(path).map_err(|e| SummaryError::Io {
            message: format!("opening {}: {e}", path.display()),
        })
    };
    let stops = if let Some(path) = waypoints {
        Some(stops_from_waypoints(BufReader::new(open(path)?), grid)?)
    } else if let Some(path) = cafes {
        Some(stops_from_cafe_json(BufReader::new(open(path)?), grid)?)
    } else {
        None
    };
    Ok(stops.map(StopIndex::from_stops))
}

fn run_summarize(
    gazetteer_path: &Path,
    gpx: Option<&Path>,
    dir: Option<&Path>,
    stops_waypoints: Option<&Path>,
    stops_cafes: Option<&Path>,
    no_start_check: bool,
    grid_args: &GridArgs,
) -> gpx_summary::Result<()> {
    let grid = grid_args.grid();
    let places = load_place_index(gazetteer_path)?;
    let stops = load_stop_index(stops_waypoints, stops_cafes, &grid)?;
    let mut config = SummaryConfig::default();
    if no_start_check {
        config.start_range_m = None;
    }
    let summarizer = TrackSummarizer::with_config(places, grid, config);

    match (gpx, dir) {
        (Some(file), None) => {
            let summary = summarize_file(&summarizer, stops.as_ref(), file)?;
            print_json(&summary)
        }
        (None, Some(dir)) => summarize_directory(&summarizer, stops.as_ref(), dir),
        _ => Err(SummaryError::InvalidConstraint {
            message: "exactly one of a GPX file or --dir is required".to_string(),
        }),
    }
}

fn summarize_file(
    summarizer: &TrackSummarizer<PlanarGrid>,
    stops: Option<&StopIndex>,
    path: &Path,
) -> gpx_summary::Result<TrackSummary> {
    log::info!("analyzing {}", path.display());
    let file = File::open(path).map_err(|e| SummaryError::Io {
        message: format!("opening {}: {e}", path.display()),
    })?;
    summarizer.summarize(BufReader::new(file), stops)
}

fn summarize_directory(
    summarizer: &TrackSummarizer<PlanarGrid>,
    stops: Option<&StopIndex>,
    dir: &Path,
) -> gpx_summary::Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| SummaryError::Io {
        message: format!("reading {}: {e}", dir.display()),
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| SummaryError::Io {
            message: e.to_string(),
        })?;
        let path = entry.path();
        if path.extension().map_or(true, |ext| ext != "gpx") {
            continue;
        }
        let summary = summarize_file(summarizer, stops, &path)?;
        let out_path = path.with_extension("json");
        write_json(&out_path, &summary)?;
        log::info!("wrote {}", out_path.display());
    }
    Ok(())
}

fn run_condense(
    summary_path: &Path,
    min_dist: Option<f64>,
    max_poi: Option<usize>,
) -> gpx_summary::Result<()> {
    let file = File::open(summary_path).map_err(|e| SummaryError::Io {
        message: format!("opening {}: {e}", summary_path.display()),
    })?;
    let summary: TrackSummary =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| SummaryError::Io {
            message: format!("parsing {}: {e}", summary_path.display()),
        })?;

    let options = CondenseOptions {
        min_spacing_km: min_dist,
        max_count: max_poi,
        ..CondenseOptions::default()
    };
    let condensed = condense(summary.points_of_interest, &options)?;
    let names: Vec<&str> = condensed.iter().map(|p| p.name.as_str()).collect();
    println!("{}", names.join(", "));
    Ok(())
}

fn run_build_cache(input: &Path, output: &Path) -> gpx_summary::Result<()> {
    let regions = gazetteer::load_zip(input)?;
    gazetteer::save_cache(output, &regions)?;
    log::info!("wrote {} regions to {}", regions.len(), output.display());
    Ok(())
}

#[cfg(feature = "http")]
fn run_fetch(
    route_id: u64,
    gazetteer_path: &Path,
    stops_source: Option<&str>,
    grid_args: &GridArgs,
) -> gpx_summary::Result<()> {
    use gpx_summary::http;

    let grid = grid_args.grid();
    let places = load_place_index(gazetteer_path)?;
    let summarizer = TrackSummarizer::new(places, grid);

    let runtime = tokio::runtime::Runtime::new().map_err(|e| SummaryError::Http {
        message: format!("starting runtime: {e}"),
        status_code: None,
    })?;
    let summary = runtime.block_on(async {
        let client = http::client()?;
        let stops = match stops_source {
            Some(source) => Some(http::fetch_stop_source(&client, source, &grid).await?),
            None => None,
        };
        let track = http::fetch_route(&client, route_id).await?;
        summarizer.summarize(&track[..], stops.as_ref())
    })?;
    print_json(&summary)
}

fn print_json(summary: &TrackSummary) -> gpx_summary::Result<()> {
    let json = serde_json::to_string_pretty(summary).map_err(|e| SummaryError::Io {
        message: format!("encoding summary: {e}"),
    })?;
    println!("{json}");
    Ok(())
}

fn write_json(path: &Path, summary: &TrackSummary) -> gpx_summary::Result<()> {
    let file = File::create(path).map_err(|e| SummaryError::Io {
        message: format!("creating {}: {e}", path.display()),
    })?;
    serde_json::to_writer_pretty(file, summary).map_err(|e| SummaryError::Io {
        message: format!("writing {}: {e}", path.display()),
    })
}
