use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use rand::{Rng, SeedableRng};
use tracing_subscriber::{fmt, EnvFilter};

use dmap::{
    cluster_sizes, coordinates_from_signed, parse_range, read_labels, write_matrix_with,
    BatchConfig, BatchRunner, DistanceMatrix, DistanceSource, FasterPam, InitStrategy, MapConfig,
    OnError,
};

/// DMAP - Cluster and inspect dense on-disk distance matrices
#[derive(Parser)]
#[command(name = "dmap", author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run FasterPAM over a range of matrix files and write label files
    Cluster {
        /// Directory holding the matrix files
        base_dir: PathBuf,

        /// Unit range (format: start:end, end exclusive)
        #[arg(long)]
        units: Option<String>,

        /// Number of clusters
        #[arg(long)]
        k: Option<usize>,

        /// Maximum FasterPAM iterations
        #[arg(long)]
        max_iter: Option<usize>,

        /// Initial medoid strategy
        #[arg(long, value_enum)]
        init: Option<InitArg>,

        /// Seed for random initialization
        #[arg(long)]
        seed: Option<u64>,

        /// Matrix dimension; derived from the file size when omitted
        #[arg(long)]
        n: Option<usize>,

        /// What to do when a unit fails
        #[arg(long, value_enum)]
        on_error: Option<OnErrorArg>,

        /// Largest single mapping in bytes
        #[arg(long)]
        max_map_bytes: Option<u64>,

        /// JSON batch config; flags given on the command line take precedence
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show matrix size and stripe layout
    Info {
        /// Matrix file
        file: PathBuf,

        /// Matrix dimension; derived from the file size when omitted
        #[arg(long)]
        n: Option<usize>,

        /// Largest single mapping in bytes
        #[arg(long)]
        max_map_bytes: Option<u64>,
    },
    /// Look up a single distance
    Query {
        /// Matrix file
        file: PathBuf,

        #[arg(allow_negative_numbers = true)]
        row: i64,

        #[arg(allow_negative_numbers = true)]
        col: i64,

        /// Matrix dimension; derived from the file size when omitted
        #[arg(long)]
        n: Option<usize>,
    },
    /// Write a synthetic matrix of planar point distances
    Generate {
        /// Output file
        file: PathBuf,

        /// Number of points
        #[arg(long)]
        n: usize,

        /// Store d(i, j) == d(j, i)
        #[arg(long)]
        symmetric: bool,

        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
    /// Print cluster sizes from a label file
    Labels {
        /// Label file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InitArg {
    Build,
    Random,
    First,
}

impl From<InitArg> for InitStrategy {
    fn from(arg: InitArg) -> Self {
        match arg {
            InitArg::Build => InitStrategy::Build,
            InitArg::Random => InitStrategy::Random,
            InitArg::First => InitStrategy::First,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OnErrorArg {
    Abort,
    Skip,
}

impl From<OnErrorArg> for OnError {
    fn from(arg: OnErrorArg) -> Self {
        match arg {
            OnErrorArg::Abort => OnError::Abort,
            OnErrorArg::Skip => OnError::Skip,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    let result = match cli.command {
        Commands::Cluster {
            base_dir,
            units,
            k,
            max_iter,
            init,
            seed,
            n,
            on_error,
            max_map_bytes,
            config,
        } => {
            let overrides = ClusterArgs {
                units,
                k,
                max_iter,
                init,
                seed,
                n,
                on_error,
                max_map_bytes,
            };
            handle_cluster(base_dir, config.as_deref(), overrides)
        }
        Commands::Info {
            file,
            n,
            max_map_bytes,
        } => handle_info(&file, n, max_map_bytes),
        Commands::Query { file, row, col, n } => handle_query(&file, row, col, n),
        Commands::Generate {
            file,
            n,
            symmetric,
            seed,
        } => handle_generate(&file, n, symmetric, seed),
        Commands::Labels { file } => handle_labels(&file),
    };

    match result {
        Ok(()) => {
            eprintln!("Completed in {:.2?}", start_time.elapsed());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error ({}): {e}", e.category());
            ExitCode::FAILURE
        }
    }
}

struct ClusterArgs {
    units: Option<String>,
    k: Option<usize>,
    max_iter: Option<usize>,
    init: Option<InitArg>,
    seed: Option<u64>,
    n: Option<usize>,
    on_error: Option<OnErrorArg>,
    max_map_bytes: Option<u64>,
}

fn handle_cluster(base_dir: PathBuf, config: Option<&Path>, args: ClusterArgs) -> dmap::Result<()> {
    let mut batch = match config {
        Some(path) => BatchConfig::from_json_file(path)?,
        None => BatchConfig::default(),
    };
    batch.base_dir = base_dir;

    if let Some(units) = args.units {
        batch.units = parse_range(&units)?;
    } else if config.is_none() {
        return Err(dmap::Error::Config("--units is required without --config".into()));
    }
    if let Some(k) = args.k {
        batch.k = k;
    }
    if let Some(max_iter) = args.max_iter {
        batch.max_iter = max_iter;
    }
    if let Some(init) = args.init {
        batch.init = init.into();
    }
    if let Some(seed) = args.seed {
        batch.seed = seed;
    }
    if args.n.is_some() {
        batch.dimension = args.n;
    }
    if let Some(on_error) = args.on_error {
        batch.on_error = on_error.into();
    }
    if let Some(max_map_bytes) = args.max_map_bytes {
        batch.map.max_map_bytes = max_map_bytes;
    }

    let runner = BatchRunner::new(batch, FasterPam)?;
    let summary = runner.run()?;

    for report in &summary.completed {
        println!(
            "unit {}: n={} loss={:.4} iterations={} swaps={} sizes={:?} windowed={} in {:.2?} -> {}",
            report.unit,
            report.n,
            report.loss,
            report.iterations,
            report.swaps,
            report.cluster_sizes,
            report.windowed,
            report.elapsed,
            report.labels_path.display()
        );
    }
    for (unit, e) in &summary.skipped {
        println!("unit {unit}: skipped ({e})");
    }
    Ok(())
}

fn handle_info(file: &Path, n: Option<usize>, max_map_bytes: Option<u64>) -> dmap::Result<()> {
    let mut config = MapConfig::default();
    if let Some(bytes) = max_map_bytes {
        config.max_map_bytes = bytes;
    }
    let matrix = DistanceMatrix::open(file, n, &config)?;
    let info = matrix.info();
    let layout = &info.layout;

    println!("File: {}", info.path.display());
    println!("  Dimension: {} x {}", info.n, info.n);
    println!("  File size: {} bytes", info.file_len);
    println!("  Bytes per row: {}", layout.bytes_per_row());
    println!("  Mapping ceiling: {} bytes", layout.max_map_bytes());
    println!("  Rows per stripe: {}", layout.rows_per_stripe());
    println!("  Stripes: {}", layout.stripe_count());
    println!(
        "  Access: {}",
        if info.windowed { "stripe window" } else { "single mapping" }
    );
    Ok(())
}

fn handle_query(file: &Path, row: i64, col: i64, n: Option<usize>) -> dmap::Result<()> {
    let matrix = DistanceMatrix::open(file, n, &MapConfig::default())?;
    let (i, j) = coordinates_from_signed(row, col, matrix.len())?;
    println!("d({i}, {j}) = {}", matrix.try_distance(i, j)?);
    Ok(())
}

fn handle_generate(file: &Path, n: usize, symmetric: bool, seed: u64) -> dmap::Result<()> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let points: Vec<(f32, f32)> = (0..n)
        .map(|_| (rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
        .collect();

    write_matrix_with(file, n, |i, j| {
        let (xi, yi) = points[i];
        let (xj, yj) = points[j];
        let d = ((xi - xj).powi(2) + (yi - yj).powi(2)).sqrt();
        if symmetric || i <= j {
            d
        } else {
            d * 1.05
        }
    })?;
    println!("Wrote {n} x {n} matrix to {}", file.display());
    Ok(())
}

fn handle_labels(file: &Path) -> dmap::Result<()> {
    let labels = read_labels(file)?;
    let sizes = cluster_sizes(&labels)?;
    println!("{} labels, {} clusters", labels.len(), sizes.len());
    for (cluster, size) in sizes.iter().enumerate() {
        println!("  cluster {cluster}: {size}");
    }
    Ok(())
}
