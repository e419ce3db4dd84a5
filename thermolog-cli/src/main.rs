//! CLI for the thermolog temperature recorder.
//!
//! Provides commands for recording, monitoring, listing, exporting and
//! deleting measurements, plus an interactive numbered menu.

mod menu;

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand, ValueEnum};
use thermolog::monitor::{self, MonitorConfig, RecordOutcome};
use thermolog::{
    Component, Config, DataSource, Direction, FileReplay, LiveSource, Measurement, Selection,
    Store, Target,
};
use tracing_subscriber::EnvFilter;

/// Record and manage hardware temperature measurements.
#[derive(Parser)]
#[command(name = "thermolog", version, about)]
struct Cli {
    /// Path to the sensor configuration file.
    #[arg(long, global = true, default_value = "thermolog.conf")]
    config: PathBuf,

    /// Data directory (defaults to `<exe dir>/../data`).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Sensor endpoint URL, overriding the configuration file.
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Record one measurement per component.
    Add {
        /// Component to record (CPU, GPU, Motherboard or all).
        #[arg(default_value = "all")]
        target: Target,
    },

    /// Record measurements periodically.
    Monitor {
        /// Component to record (CPU, GPU, Motherboard or all).
        #[arg(default_value = "all")]
        target: Target,

        /// Total monitoring time in seconds (0 = until Enter is pressed).
        #[arg(long, default_value = "0")]
        duration: u64,

        /// Seconds between measurements.
        #[arg(long, default_value = "5", value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },

    /// Print stored measurements.
    List {
        /// Component to list (CPU, GPU, Motherboard or all).
        #[arg(default_value = "all")]
        target: Target,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Export stored measurements to CSV.
    Export {
        /// Component to export (CPU, GPU, Motherboard or all).
        #[arg(default_value = "all")]
        target: Target,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Delete stored measurements.
    Delete {
        /// Component to delete from (CPU, GPU, Motherboard or all).
        target: Target,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Compare JSON and SQLite storage speed with synthetic records.
    Bench {
        /// Number of records to write per component.
        #[arg(long, default_value = "100")]
        records: u32,
    },

    /// Run the interactive menu (default).
    Menu,
}

/// Record range shared by list, export and delete.
#[derive(Args)]
struct RangeArgs {
    /// Number of records (0 = all).
    #[arg(long, default_value = "0")]
    count: usize,

    /// Which end to count from.
    #[arg(long, value_enum, default_value = "end")]
    from: Side,
}

impl RangeArgs {
    fn selection(&self) -> Selection {
        Selection {
            count: self.count,
            direction: match self.from {
                Side::Start => Direction::Start,
                Side::End => Direction::End,
            },
        }
    }
}

/// End of a record file.
#[derive(Clone, Copy, ValueEnum)]
enum Side {
    /// Oldest inserted records first.
    Start,
    /// Most recently inserted records.
    End,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    tracing::debug!("data directory: {}", data_dir.display());
    let mut store = Store::open(&data_dir);

    let result = match cli.command.unwrap_or(Commands::Menu) {
        Commands::Add { target } => {
            live_source(&cli.config, cli.endpoint.as_deref())
                .and_then(|mut source| cmd_add(&mut source, &mut store, &target))
        }
        Commands::Monitor {
            target,
            duration,
            interval,
        } => live_source(&cli.config, cli.endpoint.as_deref()).and_then(|mut source| {
            cmd_monitor(&mut source, &mut store, &target, duration, interval)
        }),
        Commands::List { target, range } => cmd_list(&store, &target, range.selection()),
        Commands::Export { target, range } => cmd_export(&store, &target, range.selection()),
        Commands::Delete { target, range } => cmd_delete(&mut store, &target, range.selection()),
        Commands::Bench { records } => cmd_bench(records),
        Commands::Menu => live_source(&cli.config, cli.endpoint.as_deref()).and_then(|mut source| {
            let input = menu::line_reader(io::stdin());
            menu::Menu::new(input, io::stdout(), &mut store, &mut source, wait_for_enter)
                .run()
                .map_err(Into::into)
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Resolves `<exe dir>/../data`, falling back to `./data`.
fn default_data_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent()?.parent().map(|root| root.join("data")))
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Loads the configuration and creates the live sensor source.
fn live_source(
    config_path: &Path,
    endpoint: Option<&str>,
) -> Result<LiveSource, Box<dyn std::error::Error>> {
    let mut config = Config::load(config_path).map_err(|e| {
        format!("{e}\nPlease complete the configuration file before running the program.")
    })?;
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint.to_string();
    }
    let source = LiveSource::new(&config)?;
    tracing::debug!("reading sensors from {}", source.endpoint());
    Ok(source)
}

/// Returns a stop trigger that fires once a line is read from stdin.
fn wait_for_enter() -> Box<dyn FnMut() -> bool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
        flag.store(true, Ordering::Relaxed);
    });
    Box::new(move || stop.load(Ordering::Relaxed))
}

/// Returns the components addressed by `target`.
fn components_of(target: &Target) -> Result<Vec<Component>, Box<dyn std::error::Error>> {
    match target {
        Target::All => Ok(Component::ALL.to_vec()),
        Target::Component(name) => Ok(vec![name.parse()?]),
    }
}

/// Prints one recording outcome.
fn print_outcome((component, outcome): &RecordOutcome) {
    match outcome {
        Ok(m) => println!("Recorded {component} temperature: {} °C", m.temperature),
        Err(e) => eprintln!("Skipping {component}: {e}"),
    }
}

/// Prints measurements as an aligned table.
fn print_records(records: &[Measurement]) {
    println!("{:<12} {:>12} {:>12}", "Component", "Temperature", "Timestamp");
    for m in records {
        println!("{:<12} {:>12.1} {:>12}", m.component, m.temperature, m.timestamp);
    }
    println!("{} record(s)", records.len());
}

/// Implements `thermolog add`.
fn cmd_add(
    source: &mut dyn DataSource,
    store: &mut Store,
    target: &Target,
) -> Result<(), Box<dyn std::error::Error>> {
    let components = components_of(target)?;
    if let [component] = components.as_slice() {
        let m = monitor::record(source, store, *component)?;
        println!("Recorded {component} temperature: {} °C", m.temperature);
        return Ok(());
    }

    for outcome in monitor::record_all(source, store, &components) {
        print_outcome(&outcome);
    }
    Ok(())
}

/// Implements `thermolog monitor`.
fn cmd_monitor(
    source: &mut dyn DataSource,
    store: &mut Store,
    target: &Target,
    duration: u64,
    interval: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let components = components_of(target)?;
    let interval = Duration::from_secs(interval);
    let config = if duration == 0 {
        println!("Monitoring {target} every {}s. Press Enter to stop.", interval.as_secs());
        MonitorConfig::continuous(interval)
    } else {
        println!(
            "Monitoring {target} every {}s for {duration}s.",
            interval.as_secs()
        );
        MonitorConfig::bounded(Duration::from_secs(duration), interval)
    };

    let should_stop: Box<dyn FnMut() -> bool> = if config.duration.is_none() {
        wait_for_enter()
    } else {
        Box::new(|| false)
    };
    let summary = monitor::run(source, store, &components, config, should_stop, print_outcome)?;

    println!(
        "Monitoring completed: {} recorded, {} failed.",
        summary.recorded, summary.failed
    );
    Ok(())
}

/// Implements `thermolog list`.
fn cmd_list(
    store: &Store,
    target: &Target,
    selection: Selection,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = store.read(target, selection)?;
    print_records(&records);
    Ok(())
}

/// Implements `thermolog export`.
fn cmd_export(
    store: &Store,
    target: &Target,
    selection: Selection,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = store.export_csv(target, selection)?;
    println!(
        "Exported {} record(s) to {}",
        summary.records,
        summary.path.display()
    );
    Ok(())
}

/// Implements `thermolog delete`.
fn cmd_delete(
    store: &mut Store,
    target: &Target,
    selection: Selection,
) -> Result<(), Box<dyn std::error::Error>> {
    let removed = FileReplay::new(store).delete_measurements(target, selection)?;
    println!("Deleted {} record(s) from {target}", removed.len());
    Ok(())
}

/// Implements `thermolog bench`.
fn cmd_bench(records: u32) -> Result<(), Box<dyn std::error::Error>> {
    println!("thermolog storage benchmark");
    println!("  Records per component: {records}");
    println!();

    let temp_dir = tempfile::tempdir()?;

    let base_time = 1_700_000_000i64;
    let samples: Vec<Measurement> = (0..records)
        .flat_map(|i| {
            Component::ALL.into_iter().map(move |component| {
                Measurement::new(
                    component.as_str(),
                    40.0 + f64::from(i % 20),
                    base_time + i64::from(i),
                )
            })
        })
        .collect();

    let mut store = Store::open(temp_dir.path());
    let start = Instant::now();
    for m in &samples {
        store.append(m)?;
    }
    report("JSON append", samples.len(), start.elapsed());

    let start = Instant::now();
    let mut read = 0;
    for component in Component::ALL {
        read += store.read(&component.into(), Selection::last(10))?.len();
    }
    report("JSON read (last 10)", read, start.elapsed());

    #[cfg(feature = "sqlite")]
    {
        let sqlite = thermolog::SqliteStore::open(temp_dir.path().join(thermolog::sqlite::DATABASE_FILE))?;
        let start = Instant::now();
        for m in &samples {
            sqlite.save(m)?;
        }
        report("SQLite insert", samples.len(), start.elapsed());

        let start = Instant::now();
        let mut read = 0;
        for component in Component::ALL {
            read += sqlite.load(component.as_str(), 10)?.len();
        }
        report("SQLite read (last 10)", read, start.elapsed());
    }

    #[cfg(not(feature = "sqlite"))]
    println!("SQLite comparison skipped (build with --features sqlite).");

    Ok(())
}

/// Prints timing for one benchmark phase.
#[allow(clippy::cast_precision_loss)] // Benchmark stats are fine with f64 precision
fn report(phase: &str, operations: usize, elapsed: Duration) {
    let per_op = if operations == 0 {
        0.0
    } else {
        elapsed.as_micros() as f64 / operations as f64
    };
    println!("{phase}:");
    println!("  Operations: {operations}");
    println!("  Elapsed: {elapsed:.3?}");
    println!("  Avg latency: {per_op:.1} µs/op");
    println!();
}
