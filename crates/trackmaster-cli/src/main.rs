//! `trackmaster` binary: simulator, reading validator and config dump

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use trackmaster_core::{LocationValidator, Reading, TrackerConfig};
use trackmaster_location::test_harness::{run_simulation, SimulationConfig, TestHarness};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("trackmaster")
        .version(trackmaster_core::VERSION)
        .about("TrackMaster location session tooling")
        .subcommand_required(true)
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("JSON logs and JSON output"),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run a tracking session against a simulated platform")
                .arg(
                    Arg::new("readings")
                        .long("readings")
                        .default_value("100")
                        .value_parser(value_parser!(u64))
                        .help("Number of platform callbacks to deliver"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("native")
                        .long("native")
                        .action(ArgAction::SetTrue)
                        .help("Simulate a native shell (background backend)"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .help("Tracker config file (TOML)"),
                ),
        )
        .subcommand(
            Command::new("certify")
                .about("Run the simulator over a range of seeds on both backends")
                .arg(
                    Arg::new("seeds")
                        .long("seeds")
                        .default_value("20")
                        .value_parser(value_parser!(u64))
                        .help("Number of seeds per backend"),
                )
                .arg(
                    Arg::new("readings")
                        .long("readings")
                        .default_value("100")
                        .value_parser(value_parser!(u64))
                        .help("Callbacks per run"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a single reading against the coordinate bounds")
                .arg(
                    Arg::new("lat")
                        .long("lat")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("lon")
                        .long("lon")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("accuracy")
                        .long("accuracy")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f64)),
                )
                .arg(
                    Arg::new("altitude")
                        .long("altitude")
                        .allow_negative_numbers(true)
                        .value_parser(value_parser!(f64)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Print the effective tracker config as TOML")
                .arg(
                    Arg::new("path")
                        .long("path")
                        .help("Config file to load (defaults if absent)"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&String>) -> Result<TrackerConfig> {
    let config = match path {
        Some(path) => TrackerConfig::load(path)
            .with_context(|| format!("failed to load tracker config from {path}"))?,
        None => TrackerConfig::default(),
    };
    config.validate().context("invalid tracker config")?;
    Ok(config)
}

async fn simulate(args: &ArgMatches, json: bool) -> Result<bool> {
    let config = SimulationConfig {
        seed: args.get_one::<u64>("seed").copied().unwrap_or(42),
        readings: args.get_one::<u64>("readings").copied().unwrap_or(100),
        native: args.get_flag("native"),
        tracker: load_config(args.get_one::<String>("config"))?,
        ..SimulationConfig::default()
    };
    tracing::info!(seed = config.seed, readings = config.readings, native = config.native, "running simulation");

    let report = run_simulation(config).await;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to encode report")?
        );
    } else {
        println!("{}", report.generate_text());
    }
    Ok(report.passed())
}

async fn certify(args: &ArgMatches, json: bool) -> Result<bool> {
    let seeds = args.get_one::<u64>("seeds").copied().unwrap_or(20);
    let readings = args.get_one::<u64>("readings").copied().unwrap_or(100);

    let report = TestHarness::run_certification(seeds, readings).await;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to encode report")?
        );
    } else {
        println!("Runs: {}", report.runs);
        println!("Violations: {}", report.total_violations);
        println!("Result: {}", if report.passed { "PASS" } else { "FAIL" });
    }
    Ok(report.passed)
}

fn validate(args: &ArgMatches, json: bool) -> Result<bool> {
    let coord = |name: &str| {
        args.get_one::<f64>(name)
            .copied()
            .with_context(|| format!("missing --{name}"))
    };
    let mut reading = Reading::new(coord("lat")?, coord("lon")?, coord("accuracy")?);
    if let Some(altitude) = args.get_one::<f64>("altitude") {
        reading = reading.with_altitude(*altitude);
    }

    let verdict = LocationValidator::check(&reading);
    if json {
        let value = serde_json::json!({
            "reading": reading,
            "valid": verdict.is_ok(),
            "reason": verdict.as_ref().err().map(ToString::to_string),
        });
        println!("{value}");
    } else {
        match &verdict {
            Ok(()) => println!("valid: {reading}"),
            Err(e) => println!("invalid: {e}"),
        }
    }
    Ok(verdict.is_ok())
}

fn print_config(args: &ArgMatches) -> Result<bool> {
    let config = load_config(args.get_one::<String>("path"))?;
    print!(
        "{}",
        config.to_toml_string().context("failed to render config")?
    );
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let json = matches.get_flag("json");
    init_tracing(json);

    let ok = match matches.subcommand() {
        Some(("simulate", args)) => simulate(args, json).await?,
        Some(("certify", args)) => certify(args, json).await?,
        Some(("validate", args)) => validate(args, json)?,
        Some(("config", args)) => print_config(args)?,
        _ => true,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
