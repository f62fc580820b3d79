//! Load Control simulator entry point: CLI wiring and config-driven engine
//! construction.

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::EnvFilter;

use bacnet_shed::config::ScenarioConfig;
use bacnet_shed::io::export::export_csv;
use bacnet_shed::sim::engine::Engine;
use bacnet_shed::sim::kpi::ShedReport;

/// Where the scenario comes from.
enum Source {
    Baseline,
    Preset(String),
    File(PathBuf),
}

/// Parsed CLI arguments.
struct CliArgs {
    source: Source,
    seed: Option<u64>,
    telemetry_out: Option<PathBuf>,
    #[cfg(feature = "api")]
    serve: Option<u16>,
}

const USAGE: &str = "\
bacnet-shed: BACnet Load Control demand-response simulator

Usage: bacnet-shed [OPTIONS]

Options:
  --scenario <path>        Load scenario from TOML config file
  --preset <name>          Use a built-in preset
  --seed <u64>             Override random seed
  --telemetry-out <path>   Export step results to CSV
  --serve                  Start REST API server after simulation (feature `api`)
  --port <u16>             API server port (default: 3000)
  --help                   Show this help message

Without --scenario or --preset the baseline preset runs.
Log verbosity follows RUST_LOG (default: info).";

enum Parsed {
    Run(CliArgs),
    Help,
}

fn value_of(args: &mut impl Iterator<Item = String>, flag: &str, what: &str) -> Result<String, String> {
    args.next()
        .ok_or_else(|| format!("error: {flag} requires {what}"))
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Parsed, String> {
    let mut cli = CliArgs {
        source: Source::Baseline,
        seed: None,
        telemetry_out: None,
        #[cfg(feature = "api")]
        serve: None,
    };
    let mut port: u16 = 3000;
    let mut serve = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Parsed::Help),
            "--scenario" => {
                cli.source = Source::File(value_of(&mut args, &arg, "a path argument")?.into());
            }
            "--preset" => {
                cli.source = Source::Preset(value_of(&mut args, &arg, "a name argument")?);
            }
            "--seed" => {
                let raw = value_of(&mut args, &arg, "a u64 argument")?;
                cli.seed = Some(
                    raw.parse()
                        .map_err(|_| format!("error: --seed value \"{raw}\" is not a valid u64"))?,
                );
            }
            "--telemetry-out" => {
                cli.telemetry_out = Some(value_of(&mut args, &arg, "a path argument")?.into());
            }
            "--serve" => serve = true,
            "--port" => {
                let raw = value_of(&mut args, &arg, "a u16 argument")?;
                port = raw
                    .parse()
                    .map_err(|_| format!("error: --port value \"{raw}\" is not a valid u16"))?;
            }
            other => return Err(format!("error: unknown argument \"{other}\"\n\n{USAGE}")),
        }
    }

    #[cfg(feature = "api")]
    {
        cli.serve = serve.then_some(port);
    }
    #[cfg(not(feature = "api"))]
    if serve {
        let _ = port;
        return Err("error: --serve needs the `api` feature".to_string());
    }

    Ok(Parsed::Run(cli))
}

fn load(source: &Source) -> Result<ScenarioConfig, String> {
    let scenario = match source {
        Source::Baseline => ScenarioConfig::baseline(),
        Source::Preset(name) => ScenarioConfig::from_preset(name).map_err(|e| e.to_string())?,
        Source::File(path) => ScenarioConfig::from_toml_file(path).map_err(|e| e.to_string())?,
    };
    Ok(scenario)
}

fn run(cli: CliArgs) -> Result<(), String> {
    let mut scenario = load(&cli.source)?;
    if let Some(seed) = cli.seed {
        scenario.simulation.seed = seed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(lines.join("\n"));
    }

    let mut engine = Engine::from_scenario(&scenario).map_err(|e| e.to_string())?;
    let results = engine.run();

    for r in results.iter().filter(|r| r.transition.is_some()) {
        println!("{r}");
    }
    let report = ShedReport::from_results(&results, scenario.policy.control_priority.get());
    println!("\n{report}");

    if let Some(path) = &cli.telemetry_out {
        export_csv(&results, path).map_err(|e| format!("error: failed to write CSV: {e}"))?;
        info!(path = %path.display(), rows = results.len(), "telemetry written");
    }

    #[cfg(feature = "api")]
    if let Some(port) = cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(bacnet_shed::api::AppState::new(engine, results));
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| format!("error: failed to create tokio runtime: {e}"))?;
        rt.block_on(bacnet_shed::api::serve(state, addr))
            .map_err(|e| format!("error: API server failed: {e}"))?;
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let outcome = match parse_args(std::env::args().skip(1)) {
        Ok(Parsed::Help) => {
            eprintln!("{USAGE}");
            eprintln!("\nPresets: {}", ScenarioConfig::PRESETS.join(", "));
            return ExitCode::SUCCESS;
        }
        Ok(Parsed::Run(cli)) => run(cli),
        Err(message) => Err(message),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
