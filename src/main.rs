use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use game_of_life_rows::{run_threaded, LifeError, SimulationConfig, TextSink};

const USAGE: &str = "\
Usage:
  game_of_life_rows [options]
  mpirun -n N game_of_life_rows --mpi [options]

Options:
  --config <file>        JSON configuration (see --example-config)
  --workers <n>          worker threads (default: available cores, at most one per row)
  --width <n>            cells per row
  --height <n>           number of rows
  --iterations <n>       generations to run
  --output-every <n>     write the whole grid every n generations
  --output <file>        where those grids go (default: stdout)
  --mpi                  run one worker per MPI rank
  --example-config       print the default configuration and exit";

struct Args {
    config: SimulationConfig,
    workers: Option<usize>,
    output: Option<PathBuf>,
    mpi: bool,
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("{flag} requires a value"))?;
    value
        .parse()
        .map_err(|_| format!("{flag} requires a non-negative integer, got {value}"))
}

fn parse_args(argv: &[String]) -> Result<Option<Args>, String> {
    // The config file is read first so that the other flags override it.
    let mut config = match argv.iter().position(|a| a == "--config") {
        Some(i) => {
            let path = argv.get(i + 1).ok_or("--config requires a value")?;
            let text = fs::read_to_string(path).map_err(|e| format!("could not read {path}: {e}"))?;
            serde_json::from_str(&text).map_err(|e| format!("could not parse {path}: {e}"))?
        }
        None => SimulationConfig::default(),
    };
    let mut workers = None;
    let mut output = None;
    let mut mpi = false;

    let mut i = 1;
    while i < argv.len() {
        let flag = argv[i].as_str();
        let value = argv.get(i + 1);
        match flag {
            "--config" => i += 1,
            "--workers" => {
                workers = Some(parse_number(flag, value)?);
                i += 1;
            }
            "--width" => {
                config.width = parse_number(flag, value)?;
                i += 1;
            }
            "--height" => {
                config.height = parse_number(flag, value)?;
                i += 1;
            }
            "--iterations" => {
                config.iterations = parse_number(flag, value)?;
                i += 1;
            }
            "--output-every" => {
                config.output_every = Some(parse_number(flag, value)?);
                i += 1;
            }
            "--output" => {
                output = Some(PathBuf::from(value.ok_or("--output requires a value")?));
                i += 1;
            }
            "--mpi" => mpi = true,
            "--example-config" => {
                let text = serde_json::to_string_pretty(&SimulationConfig::default())
                    .map_err(|e| e.to_string())?;
                println!("{text}");
                return Ok(None);
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                return Ok(None);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    Ok(Some(Args {
        config,
        workers,
        output,
        mpi,
    }))
}

fn sink_for(output: Option<&PathBuf>) -> Result<TextSink, LifeError> {
    let sink = TextSink::stdout();
    Ok(match output {
        Some(path) => sink.with_snapshots(Box::new(BufWriter::new(File::create(path)?))),
        None => sink.with_snapshots(Box::new(std::io::stdout())),
    })
}

/// One worker per core, but never more workers than rows.
fn default_workers(cores: usize, height: usize) -> usize {
    cores.min(height).max(1)
}

fn run_local(args: &Args) -> Result<(), LifeError> {
    let workers = args.workers.unwrap_or_else(|| {
        let cores = thread::available_parallelism().map_or(1, |n| n.get());
        default_workers(cores, args.config.height)
    });
    let mut sink = sink_for(args.output.as_ref())?;
    run_threaded(&args.config, workers, &mut sink)?;
    Ok(())
}

#[cfg(feature = "mpi")]
fn run_mpi(args: &Args) -> Result<(), LifeError> {
    use game_of_life_rows::comm::{Communicator, MpiComm};
    use game_of_life_rows::{worker, NullSink};
    use log::error;

    let comm = match MpiComm::init() {
        Some(comm) => comm,
        None => {
            eprintln!("ERROR: MPI was already initialized");
            std::process::abort();
        }
    };
    // Only the coordinator opens the output file.
    if comm.is_coordinator() {
        let mut sink = match sink_for(args.output.as_ref()) {
            Ok(sink) => sink,
            Err(err) => {
                error!("{err}");
                comm.abort();
                return Err(err);
            }
        };
        worker::run(&args.config, &comm, &mut sink)?;
    } else {
        worker::run(&args.config, &comm, &mut NullSink)?;
    }
    Ok(())
}

#[cfg(not(feature = "mpi"))]
fn run_mpi(_args: &Args) -> Result<(), LifeError> {
    Err(LifeError::Config(game_of_life_rows::ConfigError::MpiUnavailable))
}

fn main() -> ExitCode {
    env_logger::init();

    let argv: Vec<String> = std::env::args().collect();
    let args = match parse_args(&argv) {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("ERROR: {message}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let result = if args.mpi { run_mpi(&args) } else { run_local(&args) };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
