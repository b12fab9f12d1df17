//! LoLa Playground - CLI

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tracing::debug;

use lola_playground::io::{IoBridge, StdoutSink};
use lola_playground::samples::{self, SAMPLES};
use lola_playground::util::config::HostConfig;
use lola_playground::util::logger::{self, LogLevel};
use lola_playground::{read_source, Session, SessionExit, WasmGuest, NAME, VERSION};

/// Run LoLa programs on a WebAssembly build of the LoLa interpreter
#[derive(Parser, Debug)]
#[command(name = "lola-playground")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// More log output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the discovered one
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Interpreter module (.wasm or .wat)
    #[arg(long, value_name = "PATH", global = true)]
    module: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a LoLa source file
    Run {
        /// Source file to run
        #[arg(value_name = "FILE", required_unless_present = "sample")]
        file: Option<PathBuf>,

        /// Run a built-in sample instead
        #[arg(long, value_name = "N", conflicts_with = "file")]
        sample: Option<usize>,
    },

    /// Evaluate LoLa code from command line
    Eval {
        /// Code to evaluate
        #[arg(value_name = "CODE")]
        code: String,
    },

    /// Check source file for compile errors without running it
    Check {
        /// Source file to check
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List the built-in samples, or print one
    Samples {
        #[arg(value_name = "N")]
        index: Option<usize>,
    },

    /// Print version information
    Version,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<u8> {
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    let mut config = HostConfig::discover(args.config.as_deref(), &cwd)?;
    if let Some(module) = args.module {
        config.module.path = module;
    }
    init_logging(&config, args.verbose)?;

    match args.command {
        Commands::Run { file, sample } => {
            let source = match (file, sample) {
                (Some(file), _) => read_source(&file)?,
                (None, Some(index)) => sample_source(index)?.to_string(),
                (None, None) => bail!("either FILE or --sample is required"),
            };
            run_program(&config, &source)
        }
        Commands::Eval { code } => run_program(&config, &code),
        Commands::Check { file } => {
            let source = read_source(&file)?;
            let guest = load_guest(&config)?;
            let mut session = Session::from_config(guest, &config)?;
            let outcome = session.check(&source)?;
            if outcome.is_success() {
                eprintln!("{}", "Check passed!".green());
                Ok(0)
            } else {
                eprintln!("{} {}", "check failed:".red().bold(), outcome.describe());
                Ok(2)
            }
        }
        Commands::Samples { index } => {
            match index {
                Some(index) => print!("{}", sample_source(index)?),
                None => {
                    for (index, sample) in SAMPLES.iter().enumerate() {
                        println!("{:>2}  {}", index, sample.name);
                    }
                }
            }
            Ok(0)
        }
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
            Ok(0)
        }
    }
}

fn init_logging(
    config: &HostConfig,
    verbose: u8,
) -> Result<()> {
    let mut level = if cfg!(feature = "debug") {
        LogLevel::Debug
    } else {
        config.log.level()?
    };
    for _ in 0..verbose {
        level = level.more_verbose();
    }
    logger::init_with_level(level);
    Ok(())
}

fn sample_source(index: usize) -> Result<&'static str> {
    samples::find(index)
        .map(|sample| sample.source)
        .with_context(|| format!("No sample {} (there are {})", index, SAMPLES.len()))
}

fn load_guest(config: &HostConfig) -> Result<WasmGuest> {
    let path: &Path = &config.module.path;
    WasmGuest::load(path, &config.module, IoBridge::new(StdoutSink))
        .with_context(|| format!("Failed to load interpreter module: {}", path.display()))
}

fn run_program(
    config: &HostConfig,
    source: &str,
) -> Result<u8> {
    let guest = load_guest(config)?;
    let mut session = Session::from_config(guest, config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the event loop")?;

    let exit = runtime.block_on(session.run(source, tokio::io::stdin(), async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    }));
    // stdin reads block a worker thread that would otherwise hold up shutdown
    runtime.shutdown_background();
    let exit = exit?;
    debug!(?exit, "session ended");

    match exit {
        SessionExit::Rejected(outcome) => {
            eprintln!("{} {}", "failed to compile code:".red().bold(), outcome.describe());
        }
        SessionExit::Alarm(outcome) => {
            eprintln!("{} {}", "emulator failed:".red().bold(), outcome.describe());
        }
        SessionExit::Finished | SessionExit::Faulted(_) | SessionExit::Cancelled => {}
    }
    Ok(exit.exit_code())
}
