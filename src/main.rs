use std::process;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use scenectl::cli::{self, Cli, Commands};
use scenectl::config::StackConfig;
use scenectl::runtime::assets::HttpDownloader;
use scenectl::runtime::compose::{detect_engine, CliCompose, ContainerEngine};
use scenectl::runtime::environment;
use scenectl::runtime::health::HttpHealthProbe;
use scenectl::runtime::orchestrator::Orchestrator;
use scenectl::runtime::ports::{
    AutoConfirm, AutoDeny, ConflictPolicy, InteractivePrompt, TcpPortProbe,
};
use scenectl::runtime::supervisor::HostProcessRunner;

#[tokio::main]
async fn main() {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e)
            if e.kind() == ErrorKind::DisplayHelp || e.kind() == ErrorKind::DisplayVersion =>
        {
            print!("{}", e);
            return;
        }
        Err(e) => {
            // Unknown command or malformed invocation: usage plus exit 1
            eprint!("{}", e);
            process::exit(1);
        }
    };

    // Initialize logging
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    dotenvy::dotenv().ok();

    if !args.ignored_args().is_empty() {
        warn!("Ignoring unrecognized arguments: {:?}", args.ignored_args());
    }

    let config = StackConfig::from_env();
    let host = environment::probe();

    // Only start and stop invoke the container engine; for the other
    // commands the compose controller is constructed but never called.
    let engine = match args.command {
        Commands::Start(_) | Commands::Stop(_) => {
            match detect_engine(args.forced_engine()).await {
                Ok(engine) => engine,
                Err(e) => {
                    error!("{}", e);
                    process::exit(1);
                }
            }
        }
        _ => args.forced_engine().unwrap_or(ContainerEngine::Docker),
    };

    let policy: Arc<dyn ConflictPolicy> = if args.yes {
        Arc::new(AutoConfirm)
    } else if args.non_interactive {
        Arc::new(AutoDeny)
    } else {
        Arc::new(InteractivePrompt)
    };

    let orchestrator = Orchestrator::new(
        config,
        host,
        Arc::new(HttpDownloader::new()),
        Arc::new(HostProcessRunner),
        Arc::new(CliCompose::new(engine)),
        Arc::new(TcpPortProbe),
        policy,
        Arc::new(HttpHealthProbe::new()),
    );

    match args.command {
        Commands::Setup(_) => match orchestrator.setup().await {
            Ok(report) => print!("{}", cli::format_setup(&report)),
            Err(e) => {
                error!("Setup failed: {}", e);
                process::exit(1);
            }
        },
        Commands::Start(_) => match orchestrator.start(args.forced_mode()).await {
            Ok(report) => print!("{}", cli::format_start(&report)),
            Err(e) => {
                error!("Start failed: {}", e);
                process::exit(1);
            }
        },
        Commands::Stop(_) => {
            let report = orchestrator.stop().await;
            print!("{}", cli::format_stop(&report));
            if !report.failures.is_empty() {
                process::exit(1);
            }
        }
        Commands::Status(_) => {
            let snapshot = orchestrator.status().await;
            print!("{}", cli::format_status(&snapshot));
            print!("{}", cli::format_native_line(orchestrator.native_running().await));
        }
    }
}
