use std::{path::Path, process::ExitCode};

use anyhow::{Context, Error};
use clap::Parser;
use log::{error, info, warn, LevelFilter};

use storage_api::{
    constants::STAGING_DEVICEGRAPH,
    error::{StorageError, StorageResultExt},
    Devicegraph,
};
use storage_ng::{
    cli::{Cli, Commands},
    config, ExitKind, FileLog, MultiLogger, Storage,
};

/// Creates a storage session and fills its staging devicegraph from a layout
/// file.
fn load_staging(layout: &Path, environment: Option<&Path>) -> Result<Storage, StorageError> {
    let environment =
        config::load_environment(environment).message("Failed to load environment")?;
    let layout = config::load_layout(layout).message("Failed to load layout")?;

    let mut storage = Storage::new(environment).message("Failed to create storage session")?;
    let devicegraph = Devicegraph::try_from(&layout)
        .map_err(StorageError::from)
        .message("Failed to build devicegraph from layout")?;

    let staging = if storage.exist_devicegraph(STAGING_DEVICEGRAPH) {
        storage.staging_mut()?
    } else {
        storage.create_devicegraph(STAGING_DEVICEGRAPH)?
    };
    *staging = devicegraph;

    tracing::info!(
        metric_name = "layout_loaded",
        device_count = staging.num_devices()
    );

    Ok(storage)
}

fn run(args: &Cli) -> Result<ExitKind, StorageError> {
    info!("Storage-ng version: {}", storage_ng::STORAGE_NG_VERSION);

    let res = match &args.command {
        Commands::Show {
            layout,
            environment,
        } => {
            let storage = load_staging(layout, environment.as_deref())?;
            print!("{}", storage.staging()?);
            Ok(ExitKind::Done)
        }

        Commands::Check {
            layout,
            environment,
        } => {
            let storage = load_staging(layout, environment.as_deref())?;
            let issues = storage.staging()?.check();
            if issues.is_empty() {
                println!("No issues found");
                return Ok(ExitKind::Done);
            }

            for issue in &issues {
                println!("{issue}");
            }
            warn!("Found {} issue(s) in '{}'", issues.len(), layout.display());
            Ok(ExitKind::IssuesFound)
        }

        Commands::Environment { environment } => {
            let environment = config::load_environment(environment.as_deref())
                .message("Failed to load environment")?;
            match serde_yaml::to_string(&environment) {
                Ok(yaml) => print!("{yaml}"),
                Err(e) => error!("Failed to serialize environment: {e}"),
            }
            Ok(ExitKind::Done)
        }
    };

    res.message(format!("Failed to execute '{}' command", args.command))
}

fn setup_logging(args: &Cli) -> Result<(), Error> {
    let mut multilogger = MultiLogger::new()
        // Add regular env_logger to output to stderr
        .with_logger(Box::new(
            env_logger::builder()
                .format_timestamp(None)
                .filter_level(args.verbosity)
                .build(),
        ));

    // Graph mutations are traced for every device. The filter applies to all
    // sinks, so the log file only gets them at trace verbosity too.
    if args.verbosity < LevelFilter::Trace {
        multilogger =
            multilogger.with_global_filter("storage_api::devicegraph::graph", LevelFilter::Debug);
    }

    if let Some(log_file) = &args.log_file {
        multilogger.add_logger(FileLog::new(log_file).into_logger());
    }

    multilogger.init().context("Logger already registered")?;

    Ok(())
}

fn setup_tracing(args: &Cli) -> Result<(), Error> {
    use tracing_subscriber::{filter, layer::SubscriberExt, Layer};

    if args.trace {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter::LevelFilter::INFO);

        tracing::subscriber::set_global_default(
            tracing_subscriber::Registry::default().with(json_layer),
        )
        .context("Failed to set global default subscriber")?;
    }

    Ok(())
}

fn main() -> ExitCode {
    // Parse args
    let args = Cli::parse();

    // Initialize the loggers
    if let Err(e) = setup_logging(&args) {
        eprintln!("Failed to initialize logging: {e:?}");
        return ExitCode::from(1);
    }

    // Initialize the telemetry flow
    if let Err(e) = setup_tracing(&args) {
        error!("Failed to initialize tracing: {e:?}");
        return ExitCode::from(1);
    }

    match run(&args) {
        Ok(ExitKind::Done) => ExitCode::SUCCESS,
        Ok(ExitKind::IssuesFound) => ExitCode::from(3),
        Err(e) => {
            error!("Storage-ng failed: {e:?}");
            if let Some(error_path) = &args.error {
                if let Err(e2) = storage_ng::write_error_report(error_path, &e) {
                    error!("{e2:?}");
                }
            }
            ExitCode::from(2)
        }
    }
}
