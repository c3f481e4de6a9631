//! Application startup: configuration, logging, then the pipeline drill

use super::cli::args::Args;
use super::cli::config::{FileConfig, Settings};
use super::drill::{run_drill, DrillError};
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownCoordinator;
use crate::core::version;
use clap::Parser;

/// Initialize application startup and run the drill
pub async fn startup() {
    let args = Args::parse();

    // Logging is not up yet, so configuration problems go to stderr
    let loaded = match FileConfig::discover(args.config_file.clone()).await {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let file_config = loaded
        .as_ref()
        .map(|(_, config)| config.clone())
        .unwrap_or_default();

    let settings = match Settings::resolve(&args, &file_config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&settings.log) {
        eprintln!("Error: failed to initialise logging: {}", e);
        std::process::exit(1);
    }

    log::info!("{}", version::banner());
    if let Some((path, _)) = &loaded {
        log::debug!("Loaded configuration from {}", path.display());
    }
    log::debug!("Resolved settings: {:?}", settings);

    let drill = settings.drill;
    let result = ShutdownCoordinator::guard_with_coordinator(|coordinator, shutdown_rx| async move {
        let report = run_drill(&drill, shutdown_rx).await?;
        Ok::<_, DrillError>((report, coordinator.is_shutdown_requested()))
    })
    .await;

    match result {
        Ok((report, true)) => {
            log::warn!("Drill interrupted: {}", report);
        }
        Ok((report, false)) if !report.is_complete() => {
            log::error!("Drill lost messages: {}", report);
            std::process::exit(2);
        }
        Ok(_) => {}
        Err(e) => {
            log::error!("Drill failed: {}", e);
            std::process::exit(1);
        }
    }
}
