use log::{error, info, LevelFilter};
use rocket::Error as RocketError;
use thiserror::Error;

/// Where to find the logging config if `EVOTING_LOG_CONFIG` is unset.
const DEFAULT_LOG_CONFIG: &str = "log4rs.yaml";

/// Errors that stop the server from launching at all.
#[derive(Debug, Error)]
enum LaunchError {
    #[error(transparent)]
    Rocket(#[from] RocketError),
}

async fn run() -> Result<(), LaunchError> {
    info!("Configuring e-voting server...");
    let rocket = evoting_backend::build().ignite().await?;
    info!("...server configured!");
    // Our own logger fairing takes over request logging from here.
    log4rs_dynamic_filters::DynamicLevelFilter::set("rocket", LevelFilter::Off);
    let _ = rocket.launch().await?;
    Ok(())
}

#[rocket::main]
async fn main() {
    let log_config =
        std::env::var("EVOTING_LOG_CONFIG").unwrap_or_else(|_| DEFAULT_LOG_CONFIG.to_string());
    log4rs::init_file(&log_config, log4rs_dynamic_filters::default_deserializers())
        .unwrap_or_else(|e| panic!("Failed to initialise logging from {log_config}: {e}"));
    info!("Initialised logging from {log_config}");

    if let Err(err) = run().await {
        error!("{err}");
        error!("Critical failure, shutting down");
        std::process::exit(1)
    }
}
