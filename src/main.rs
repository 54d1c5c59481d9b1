use std::process::ExitCode;

pub mod config;
use config::app_config::load_config;
pub mod http_probe;
pub mod metrics;
pub mod remote_write;
pub mod run;
use run::{RunError, run};

async fn handle_request() -> Result<(), RunError> {
    log::info!("Starting to get API status...");

    let config = load_config()?;
    run(&config).await?;

    log::info!("API status has been sent successfully");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match handle_request().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
