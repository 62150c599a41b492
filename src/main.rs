mod app;
mod checkout;
mod config;
mod domain;
mod insights;
mod pagination;
mod payment;
mod provider;
mod records;
mod task_board;

use app::{APP_NAME, DonorDeskApp};
use config::AppConfig;
use eframe::NativeOptions;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "donor_desk=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> eframe::Result<()> {
    init_tracing();

    let (config, config_warning) = match AppConfig::from_env() {
        Ok(config) => (config, None),
        Err(err) => {
            warn!(error = %err, "invalid configuration; using defaults");
            (
                AppConfig::default(),
                Some(format!("Configuration ignored: {err}")),
            )
        }
    };
    info!(model = %config.insights.model, "starting {APP_NAME}");

    let options = NativeOptions::default();
    eframe::run_native(
        APP_NAME,
        options,
        Box::new(|cc| Ok(Box::new(DonorDeskApp::new(cc, config, config_warning)))),
    )
}
