pub mod api;
pub mod auth;
pub mod config;
pub mod telemetry;
pub mod ui;

use color_eyre::eyre::{eyre, Result};
use eframe::egui;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::api::ApiClient;
use crate::auth::{AuthController, SessionStore};
use crate::config::AppConfig;
use crate::ui::IotViewApp;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let app_config = AppConfig::load_or_default().await?;
    info!("Using backend at {}", app_config.api_base_url);

    let api = ApiClient::new(app_config.api_base_url.clone());
    let mut auth = AuthController::new(api.clone(), SessionStore::new(), app_config.session_minutes);
    auth.begin_startup_check();

    info!("Starting UI");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default().with_inner_size([1100.0, 720.0]);

    eframe::run_native(
        "IoT Connect Viewer",
        native_options,
        Box::new(|cc| Ok(Box::new(IotViewApp::new(cc, app_config, api, auth)))),
    )
    .map_err(|e| eyre!("UI failed: {}", e))?;

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;

    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();
    Ok(())
}
