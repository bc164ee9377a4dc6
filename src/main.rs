mod app;
mod color;
mod state;
mod ui;

use std::path::Path;

use app::ChocoDashApp;
use choco_dash::data::PipelineConfig;
use eframe::egui;
use state::AppState;

/// Optional pipeline settings, read from the working directory.
const CONFIG_FILE: &str = "dashboard.json";
/// Opened on startup when present.
const DEFAULT_DATASET: &str = "Chocolatesales.csv";

fn main() -> eframe::Result {
    env_logger::init();

    let config = load_config(Path::new(CONFIG_FILE));
    let mut state = AppState::new(config);

    let default_path = Path::new(DEFAULT_DATASET);
    if default_path.exists() {
        if let Err(e) = state.open(default_path) {
            log::error!("Failed to load {DEFAULT_DATASET}: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Chocolate Sales Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(ChocoDashApp::new(state)))),
    )
}

fn load_config(path: &Path) -> PipelineConfig {
    if !path.exists() {
        return PipelineConfig::default();
    }
    match PipelineConfig::from_json_file(path) {
        Ok(config) => {
            log::info!("Using pipeline config from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("Ignoring {}: {e}", path.display());
            PipelineConfig::default()
        }
    }
}
