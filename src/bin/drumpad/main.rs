//! drumpad - terminal drum pad
//!
//! Run with: cargo run --bin drumpad
//!
//! Keys: `a s d f g h j k l ;` play the ten pads (hold Shift for an accent),
//! Space toggles the metronome, `r` records, `q` quits. The help bar lists
//! the rest.

mod host;
mod ui;

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing_subscriber::EnvFilter;

use drumpad::{settings::JsonFileStore, Engine, EngineConfig, APP_NAME};

use host::CpalHost;
use ui::{PadApp, UiFeedback};

fn main() -> EyreResult<()> {
    color_eyre::install()?;

    let dir = app_dir();
    init_tracing(&dir)?;

    let config = load_config(&dir)?;
    let (host, scope_rx) = CpalHost::default_output()?;
    let feedback = UiFeedback::default();

    let engine = Engine::new(config, host)
        .with_settings(JsonFileStore::open(dir.join("settings.json")))
        .with_feedback(feedback.clone());

    let mut terminal = ratatui::init();
    let result = PadApp::new(engine, feedback, scope_rx, dir).run(&mut terminal);
    ratatui::restore();
    result
}

/// `<config dir>/drumpad`, or the working directory without one.
fn app_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Logs go to a file so they never tear the TUI.
fn init_tracing(dir: &Path) -> EyreResult<()> {
    fs::create_dir_all(dir).wrap_err("failed to create app directory")?;
    let file = fs::File::create(dir.join("drumpad.log")).wrap_err("failed to create log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Optional `config.json` next to the settings; missing keys keep their defaults.
fn load_config(dir: &Path) -> EyreResult<EngineConfig> {
    let path = dir.join("config.json");
    match fs::read_to_string(&path) {
        Ok(text) => serde_json::from_str(&text)
            .wrap_err_with(|| format!("invalid config file {}", path.display())),
        Err(_) => Ok(EngineConfig::default()),
    }
}
