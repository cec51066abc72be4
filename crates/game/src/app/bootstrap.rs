use std::env;
use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vantage_engine::{
    load_game_config, parse_game_config, ConfigError, Frontend, GameConfig, SceneCoordinator,
};

use super::terminal::{
    TerminalAudio, TerminalEffects, TerminalNarrator, TerminalScoreline, TerminalStage,
};

const CONFIG_ENV_VAR: &str = "VANTAGE_CONFIG";
const DEMO_CONFIG: &str = include_str!("../../assets/demo.json");

pub(crate) struct AppWiring {
    pub(crate) coordinator: SceneCoordinator,
}

pub(crate) fn build_app() -> Result<AppWiring, ConfigError> {
    let config = load_config_from_env()?;
    info!(
        title = %config.meta.title,
        scenes = config.scenes.len(),
        "config_loaded"
    );

    let frontend = Frontend {
        narration: Box::new(TerminalNarrator::new(config.narrator.typing_delay())),
        effects: Box::new(TerminalEffects),
        audio: Box::new(TerminalAudio),
        stage: Box::new(TerminalStage),
        progress: Box::new(TerminalScoreline),
    };

    Ok(AppWiring {
        coordinator: SceneCoordinator::new(config, frontend),
    })
}

/// The embedded demo config ships inside the binary; `VANTAGE_CONFIG`
/// points at a JSON file to play something else.
fn load_config_from_env() -> Result<GameConfig, ConfigError> {
    match env::var(CONFIG_ENV_VAR) {
        Ok(path) => {
            let path = PathBuf::from(path);
            info!(path = %path.display(), "loading_config_file");
            load_game_config(&path)
        }
        Err(env::VarError::NotPresent) => parse_game_config(DEMO_CONFIG),
        Err(err) => {
            warn!(error = %err, "config_env_var_unreadable_using_demo");
            parse_game_config(DEMO_CONFIG)
        }
    }
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
