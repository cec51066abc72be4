use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use super::types::{GameConfig, HotspotAction, HotspotDef, SceneDef, SceneKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read game config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse game config: {detail}")]
    Parse { detail: String },
    #[error("invalid game config: {detail}")]
    Invalid { detail: String },
}

pub fn load_game_config(path: &Path) -> Result<GameConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_game_config(&raw)
}

pub fn parse_game_config(raw: &str) -> Result<GameConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config: GameConfig = match serde_path_to_error::deserialize(&mut deserializer) {
        Ok(config) => config,
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            let detail = if path.is_empty() || path == "." {
                source.to_string()
            } else {
                format!("{source} (at {path})")
            };
            return Err(ConfigError::Parse { detail });
        }
    };
    validate_game_config(&config)?;
    Ok(config)
}

fn validation_err(path: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        detail: format!("at {path}: {}", message.into()),
    }
}

fn expected_actual(path: &str, expected: impl Display, actual: impl Display) -> ConfigError {
    validation_err(path, format!("expected {expected}, got {actual}"))
}

fn validate_game_config(config: &GameConfig) -> Result<(), ConfigError> {
    if config.scenes.is_empty() {
        return Err(validation_err("scenes", "at least one scene is required"));
    }

    let mut scene_ids = HashSet::new();
    for (scene_index, scene) in config.scenes.iter().enumerate() {
        if !scene_ids.insert(&scene.id) {
            return Err(validation_err(
                &format!("scenes[{scene_index}].id"),
                format!("duplicate scene id '{}'", scene.id),
            ));
        }
    }

    let hub_count = config
        .scenes
        .iter()
        .filter(|scene| scene.is_hub())
        .count();
    if hub_count != 1 {
        return Err(expected_actual("scenes", "exactly one hub scene", hub_count));
    }

    let mut hotspot_owners: HashMap<&str, &str> = HashMap::new();
    for (scene_index, scene) in config.scenes.iter().enumerate() {
        validate_scene(config, scene, scene_index, &mut hotspot_owners)?;
    }

    Ok(())
}

fn validate_scene<'a>(
    config: &'a GameConfig,
    scene: &'a SceneDef,
    scene_index: usize,
    hotspot_owners: &mut HashMap<&'a str, &'a str>,
) -> Result<(), ConfigError> {
    for (card_index, card) in scene.cards.iter().enumerate() {
        let path = format!("scenes[{scene_index}].cards[{card_index}].target");
        match config.scene(&card.target) {
            None => {
                return Err(validation_err(
                    &path,
                    format!("target scene '{}' does not exist", card.target),
                ));
            }
            Some(target) if target.kind == SceneKind::Hub => {
                return Err(validation_err(
                    &path,
                    format!("target scene '{}' is the hub itself", card.target),
                ));
            }
            Some(_) => {}
        }
    }

    if scene.is_hub() {
        if scene.cards.is_empty() {
            warn!(scene = %scene.id, "hub_without_cards");
        }
        if !scene.hotspots.is_empty() || scene.event.is_some() {
            warn!(scene = %scene.id, "hub_with_panorama_content");
        }
        return Ok(());
    }

    let mut quiz_count = 0;
    for (hotspot_index, hotspot) in scene.hotspots.iter().enumerate() {
        let path = format!("scenes[{scene_index}].hotspots[{hotspot_index}]");
        if let Some(owner) = hotspot_owners.insert(hotspot.id.as_str(), scene.id.as_str()) {
            return Err(validation_err(
                &format!("{path}.id"),
                format!(
                    "duplicate hotspot id '{}' (already used in scene '{owner}')",
                    hotspot.id
                ),
            ));
        }
        match hotspot.action {
            HotspotAction::Dialog => {
                if hotspot.text.as_deref().unwrap_or("").is_empty() {
                    warn!(scene = %scene.id, hotspot = %hotspot.id, "dialog_hotspot_without_text");
                }
            }
            HotspotAction::Quiz => {
                quiz_count += 1;
                if hotspot.questions.is_empty() {
                    warn!(scene = %scene.id, hotspot = %hotspot.id, "quiz_hotspot_without_questions");
                }
                validate_questions(hotspot, &path)?;
            }
        }
    }

    if quiz_count > 1 {
        warn!(scene = %scene.id, quiz_count, "scene_with_multiple_quiz_hotspots");
    }
    if scene.event.is_some() && quiz_count == 0 {
        warn!(scene = %scene.id, "event_unreachable_without_quiz_hotspot");
    }

    Ok(())
}

fn validate_questions(hotspot: &HotspotDef, hotspot_path: &str) -> Result<(), ConfigError> {
    for (question_index, question) in hotspot.questions.iter().enumerate() {
        let path = format!("{hotspot_path}.questions[{question_index}]");
        if question.options.is_empty() {
            return Err(validation_err(&path, "question has no options"));
        }
        // A question with no correct option can never be answered, which
        // strands the quiz mid-run.
        if !question.options.iter().any(|option| option.correct) {
            return Err(validation_err(&path, "question has no correct option"));
        }
    }
    Ok(())
}
