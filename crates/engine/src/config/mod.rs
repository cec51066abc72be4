mod loader;
mod types;

pub use loader::{load_game_config, parse_game_config, ConfigError};
pub use types::{
    CardDef, EventDef, EventKind, GameConfig, GameplayConfig, HotspotAction, HotspotDef,
    HotspotId, MetaConfig, NarratorConfig, OptionDef, QuestionDef, SceneDef, SceneId, SceneKind,
    SequenceTimings, SoundRef,
};
