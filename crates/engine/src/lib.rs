pub mod app;
pub mod config;

pub use app::{
    accuracy, AudioSurface, EffectsSurface, EventSequencer, Frontend, MissionReport, NarrationLine,
    NarrationPresenter, OptionView, Persona, ProgressSink, ProgressStore, QuestionPrompt,
    QuizError, QuizSession, QuizSignal, QuizStep, ReportStatus, SceneCoordinator, SequenceOutcome,
    SequencePhase, SequenceTick, StageEffect, StageView,
};
pub use config::{
    load_game_config, parse_game_config, CardDef, ConfigError, EventDef, EventKind, GameConfig,
    GameplayConfig, HotspotAction, HotspotDef, HotspotId, MetaConfig, NarratorConfig, OptionDef,
    QuestionDef, SceneDef, SceneId, SceneKind, SequenceTimings, SoundRef,
};
