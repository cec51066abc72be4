use crate::config::{CardDef, HotspotId, SceneDef, SoundRef};

use super::quiz::{MissionReport, QuestionPrompt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    Ally,
    Villain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationLine {
    pub persona: Persona,
    pub speaker: String,
    pub text: String,
    /// Gated lines expect the player to advance them; the front-end reports
    /// that by calling `SceneCoordinator::dismiss_narration` exactly once.
    pub gated: bool,
}

pub trait NarrationPresenter {
    fn show(&mut self, line: &NarrationLine);
}

/// Scene-wide visual effects. Fire-and-forget; calls must be idempotent when
/// the effect is already in the requested state.
pub trait EffectsSurface {
    fn start_red_alert(&mut self);
    fn stop_red_alert(&mut self);
    fn show_glitch(&mut self);
    fn hide_glitch(&mut self);
    fn show_villain(&mut self);
    fn hide_villain(&mut self);
    fn start_victory_glow(&mut self);
    fn stop_victory_glow(&mut self);
}

/// Playback failures stay on the implementing side; the game never gates
/// progression on audio.
pub trait AudioSurface {
    fn play_sfx(&mut self, sound: &SoundRef);
    fn play_bgm(&mut self, sound: &SoundRef);
    fn stop_bgm(&mut self);
}

pub trait StageView {
    fn show_hub(&mut self, title: &str, cards: &[CardDef]);
    fn enter_scene(&mut self, scene: &SceneDef);
    fn leave_scene(&mut self);
    fn highlight_quiz_hotspot(&mut self, hotspot: &HotspotId);
    fn show_question(&mut self, prompt: &QuestionPrompt);
    fn show_report(&mut self, report: &MissionReport);
    fn close_quiz(&mut self);
}

pub trait ProgressSink {
    fn publish(&mut self, score: u32, percent: u8, scene_label: Option<&str>);
}

pub struct Frontend {
    pub narration: Box<dyn NarrationPresenter>,
    pub effects: Box<dyn EffectsSurface>,
    pub audio: Box<dyn AudioSurface>,
    pub stage: Box<dyn StageView>,
    pub progress: Box<dyn ProgressSink>,
}
