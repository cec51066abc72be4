use std::fmt;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_TYPING_SPEED_MS: u64 = 24;
const DEFAULT_POINTS_PER_HOTSPOT: u32 = 10;
const DEFAULT_POINTS_QUIZ_COMPLETE: u32 = 50;
const DEFAULT_ALARM_TO_GLITCH_MS: u64 = 2000;
const DEFAULT_GLITCH_TO_SPRITE_MS: u64 = 1500;
const DEFAULT_SPRITE_TO_SPEECH_MS: u64 = 800;
const DEFAULT_HUB_GREETING_DELAY_MS: u64 = 1200;
const DEFAULT_IDLE_GREETING: &str = "Systems idle. Pick a sector when you are ready.";
const DEFAULT_QUIZ_UNLOCKED: &str = "Sweep complete. The assessment terminal is unlocked.";
const DEFAULT_LOCKED_MESSAGE: &str = "Survey the whole sector before the terminal will respond.";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct SceneId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct HotspotId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SoundRef(pub String);

impl SceneId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl HotspotId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl SoundRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for HotspotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SoundRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub meta: MetaConfig,
    pub narrator: NarratorConfig,
    #[serde(default)]
    pub gameplay: GameplayConfig,
    #[serde(default)]
    pub timings: SequenceTimings,
    pub scenes: Vec<SceneDef>,
}

impl GameConfig {
    pub fn scene(&self, id: &SceneId) -> Option<&SceneDef> {
        self.scenes.iter().find(|scene| &scene.id == id)
    }

    pub fn hub_scene(&self) -> Option<&SceneDef> {
        self.scenes.iter().find(|scene| scene.is_hub())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetaConfig {
    pub title: String,
    #[serde(default)]
    pub menu_bgm: Option<SoundRef>,
    #[serde(default)]
    pub start_sound: Option<SoundRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NarratorConfig {
    pub ally_name: String,
    pub villain_name: String,
    #[serde(default = "default_typing_speed_ms")]
    pub typing_speed_ms: u64,
    pub intro_text: String,
    #[serde(default = "default_idle_greeting")]
    pub idle_greeting: String,
    #[serde(default = "default_quiz_unlocked")]
    pub quiz_unlocked: String,
    #[serde(default = "default_locked_message")]
    pub locked_message: String,
}

impl NarratorConfig {
    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_speed_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameplayConfig {
    #[serde(default = "default_points_per_hotspot")]
    pub points_per_hotspot: u32,
    #[serde(default = "default_points_quiz_complete")]
    pub points_quiz_complete: u32,
    #[serde(default = "default_true")]
    pub require_exploration_to_quiz: bool,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            points_per_hotspot: DEFAULT_POINTS_PER_HOTSPOT,
            points_quiz_complete: DEFAULT_POINTS_QUIZ_COMPLETE,
            require_exploration_to_quiz: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SequenceTimings {
    #[serde(default = "default_alarm_to_glitch_ms")]
    pub alarm_to_glitch_ms: u64,
    #[serde(default = "default_glitch_to_sprite_ms")]
    pub glitch_to_sprite_ms: u64,
    #[serde(default = "default_sprite_to_speech_ms")]
    pub sprite_to_speech_ms: u64,
    #[serde(default = "default_hub_greeting_delay_ms")]
    pub hub_greeting_delay_ms: u64,
}

impl SequenceTimings {
    pub fn alarm_to_glitch(&self) -> Duration {
        Duration::from_millis(self.alarm_to_glitch_ms)
    }

    pub fn glitch_to_sprite(&self) -> Duration {
        Duration::from_millis(self.glitch_to_sprite_ms)
    }

    pub fn sprite_to_speech(&self) -> Duration {
        Duration::from_millis(self.sprite_to_speech_ms)
    }

    pub fn hub_greeting_delay(&self) -> Duration {
        Duration::from_millis(self.hub_greeting_delay_ms)
    }
}

impl Default for SequenceTimings {
    fn default() -> Self {
        Self {
            alarm_to_glitch_ms: DEFAULT_ALARM_TO_GLITCH_MS,
            glitch_to_sprite_ms: DEFAULT_GLITCH_TO_SPRITE_MS,
            sprite_to_speech_ms: DEFAULT_SPRITE_TO_SPEECH_MS,
            hub_greeting_delay_ms: DEFAULT_HUB_GREETING_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    Hub,
    Panorama,
}

impl Default for SceneKind {
    fn default() -> Self {
        SceneKind::Panorama
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneDef {
    pub id: SceneId,
    #[serde(default, rename = "type")]
    pub kind: SceneKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub ambience: Option<SoundRef>,
    #[serde(default)]
    pub narrator_intro: Option<String>,
    #[serde(default)]
    pub hotspots: Vec<HotspotDef>,
    #[serde(default)]
    pub event: Option<EventDef>,
    #[serde(default)]
    pub cards: Vec<CardDef>,
}

impl SceneDef {
    pub fn is_hub(&self) -> bool {
        self.kind == SceneKind::Hub
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.id.as_str())
    }

    pub fn quiz_hotspot(&self) -> Option<&HotspotDef> {
        self.hotspots
            .iter()
            .find(|hotspot| hotspot.action == HotspotAction::Quiz)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotspotAction {
    Dialog,
    Quiz,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HotspotDef {
    pub id: HotspotId,
    pub action: HotspotAction,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub locked_message: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionDef>,
}

impl HotspotDef {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(self.id.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    VillainAppears,
}

impl Default for EventKind {
    fn default() -> Self {
        EventKind::VillainAppears
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventDef {
    #[serde(default)]
    pub kind: EventKind,
    #[serde(default)]
    pub alarm_sound: Option<SoundRef>,
    #[serde(default)]
    pub victory_sound: Option<SoundRef>,
    pub villain_speech: String,
    pub ally_alert: String,
    pub villain_defeat: String,
    pub victory_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuestionDef {
    pub text: String,
    pub options: Vec<OptionDef>,
    #[serde(default)]
    pub feedback_correct: Option<String>,
    #[serde(default)]
    pub feedback_wrong: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OptionDef {
    pub text: String,
    #[serde(default)]
    pub correct: bool,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardDef {
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub target: SceneId,
}

fn default_idle_greeting() -> String {
    DEFAULT_IDLE_GREETING.to_string()
}

fn default_quiz_unlocked() -> String {
    DEFAULT_QUIZ_UNLOCKED.to_string()
}

fn default_locked_message() -> String {
    DEFAULT_LOCKED_MESSAGE.to_string()
}

fn default_typing_speed_ms() -> u64 {
    DEFAULT_TYPING_SPEED_MS
}

fn default_points_per_hotspot() -> u32 {
    DEFAULT_POINTS_PER_HOTSPOT
}

fn default_points_quiz_complete() -> u32 {
    DEFAULT_POINTS_QUIZ_COMPLETE
}

fn default_true() -> bool {
    true
}

fn default_alarm_to_glitch_ms() -> u64 {
    DEFAULT_ALARM_TO_GLITCH_MS
}

fn default_glitch_to_sprite_ms() -> u64 {
    DEFAULT_GLITCH_TO_SPRITE_MS
}

fn default_sprite_to_speech_ms() -> u64 {
    DEFAULT_SPRITE_TO_SPEECH_MS
}

fn default_hub_greeting_delay_ms() -> u64 {
    DEFAULT_HUB_GREETING_DELAY_MS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_kind_defaults_to_panorama() {
        let scene: SceneDef = serde_json::from_value(serde_json::json!({
            "id": "relay_hall",
            "hotspots": []
        }))
        .expect("scene");
        assert_eq!(scene.kind, SceneKind::Panorama);
        assert!(!scene.is_hub());
    }

    #[test]
    fn display_label_falls_back_to_id() {
        let scene: SceneDef = serde_json::from_value(serde_json::json!({
            "id": "cold_archive"
        }))
        .expect("scene");
        assert_eq!(scene.display_label(), "cold_archive");
    }

    #[test]
    fn timing_defaults_apply_when_section_is_absent() {
        let timings = SequenceTimings::default();
        assert_eq!(timings.alarm_to_glitch(), Duration::from_millis(2000));
        assert_eq!(timings.glitch_to_sprite(), Duration::from_millis(1500));
        assert_eq!(timings.sprite_to_speech(), Duration::from_millis(800));
    }

    #[test]
    fn quiz_hotspot_lookup_skips_dialog_hotspots() {
        let scene: SceneDef = serde_json::from_value(serde_json::json!({
            "id": "relay_hall",
            "hotspots": [
                { "id": "patch_bay", "action": "dialog", "text": "Scorched." },
                { "id": "terminal", "action": "quiz", "questions": [] }
            ]
        }))
        .expect("scene");
        let quiz = scene.quiz_hotspot().expect("quiz hotspot");
        assert_eq!(quiz.id.as_str(), "terminal");
    }

    #[test]
    fn option_correct_defaults_to_false() {
        let option: OptionDef = serde_json::from_value(serde_json::json!({
            "text": "The cooling loop"
        }))
        .expect("option");
        assert!(!option.correct);
        assert!(option.feedback.is_none());
    }
}
