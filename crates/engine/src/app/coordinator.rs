use std::mem;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::{GameConfig, HotspotAction, HotspotDef, HotspotId, SceneDef, SceneId};

use super::frontend::{Frontend, NarrationLine, Persona};
use super::progress::ProgressStore;
use super::quiz::{MissionReport, QuizSession, QuizSignal, QuizStep};
use super::sequence::{EventSequencer, SequenceOutcome, SequenceTick, StageEffect};

/// Where the next narration dismissal is routed. Showing a new gated line
/// overwrites whatever was pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum NarrationGate {
    #[default]
    Idle,
    Dialog { announce_unlock: bool },
    Sequence,
    QuizFeedback,
}

/// Top-level orchestrator. Owns the session state and is the only component
/// that talks to the front-end surfaces; the sequencer and quiz hand their
/// effects back as values for it to apply.
pub struct SceneCoordinator {
    config: GameConfig,
    frontend: Frontend,
    progress: ProgressStore,
    sequencer: EventSequencer,
    quiz: Option<QuizSession>,
    gate: NarrationGate,
    scene_clock: Duration,
}

impl SceneCoordinator {
    pub fn new(config: GameConfig, frontend: Frontend) -> Self {
        Self {
            config,
            frontend,
            progress: ProgressStore::new(),
            sequencer: EventSequencer::new(),
            quiz: None,
            gate: NarrationGate::Idle,
            scene_clock: Duration::ZERO,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn sequencer(&self) -> &EventSequencer {
        &self.sequencer
    }

    pub fn quiz_active(&self) -> bool {
        self.quiz.is_some()
    }

    /// True while a gated narration line is on screen.
    pub fn awaiting_dismissal(&self) -> bool {
        self.gate != NarrationGate::Idle
    }

    /// The shown report has not been acknowledged yet.
    pub fn report_pending(&self) -> bool {
        self.quiz
            .as_ref()
            .map(|quiz| quiz.current_prompt().is_none())
            .unwrap_or(false)
            && self.gate == NarrationGate::Idle
    }

    pub fn start_game(&mut self) {
        info!(title = %self.config.meta.title, "game_started");
        if let Some(sound) = &self.config.meta.start_sound {
            self.frontend.audio.play_sfx(sound);
        }
        self.go_home();
        let intro = self.config.narrator.intro_text.clone();
        self.say(Persona::Ally, &intro);
    }

    /// Back to the hub. Drops any cutscene or quiz in flight and fully
    /// resets session progress.
    pub fn go_home(&mut self) {
        self.cancel_transients();
        self.progress.reset();
        self.scene_clock = Duration::ZERO;
        self.frontend.stage.leave_scene();
        match &self.config.meta.menu_bgm {
            Some(bgm) => self.frontend.audio.play_bgm(bgm),
            None => self.frontend.audio.stop_bgm(),
        }
        let title = self.config.meta.title.clone();
        let cards = self
            .config
            .hub_scene()
            .map(|hub| hub.cards.clone())
            .unwrap_or_default();
        self.frontend.stage.show_hub(&title, &cards);
        info!("returned_to_hub");
        self.publish_progress();
    }

    pub fn load_scene(&mut self, scene_id: &SceneId) {
        let Some(scene) = self.config.scene(scene_id).cloned() else {
            warn!(scene = %scene_id, "unknown_scene_ignored");
            return;
        };
        if scene.is_hub() {
            self.go_home();
            return;
        }
        self.cancel_transients();
        self.scene_clock = Duration::ZERO;
        match &scene.ambience {
            Some(ambience) => self.frontend.audio.play_bgm(ambience),
            None => self.frontend.audio.stop_bgm(),
        }
        self.progress.enter_scene(&scene.id);
        self.frontend.stage.enter_scene(&scene);
        info!(scene = %scene.id, label = scene.display_label(), "scene_loaded");
        self.publish_progress();
        if let Some(intro) = &scene.narrator_intro {
            self.say(Persona::Ally, intro);
        }
    }

    /// Clears that scene's visits and event flag, then re-enters it. Score
    /// earned elsewhere is kept.
    pub fn reset_and_replay_scene(&mut self, scene_id: &SceneId) {
        let Some(scene) = self.config.scene(scene_id).cloned() else {
            warn!(scene = %scene_id, "unknown_scene_ignored");
            return;
        };
        self.cancel_transients();
        self.progress.reset_scene(&scene);
        info!(scene = %scene.id, "scene_reset");
        self.load_scene(scene_id);
    }

    pub fn handle_hotspot_click(&mut self, hotspot_id: &HotspotId) {
        if self.sequencer.is_running() {
            debug!(hotspot = %hotspot_id, "click_ignored_during_cutscene");
            return;
        }
        if self.quiz.is_some() {
            debug!(hotspot = %hotspot_id, "click_ignored_during_quiz");
            return;
        }
        let Some(scene) = self
            .progress
            .current_scene()
            .and_then(|id| self.config.scene(id))
            .cloned()
        else {
            warn!(hotspot = %hotspot_id, "hotspot_click_outside_scene");
            return;
        };
        let Some(hotspot) = scene
            .hotspots
            .iter()
            .find(|hotspot| &hotspot.id == hotspot_id)
            .cloned()
        else {
            warn!(scene = %scene.id, hotspot = %hotspot_id, "unknown_hotspot_ignored");
            return;
        };
        match hotspot.action {
            HotspotAction::Dialog => self.dialog_hotspot(&scene, &hotspot),
            HotspotAction::Quiz => self.quiz_hotspot_clicked(&scene, &hotspot),
        }
    }

    /// Player closed the current narration line. Routes to whichever flow
    /// was waiting on it.
    pub fn dismiss_narration(&mut self) {
        match mem::take(&mut self.gate) {
            NarrationGate::Idle => debug!("narration_dismissed_without_gate"),
            NarrationGate::Dialog { announce_unlock } => {
                if announce_unlock {
                    let text = self.config.narrator.quiz_unlocked.clone();
                    self.say(Persona::Ally, &text);
                }
            }
            NarrationGate::Sequence => {
                let tick = self.sequencer.dismiss();
                self.apply_tick(tick);
            }
            NarrationGate::QuizFeedback => self.advance_quiz(),
        }
    }

    pub fn select_quiz_option(&mut self, option_index: usize) {
        let Some(quiz) = self.quiz.as_mut() else {
            warn!(option = option_index, "quiz_selection_without_quiz");
            return;
        };
        match quiz.select_option(option_index) {
            QuizSignal::Feedback { text, correct } => {
                debug!(option = option_index, correct, "quiz_option_selected");
                self.say_gated(NarrationGate::QuizFeedback, Persona::Ally, &text);
            }
            QuizSignal::Rejected => {
                debug!(option = option_index, "quiz_selection_rejected");
            }
        }
    }

    /// Player closed the mission report. Awards the completion reward and
    /// either plays the defeat sequence or heads straight home.
    pub fn acknowledge_report(&mut self) {
        let acknowledged = self
            .quiz
            .as_mut()
            .map(|quiz| quiz.acknowledge_report())
            .unwrap_or(false);
        if !acknowledged {
            debug!("report_ack_out_of_phase");
            return;
        }
        self.quiz = None;
        self.frontend.stage.close_quiz();
        let reward = self.config.gameplay.points_quiz_complete;
        self.progress.add_score(reward);
        info!(points = reward, score = self.progress.score(), "quiz_completed");
        self.publish_progress();

        let scene = self
            .progress
            .current_scene()
            .and_then(|id| self.config.scene(id))
            .cloned();
        match scene {
            Some(scene) => match &scene.event {
                Some(event) => {
                    if let Some(sound) = &event.victory_sound {
                        self.frontend.audio.play_sfx(sound);
                    }
                    let tick = self.sequencer.villain_defeated(&scene.id, event);
                    self.apply_tick(tick);
                }
                None => self.return_home_after_victory(),
            },
            None => {
                warn!("report_acknowledged_outside_scene");
                self.return_home_after_victory();
            }
        }
    }

    /// Moves session time forward. All cutscene delays tick from here.
    pub fn advance(&mut self, dt: Duration) {
        if self.progress.current_scene().is_some() {
            self.scene_clock = self.scene_clock.saturating_add(dt);
        }
        let tick = self.sequencer.advance(dt);
        if !tick.is_empty() {
            self.apply_tick(tick);
        }
    }

    fn dialog_hotspot(&mut self, scene: &SceneDef, hotspot: &HotspotDef) {
        let reward = self.config.gameplay.points_per_hotspot;
        let first_visit = self.progress.register_visit(&hotspot.id, reward);
        if first_visit {
            info!(
                scene = %scene.id,
                hotspot = %hotspot.id,
                points = reward,
                "hotspot_visited"
            );
        }
        self.publish_progress();
        let announce_unlock = first_visit
            && self.progress.is_scene_fully_explored(scene)
            && !self.progress.event_triggered(&scene.id)
            && scene.quiz_hotspot().is_some();
        let text = hotspot
            .text
            .clone()
            .unwrap_or_else(|| hotspot.display_label().to_string());
        self.say_gated(
            NarrationGate::Dialog { announce_unlock },
            Persona::Ally,
            &text,
        );
    }

    fn quiz_hotspot_clicked(&mut self, scene: &SceneDef, hotspot: &HotspotDef) {
        if self.config.gameplay.require_exploration_to_quiz
            && !self.progress.is_scene_fully_explored(scene)
        {
            let locked = hotspot
                .locked_message
                .clone()
                .unwrap_or_else(|| self.config.narrator.locked_message.clone());
            debug!(scene = %scene.id, hotspot = %hotspot.id, "quiz_locked");
            self.say(Persona::Ally, &locked);
            return;
        }
        match &scene.event {
            Some(event) if !self.progress.event_triggered(&scene.id) => {
                // Marked before the first stage runs; a repeat click must
                // not start a second cutscene.
                self.progress.mark_event_triggered(&scene.id);
                let tick = self.sequencer.trigger_villain(
                    &scene.id,
                    event,
                    Some(hotspot.id.clone()),
                    &self.config.timings,
                );
                self.apply_tick(tick);
            }
            _ => self.open_quiz(hotspot),
        }
    }

    fn open_quiz(&mut self, hotspot: &HotspotDef) {
        match QuizSession::new(hotspot.questions.clone()) {
            Ok(session) => {
                let prompt = session.current_prompt();
                self.quiz = Some(session);
                info!(hotspot = %hotspot.id, "quiz_opened");
                if let Some(prompt) = prompt {
                    self.frontend.stage.show_question(&prompt);
                }
            }
            Err(err) => {
                error!(hotspot = %hotspot.id, error = %err, "quiz_start_failed");
            }
        }
    }

    fn advance_quiz(&mut self) {
        let Some(quiz) = self.quiz.as_mut() else {
            warn!("quiz_dismissal_without_quiz");
            return;
        };
        match quiz.feedback_dismissed() {
            QuizStep::Ask(prompt) => self.frontend.stage.show_question(&prompt),
            QuizStep::Finished {
                total_questions,
                mistakes,
            } => {
                let report = self.build_report(total_questions, mistakes);
                info!(
                    accuracy = report.accuracy,
                    status = report.status.label(),
                    "quiz_finished"
                );
                self.frontend.stage.show_report(&report);
            }
            QuizStep::Rejected => debug!("quiz_dismissal_out_of_phase"),
        }
    }

    fn build_report(&self, total_questions: u32, mistakes: u32) -> MissionReport {
        let explored = self
            .progress
            .current_scene()
            .and_then(|id| self.config.scene(id))
            .map(|scene| self.progress.explored_required(scene))
            .unwrap_or((0, 0));
        MissionReport::new(
            self.scene_clock,
            self.progress.score(),
            explored,
            total_questions,
            mistakes,
        )
    }

    fn return_home_after_victory(&mut self) {
        self.go_home();
        if let Some(hub) = self.config.hub_scene() {
            let hub_id = hub.id.clone();
            let delay = self.config.timings.hub_greeting_delay();
            let greeting = self.config.narrator.idle_greeting.clone();
            let tick = self.sequencer.begin_hub_greeting(&hub_id, delay, greeting);
            self.apply_tick(tick);
        }
    }

    /// Stops whatever run or quiz is in flight and clears its on-screen
    /// leftovers. Progress is untouched.
    fn cancel_transients(&mut self) {
        let stops = self.sequencer.cancel();
        self.apply_effects(stops);
        if self.quiz.take().is_some() {
            debug!("quiz_abandoned");
            self.frontend.stage.close_quiz();
        }
        self.gate = NarrationGate::Idle;
    }

    fn apply_tick(&mut self, tick: SequenceTick) {
        self.apply_effects(tick.effects);
        match tick.outcome {
            Some(SequenceOutcome::OpenQuiz { hotspot }) => {
                let found = self
                    .progress
                    .current_scene()
                    .and_then(|id| self.config.scene(id))
                    .and_then(|scene| scene.hotspots.iter().find(|h| h.id == hotspot))
                    .cloned();
                match found {
                    Some(hotspot) => self.open_quiz(&hotspot),
                    None => warn!(hotspot = %hotspot, "quiz_hotspot_missing_after_cutscene"),
                }
            }
            Some(SequenceOutcome::ReturnToHub) => self.return_home_after_victory(),
            None => {}
        }
    }

    fn apply_effects(&mut self, effects: Vec<StageEffect>) {
        for effect in effects {
            match effect {
                StageEffect::PlaySfx(sound) => self.frontend.audio.play_sfx(&sound),
                StageEffect::StartRedAlert => self.frontend.effects.start_red_alert(),
                StageEffect::StopRedAlert => self.frontend.effects.stop_red_alert(),
                StageEffect::ShowGlitch => self.frontend.effects.show_glitch(),
                StageEffect::HideGlitch => self.frontend.effects.hide_glitch(),
                StageEffect::ShowVillain => self.frontend.effects.show_villain(),
                StageEffect::HideVillain => self.frontend.effects.hide_villain(),
                StageEffect::StartVictoryGlow => self.frontend.effects.start_victory_glow(),
                StageEffect::StopVictoryGlow => self.frontend.effects.stop_victory_glow(),
                StageEffect::Narrate {
                    persona,
                    text,
                    gated,
                } => {
                    if gated {
                        self.say_gated(NarrationGate::Sequence, persona, &text);
                    } else {
                        self.say(persona, &text);
                    }
                }
            }
        }
    }

    fn publish_progress(&mut self) {
        let (percent, label, unlocked_quiz) = match self
            .progress
            .current_scene()
            .and_then(|id| self.config.scene(id))
        {
            Some(scene) => {
                let percent = self.progress.progress_percent(&scene.hotspots);
                let unlocked = if percent == 100 {
                    scene.quiz_hotspot().map(|hotspot| hotspot.id.clone())
                } else {
                    None
                };
                (percent, Some(scene.display_label().to_string()), unlocked)
            }
            None => (0, None, None),
        };
        self.frontend
            .progress
            .publish(self.progress.score(), percent, label.as_deref());
        if let Some(hotspot) = unlocked_quiz {
            self.frontend.stage.highlight_quiz_hotspot(&hotspot);
        }
    }

    fn say(&mut self, persona: Persona, text: &str) {
        let line = self.narration_line(persona, text, false);
        self.frontend.narration.show(&line);
    }

    fn say_gated(&mut self, gate: NarrationGate, persona: Persona, text: &str) {
        if self.gate != NarrationGate::Idle {
            debug!("pending_narration_gate_replaced");
        }
        self.gate = gate;
        let line = self.narration_line(persona, text, true);
        self.frontend.narration.show(&line);
    }

    fn narration_line(&self, persona: Persona, text: &str, gated: bool) -> NarrationLine {
        let speaker = match persona {
            Persona::Ally => self.config.narrator.ally_name.clone(),
            Persona::Villain => self.config.narrator.villain_name.clone(),
        };
        NarrationLine {
            persona,
            speaker,
            text: text.to_string(),
            gated,
        }
    }
}
