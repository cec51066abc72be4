use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{EventDef, HotspotId, SceneId, SequenceTimings, SoundRef};

use super::frontend::Persona;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageEffect {
    PlaySfx(SoundRef),
    StartRedAlert,
    StopRedAlert,
    ShowGlitch,
    HideGlitch,
    ShowVillain,
    HideVillain,
    StartVictoryGlow,
    StopVictoryGlow,
    Narrate {
        persona: Persona,
        text: String,
        gated: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencePhase {
    Idle,
    AlarmPlaying,
    GlitchVisualActive,
    VillainSpriteVisible,
    VillainSpeaking,
    AllyAlerting,
    DefeatSpeech,
    VictorySpeech,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceOutcome {
    OpenQuiz { hotspot: HotspotId },
    ReturnToHub,
}

/// Effects to apply and, when a run completes, the hand-off for the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceTick {
    pub effects: Vec<StageEffect>,
    pub outcome: Option<SequenceOutcome>,
}

impl SequenceTick {
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty() && self.outcome.is_none()
    }

    fn merge(&mut self, other: SequenceTick) {
        self.effects.extend(other.effects);
        if other.outcome.is_some() {
            self.outcome = other.outcome;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    Delay(Duration),
    Apply(StageEffect),
    Say { persona: Persona, text: String },
    EnterPhase(SequencePhase),
    SetActive(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitState {
    Ready,
    Delay(Duration),
    Narration,
}

/// Which visuals a run currently has open, so cancellation can force exactly
/// those back to their stopped state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct VisualLedger {
    red_alert: bool,
    glitch: bool,
    villain: bool,
    glow: bool,
}

impl VisualLedger {
    fn note(&mut self, effect: &StageEffect) {
        match effect {
            StageEffect::StartRedAlert => self.red_alert = true,
            StageEffect::StopRedAlert => self.red_alert = false,
            StageEffect::ShowGlitch => self.glitch = true,
            StageEffect::HideGlitch => self.glitch = false,
            StageEffect::ShowVillain => self.villain = true,
            StageEffect::HideVillain => self.villain = false,
            StageEffect::StartVictoryGlow => self.glow = true,
            StageEffect::StopVictoryGlow => self.glow = false,
            StageEffect::PlaySfx(_) | StageEffect::Narrate { .. } => {}
        }
    }

    fn stop_effects(&self) -> Vec<StageEffect> {
        let mut effects = Vec::new();
        if self.red_alert {
            effects.push(StageEffect::StopRedAlert);
        }
        if self.glitch {
            effects.push(StageEffect::HideGlitch);
        }
        if self.villain {
            effects.push(StageEffect::HideVillain);
        }
        if self.glow {
            effects.push(StageEffect::StopVictoryGlow);
        }
        effects
    }
}

/// One cutscene run. The run owns every stage it has not executed yet, so
/// dropping it is the whole cancellation.
#[derive(Debug)]
struct SequenceRun {
    scene: SceneId,
    stages: VecDeque<Stage>,
    wait: WaitState,
    visuals: VisualLedger,
    outcome: Option<SequenceOutcome>,
}

/// Drives the villain cutscenes as ordered stage lists. Delays are data
/// ticked by `advance`; narration stages suspend the run until `dismiss`.
#[derive(Debug)]
pub struct EventSequencer {
    run: Option<SequenceRun>,
    event_active: bool,
    phase: SequencePhase,
}

impl Default for EventSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSequencer {
    pub fn new() -> Self {
        Self {
            run: None,
            event_active: false,
            phase: SequencePhase::Idle,
        }
    }

    pub fn is_event_active(&self) -> bool {
        self.event_active
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn phase(&self) -> SequencePhase {
        self.phase
    }

    pub fn waiting_on_narration(&self) -> bool {
        matches!(
            self.run.as_ref().map(|run| run.wait),
            Some(WaitState::Narration)
        )
    }

    /// Remaining time of the delay currently holding the run up, if any.
    pub fn pending_delay(&self) -> Option<Duration> {
        match self.run.as_ref().map(|run| run.wait) {
            Some(WaitState::Delay(remaining)) => Some(remaining),
            _ => None,
        }
    }

    pub fn trigger_villain(
        &mut self,
        scene: &SceneId,
        event: &EventDef,
        quiz_hotspot: Option<HotspotId>,
        timings: &SequenceTimings,
    ) -> SequenceTick {
        let mut tick = SequenceTick::default();
        if self.run.is_some() {
            warn!(scene = %scene, "event_sequence_replaced");
            tick.effects.extend(self.cancel());
        }
        self.event_active = true;
        self.run = Some(SequenceRun {
            scene: scene.clone(),
            stages: appear_stages(event, timings),
            wait: WaitState::Ready,
            visuals: VisualLedger::default(),
            outcome: quiz_hotspot.map(|hotspot| SequenceOutcome::OpenQuiz { hotspot }),
        });
        info!(scene = %scene, "villain_sequence_started");
        tick.merge(self.pump());
        tick
    }

    pub fn villain_defeated(&mut self, scene: &SceneId, event: &EventDef) -> SequenceTick {
        let mut tick = SequenceTick::default();
        if self.run.is_some() {
            warn!(scene = %scene, "event_sequence_replaced");
            tick.effects.extend(self.cancel());
        }
        // The event flag drops at entry; the victory visuals still run with
        // it unset.
        self.event_active = false;
        self.run = Some(SequenceRun {
            scene: scene.clone(),
            stages: defeat_stages(event),
            wait: WaitState::Ready,
            visuals: VisualLedger::default(),
            outcome: Some(SequenceOutcome::ReturnToHub),
        });
        info!(scene = %scene, "villain_defeat_sequence_started");
        tick.merge(self.pump());
        tick
    }

    /// Queues the post-victory idle greeting shown back at the hub.
    pub fn begin_hub_greeting(
        &mut self,
        hub: &SceneId,
        delay: Duration,
        greeting: String,
    ) -> SequenceTick {
        let mut tick = SequenceTick::default();
        if self.run.is_some() {
            tick.effects.extend(self.cancel());
        }
        let mut stages = VecDeque::new();
        stages.push_back(Stage::Delay(delay));
        stages.push_back(Stage::Apply(StageEffect::Narrate {
            persona: Persona::Ally,
            text: greeting,
            gated: false,
        }));
        self.run = Some(SequenceRun {
            scene: hub.clone(),
            stages,
            wait: WaitState::Ready,
            visuals: VisualLedger::default(),
            outcome: None,
        });
        debug!(scene = %hub, "hub_greeting_queued");
        tick.merge(self.pump());
        tick
    }

    /// Ticks the pending delay. One oversized `dt` crosses as many delay
    /// stages as it covers but never passes a narration stage.
    pub fn advance(&mut self, dt: Duration) -> SequenceTick {
        let mut tick = SequenceTick::default();
        let mut budget = dt;
        loop {
            let wait = match &self.run {
                Some(run) => run.wait,
                None => break,
            };
            match wait {
                WaitState::Narration => break,
                WaitState::Delay(remaining) => {
                    if budget < remaining {
                        if let Some(run) = self.run.as_mut() {
                            run.wait = WaitState::Delay(remaining - budget);
                        }
                        break;
                    }
                    budget -= remaining;
                    if let Some(run) = self.run.as_mut() {
                        run.wait = WaitState::Ready;
                    }
                    tick.merge(self.pump());
                }
                WaitState::Ready => tick.merge(self.pump()),
            }
        }
        tick
    }

    /// Resumes a run suspended on narration.
    pub fn dismiss(&mut self) -> SequenceTick {
        match self.run.as_mut() {
            Some(run) if run.wait == WaitState::Narration => {
                run.wait = WaitState::Ready;
                self.pump()
            }
            _ => {
                warn!("sequence_dismiss_without_pending_narration");
                SequenceTick::default()
            }
        }
    }

    /// Drops every pending stage and returns the stop effects for whatever
    /// visuals the run left open.
    pub fn cancel(&mut self) -> Vec<StageEffect> {
        self.event_active = false;
        self.phase = SequencePhase::Idle;
        match self.run.take() {
            Some(run) => {
                debug!(scene = %run.scene, "event_sequence_canceled");
                run.visuals.stop_effects()
            }
            None => Vec::new(),
        }
    }

    fn pump(&mut self) -> SequenceTick {
        let mut tick = SequenceTick::default();
        let mut finished = false;
        while !finished {
            let Some(run) = self.run.as_mut() else { break };
            if run.wait != WaitState::Ready {
                break;
            }
            match run.stages.pop_front() {
                None => finished = true,
                Some(Stage::Delay(duration)) => run.wait = WaitState::Delay(duration),
                Some(Stage::Apply(effect)) => {
                    run.visuals.note(&effect);
                    tick.effects.push(effect);
                }
                Some(Stage::Say { persona, text }) => {
                    run.wait = WaitState::Narration;
                    tick.effects.push(StageEffect::Narrate {
                        persona,
                        text,
                        gated: true,
                    });
                }
                Some(Stage::EnterPhase(phase)) => self.phase = phase,
                Some(Stage::SetActive(active)) => self.event_active = active,
            }
        }
        if finished {
            if let Some(run) = self.run.take() {
                self.phase = SequencePhase::Resolved;
                tick.outcome = run.outcome;
                debug!(scene = %run.scene, "event_sequence_resolved");
            }
        }
        tick
    }
}

fn appear_stages(event: &EventDef, timings: &SequenceTimings) -> VecDeque<Stage> {
    let mut stages = VecDeque::new();
    stages.push_back(Stage::EnterPhase(SequencePhase::AlarmPlaying));
    if let Some(alarm) = &event.alarm_sound {
        stages.push_back(Stage::Apply(StageEffect::PlaySfx(alarm.clone())));
    }
    stages.push_back(Stage::Apply(StageEffect::StartRedAlert));
    stages.push_back(Stage::Delay(timings.alarm_to_glitch()));
    stages.push_back(Stage::EnterPhase(SequencePhase::GlitchVisualActive));
    stages.push_back(Stage::Apply(StageEffect::ShowGlitch));
    stages.push_back(Stage::Delay(timings.glitch_to_sprite()));
    stages.push_back(Stage::EnterPhase(SequencePhase::VillainSpriteVisible));
    stages.push_back(Stage::Apply(StageEffect::ShowVillain));
    stages.push_back(Stage::Delay(timings.sprite_to_speech()));
    stages.push_back(Stage::EnterPhase(SequencePhase::VillainSpeaking));
    stages.push_back(Stage::Say {
        persona: Persona::Villain,
        text: event.villain_speech.clone(),
    });
    stages.push_back(Stage::EnterPhase(SequencePhase::AllyAlerting));
    stages.push_back(Stage::Say {
        persona: Persona::Ally,
        text: event.ally_alert.clone(),
    });
    stages.push_back(Stage::Apply(StageEffect::StopRedAlert));
    stages.push_back(Stage::Apply(StageEffect::HideGlitch));
    stages.push_back(Stage::Apply(StageEffect::HideVillain));
    stages.push_back(Stage::SetActive(false));
    stages
}

fn defeat_stages(event: &EventDef) -> VecDeque<Stage> {
    let mut stages = VecDeque::new();
    stages.push_back(Stage::Apply(StageEffect::ShowVillain));
    stages.push_back(Stage::Apply(StageEffect::StartVictoryGlow));
    stages.push_back(Stage::EnterPhase(SequencePhase::DefeatSpeech));
    stages.push_back(Stage::Say {
        persona: Persona::Villain,
        text: event.villain_defeat.clone(),
    });
    stages.push_back(Stage::Apply(StageEffect::StopVictoryGlow));
    stages.push_back(Stage::Apply(StageEffect::HideVillain));
    stages.push_back(Stage::EnterPhase(SequencePhase::VictorySpeech));
    stages.push_back(Stage::Say {
        persona: Persona::Ally,
        text: event.victory_message.clone(),
    });
    stages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventKind;

    fn sample_event() -> EventDef {
        EventDef {
            kind: EventKind::VillainAppears,
            alarm_sound: Some(SoundRef("klaxon.ogg".to_string())),
            victory_sound: Some(SoundRef("fanfare.ogg".to_string())),
            villain_speech: "This relay is mine.".to_string(),
            ally_alert: "That is the intruder. Get to the terminal!".to_string(),
            villain_defeat: "Impossible...".to_string(),
            victory_message: "Clean sweep.".to_string(),
        }
    }

    fn scene_id() -> SceneId {
        SceneId("relay_hall".to_string())
    }

    fn gated_narration(persona: Persona, text: &str) -> StageEffect {
        StageEffect::Narrate {
            persona,
            text: text.to_string(),
            gated: true,
        }
    }

    #[test]
    fn appear_sequence_runs_stages_in_order() {
        let mut sequencer = EventSequencer::new();
        let timings = SequenceTimings::default();
        let event = sample_event();

        let tick = sequencer.trigger_villain(&scene_id(), &event, None, &timings);
        assert_eq!(
            tick.effects,
            vec![
                StageEffect::PlaySfx(SoundRef("klaxon.ogg".to_string())),
                StageEffect::StartRedAlert,
            ]
        );
        assert!(sequencer.is_event_active());
        assert!(sequencer.is_running());
        assert_eq!(sequencer.phase(), SequencePhase::AlarmPlaying);

        assert!(sequencer.advance(Duration::from_millis(1999)).is_empty());
        let tick = sequencer.advance(Duration::from_millis(1));
        assert_eq!(tick.effects, vec![StageEffect::ShowGlitch]);
        assert_eq!(sequencer.phase(), SequencePhase::GlitchVisualActive);

        let tick = sequencer.advance(Duration::from_millis(1500));
        assert_eq!(tick.effects, vec![StageEffect::ShowVillain]);
        assert_eq!(sequencer.phase(), SequencePhase::VillainSpriteVisible);

        let tick = sequencer.advance(Duration::from_millis(800));
        assert_eq!(
            tick.effects,
            vec![gated_narration(Persona::Villain, "This relay is mine.")]
        );
        assert_eq!(sequencer.phase(), SequencePhase::VillainSpeaking);
        assert!(sequencer.waiting_on_narration());

        // Time does not move a narration-gated run.
        assert!(sequencer.advance(Duration::from_secs(60)).is_empty());

        let tick = sequencer.dismiss();
        assert_eq!(
            tick.effects,
            vec![gated_narration(
                Persona::Ally,
                "That is the intruder. Get to the terminal!"
            )]
        );
        assert_eq!(sequencer.phase(), SequencePhase::AllyAlerting);

        let tick = sequencer.dismiss();
        assert_eq!(
            tick.effects,
            vec![
                StageEffect::StopRedAlert,
                StageEffect::HideGlitch,
                StageEffect::HideVillain,
            ]
        );
        assert_eq!(tick.outcome, None);
        assert!(!sequencer.is_event_active());
        assert!(!sequencer.is_running());
        assert_eq!(sequencer.phase(), SequencePhase::Resolved);
    }

    #[test]
    fn completion_hands_back_the_quiz_hotspot() {
        let mut sequencer = EventSequencer::new();
        let timings = SequenceTimings::default();
        let event = sample_event();
        let hotspot = HotspotId("terminal".to_string());

        sequencer.trigger_villain(&scene_id(), &event, Some(hotspot.clone()), &timings);
        sequencer.advance(Duration::from_millis(4300));
        sequencer.dismiss();
        let tick = sequencer.dismiss();
        assert_eq!(tick.outcome, Some(SequenceOutcome::OpenQuiz { hotspot }));
    }

    #[test]
    fn one_oversized_advance_stops_at_the_narration_stage() {
        let mut sequencer = EventSequencer::new();
        let timings = SequenceTimings::default();
        let event = sample_event();

        sequencer.trigger_villain(&scene_id(), &event, None, &timings);
        let tick = sequencer.advance(Duration::from_secs(60));
        assert_eq!(
            tick.effects,
            vec![
                StageEffect::ShowGlitch,
                StageEffect::ShowVillain,
                gated_narration(Persona::Villain, "This relay is mine."),
            ]
        );
        assert!(sequencer.waiting_on_narration());
    }

    #[test]
    fn alarm_sound_is_skipped_when_not_configured() {
        let mut sequencer = EventSequencer::new();
        let timings = SequenceTimings::default();
        let mut event = sample_event();
        event.alarm_sound = None;

        let tick = sequencer.trigger_villain(&scene_id(), &event, None, &timings);
        assert_eq!(tick.effects, vec![StageEffect::StartRedAlert]);
    }

    #[test]
    fn cancel_stops_exactly_the_open_visuals() {
        let mut sequencer = EventSequencer::new();
        let timings = SequenceTimings::default();
        let event = sample_event();

        sequencer.trigger_villain(&scene_id(), &event, None, &timings);
        sequencer.advance(Duration::from_millis(3500));

        let stops = sequencer.cancel();
        assert_eq!(
            stops,
            vec![
                StageEffect::StopRedAlert,
                StageEffect::HideGlitch,
                StageEffect::HideVillain,
            ]
        );
        assert!(!sequencer.is_event_active());
        assert!(!sequencer.is_running());
        assert_eq!(sequencer.phase(), SequencePhase::Idle);
        assert!(sequencer.advance(Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn cancel_before_any_visual_emits_only_whats_open() {
        let mut sequencer = EventSequencer::new();
        let timings = SequenceTimings::default();
        let event = sample_event();

        sequencer.trigger_villain(&scene_id(), &event, None, &timings);
        let stops = sequencer.cancel();
        assert_eq!(stops, vec![StageEffect::StopRedAlert]);
    }

    #[test]
    fn defeat_sequence_is_inactive_from_entry_but_still_running() {
        let mut sequencer = EventSequencer::new();
        let event = sample_event();

        let tick = sequencer.villain_defeated(&scene_id(), &event);
        assert_eq!(
            tick.effects,
            vec![
                StageEffect::ShowVillain,
                StageEffect::StartVictoryGlow,
                gated_narration(Persona::Villain, "Impossible..."),
            ]
        );
        assert!(!sequencer.is_event_active());
        assert!(sequencer.is_running());
        assert_eq!(sequencer.phase(), SequencePhase::DefeatSpeech);

        let tick = sequencer.dismiss();
        assert_eq!(
            tick.effects,
            vec![
                StageEffect::StopVictoryGlow,
                StageEffect::HideVillain,
                gated_narration(Persona::Ally, "Clean sweep."),
            ]
        );
        assert_eq!(sequencer.phase(), SequencePhase::VictorySpeech);

        let tick = sequencer.dismiss();
        assert_eq!(tick.effects, Vec::new());
        assert_eq!(tick.outcome, Some(SequenceOutcome::ReturnToHub));
        assert!(!sequencer.is_running());
    }

    #[test]
    fn hub_greeting_waits_out_its_delay_then_speaks_ungated() {
        let mut sequencer = EventSequencer::new();
        let hub = SceneId("hub".to_string());

        let tick = sequencer.begin_hub_greeting(
            &hub,
            Duration::from_millis(1200),
            "Systems idle.".to_string(),
        );
        assert!(tick.is_empty());
        assert!(sequencer.is_running());
        assert_eq!(sequencer.pending_delay(), Some(Duration::from_millis(1200)));

        assert!(sequencer.advance(Duration::from_millis(1100)).is_empty());
        let tick = sequencer.advance(Duration::from_millis(100));
        assert_eq!(
            tick.effects,
            vec![StageEffect::Narrate {
                persona: Persona::Ally,
                text: "Systems idle.".to_string(),
                gated: false,
            }]
        );
        assert_eq!(tick.outcome, None);
        assert!(!sequencer.is_running());
    }

    #[test]
    fn dismiss_without_pending_narration_is_a_no_op() {
        let mut sequencer = EventSequencer::new();
        assert!(sequencer.dismiss().is_empty());

        let timings = SequenceTimings::default();
        sequencer.trigger_villain(&scene_id(), &sample_event(), None, &timings);
        // Run is waiting on a delay, not narration.
        assert!(sequencer.dismiss().is_empty());
        assert_eq!(sequencer.pending_delay(), Some(Duration::from_millis(2000)));
    }

    #[test]
    fn retriggering_replaces_the_run_and_clears_old_visuals() {
        let mut sequencer = EventSequencer::new();
        let timings = SequenceTimings::default();
        let event = sample_event();

        sequencer.trigger_villain(&scene_id(), &event, None, &timings);
        sequencer.advance(Duration::from_millis(2000));

        let tick = sequencer.trigger_villain(&scene_id(), &event, None, &timings);
        assert_eq!(
            tick.effects,
            vec![
                StageEffect::StopRedAlert,
                StageEffect::HideGlitch,
                StageEffect::PlaySfx(SoundRef("klaxon.ogg".to_string())),
                StageEffect::StartRedAlert,
            ]
        );
        assert!(sequencer.is_event_active());
        assert_eq!(sequencer.phase(), SequencePhase::AlarmPlaying);
    }
}
