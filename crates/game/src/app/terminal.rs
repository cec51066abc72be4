use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use vantage_engine::{
    AudioSurface, CardDef, EffectsSurface, HotspotAction, HotspotId, MissionReport, NarrationLine,
    NarrationPresenter, ProgressSink, QuestionPrompt, SceneDef, SoundRef, StageView,
};

/// Prints narration one character at a time, old terminal style. A zero
/// delay prints the whole line at once.
pub(crate) struct TerminalNarrator {
    typing_delay: Duration,
}

impl TerminalNarrator {
    pub(crate) fn new(typing_delay: Duration) -> Self {
        Self { typing_delay }
    }
}

impl NarrationPresenter for TerminalNarrator {
    fn show(&mut self, line: &NarrationLine) {
        print!("\n[{}] ", line.speaker);
        io::stdout().flush().ok();
        if self.typing_delay.is_zero() {
            println!("{}", line.text);
        } else {
            for ch in line.text.chars() {
                print!("{ch}");
                io::stdout().flush().ok();
                thread::sleep(self.typing_delay);
            }
            println!();
        }
        if line.gated {
            println!("  (press Enter to continue)");
        }
    }
}

pub(crate) struct TerminalEffects;

impl EffectsSurface for TerminalEffects {
    fn start_red_alert(&mut self) {
        println!("  !! RED ALERT - the deck lighting snaps to red !!");
    }

    fn stop_red_alert(&mut self) {
        println!("  (the red alert lighting fades)");
    }

    fn show_glitch(&mut self) {
        println!("  ~~ every display on the deck dissolves into static ~~");
    }

    fn hide_glitch(&mut self) {
        println!("  (the displays settle back to normal)");
    }

    fn show_villain(&mut self) {
        println!("  >> a jagged sprite coalesces out of the static <<");
    }

    fn hide_villain(&mut self) {
        println!("  (the sprite breaks apart and is gone)");
    }

    fn start_victory_glow(&mut self) {
        println!("  ** a warm glow spreads across the deck **");
    }

    fn stop_victory_glow(&mut self) {
        println!("  (the glow fades)");
    }
}

pub(crate) struct TerminalAudio;

impl AudioSurface for TerminalAudio {
    fn play_sfx(&mut self, sound: &SoundRef) {
        println!("  (sfx: {sound})");
    }

    fn play_bgm(&mut self, sound: &SoundRef) {
        println!("  (bgm: {sound})");
    }

    fn stop_bgm(&mut self) {
        println!("  (bgm off)");
    }
}

pub(crate) struct TerminalStage;

impl StageView for TerminalStage {
    fn show_hub(&mut self, title: &str, cards: &[CardDef]) {
        println!("\n=== {title} ===");
        for (index, card) in cards.iter().enumerate() {
            match &card.description {
                Some(description) => {
                    println!("  {}. {} - {}", index + 1, card.label, description)
                }
                None => println!("  {}. {}", index + 1, card.label),
            }
        }
        println!("  (type `go <number>` to enter a deck, `help` for commands)");
    }

    fn enter_scene(&mut self, scene: &SceneDef) {
        println!("\n--- {} ---", scene.display_label());
        for hotspot in &scene.hotspots {
            let tag = match hotspot.action {
                HotspotAction::Dialog => "look",
                HotspotAction::Quiz => "term",
            };
            println!("  [{tag}] {} ({})", hotspot.display_label(), hotspot.id);
        }
        println!("  (type `click <hotspot id>`, `home`, or `help`)");
    }

    fn leave_scene(&mut self) {}

    fn highlight_quiz_hotspot(&mut self, hotspot: &HotspotId) {
        println!("  >> {hotspot} hums and its screen turns green <<");
    }

    fn show_question(&mut self, prompt: &QuestionPrompt) {
        println!("\n  Q{}/{}: {}", prompt.index + 1, prompt.total, prompt.text);
        for (index, option) in prompt.options.iter().enumerate() {
            if option.enabled {
                println!("    {}) {}", index + 1, option.text);
            } else {
                println!("    -) {} (ruled out)", option.text);
            }
        }
        println!("  (type `answer <number>`)");
    }

    fn show_report(&mut self, report: &MissionReport) {
        println!("\n  ==== MISSION REPORT ====");
        println!("  time      {}", format_elapsed(report.elapsed));
        println!("  score     {}", report.score);
        println!(
            "  explored  {}/{} stations",
            report.explored_visited, report.explored_required
        );
        println!(
            "  answers   {}/{} first try",
            report.correct_answers, report.total_questions
        );
        println!(
            "  accuracy  {}% - link {}",
            report.accuracy,
            report.status.label()
        );
        println!("  (type `ok` to continue)");
    }

    fn close_quiz(&mut self) {
        println!("  (terminal session closed)");
    }
}

pub(crate) struct TerminalScoreline;

impl ProgressSink for TerminalScoreline {
    fn publish(&mut self, score: u32, percent: u8, scene_label: Option<&str>) {
        match scene_label {
            Some(label) => println!("  [score {score} | {label} {percent}% surveyed]"),
            None => println!("  [score {score}]"),
        }
    }
}

pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    let total_seconds = elapsed.as_secs();
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_formats_as_minutes_and_seconds() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00");
        assert_eq!(format_elapsed(Duration::from_secs(5)), "00:05");
        assert_eq!(format_elapsed(Duration::from_secs(75)), "01:15");
        assert_eq!(format_elapsed(Duration::from_millis(59_999)), "00:59");
    }

    #[test]
    fn elapsed_minutes_run_past_the_hour() {
        assert_eq!(format_elapsed(Duration::from_secs(3_661)), "61:01");
    }
}
