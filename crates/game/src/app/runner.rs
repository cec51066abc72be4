use std::io::{self, BufRead, Write};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;
use vantage_engine::{HotspotId, SceneCoordinator, SceneId};

use super::bootstrap::AppWiring;

const DELAY_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Go(String),
    Click(String),
    Answer(usize),
    Continue,
    Home,
    Replay,
    Help,
    Quit,
}

/// Line-driven front end. Cutscene delays tick in real time between
/// prompts; a blank line doubles as "continue".
pub(crate) fn run(wiring: AppWiring) -> io::Result<()> {
    let AppWiring { mut coordinator } = wiring;
    coordinator.start_game();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        pump_delays(&mut coordinator);
        print!("> ");
        io::stdout().flush()?;
        let waited = Instant::now();
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        coordinator.advance(waited.elapsed());
        match parse_command(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => dispatch(&mut coordinator, command),
            Err(message) => println!("  {message}"),
        }
    }
    Ok(())
}

/// Sleeps through whatever timed stage the sequencer is waiting on. Returns
/// once the run needs input or has finished.
fn pump_delays(coordinator: &mut SceneCoordinator) {
    while let Some(remaining) = coordinator.sequencer().pending_delay() {
        let nap = remaining.min(DELAY_POLL_INTERVAL);
        let started = Instant::now();
        thread::sleep(nap);
        coordinator.advance(started.elapsed());
    }
}

fn dispatch(coordinator: &mut SceneCoordinator, command: Command) {
    match command {
        Command::Go(target) => match resolve_destination(coordinator, &target) {
            Some(scene_id) => coordinator.load_scene(&scene_id),
            None => println!("  no deck matches '{target}'"),
        },
        Command::Click(hotspot) => coordinator.handle_hotspot_click(&HotspotId(hotspot)),
        Command::Answer(index) => {
            if coordinator.quiz_active() {
                coordinator.select_quiz_option(index);
            } else {
                println!("  no terminal session is open");
            }
        }
        Command::Continue => {
            if coordinator.awaiting_dismissal() {
                coordinator.dismiss_narration();
            } else if coordinator.report_pending() {
                coordinator.acknowledge_report();
            } else {
                debug!("nothing_to_continue");
            }
        }
        Command::Home => coordinator.go_home(),
        Command::Replay => match coordinator.progress().current_scene().cloned() {
            Some(scene_id) => coordinator.reset_and_replay_scene(&scene_id),
            None => println!("  enter a deck before replaying it"),
        },
        Command::Help => print_help(),
        Command::Quit => {}
    }
}

pub(crate) fn parse_command(line: &str) -> Result<Command, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Command::Continue);
    }
    let mut parts = trimmed.split_whitespace();
    let head = parts.next().unwrap_or("");
    let rest = parts.collect::<Vec<_>>();
    match head {
        "go" => {
            if rest.is_empty() {
                return Err("go requires a deck number or scene id".to_string());
            }
            Ok(Command::Go(rest.join(" ")))
        }
        "click" => {
            if rest.len() != 1 {
                return Err("click requires exactly one hotspot id".to_string());
            }
            Ok(Command::Click(rest[0].to_string()))
        }
        "answer" => {
            let value = rest
                .first()
                .ok_or_else(|| "answer requires an option number".to_string())?;
            let number = value
                .parse::<usize>()
                .map_err(|_| format!("invalid option number '{value}'"))?;
            if number == 0 {
                return Err("option numbers start at 1".to_string());
            }
            Ok(Command::Answer(number - 1))
        }
        "ok" | "next" => Ok(Command::Continue),
        "home" | "hub" => Ok(Command::Home),
        "replay" => Ok(Command::Replay),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}' (try `help`)")),
    }
}

/// `go` accepts either a 1-based hub card number or a scene id.
fn resolve_destination(coordinator: &SceneCoordinator, target: &str) -> Option<SceneId> {
    let config = coordinator.config();
    if let Ok(number) = target.parse::<usize>() {
        let cards = config
            .hub_scene()
            .map(|hub| hub.cards.as_slice())
            .unwrap_or(&[]);
        return number
            .checked_sub(1)
            .and_then(|index| cards.get(index))
            .map(|card| card.target.clone());
    }
    let id = SceneId(target.to_string());
    config.scene(&id).map(|scene| scene.id.clone())
}

fn print_help() {
    println!(
        "{}",
        [
            "commands:",
            "  go <number|scene id>   enter a deck from the hub",
            "  click <hotspot id>     inspect a station or open a terminal",
            "  answer <number>        pick an option in a terminal session",
            "  ok                     continue past narration or the report (Enter works too)",
            "  home                   abandon the deck and return to the hub",
            "  replay                 restart the current deck from scratch",
            "  quit                   leave the game",
        ]
        .join("\n")
    );
}
