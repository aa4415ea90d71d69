use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::info;
use rhino_detective::errors::LeaderboardError;
use rhino_detective::events::{Channel, EventEmitter};
use rhino_detective::game::{GameRuntime, LeaderboardStore, Settings, SystemClock};
use rhino_detective::helpers::format_elapsed;
use rhino_detective::model::{GameCommand, GameEvent, Point, Ranking, SessionPhase};
use rhino_detective::Destroyable;

#[derive(Debug, Parser)]
#[command(name = "rhino-detective", version, about = "Find the hidden rhinos, level by level")]
struct Cli {
    /// Directory holding level1.json, level2.json, ...
    #[arg(long, global = true)]
    levels: Option<PathBuf>,

    /// Shared ledger file used as the online ranking.
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Play from level 1. Type "x y" to click, or pause, resume, retry, ranking, quit.
    Play,
    Ranking {
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Write the local ranking to a JSON file.
    Export { path: PathBuf },
    /// Forget every locally stored time.
    Clear,
}

fn init_logging() {
    env_logger::init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let cli = Cli::parse();

    let mut settings = Settings::load();
    if let Some(levels) = cli.levels {
        settings.levels_dir = Some(levels);
    }
    if let Some(ledger) = cli.ledger {
        settings.leaderboard.remote_ledger = Some(ledger);
    }

    match cli.command {
        Commands::Play => cmd_play(&settings),
        Commands::Ranking { top } => {
            let mut store = open_store(&settings);
            print_ranking(&store.fetch_top(top));
            Ok(())
        }
        Commands::Export { path } => {
            let export = open_store(&settings).export_to(&path)?;
            println!("Exported {} entries to {}", export.ranking.len(), path.display());
            Ok(())
        }
        Commands::Clear => {
            open_store(&settings).clear_local()?;
            println!("Local ranking cleared");
            Ok(())
        }
    }
}

fn open_store(settings: &Settings) -> LeaderboardStore {
    LeaderboardStore::from_settings(&settings.leaderboard, Settings::data_dir())
}

fn cmd_play(settings: &Settings) -> Result<(), Box<dyn Error>> {
    let (command_emitter, command_observer) = Channel::<GameCommand>::new();
    let (event_emitter, event_observer) = Channel::<GameEvent>::new();
    let printer = event_observer.subscribe(print_event);

    let mut runtime = GameRuntime::from_settings(
        settings,
        Rc::new(SystemClock),
        command_observer,
        event_emitter,
    );
    info!("Levels from {}", settings.levels_dir().display());

    command_emitter.emit(GameCommand::StartGame);
    runtime.pump();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        wait_for_advance(&mut runtime, &command_emitter, settings.tick_interval);

        if runtime.pending_run().is_some() {
            ask_for_name(&mut runtime, &mut lines)?;
            break;
        }

        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            command_emitter.emit(GameCommand::Abandon);
            runtime.pump();
            break;
        };
        let line = line?;
        match parse_input(&line) {
            Some(Input::Quit) => {
                command_emitter.emit(GameCommand::Abandon);
                runtime.pump();
                break;
            }
            Some(Input::Command(command)) => command_emitter.emit(command),
            None => eprintln!("Type \"x y\" to click, or pause, resume, retry, ranking, quit"),
        }
        command_emitter.emit(GameCommand::Tick);
        runtime.pump();
    }

    runtime.destroy();
    printer.unsubscribe();
    Ok(())
}

/// Keeps ticking while a finished level waits for its advance delay.
fn wait_for_advance(
    runtime: &mut GameRuntime,
    commands: &EventEmitter<GameCommand>,
    tick_interval: Duration,
) {
    while matches!(runtime.session().phase(), SessionPhase::LevelComplete { .. })
        && !runtime.session().is_paused()
    {
        thread::sleep(tick_interval);
        commands.emit(GameCommand::Tick);
        runtime.pump();
    }
}

fn ask_for_name(
    runtime: &mut GameRuntime,
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> Result<(), Box<dyn Error>> {
    loop {
        print!("Your name: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            return Ok(());
        };
        match runtime.submit_score(&line?) {
            Ok(source) => {
                println!("Saved ({})", source);
                return Ok(());
            }
            Err(LeaderboardError::Validation(_)) => continue,
            // already reported through SubmissionRejected; the time is in this session's ranking
            Err(LeaderboardError::NotPersisted(_)) => return Ok(()),
            Err(err) => return Err(err.into()),
        }
    }
}

enum Input {
    Command(GameCommand),
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    let command = match line {
        "pause" | "p" => GameCommand::Pause,
        "resume" | "r" => GameCommand::Resume,
        "retry" => GameCommand::RetryLevel,
        "ranking" => GameCommand::ShowRanking,
        "quit" | "q" => return Some(Input::Quit),
        _ => {
            let mut parts = line.split_whitespace();
            let x = parts.next()?.parse().ok()?;
            let y = parts.next()?.parse().ok()?;
            if parts.next().is_some() {
                return None;
            }
            GameCommand::PointerClick(Point::new(x, y))
        }
    };
    Some(Input::Command(command))
}

fn print_event(event: &GameEvent) {
    match event {
        GameEvent::SceneLoaded {
            level_index,
            total_levels,
            background,
            object_count,
        } => println!(
            "Level {}/{} ({}): find {} objects",
            level_index, total_levels, background, object_count
        ),
        GameEvent::SceneUnavailable {
            level_index,
            reason,
        } => println!("Level {} could not be loaded: {}. Type retry.", level_index, reason),
        GameEvent::ObjectFound {
            message,
            found_count,
            object_count,
            ..
        } => println!("{} ({}/{})", message, found_count, object_count),
        GameEvent::LevelComplete {
            level_index,
            total_levels,
        } if level_index < total_levels => println!("Level {} complete!", level_index),
        GameEvent::LevelComplete { .. } => (),
        GameEvent::GameComplete(run) => {
            println!("All levels done in {}", format_elapsed(run.final_time))
        }
        GameEvent::TimerTick(_) => (),
        GameEvent::SessionPaused(elapsed) => println!("Paused at {}", format_elapsed(*elapsed)),
        GameEvent::SessionResumed => println!("Resumed"),
        GameEvent::SessionAbandoned => println!("Game abandoned"),
        GameEvent::LeaderboardUpdated(ranking) => print_ranking(ranking),
        GameEvent::SubmissionRejected(reason) => println!("Not saved: {}", reason),
    }
}

fn print_ranking(ranking: &Ranking) {
    println!("Ranking ({})", ranking.source);
    if ranking.entries.is_empty() {
        println!("  no times yet");
    }
    for (position, entry) in ranking.entries.iter().enumerate() {
        println!(
            "  {:>3}. {:<20} {}",
            position + 1,
            entry.player_name,
            entry.formatted_time()
        );
    }
}
