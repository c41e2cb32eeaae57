use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use maze_chase::autopilot;
use maze_chase::config::EngineConfig;
use maze_chase::constants::TICK_MS;
use maze_chase::engine::{GameEngine, GameEngineOptions};
use maze_chase::score_board::ScoreBoard;
use maze_chase::types::{Direction, GameStatus, GhostId, GhostMode, Snapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Plays maze-chase in the terminal")]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value_t = 1)]
    level: u32,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = ".data/scores.json")]
    scores: PathBuf,
    #[arg(long, default_value = "player")]
    name: String,
    /// Let the built-in pilot steer; typed moves still override it.
    #[arg(long)]
    autopilot: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Move(Direction),
    TogglePause,
    Reset,
    Next,
    Quit,
}

struct PlayState {
    engine: GameEngine,
    score_board: ScoreBoard,
    name: String,
    autopilot: bool,
    /// Typed move for the next tick; takes precedence over the pilot.
    pending_move: Option<Direction>,
    recorded: bool,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to load engine config");
                std::process::exit(2);
            }
        },
        None => EngineConfig::default(),
    };

    let seed = cli.seed.unwrap_or_else(rand::random);
    let engine = match GameEngine::builtin(
        seed,
        GameEngineOptions {
            config,
            start_level: cli.level,
        },
    ) {
        Ok(engine) => engine,
        Err(err) => {
            error!(error = %err, "failed to build engine");
            std::process::exit(2);
        }
    };
    info!(seed, level = cli.level, "starting run");

    let mut state = PlayState {
        engine,
        score_board: ScoreBoard::open(cli.scores),
        name: cli.name,
        autopilot: cli.autopilot,
        pending_move: None,
        recorded: false,
    };

    let (tx, mut rx) = mpsc::channel::<Command>(32);
    tokio::spawn(read_commands(tx));

    let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                tick_game(&mut state);
                draw(&state);
            }
            command = rx.recv() => {
                match command {
                    Some(Command::Quit) | None => break,
                    Some(command) => apply_command(&mut state, command),
                }
            }
        }
    }

    let summary = state.engine.build_summary();
    println!(
        "final score {} on level {} after {} ticks",
        summary.score, summary.level, summary.ticks
    );
}

async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                error!(error = %err, "failed to read input");
                break;
            }
        };
        for command in parse_commands(&line) {
            if tx.send(command).await.is_err() || command == Command::Quit {
                return;
            }
        }
    }
    let _ = tx.send(Command::Quit).await;
}

/// A line may hold several single-letter commands ("ww d") or one word ("left").
fn parse_commands(line: &str) -> Vec<Command> {
    let line = line.trim().to_lowercase();
    if let Some(command) = parse_command(&line) {
        return vec![command];
    }
    line.split_whitespace()
        .flat_map(|word| match parse_command(word) {
            Some(command) => vec![command],
            None => word
                .chars()
                .filter_map(|key| parse_command(key.encode_utf8(&mut [0; 4])))
                .collect(),
        })
        .collect()
}

fn parse_command(word: &str) -> Option<Command> {
    match word {
        "p" | "pause" => Some(Command::TogglePause),
        "r" | "reset" => Some(Command::Reset),
        "n" | "next" => Some(Command::Next),
        "q" | "quit" => Some(Command::Quit),
        _ => Direction::parse_move(word)
            .filter(|dir| *dir != Direction::None)
            .map(Command::Move),
    }
}

fn apply_command(state: &mut PlayState, command: Command) {
    match command {
        Command::Move(dir) => state.pending_move = Some(dir),
        Command::TogglePause => match state.engine.status() {
            GameStatus::Playing => state.engine.pause(),
            GameStatus::Paused => state.engine.resume(),
            _ => {}
        },
        Command::Reset => {
            state.engine.reset(None);
            state.recorded = false;
        }
        Command::Next => {
            if state.engine.advance_level() {
                state.recorded = false;
            }
        }
        Command::Quit => {}
    }
}

fn tick_game(state: &mut PlayState) {
    let input = if state.engine.status() == GameStatus::Playing {
        state
            .pending_move
            .take()
            .or_else(|| state.autopilot.then(|| autopilot::choose_direction(&state.engine)))
    } else {
        state.pending_move = None;
        None
    };
    state.engine.tick(input);

    if state.engine.is_ended() && !state.recorded {
        state.recorded = true;
        let summary = state.engine.build_summary();
        let rank = state.score_board.record(&state.name, &summary);
        info!(score = summary.score, level = summary.level, ?rank, "run recorded");
    }
}

fn draw(state: &PlayState) {
    let snapshot = state.engine.snapshot();
    let mut out = String::from("\x1b[2J\x1b[H");
    for row in render(&snapshot) {
        out.push_str(&row);
        out.push('\n');
    }
    out.push_str(&status_line(&snapshot));
    out.push('\n');
    if let Some(best) = state.score_board.best() {
        out.push_str(&format!("best {} by {}\n", best.score, best.name));
    }
    out.push_str("w/a/s/d + enter to steer, p pause, r reset, n next level, q quit\n");

    let mut stdout = std::io::stdout().lock();
    if let Err(err) = stdout.write_all(out.as_bytes()).and_then(|_| stdout.flush()) {
        error!(error = %err, "failed to draw frame");
    }
}

fn render(snapshot: &Snapshot) -> Vec<String> {
    let mut grid: Vec<Vec<char>> = snapshot.tiles.iter().map(|row| row.chars().collect()).collect();
    let mut put = |x: i32, y: i32, glyph: char| {
        if let Some(cell) = grid
            .get_mut(y as usize)
            .and_then(|row| row.get_mut(x as usize))
        {
            *cell = glyph;
        }
    };

    for ghost in &snapshot.ghosts {
        let glyph = match ghost.mode {
            GhostMode::Frightened => 'v',
            GhostMode::Eaten => '"',
            _ => ghost_glyph(ghost.id),
        };
        put(ghost.pos.x, ghost.pos.y, glyph);
    }
    let player = &snapshot.player;
    put(player.pos.x, player.pos.y, if player.alive { 'C' } else { 'x' });

    grid.into_iter().map(|row| row.into_iter().collect()).collect()
}

fn ghost_glyph(id: GhostId) -> char {
    match id {
        GhostId::Direct => 'D',
        GhostId::Ambush => 'A',
        GhostId::Flank => 'F',
        GhostId::Shy => 'S',
    }
}

fn status_line(snapshot: &Snapshot) -> String {
    let status = match snapshot.status {
        GameStatus::Playing => "",
        GameStatus::Paused => "  [paused]",
        GameStatus::GameOver => "  [game over: r to restart]",
        GameStatus::LevelComplete => "  [level clear: n for next]",
    };
    let power = if snapshot.power.active {
        format!("  power {}", snapshot.power.remaining_ticks)
    } else {
        String::new()
    };
    format!(
        "level {}  score {}  lives {}  pellets {}/{}{}{}",
        snapshot.level,
        snapshot.score,
        snapshot.lives,
        snapshot.pellets.collected,
        snapshot.pellets.total,
        power,
        status
    )
}
