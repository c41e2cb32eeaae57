use clap::Parser;
use maze_chase::autopilot;
use maze_chase::config::EngineConfig;
use maze_chase::engine::{GameEngine, GameEngineOptions};
use maze_chase::error::ConfigurationError;
use maze_chase::types::{GameStatus, GhostId, RuntimeEvent, Snapshot};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_MAX_TICKS: u64 = 20_000;

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs seeded maze-chase scenarios and checks state invariants")]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    /// Autopilot runs with consecutive seeds instead of the default suite.
    #[arg(long)]
    runs: Option<u32>,
    /// Levels an autopilot run may play through before stopping.
    #[arg(long, default_value_t = 1)]
    levels: u32,
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    max_ticks: u64,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u32,
    autopilot: bool,
    levels: u32,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    status: GameStatus,
    level: u32,
    score: u32,
    lives: u32,
    ticks: u64,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "powerPellets")]
    power_pellets: u32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    #[serde(rename = "phaseFlips")]
    phase_flips: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTicks")]
    average_ticks: u64,
    #[serde(rename = "statusCounts")]
    status_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

/// Figures carried between ticks for the monotonicity checks.
#[derive(Clone, Copy, Debug)]
struct Progress {
    level: u32,
    collected: u32,
    score: u32,
    lives: u32,
}

impl Progress {
    fn of(snapshot: &Snapshot) -> Self {
        Self {
            level: snapshot.level,
            collected: snapshot.pellets.collected,
            score: snapshot.score,
            lives: snapshot.lives,
        }
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!(event = "config_failed", error = %err, "failed to load engine config");
            std::process::exit(2);
        }
    };

    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut status_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_ticks = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        info!(
            event = "scenario_started",
            match_id = %match_id,
            scenario = %scenario.name,
            seed = scenario.seed,
            autopilot = scenario.autopilot,
            levels = scenario.levels,
            "scenario started"
        );
        let scenario_run = match run_scenario(&scenario, &config, cli.max_ticks) {
            Ok(run) => run,
            Err(err) => {
                error!(
                    event = "engine_failed",
                    match_id = %match_id,
                    scenario = %scenario.name,
                    error = %err,
                    "failed to build engine"
                );
                std::process::exit(2);
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            warn!(
                event = "anomaly_detected",
                match_id = %match_id,
                scenario = %scenario.name,
                seed = scenario.seed,
                tick = anomaly.tick,
                detail = %anomaly.message,
                "anomaly detected"
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_ticks += scenario_run.result.ticks;
        *status_counts
            .entry(status_key(scenario_run.result.status))
            .or_insert(0) += 1;

        info!(
            event = "scenario_finished",
            match_id = %match_id,
            scenario = %scenario.name,
            seed = scenario.seed,
            tick = scenario_run.result.ticks,
            status = %status_key(scenario_run.result.status),
            score = scenario_run.result.score,
            level = scenario_run.result.level,
            anomaly_count = scenario_run.anomaly_records.len(),
            "scenario finished"
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(err) => error!(error = %err, "failed to serialize scenario result"),
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        now_ms(),
        scenario_results,
        status_counts,
        total_anomalies,
        total_ticks,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(err) = write_summary(path, &summary) {
            error!(
                event = "summary_write_failed",
                match_id = %match_id,
                path = %path.display(),
                error = %err,
                "failed to write run summary"
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    info!(
        event = "run_finished",
        match_id = %match_id,
        scenario_count = summary.scenario_count,
        anomaly_count = summary.anomaly_count,
        average_ticks = summary.average_ticks,
        status_counts = ?summary.status_counts,
        summary_out = ?summary_out_written,
        "run finished"
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("simulate=info,maze_chase=warn"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_current_span(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, ConfigurationError> {
    match path {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

fn run_scenario(
    scenario: &Scenario,
    config: &EngineConfig,
    max_ticks: u64,
) -> Result<ScenarioRunResult, ConfigurationError> {
    let mut engine = GameEngine::builtin(
        scenario.seed,
        GameEngineOptions {
            config: config.clone(),
            start_level: 1,
        },
    )?;

    let mut pellets_eaten = 0;
    let mut power_pellets = 0;
    let mut ghosts_eaten = 0;
    let mut lives_lost = 0;
    let mut phase_flips = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut previous = Progress::of(&engine.snapshot());

    loop {
        if engine.status() == GameStatus::LevelComplete && engine.level() < scenario.levels {
            engine.advance_level();
            previous = Progress::of(&engine.snapshot());
        }
        if engine.is_ended() {
            break;
        }
        if engine.tick_count() >= max_ticks {
            break;
        }

        let input = scenario.autopilot.then(|| autopilot::choose_direction(&engine));
        engine.tick(input);
        let snapshot = engine.build_snapshot(true);
        for message in collect_snapshot_anomalies(&snapshot, previous) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        previous = Progress::of(&snapshot);

        for event in &snapshot.events {
            match event {
                RuntimeEvent::PelletEaten { .. } => pellets_eaten += 1,
                RuntimeEvent::PowerPelletEaten { .. } => power_pellets += 1,
                RuntimeEvent::GhostEaten { .. } => ghosts_eaten += 1,
                RuntimeEvent::LifeLost { .. } => lives_lost += 1,
                RuntimeEvent::PhaseChanged { .. } => phase_flips += 1,
                _ => {}
            }
        }
    }

    let summary = engine.build_summary();
    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            status: summary.status,
            level: summary.level,
            score: summary.score,
            lives: summary.lives,
            ticks: summary.ticks,
            pellets_eaten,
            power_pellets,
            ghosts_eaten,
            lives_lost,
            phase_flips,
            anomalies,
        },
        anomaly_records,
    })
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, previous: Progress) -> Vec<String> {
    let mut anomalies = Vec::new();
    let blocked = |x: i32, y: i32| -> bool {
        if x < 0 || y < 0 || x >= snapshot.width || y >= snapshot.height {
            return true;
        }
        snapshot
            .tiles
            .get(y as usize)
            .and_then(|row| row.chars().nth(x as usize))
            .map_or(true, |glyph| glyph == '#')
    };

    let player = &snapshot.player;
    if blocked(player.pos.x, player.pos.y) {
        anomalies.push(format!(
            "player outside walkable cells: ({}, {})",
            player.pos.x, player.pos.y
        ));
    }
    for ghost in &snapshot.ghosts {
        if blocked(ghost.pos.x, ghost.pos.y) {
            anomalies.push(format!(
                "ghost {} outside walkable cells: ({}, {})",
                ghost.id.label(),
                ghost.pos.x,
                ghost.pos.y
            ));
        }
    }

    let ids: HashSet<GhostId> = snapshot.ghosts.iter().map(|ghost| ghost.id).collect();
    if snapshot.ghosts.len() != GhostId::ALL.len() || ids.len() != GhostId::ALL.len() {
        anomalies.push(format!("ghost roster broken: {} entries", snapshot.ghosts.len()));
    }

    let pellets = snapshot.pellets;
    if pellets.collected > pellets.total {
        anomalies.push(format!(
            "collected exceeds total: {}/{}",
            pellets.collected, pellets.total
        ));
    }
    if pellets.is_cleared() != (snapshot.status == GameStatus::LevelComplete) {
        anomalies.push(format!(
            "clear state mismatch: {}/{} with status {}",
            pellets.collected,
            pellets.total,
            status_key(snapshot.status)
        ));
    }
    if snapshot.level == previous.level && pellets.collected < previous.collected {
        anomalies.push(format!(
            "collected went backwards: {} -> {}",
            previous.collected, pellets.collected
        ));
    }
    if snapshot.score < previous.score {
        anomalies.push(format!(
            "score went backwards: {} -> {}",
            previous.score, snapshot.score
        ));
    }
    if snapshot.lives > previous.lives {
        anomalies.push(format!(
            "lives increased: {} -> {}",
            previous.lives, snapshot.lives
        ));
    }
    if !snapshot.power.active && (snapshot.power.combo != 0 || snapshot.power.remaining_ticks != 0) {
        anomalies.push("inactive power window carries state".to_string());
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }));
    let levels = cli.levels.max(1);

    if let Some(runs) = cli.runs {
        return (0..runs.max(1))
            .map(|idx| Scenario {
                name: format!("autopilot-{}", idx + 1),
                seed: seed.wrapping_add(idx),
                autopilot: true,
                levels,
            })
            .collect();
    }

    vec![
        Scenario {
            name: "autopilot".to_string(),
            seed,
            autopilot: true,
            levels,
        },
        Scenario {
            name: "idle".to_string(),
            seed: seed.wrapping_add(1),
            autopilot: false,
            levels: 1,
        },
    ]
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    status_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_ticks: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_ticks = if scenario_count == 0 {
        0
    } else {
        total_ticks / scenario_count as u64
    };
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_ticks,
        status_counts,
        scenarios,
    }
}

fn status_key(status: GameStatus) -> String {
    match status {
        GameStatus::Playing => "playing",
        GameStatus::Paused => "paused",
        GameStatus::GameOver => "game_over",
        GameStatus::LevelComplete => "level_complete",
    }
    .to_string()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_scenario_result(status: GameStatus, ticks: u64) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: "test".to_string(),
            seed: 42,
            status,
            level: 1,
            score: 0,
            lives: 0,
            ticks,
            pellets_eaten: 0,
            power_pellets: 0,
            ghosts_eaten: 0,
            lives_lost: 0,
            phase_flips: 0,
            anomalies: Vec::new(),
        }
    }

    fn scenario(seed: u32, autopilot: bool) -> Scenario {
        Scenario {
            name: "test".to_string(),
            seed,
            autopilot,
            levels: 1,
        }
    }

    #[test]
    fn default_match_id_contains_seed_and_timestamp() {
        assert_eq!(default_match_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn build_run_summary_calculates_average_ticks() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            1,
            2,
            vec![
                make_scenario_result(GameStatus::GameOver, 600),
                make_scenario_result(GameStatus::LevelComplete, 900),
            ],
            BTreeMap::from([
                ("game_over".to_string(), 1usize),
                ("level_complete".to_string(), 1usize),
            ]),
            1,
            1_500,
        );
        assert_eq!(summary.average_ticks, 750);
        assert_eq!(summary.scenario_count, 2);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("maze-chase-missing-{}", rand::random::<u32>()))
            .join("summary.json");
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            1,
            2,
            vec![make_scenario_result(GameStatus::GameOver, 60)],
            BTreeMap::from([("game_over".to_string(), 1usize)]),
            0,
            60,
        );
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 10, "same anomaly".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 11, "same anomaly".to_string());

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tick, 10);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn regressions_are_reported() {
        let engine = GameEngine::builtin(1, GameEngineOptions::default()).expect("builds");
        let snapshot = engine.snapshot();
        let mut previous = Progress::of(&snapshot);
        assert!(collect_snapshot_anomalies(&snapshot, previous).is_empty());

        previous.score = snapshot.score + 10;
        previous.lives = snapshot.lives - 1;
        let found = collect_snapshot_anomalies(&snapshot, previous);
        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|message| message.starts_with("score went backwards")));
    }

    #[test]
    fn autopilot_scenario_runs_clean() {
        let run = run_scenario(&scenario(20_260_101, true), &EngineConfig::default(), 400)
            .expect("engine builds");
        assert!(run.result.ticks > 0);
        assert!(run.result.pellets_eaten > 0);
        assert!(run.result.anomalies.is_empty(), "{:?}", run.anomaly_records);
    }

    #[test]
    fn idle_scenario_is_deterministic() {
        let first = run_scenario(&scenario(77, false), &EngineConfig::default(), 500)
            .expect("engine builds");
        let second = run_scenario(&scenario(77, false), &EngineConfig::default(), 500)
            .expect("engine builds");
        assert_eq!(first.result.ticks, second.result.ticks);
        assert_eq!(first.result.status, second.result.status);
        assert_eq!(first.result.lives_lost, second.result.lives_lost);
        assert_eq!(first.result.pellets_eaten, 0);
    }

    #[test]
    fn scenarios_follow_runs_flag() {
        let cli = Cli::parse_from(["simulate", "--seed", "5", "--runs", "3"]);
        let scenarios = resolve_scenarios(&cli);
        let seeds: Vec<u32> = scenarios.iter().map(|scenario| scenario.seed).collect();
        assert_eq!(seeds, vec![5, 6, 7]);
        assert!(scenarios.iter().all(|scenario| scenario.autopilot));
    }
}
