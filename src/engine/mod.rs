use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::constants::LEVEL_LAYOUTS;
use crate::error::ConfigurationError;
use crate::maze::Maze;
use crate::rng::Rng;
use crate::types::{
    CellKind, Direction, GameStatus, GameSummary, Ghost, GhostId, GhostMode, PelletCounter, Phase,
    Player, PowerWindow, RuntimeEvent, ScheduleState, Snapshot, Vec2,
};

mod ghost_system;
pub mod pathfinding;
mod schedule;

pub use self::ghost_system::Personality;
pub use self::schedule::ModeScheduler;

use self::ghost_system::spawn_roster;
use self::pathfinding::{best_direction, can_enter};

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub config: EngineConfig,
    pub start_level: u32,
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            start_level: 1,
        }
    }
}

/// Owns and mutates the whole simulation state. One call to [`tick`] is one
/// step; everything else is a read or a host-issued lifecycle command.
///
/// [`tick`]: GameEngine::tick
#[derive(Clone, Debug)]
pub struct GameEngine {
    pub config: EngineConfig,

    levels: Vec<Maze>,
    maze: Maze,
    seed: u32,
    rng: Rng,

    level: u32,
    status: GameStatus,
    score: u32,
    lives: u32,
    player: Player,
    ghosts: Vec<Ghost>,
    remaining: BTreeMap<Vec2, CellKind>,
    pellets: PelletCounter,
    power: PowerWindow,
    scheduler: ModeScheduler,

    events: Vec<RuntimeEvent>,
    tick_counter: u64,
    ghosts_eaten: u32,
    pellets_eaten: u32,
}

impl GameEngine {
    pub fn new(
        levels: Vec<Maze>,
        seed: u32,
        options: GameEngineOptions,
    ) -> Result<Self, ConfigurationError> {
        options.config.validate()?;
        let Some(first) = levels.first().cloned() else {
            return Err(ConfigurationError::NoLevels);
        };
        let config = options.config;
        let scheduler = ModeScheduler::new(config.scatter_ticks, config.chase_ticks);

        let mut engine = Self {
            player: spawn_player(&first),
            ghosts: spawn_roster(&first, &config),
            maze: first,
            levels,
            seed,
            rng: Rng::new(seed),
            level: 1,
            status: GameStatus::Playing,
            score: 0,
            lives: config.lives,
            remaining: BTreeMap::new(),
            pellets: PelletCounter::default(),
            power: PowerWindow::default(),
            scheduler,
            events: Vec::new(),
            tick_counter: 0,
            ghosts_eaten: 0,
            pellets_eaten: 0,
            config,
        };
        engine.start_level(options.start_level.max(1));
        Ok(engine)
    }

    /// Engine over the compiled-in level layouts.
    pub fn builtin(seed: u32, options: GameEngineOptions) -> Result<Self, ConfigurationError> {
        let levels = LEVEL_LAYOUTS
            .iter()
            .copied()
            .map(Maze::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(levels, seed, options)
    }

    pub fn tick(&mut self, input: Option<Direction>) {
        if self.status != GameStatus::Playing {
            return;
        }
        if let Some(dir) = input {
            self.request_direction(dir);
        }
        self.tick_counter += 1;
        let collected_before = self.pellets.collected;

        self.update_player();
        self.update_ghosts();
        self.update_power_window();
        self.resolve_collisions();
        self.check_level_complete();

        debug_assert!(self.pellets.collected >= collected_before);
        debug_assert!(self.pellets.collected <= self.pellets.total);
        debug_assert_eq!(self.ghosts.len(), GhostId::ALL.len());
    }

    /// Buffers a turn for the next tick. Last write wins; ignored unless playing.
    pub fn request_direction(&mut self, dir: Direction) {
        if self.status != GameStatus::Playing || dir == Direction::None {
            return;
        }
        self.player.queued_dir = dir;
    }

    pub fn pause(&mut self) {
        if self.status == GameStatus::Playing {
            self.status = GameStatus::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.status == GameStatus::Paused {
            self.status = GameStatus::Playing;
        }
    }

    /// Fresh run from `level` (default 1): score, lives and the random source
    /// all start over.
    pub fn reset(&mut self, level: Option<u32>) {
        self.rng = Rng::new(self.seed);
        self.score = 0;
        self.lives = self.config.lives;
        self.tick_counter = 0;
        self.ghosts_eaten = 0;
        self.pellets_eaten = 0;
        self.events.clear();
        self.start_level(level.unwrap_or(1).max(1));
    }

    /// Moves on from a completed level, carrying score and lives.
    pub fn advance_level(&mut self) -> bool {
        if self.status != GameStatus::LevelComplete {
            return false;
        }
        self.start_level(self.level + 1);
        true
    }

    pub fn is_ended(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn pellets(&self) -> PelletCounter {
        self.pellets
    }

    pub fn power(&self) -> PowerWindow {
        self.power
    }

    pub fn schedule(&self) -> ScheduleState {
        self.scheduler.state()
    }

    pub fn remaining_pellets(&self) -> impl Iterator<Item = (Vec2, CellKind)> + '_ {
        self.remaining.iter().map(|(pos, kind)| (*pos, *kind))
    }

    /// Read-only copy of the current state; pending events stay queued.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick_counter,
            level: self.level,
            status: self.status,
            score: self.score,
            lives: self.lives,
            player: self.player.clone(),
            ghosts: self.ghosts.clone(),
            pellets: self.pellets,
            power: self.power,
            schedule: self.scheduler.state(),
            width: self.maze.width(),
            height: self.maze.height(),
            tiles: self.render_tiles(),
            events: Vec::new(),
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let mut snapshot = self.snapshot();
        if include_events {
            snapshot.events = std::mem::take(&mut self.events);
        }
        snapshot
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            status: self.status,
            level: self.level,
            score: self.score,
            lives: self.lives,
            ticks: self.tick_counter,
            ghosts_eaten: self.ghosts_eaten,
            pellets_collected: self.pellets_eaten,
        }
    }

    fn start_level(&mut self, level: u32) {
        self.level = level;
        let index = (level as usize - 1) % self.levels.len();
        self.maze = self.levels[index].clone();
        self.remaining = self.maze.consumable_cells().collect();
        self.pellets = PelletCounter {
            total: self.maze.count_consumables(),
            collected: 0,
        };
        self.reset_actors();
        self.status = GameStatus::Playing;
        info!(
            level,
            pellets = self.pellets.total,
            "level started"
        );
    }

    fn reset_actors(&mut self) {
        self.player = spawn_player(&self.maze);
        self.ghosts = spawn_roster(&self.maze, &self.config);
        self.power = PowerWindow::default();
        self.scheduler.reset();
    }

    fn update_player(&mut self) {
        let queued = self.player.queued_dir;
        if queued != Direction::None {
            let turn = self.maze.wrap(self.player.pos.step(queued));
            if can_enter(&self.maze, turn, false) {
                self.player.dir = queued;
                self.player.queued_dir = Direction::None;
            }
        }
        if self.player.dir == Direction::None {
            return;
        }

        let next = self.maze.wrap(self.player.pos.step(self.player.dir));
        if !can_enter(&self.maze, next, false) {
            return;
        }
        self.player.pos = next;
        self.consume_pickup(next);
    }

    fn consume_pickup(&mut self, pos: Vec2) {
        let Some(kind) = self.remaining.remove(&pos) else {
            return;
        };
        self.pellets.collected += 1;
        self.pellets_eaten += 1;
        if kind == CellKind::PowerPellet {
            self.score = self.score.saturating_add(self.config.power_pellet_score);
            self.events.push(RuntimeEvent::PowerPelletEaten { x: pos.x, y: pos.y });
            self.activate_power_window();
        } else {
            self.score = self.score.saturating_add(self.config.pellet_score);
            self.events.push(RuntimeEvent::PelletEaten { x: pos.x, y: pos.y });
        }
    }

    /// Runs after the power countdown, so a window that expired this tick
    /// leaves its ghosts hostile for the contact check.
    fn resolve_collisions(&mut self) {
        let board_cleared = self.pellets.is_cleared();
        for idx in 0..self.ghosts.len() {
            if self.ghosts[idx].pos != self.player.pos {
                continue;
            }
            match self.ghosts[idx].mode {
                GhostMode::Frightened => self.eat_ghost(idx),
                GhostMode::Eaten => {}
                _ if board_cleared => {}
                _ => {
                    self.lose_life(self.ghosts[idx].id);
                    return;
                }
            }
        }
    }

    fn eat_ghost(&mut self, idx: usize) {
        let points = self
            .config
            .ghost_base_score
            .saturating_mul(2u32.saturating_pow(self.power.combo));
        self.score = self.score.saturating_add(points);
        self.power.combo += 1;
        self.ghosts_eaten += 1;

        let ghost = &mut self.ghosts[idx];
        ghost.mode = GhostMode::Eaten;
        debug!(ghost = ghost.id.label(), points, combo = self.power.combo, "ghost eaten");
        self.events.push(RuntimeEvent::GhostEaten {
            ghost: ghost.id,
            points,
            combo: self.power.combo,
        });
    }

    fn lose_life(&mut self, by: GhostId) {
        self.lives = self.lives.saturating_sub(1);
        self.events.push(RuntimeEvent::LifeLost {
            lives_left: self.lives,
            by,
        });
        if self.lives == 0 {
            self.player.alive = false;
            self.status = GameStatus::GameOver;
            info!(
                level = self.level,
                score = self.score,
                tick = self.tick_counter,
                "game over"
            );
            self.events.push(RuntimeEvent::GameOver { score: self.score });
            return;
        }
        info!(lives = self.lives, by = by.label(), "life lost");
        self.reset_actors();
    }

    fn check_level_complete(&mut self) {
        if self.status != GameStatus::Playing || !self.pellets.is_cleared() {
            return;
        }
        self.status = GameStatus::LevelComplete;
        info!(
            level = self.level,
            score = self.score,
            tick = self.tick_counter,
            "level complete"
        );
        self.events.push(RuntimeEvent::LevelComplete { level: self.level });
    }

    fn render_tiles(&self) -> Vec<String> {
        (0..self.maze.height())
            .map(|y| {
                (0..self.maze.width())
                    .map(|x| {
                        let pos = Vec2::new(x, y);
                        let kind = self.maze.cell(pos);
                        if kind.is_consumable() && !self.remaining.contains_key(&pos) {
                            CellKind::Empty.glyph()
                        } else {
                            kind.glyph()
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

fn spawn_player(maze: &Maze) -> Player {
    Player {
        pos: maze.player_start(),
        dir: Direction::None,
        queued_dir: Direction::None,
        alive: true,
    }
}
