use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Enumeration order used for every tie-break in movement decisions.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" | "w" | "k" => Some(Self::Up),
            "down" | "s" | "j" => Some(Self::Down),
            "left" | "a" | "h" => Some(Self::Left),
            "right" | "d" | "l" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        self.offset(dir, 1)
    }

    pub fn offset(self, dir: Direction, cells: i32) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx * cells,
            y: self.y + dy * cells,
        }
    }

    pub fn manhattan(self, other: Vec2) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Wall,
    Pellet,
    PowerPellet,
    Empty,
    GhostHouse,
}

impl CellKind {
    pub fn is_consumable(self) -> bool {
        matches!(self, Self::Pellet | Self::PowerPellet)
    }

    pub fn glyph(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Pellet => '.',
            Self::PowerPellet => 'o',
            Self::Empty => ' ',
            Self::GhostHouse => '-',
        }
    }
}

/// The four fixed adversary identities, in roster order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostId {
    Direct,
    Ambush,
    Flank,
    Shy,
}

impl GhostId {
    pub const ALL: [GhostId; 4] = [
        GhostId::Direct,
        GhostId::Ambush,
        GhostId::Flank,
        GhostId::Shy,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Direct => 0,
            Self::Ambush => 1,
            Self::Flank => 2,
            Self::Shy => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Ambush => "ambush",
            Self::Flank => "flank",
            Self::Shy => "shy",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMode {
    InHouse,
    ExitingHouse,
    Scatter,
    Chase,
    Frightened,
    Eaten,
}

impl GhostMode {
    /// Modes that may walk through ghost-house cells.
    pub fn may_enter_house(self) -> bool {
        matches!(self, Self::InHouse | Self::ExitingHouse | Self::Eaten)
    }

    /// Modes that follow the global scatter/chase schedule.
    pub fn on_schedule(self) -> bool {
        matches!(self, Self::Scatter | Self::Chase)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Scatter,
    Chase,
}

impl Phase {
    pub fn as_mode(self) -> GhostMode {
        match self {
            Self::Scatter => GhostMode::Scatter,
            Self::Chase => GhostMode::Chase,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Playing,
    Paused,
    GameOver,
    LevelComplete,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::LevelComplete)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Player {
    pub pos: Vec2,
    pub dir: Direction,
    #[serde(rename = "queuedDir")]
    pub queued_dir: Direction,
    pub alive: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Ghost {
    pub id: GhostId,
    pub pos: Vec2,
    pub dir: Direction,
    pub mode: GhostMode,
    pub vulnerable: bool,
    pub target: Vec2,
    #[serde(rename = "homeCorner")]
    pub home_corner: Vec2,
    #[serde(rename = "exitDelay")]
    pub exit_delay: u32,
    #[serde(rename = "inHouse")]
    pub in_house: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PelletCounter {
    pub total: u32,
    pub collected: u32,
}

impl PelletCounter {
    pub fn remaining(&self) -> u32 {
        self.total.saturating_sub(self.collected)
    }

    pub fn is_cleared(&self) -> bool {
        self.collected == self.total
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PowerWindow {
    pub active: bool,
    #[serde(rename = "remainingTicks")]
    pub remaining_ticks: u32,
    pub combo: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScheduleState {
    pub phase: Phase,
    #[serde(rename = "remainingTicks")]
    pub remaining_ticks: u32,
    pub flips: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PelletEaten {
        x: i32,
        y: i32,
    },
    PowerPelletEaten {
        x: i32,
        y: i32,
    },
    GhostReleased {
        ghost: GhostId,
    },
    GhostEaten {
        ghost: GhostId,
        points: u32,
        combo: u32,
    },
    GhostHome {
        ghost: GhostId,
    },
    PhaseChanged {
        phase: Phase,
    },
    PowerWindowEnded,
    LifeLost {
        #[serde(rename = "livesLeft")]
        lives_left: u32,
        by: GhostId,
    },
    LevelComplete {
        level: u32,
    },
    GameOver {
        score: u32,
    },
}

/// Read-only copy of the whole simulation state after a tick.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub level: u32,
    pub status: GameStatus,
    pub score: u32,
    pub lives: u32,
    pub player: Player,
    pub ghosts: Vec<Ghost>,
    pub pellets: PelletCounter,
    pub power: PowerWindow,
    pub schedule: ScheduleState,
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<String>,
    pub events: Vec<RuntimeEvent>,
}

/// Final figures handed to session recording once a run stops.
#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub status: GameStatus,
    pub level: u32,
    pub score: u32,
    pub lives: u32,
    pub ticks: u64,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: u32,
    #[serde(rename = "pelletsCollected")]
    pub pellets_collected: u32,
}
