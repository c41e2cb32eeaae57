pub const TICK_RATE: u32 = 10;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const STARTING_LIVES: u32 = 3;

pub const PELLET_SCORE: u32 = 10;
pub const POWER_PELLET_SCORE: u32 = 50;
pub const GHOST_BASE_SCORE: u32 = 200;

pub const POWER_DURATION_TICKS: u32 = 60;
pub const SCATTER_TICKS: u32 = 70;
pub const CHASE_TICKS: u32 = 200;

/// Release delays in roster order: direct, ambush, flank, shy.
pub const HOUSE_EXIT_DELAYS: [u32; 4] = [0, 30, 60, 90];
pub const EATEN_EXIT_DELAY: u32 = 10;

pub const AMBUSH_LEAD_CELLS: i32 = 4;
pub const ENGAGE_RADIUS: i32 = 8;

/// `#` wall, `.` pellet, `o` power pellet, ` ` empty, `H` ghost house,
/// `=` house door, `G` house center, `E` house exit, `P` player start.
pub const CLASSIC_LAYOUT: &[&str] = &[
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "######.##### ## #####.######",
    "######.##    E     ##.######",
    "######.## ###==### ##.######",
    "######.## #HHHHHH# ##.######",
    "      .   #HHHGHH#   .      ",
    "######.## #HHHHHH# ##.######",
    "######.## ######## ##.######",
    "######.##          ##.######",
    "######.## ######## ##.######",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#o..##.......P .......##..o#",
    "###.##.##.########.##.##.###",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
];

/// Level `n` plays `LEVEL_LAYOUTS[(n - 1) % len]`.
pub const LEVEL_LAYOUTS: &[&[&str]] = &[CLASSIC_LAYOUT];
