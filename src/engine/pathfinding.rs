use crate::maze::Maze;
use crate::types::{CellKind, Direction, Vec2};

/// Whether an agent may stand on `pos`. Ghost-house cells are only open to
/// agents that are allowed inside.
pub fn can_enter(maze: &Maze, pos: Vec2, allow_ghost_house: bool) -> bool {
    match maze.cell(pos) {
        CellKind::Wall => false,
        CellKind::GhostHouse => allow_ghost_house,
        CellKind::Pellet | CellKind::PowerPellet | CellKind::Empty => true,
    }
}

/// One-step greedy choice toward (or, with `flee`, away from) `target`.
///
/// Candidates are tried in `Direction::CARDINALS` order and only a strictly
/// better distance replaces the current pick, so ties go to the earlier
/// direction. Reversing is only allowed when it is the sole legal move; with
/// no legal move at all the agent keeps `current` and stalls.
pub fn best_direction(
    maze: &Maze,
    position: Vec2,
    target: Vec2,
    current: Direction,
    allow_ghost_house: bool,
    flee: bool,
) -> Direction {
    let reverse = current.opposite();
    let mut reverse_legal = false;
    let mut best: Option<(Direction, i32)> = None;

    for dir in Direction::CARDINALS {
        let next = maze.wrap(position.step(dir));
        if !can_enter(maze, next, allow_ghost_house) {
            continue;
        }
        if dir == reverse {
            reverse_legal = true;
            continue;
        }
        let distance = next.manhattan(target);
        let better = match best {
            None => true,
            Some((_, best_distance)) if flee => distance > best_distance,
            Some((_, best_distance)) => distance < best_distance,
        };
        if better {
            best = Some((dir, distance));
        }
    }

    match best {
        Some((dir, _)) => dir,
        None if reverse_legal => reverse,
        None => current,
    }
}
