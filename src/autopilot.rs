use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::engine::pathfinding::{best_direction, can_enter};
use crate::engine::GameEngine;
use crate::maze::Maze;
use crate::types::{Direction, Ghost, GhostMode, Player, Vec2};

pub const FLEE_RADIUS: i32 = 4;
pub const HUNT_RADIUS: i32 = 6;

/// Picks the next input for the player from the engine's public state.
pub fn choose_direction(engine: &GameEngine) -> Direction {
    let pellets: BTreeSet<Vec2> = engine.remaining_pellets().map(|(pos, _)| pos).collect();
    steer(engine.maze(), engine.player(), engine.ghosts(), &pellets)
}

pub fn steer(maze: &Maze, player: &Player, ghosts: &[Ghost], pellets: &BTreeSet<Vec2>) -> Direction {
    let at = player.pos;

    if let Some(threat) = nearest(ghosts, at, is_hostile) {
        if threat.pos.manhattan(at) <= FLEE_RADIUS {
            return best_direction(maze, at, threat.pos, Direction::None, false, true);
        }
    }

    if let Some(prey) = nearest(ghosts, at, |ghost| ghost.mode == GhostMode::Frightened) {
        if prey.pos.manhattan(at) <= HUNT_RADIUS {
            return best_direction(maze, at, prey.pos, Direction::None, false, false);
        }
    }

    first_step_to_pellet(maze, at, pellets).unwrap_or(player.dir)
}

fn is_hostile(ghost: &Ghost) -> bool {
    !ghost.in_house
        && matches!(
            ghost.mode,
            GhostMode::Scatter | GhostMode::Chase | GhostMode::ExitingHouse
        )
}

fn nearest<'a>(ghosts: &'a [Ghost], at: Vec2, keep: impl Fn(&Ghost) -> bool) -> Option<&'a Ghost> {
    ghosts
        .iter()
        .filter(|ghost| keep(ghost))
        .min_by_key(|ghost| ghost.pos.manhattan(at))
}

/// Breadth-first over player-walkable cells; returns the opening move of a
/// shortest path to any remaining pellet.
fn first_step_to_pellet(maze: &Maze, start: Vec2, pellets: &BTreeSet<Vec2>) -> Option<Direction> {
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::new();

    for dir in Direction::CARDINALS {
        let next = maze.wrap(start.step(dir));
        if can_enter(maze, next, false) && seen.insert(next) {
            queue.push_back((next, dir));
        }
    }

    while let Some((pos, first)) = queue.pop_front() {
        if pellets.contains(&pos) {
            return Some(first);
        }
        for dir in Direction::CARDINALS {
            let next = maze.wrap(pos.step(dir));
            if can_enter(maze, next, false) && seen.insert(next) {
                queue.push_back((next, first));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GhostId;

    const HOOK: &[&str] = &[
        "#########",
        "#P  #...#",
        "# #.# # #",
        "#       #",
        "####E####",
        "####G####",
        "#########",
    ];

    fn maze() -> Maze {
        Maze::parse(HOOK).expect("test layout is valid")
    }

    fn player_at(x: i32, y: i32) -> Player {
        Player {
            pos: Vec2::new(x, y),
            dir: Direction::None,
            queued_dir: Direction::None,
            alive: true,
        }
    }

    fn ghost_at(maze: &Maze, x: i32, y: i32, mode: GhostMode) -> Ghost {
        Ghost {
            id: GhostId::Direct,
            pos: Vec2::new(x, y),
            dir: Direction::None,
            mode,
            vulnerable: mode == GhostMode::Frightened,
            target: Vec2::new(x, y),
            home_corner: maze.home_corner(GhostId::Direct),
            exit_delay: 0,
            in_house: false,
        }
    }

    fn pellets(maze: &Maze) -> BTreeSet<Vec2> {
        maze.consumable_cells().map(|(pos, _)| pos).collect()
    }

    #[test]
    fn heads_for_the_closest_pellet_by_path() {
        let maze = maze();
        let player = player_at(1, 1);
        // (3,2) is three steps away through (2,1) and (3,1).
        assert_eq!(steer(&maze, &player, &[], &pellets(&maze)), Direction::Right);
    }

    #[test]
    fn flees_a_nearby_hostile_ghost() {
        let maze = maze();
        let player = player_at(2, 1);
        let ghosts = vec![ghost_at(&maze, 3, 1, GhostMode::Chase)];
        assert_eq!(steer(&maze, &player, &ghosts, &pellets(&maze)), Direction::Left);
    }

    #[test]
    fn ignores_distant_and_house_bound_ghosts() {
        let maze = maze();
        let player = player_at(1, 1);
        let mut ghosts = vec![
            ghost_at(&maze, 7, 3, GhostMode::Chase),
            ghost_at(&maze, 4, 5, GhostMode::InHouse),
        ];
        ghosts[1].in_house = true;
        assert_eq!(steer(&maze, &player, &ghosts, &pellets(&maze)), Direction::Right);
    }

    #[test]
    fn hunts_a_frightened_ghost_in_range() {
        let maze = maze();
        let player = player_at(1, 1);
        let ghosts = vec![ghost_at(&maze, 1, 3, GhostMode::Frightened)];
        assert_eq!(steer(&maze, &player, &ghosts, &pellets(&maze)), Direction::Down);
    }

    #[test]
    fn keeps_heading_when_no_pellet_is_reachable() {
        let maze = maze();
        let mut player = player_at(1, 1);
        player.dir = Direction::Down;
        assert_eq!(steer(&maze, &player, &[], &BTreeSet::new()), Direction::Down);
    }

    #[test]
    fn drives_the_engine_through_its_public_state() {
        let mut engine = GameEngine::builtin(3, Default::default()).expect("builds");
        let start = engine.pellets().collected;
        for _ in 0..40 {
            let dir = choose_direction(&engine);
            engine.tick(Some(dir));
        }
        assert!(engine.pellets().collected > start);
    }
}
