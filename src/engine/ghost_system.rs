use super::*;

/// Chase-mode targeting per identity. Each variant carries only what its
/// formula reads; the flank partner is a roster index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Personality {
    Direct,
    Ambush { lead: i32 },
    Flank { partner: usize, radius: i32 },
    Shy { radius: i32 },
}

impl Personality {
    pub fn of(id: GhostId, config: &EngineConfig) -> Self {
        match id {
            GhostId::Direct => Self::Direct,
            GhostId::Ambush => Self::Ambush {
                lead: config.ambush_lead_cells,
            },
            GhostId::Flank => Self::Flank {
                partner: GhostId::Direct.index(),
                radius: config.engage_radius,
            },
            GhostId::Shy => Self::Shy {
                radius: config.engage_radius,
            },
        }
    }

    pub fn chase_target(self, ghost: &Ghost, player: &Player, roster: &[Ghost], maze: &Maze) -> Vec2 {
        let prey = player.pos;
        match self {
            Self::Direct => prey,
            Self::Ambush { lead } => maze.clamp(prey.offset(player.dir, lead)),
            Self::Flank { partner, radius } => {
                if ghost.pos.manhattan(prey) > radius {
                    return prey;
                }
                let Some(anchor) = roster.get(partner) else {
                    return prey;
                };
                maze.clamp(Vec2::new(
                    2 * prey.x - anchor.pos.x,
                    2 * prey.y - anchor.pos.y,
                ))
            }
            Self::Shy { radius } => {
                if ghost.pos.manhattan(prey) > radius {
                    prey
                } else {
                    ghost.home_corner
                }
            }
        }
    }
}

pub(super) fn spawn_ghost(id: GhostId, maze: &Maze, config: &EngineConfig) -> Ghost {
    let home = maze.house_center();
    Ghost {
        id,
        pos: home,
        dir: Direction::None,
        mode: GhostMode::InHouse,
        vulnerable: false,
        target: home,
        home_corner: maze.home_corner(id),
        exit_delay: config.house_exit_delays[id.index()],
        in_house: true,
    }
}

pub(super) fn spawn_roster(maze: &Maze, config: &EngineConfig) -> Vec<Ghost> {
    GhostId::ALL
        .iter()
        .map(|id| spawn_ghost(*id, maze, config))
        .collect()
}

/// Target cell for this tick. Frightened ghosts re-roll a random cell every
/// call; eaten ghosts head for the exit first, then drop to the center.
pub(super) fn select_target(
    ghost: &Ghost,
    roster: &[Ghost],
    player: &Player,
    maze: &Maze,
    config: &EngineConfig,
    rng: &mut Rng,
) -> Vec2 {
    match ghost.mode {
        GhostMode::InHouse => ghost.pos,
        GhostMode::ExitingHouse => maze.house_exit(),
        GhostMode::Scatter => ghost.home_corner,
        GhostMode::Chase => Personality::of(ghost.id, config).chase_target(ghost, player, roster, maze),
        GhostMode::Frightened => rng.cell_within(maze.width(), maze.height()),
        GhostMode::Eaten => {
            if ghost.in_house || ghost.pos == maze.house_exit() {
                maze.house_center()
            } else {
                maze.house_exit()
            }
        }
    }
}

impl GameEngine {
    pub(super) fn update_ghosts(&mut self) {
        if let Some(phase) = self.scheduler.advance() {
            self.apply_phase(phase);
        }
        let phase = self.scheduler.phase();

        for idx in 0..self.ghosts.len() {
            if self.ghosts[idx].mode == GhostMode::InHouse && !self.release_if_due(idx) {
                continue;
            }

            let target = select_target(
                &self.ghosts[idx],
                &self.ghosts,
                &self.player,
                &self.maze,
                &self.config,
                &mut self.rng,
            );
            let ghost = &mut self.ghosts[idx];
            ghost.target = target;

            let allow_house = ghost.mode.may_enter_house();
            let dir = best_direction(&self.maze, ghost.pos, target, ghost.dir, allow_house, false);
            let next = self.maze.wrap(ghost.pos.step(dir));
            if dir != Direction::None && can_enter(&self.maze, next, allow_house) {
                ghost.pos = next;
                ghost.dir = dir;
            }

            self.settle_ghost(idx, phase);
        }
    }

    /// Pushes a schedule flip into every ghost on the normal track.
    pub(super) fn apply_phase(&mut self, phase: Phase) {
        for ghost in &mut self.ghosts {
            if ghost.mode.on_schedule() {
                ghost.mode = phase.as_mode();
            }
        }
        debug!(tick = self.tick_counter, ?phase, "schedule phase changed");
        self.events.push(RuntimeEvent::PhaseChanged { phase });
    }

    pub(super) fn frighten_ghosts(&mut self) {
        for ghost in &mut self.ghosts {
            if ghost.mode.on_schedule() || ghost.mode == GhostMode::Frightened {
                ghost.mode = GhostMode::Frightened;
                ghost.vulnerable = true;
                ghost.dir = ghost.dir.opposite();
            }
        }
    }

    pub(super) fn calm_frightened_ghosts(&mut self, phase: Phase) {
        for ghost in &mut self.ghosts {
            if ghost.mode == GhostMode::Frightened {
                ghost.mode = phase.as_mode();
                ghost.vulnerable = false;
            }
        }
    }

    fn release_if_due(&mut self, idx: usize) -> bool {
        let ghost = &mut self.ghosts[idx];
        ghost.exit_delay = ghost.exit_delay.saturating_sub(1);
        if ghost.exit_delay > 0 {
            return false;
        }
        ghost.mode = GhostMode::ExitingHouse;
        self.events.push(RuntimeEvent::GhostReleased { ghost: ghost.id });
        true
    }

    fn settle_ghost(&mut self, idx: usize, phase: Phase) {
        let ghost = &mut self.ghosts[idx];
        ghost.in_house = self.maze.cell(ghost.pos) == CellKind::GhostHouse;
        match ghost.mode {
            GhostMode::ExitingHouse if ghost.pos == self.maze.house_exit() => {
                ghost.mode = phase.as_mode();
            }
            GhostMode::Eaten if ghost.pos == self.maze.house_center() => {
                ghost.mode = GhostMode::InHouse;
                ghost.vulnerable = false;
                ghost.exit_delay = self.config.eaten_exit_delay;
                self.events.push(RuntimeEvent::GhostHome { ghost: ghost.id });
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CLASSIC_LAYOUT;

    fn classic() -> Maze {
        Maze::parse(CLASSIC_LAYOUT).expect("classic layout is valid")
    }

    fn player_at(x: i32, y: i32, dir: Direction) -> Player {
        Player {
            pos: Vec2::new(x, y),
            dir,
            queued_dir: Direction::None,
            alive: true,
        }
    }

    fn roster_at(maze: &Maze, positions: [(i32, i32); 4]) -> Vec<Ghost> {
        let config = EngineConfig::default();
        spawn_roster(maze, &config)
            .into_iter()
            .zip(positions)
            .map(|(mut ghost, (x, y))| {
                ghost.pos = Vec2::new(x, y);
                ghost.mode = GhostMode::Chase;
                ghost
            })
            .collect()
    }

    #[test]
    fn direct_targets_the_player() {
        let maze = classic();
        let roster = roster_at(&maze, [(1, 1), (1, 5), (6, 5), (26, 29)]);
        let player = player_at(6, 8, Direction::Left);
        let target = Personality::Direct.chase_target(&roster[0], &player, &roster, &maze);
        assert_eq!(target, player.pos);
    }

    #[test]
    fn ambush_leads_along_facing_and_clamps() {
        let maze = classic();
        let roster = roster_at(&maze, [(1, 1), (1, 5), (6, 5), (26, 29)]);
        let personality = Personality::of(GhostId::Ambush, &EngineConfig::default());

        let player = player_at(12, 20, Direction::Right);
        let target = personality.chase_target(&roster[1], &player, &roster, &maze);
        assert_eq!(target, Vec2::new(16, 20));

        let player = player_at(1, 2, Direction::Up);
        let target = personality.chase_target(&roster[1], &player, &roster, &maze);
        assert_eq!(target, Vec2::new(1, 0));

        let player = player_at(5, 5, Direction::None);
        let target = personality.chase_target(&roster[1], &player, &roster, &maze);
        assert_eq!(target, Vec2::new(5, 5));
    }

    #[test]
    fn flank_pincers_off_direct_when_close() {
        let maze = classic();
        let roster = roster_at(&maze, [(6, 5), (1, 1), (9, 8), (26, 29)]);
        let personality = Personality::of(GhostId::Flank, &EngineConfig::default());
        let player = player_at(8, 8, Direction::Left);
        // (8,8) + ((8,8) - (6,5)) = (10,11)
        let target = personality.chase_target(&roster[2], &player, &roster, &maze);
        assert_eq!(target, Vec2::new(10, 11));
    }

    #[test]
    fn flank_pincer_is_clamped_to_the_grid() {
        let maze = classic();
        let roster = roster_at(&maze, [(6, 5), (1, 1), (3, 1), (26, 29)]);
        let personality = Personality::of(GhostId::Flank, &EngineConfig::default());
        let player = player_at(1, 1, Direction::Left);
        let target = personality.chase_target(&roster[2], &player, &roster, &maze);
        assert_eq!(target, Vec2::new(0, 0));
    }

    #[test]
    fn flank_goes_direct_when_far() {
        let maze = classic();
        let roster = roster_at(&maze, [(6, 5), (1, 1), (26, 29), (1, 29)]);
        let personality = Personality::of(GhostId::Flank, &EngineConfig::default());
        let player = player_at(8, 8, Direction::Left);
        let target = personality.chase_target(&roster[2], &player, &roster, &maze);
        assert_eq!(target, player.pos);
    }

    #[test]
    fn shy_retreats_inside_radius() {
        let maze = classic();
        let roster = roster_at(&maze, [(6, 5), (1, 1), (26, 29), (6, 20)]);
        let personality = Personality::of(GhostId::Shy, &EngineConfig::default());

        let near = player_at(9, 20, Direction::Left);
        let target = personality.chase_target(&roster[3], &near, &roster, &maze);
        assert_eq!(target, roster[3].home_corner);

        let far = player_at(26, 1, Direction::Left);
        let target = personality.chase_target(&roster[3], &far, &roster, &maze);
        assert_eq!(target, far.pos);
    }

    #[test]
    fn scatter_and_frightened_targets() {
        let maze = classic();
        let config = EngineConfig::default();
        let mut roster = roster_at(&maze, [(6, 5), (1, 1), (26, 29), (6, 20)]);
        let player = player_at(9, 20, Direction::Left);
        let mut rng = Rng::new(9);

        roster[0].mode = GhostMode::Scatter;
        let target = select_target(&roster[0], &roster, &player, &maze, &config, &mut rng);
        assert_eq!(target, Vec2::new(27, 0));

        roster[0].mode = GhostMode::Frightened;
        for _ in 0..200 {
            let target = select_target(&roster[0], &roster, &player, &maze, &config, &mut rng);
            assert!(maze.in_bounds(target));
        }
    }

    #[test]
    fn eaten_heads_for_exit_then_center() {
        let maze = classic();
        let config = EngineConfig::default();
        let mut roster = roster_at(&maze, [(6, 5), (1, 1), (26, 29), (6, 20)]);
        let player = player_at(9, 20, Direction::Left);
        let mut rng = Rng::new(1);

        roster[0].mode = GhostMode::Eaten;
        roster[0].in_house = false;
        let target = select_target(&roster[0], &roster, &player, &maze, &config, &mut rng);
        assert_eq!(target, maze.house_exit());

        roster[0].pos = maze.house_exit();
        let target = select_target(&roster[0], &roster, &player, &maze, &config, &mut rng);
        assert_eq!(target, maze.house_center());
    }

    #[test]
    fn spawned_roster_is_staggered_in_house() {
        let maze = classic();
        let roster = spawn_roster(&maze, &EngineConfig::default());
        let delays: Vec<u32> = roster.iter().map(|ghost| ghost.exit_delay).collect();
        assert_eq!(delays, vec![0, 30, 60, 90]);
        assert!(roster
            .iter()
            .all(|ghost| ghost.mode == GhostMode::InHouse && ghost.pos == maze.house_center()));
        let ids: Vec<GhostId> = roster.iter().map(|ghost| ghost.id).collect();
        assert_eq!(ids, GhostId::ALL.to_vec());
    }
}
