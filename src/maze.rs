use crate::error::ConfigurationError;
use crate::types::{CellKind, GhostId, Vec2};

/// Immutable grid the simulation runs on. Consumed pellets are tracked by the
/// engine, never written back here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze {
    width: i32,
    height: i32,
    cells: Vec<CellKind>,
    tunnel_rows: Vec<bool>,
    player_start: Vec2,
    house_center: Vec2,
    house_exit: Vec2,
    consumables: u32,
}

impl Maze {
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, ConfigurationError> {
        let Some(first) = rows.first() else {
            return Err(ConfigurationError::EmptyLayout);
        };
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(ConfigurationError::EmptyLayout);
        }

        let mut cells = Vec::with_capacity(width * rows.len());
        let mut player_start = None;
        let mut house_center = None;
        let mut house_exit = None;

        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width {
                return Err(ConfigurationError::RaggedRow {
                    row: y,
                    found,
                    expected: width,
                });
            }
            for (x, code) in row.chars().enumerate() {
                let pos = Vec2::new(x as i32, y as i32);
                let kind = match code {
                    '#' => CellKind::Wall,
                    '.' => CellKind::Pellet,
                    'o' => CellKind::PowerPellet,
                    ' ' => CellKind::Empty,
                    'H' | '=' => CellKind::GhostHouse,
                    'P' => {
                        place_marker(&mut player_start, pos, code)?;
                        CellKind::Empty
                    }
                    'E' => {
                        place_marker(&mut house_exit, pos, code)?;
                        CellKind::Empty
                    }
                    'G' => {
                        place_marker(&mut house_center, pos, code)?;
                        CellKind::GhostHouse
                    }
                    _ => return Err(ConfigurationError::UnknownCell { code, x, y }),
                };
                cells.push(kind);
            }
        }

        let player_start = player_start.ok_or(ConfigurationError::MissingPlayerStart)?;
        let house_center = house_center.ok_or(ConfigurationError::MissingGhostHouse)?;
        let house_exit = house_exit.ok_or(ConfigurationError::MissingHouseExit)?;

        let width = width as i32;
        let height = rows.len() as i32;
        let tunnel_rows = (0..height as usize)
            .map(|y| {
                let left = cells[y * width as usize];
                let right = cells[y * width as usize + width as usize - 1];
                left != CellKind::Wall && right != CellKind::Wall
            })
            .collect();
        let consumables = cells.iter().filter(|kind| kind.is_consumable()).count() as u32;

        Ok(Self {
            width,
            height,
            cells,
            tunnel_rows,
            player_start,
            house_center,
            house_exit,
            consumables,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn player_start(&self) -> Vec2 {
        self.player_start
    }

    pub fn house_center(&self) -> Vec2 {
        self.house_center
    }

    pub fn house_exit(&self) -> Vec2 {
        self.house_exit
    }

    pub fn in_bounds(&self, pos: Vec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn is_tunnel_row(&self, y: i32) -> bool {
        y >= 0 && y < self.height && self.tunnel_rows[y as usize]
    }

    /// Resolves a horizontal step off a tunnel row to the opposite edge.
    /// Positions off any other row are returned unchanged.
    pub fn wrap(&self, pos: Vec2) -> Vec2 {
        if (pos.x < 0 || pos.x >= self.width) && self.is_tunnel_row(pos.y) {
            Vec2::new(pos.x.rem_euclid(self.width), pos.y)
        } else {
            pos
        }
    }

    pub fn cell_at(&self, x: i32, y: i32) -> CellKind {
        if y < 0 || y >= self.height {
            return CellKind::Wall;
        }
        let x = if x < 0 || x >= self.width {
            if !self.is_tunnel_row(y) {
                return CellKind::Wall;
            }
            x.rem_euclid(self.width)
        } else {
            x
        };
        self.cells[(y * self.width + x) as usize]
    }

    pub fn cell(&self, pos: Vec2) -> CellKind {
        self.cell_at(pos.x, pos.y)
    }

    pub fn count_consumables(&self) -> u32 {
        self.consumables
    }

    pub fn consumable_cells(&self) -> impl Iterator<Item = (Vec2, CellKind)> + '_ {
        self.cells.iter().enumerate().filter_map(|(idx, kind)| {
            kind.is_consumable().then(|| {
                let idx = idx as i32;
                (Vec2::new(idx % self.width, idx / self.width), *kind)
            })
        })
    }

    pub fn clamp(&self, pos: Vec2) -> Vec2 {
        Vec2::new(
            pos.x.clamp(0, self.width - 1),
            pos.y.clamp(0, self.height - 1),
        )
    }

    /// Fixed scatter corner per identity.
    pub fn home_corner(&self, id: GhostId) -> Vec2 {
        let right = self.width - 1;
        let bottom = self.height - 1;
        match id {
            GhostId::Direct => Vec2::new(right, 0),
            GhostId::Ambush => Vec2::new(0, 0),
            GhostId::Flank => Vec2::new(right, bottom),
            GhostId::Shy => Vec2::new(0, bottom),
        }
    }

    pub fn rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|kind| kind.glyph()).collect())
            .collect()
    }
}

fn place_marker(slot: &mut Option<Vec2>, pos: Vec2, marker: char) -> Result<(), ConfigurationError> {
    if slot.is_some() {
        return Err(ConfigurationError::DuplicateMarker { marker });
    }
    *slot = Some(pos);
    Ok(())
}
