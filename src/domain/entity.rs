/// Entities: grid coordinates, movement directions, and the per-level
/// entity lists derived from the initial grid.

use super::tile::Tile;

/// A cell coordinate. `x` is the column, `y` the row.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }

    /// One step in `dir`, or `None` if that leaves a `width` × `height` grid.
    pub fn step(self, dir: MoveDir, width: usize, height: usize) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        let nx = self.x as isize + dx;
        let ny = self.y as isize + dy;
        if nx < 0 || ny < 0 || nx as usize >= width || ny as usize >= height {
            return None;
        }
        Some(Pos::new(nx as usize, ny as usize))
    }
}

/// Movement direction: one of the four axis-aligned unit vectors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDir {
    pub const ALL: [MoveDir; 4] = [MoveDir::Right, MoveDir::Left, MoveDir::Down, MoveDir::Up];

    #[inline]
    pub fn delta(self) -> (isize, isize) {
        match self {
            MoveDir::Up => (0, -1),
            MoveDir::Down => (0, 1),
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
        }
    }
}

/// Coordinates of every entity kind, in row-major scan order.
///
/// Checkpoints, lava and both portal lists are fixed once scanned.
/// Boxes and coins mutate during play; `initial_boxes` / `initial_coins`
/// keep the load-time snapshot for resets.
#[derive(Clone, Debug, Default)]
pub struct Entities {
    pub boxes: Vec<Pos>,
    pub coins: Vec<Pos>,
    pub checkpoints: Vec<Pos>,
    pub lava: Vec<Pos>,
    pub portals_a: Vec<Pos>,
    pub portals_b: Vec<Pos>,
    pub initial_boxes: Vec<Pos>,
    pub initial_coins: Vec<Pos>,
}

impl Entities {
    /// Scan a grid (row-major, `y` outer) for every entity kind.
    pub fn scan(grid: &[Vec<Tile>]) -> Self {
        let mut e = Entities::default();
        for (y, row) in grid.iter().enumerate() {
            for (x, &tile) in row.iter().enumerate() {
                let p = Pos::new(x, y);
                match tile {
                    Tile::Box => e.boxes.push(p),
                    Tile::Coin => e.coins.push(p),
                    Tile::Checkpoint => e.checkpoints.push(p),
                    Tile::Lava => e.lava.push(p),
                    Tile::PortalA => e.portals_a.push(p),
                    Tile::PortalB => e.portals_b.push(p),
                    Tile::Floor | Tile::Wall | Tile::Player => {}
                }
            }
        }
        e.initial_boxes = e.boxes.clone();
        e.initial_coins = e.coins.clone();
        e
    }

    #[inline]
    pub fn has_box(&self, p: Pos) -> bool {
        self.boxes.contains(&p)
    }

    #[inline]
    pub fn is_lava(&self, p: Pos) -> bool {
        self.lava.contains(&p)
    }
}

/// Locate the first cell holding `tile` (row-major).
pub fn find_tile(grid: &[Vec<Tile>], tile: Tile) -> Option<Pos> {
    grid.iter().enumerate().find_map(|(y, row)| {
        row.iter().position(|&t| t == tile).map(|x| Pos::new(x, y))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_stays_inside_the_grid() {
        let p = Pos::new(0, 0);
        assert_eq!(p.step(MoveDir::Left, 3, 3), None);
        assert_eq!(p.step(MoveDir::Up, 3, 3), None);
        assert_eq!(p.step(MoveDir::Right, 3, 3), Some(Pos::new(1, 0)));
        assert_eq!(p.step(MoveDir::Down, 3, 3), Some(Pos::new(0, 1)));
        assert_eq!(Pos::new(2, 2).step(MoveDir::Right, 3, 3), None);
        assert_eq!(Pos::new(2, 2).step(MoveDir::Down, 3, 3), None);
    }

    #[test]
    fn scan_is_row_major() {
        let grid = vec![
            vec![Tile::PortalA, Tile::Floor, Tile::PortalA],
            vec![Tile::PortalA, Tile::Box, Tile::Coin],
        ];
        let e = Entities::scan(&grid);
        assert_eq!(e.portals_a, vec![Pos::new(0, 0), Pos::new(2, 0), Pos::new(0, 1)]);
        assert_eq!(e.boxes, vec![Pos::new(1, 1)]);
        assert_eq!(e.initial_boxes, e.boxes);
        assert_eq!(e.initial_coins, vec![Pos::new(2, 1)]);
    }

    #[test]
    fn find_tile_returns_first_match() {
        let grid = vec![
            vec![Tile::Floor, Tile::Floor],
            vec![Tile::Player, Tile::Player],
        ];
        assert_eq!(find_tile(&grid, Tile::Player), Some(Pos::new(0, 1)));
        assert_eq!(find_tile(&grid, Tile::Lava), None);
    }
}
