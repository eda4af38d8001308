/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.
///
/// Catalog encoding (one decimal digit per cell):
///   0 Floor   1 Wall   2 Player   3 Box   4 Checkpoint
///   5 Coin    6 Lava   7 PortalA  8 PortalB

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Tile {
    Floor,
    Wall,
    Player,
    Box,
    Checkpoint,
    Coin,
    Lava,
    PortalA,
    PortalB,
}

impl Tile {
    /// Decode a catalog tile code.
    pub fn from_code(code: u8) -> Option<Tile> {
        let tile = match code {
            0 => Tile::Floor,
            1 => Tile::Wall,
            2 => Tile::Player,
            3 => Tile::Box,
            4 => Tile::Checkpoint,
            5 => Tile::Coin,
            6 => Tile::Lava,
            7 => Tile::PortalA,
            8 => Tile::PortalB,
            _ => return None,
        };
        Some(tile)
    }

    pub fn code(self) -> u8 {
        match self {
            Tile::Floor => 0,
            Tile::Wall => 1,
            Tile::Player => 2,
            Tile::Box => 3,
            Tile::Checkpoint => 4,
            Tile::Coin => 5,
            Tile::Lava => 6,
            Tile::PortalA => 7,
            Tile::PortalB => 8,
        }
    }

    /// Nothing may ever enter a wall.
    pub fn is_wall(self) -> bool {
        matches!(self, Tile::Wall)
    }

    pub fn is_portal(self) -> bool {
        matches!(self, Tile::PortalA | Tile::PortalB)
    }

    /// Can a box be pushed onto this tile (before box occupancy is considered)?
    pub fn accepts_box(self) -> bool {
        !matches!(self, Tile::Wall | Tile::Lava)
    }

    /// The code a cell reverts to once whatever stood on it moves away.
    ///
    /// `self` is the cell's tile in the initial grid. Terrain that is part of
    /// the level layout survives; spawn, box and coin cells become floor.
    pub fn underlying(self) -> Tile {
        match self {
            Tile::PortalA | Tile::PortalB | Tile::Checkpoint | Tile::Wall => self,
            Tile::Floor | Tile::Player | Tile::Box | Tile::Coin | Tile::Lava => Tile::Floor,
        }
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_decode_to_the_matching_variant() {
        for code in 0..=8u8 {
            let tile = Tile::from_code(code).unwrap();
            assert_eq!(tile.code(), code);
        }
        assert_eq!(Tile::from_code(9), None);
    }

    #[test]
    fn layout_terrain_survives_vacating() {
        assert_eq!(Tile::PortalA.underlying(), Tile::PortalA);
        assert_eq!(Tile::PortalB.underlying(), Tile::PortalB);
        assert_eq!(Tile::Checkpoint.underlying(), Tile::Checkpoint);
        assert_eq!(Tile::Wall.underlying(), Tile::Wall);
    }

    #[test]
    fn spawn_box_and_coin_cells_become_floor() {
        assert_eq!(Tile::Player.underlying(), Tile::Floor);
        assert_eq!(Tile::Box.underlying(), Tile::Floor);
        assert_eq!(Tile::Coin.underlying(), Tile::Floor);
    }

    #[test]
    fn boxes_never_enter_walls_or_lava() {
        assert!(!Tile::Wall.accepts_box());
        assert!(!Tile::Lava.accepts_box());
        assert!(Tile::Checkpoint.accepts_box());
        assert!(Tile::PortalB.accepts_box());
    }
}
