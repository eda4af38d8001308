/// Level catalog: the ordered, immutable set of levels a game is played
/// through, indexed `0..len()`.
///
/// ## Level format
///   One string per row, one decimal digit per cell:
///   ```text
///   0 Floor     1 Wall     2 Player start   3 Box      4 Checkpoint
///   5 Coin      6 Lava     7 Portal A       8 Portal B
///   ```
///   Rows must all be the same width, and a level must hold exactly one
///   player start. Portal A/B counts need not match; unmatched portals
///   simply have no exit.
///
/// Levels are embedded in the binary; nothing is read from disk.

use tracing::info;

use crate::domain::entity::Entities;
use crate::domain::tile::Tile;
use crate::sim::world::{GameField, LevelState};

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum LevelError {
    #[error("invalid level: {index} (catalog has {count} levels)")]
    InvalidLevel { index: usize, count: usize },
    #[error("level \"{name}\" has no rows")]
    Empty { name: String },
    #[error("level \"{name}\": row {row} is {found} cells wide, expected {expected}")]
    RaggedRow { name: String, row: usize, expected: usize, found: usize },
    #[error("level \"{name}\": unknown tile {found:?} at ({x}, {y})")]
    UnknownTile { name: String, x: usize, y: usize, found: char },
    #[error("level \"{name}\" has {count} player starts, expected exactly one")]
    PlayerCount { name: String, count: usize },
}

/// One immutable level: a display name plus its rectangular grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelDef {
    pub name: String,
    pub grid: Vec<Vec<Tile>>,
}

impl LevelDef {
    /// Parse a level from digit rows. See the module docs for the format.
    pub fn parse(name: &str, rows: &[&str]) -> Result<Self, LevelError> {
        let name = name.to_string();
        let expected = match rows.first() {
            Some(r) => r.chars().count(),
            None => return Err(LevelError::Empty { name }),
        };
        if expected == 0 {
            return Err(LevelError::Empty { name });
        }

        let mut grid = Vec::with_capacity(rows.len());
        let mut players = 0;
        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != expected {
                return Err(LevelError::RaggedRow { name, row: y, expected, found });
            }
            let mut cells = Vec::with_capacity(expected);
            for (x, ch) in row.chars().enumerate() {
                let tile = ch
                    .to_digit(10)
                    .and_then(|d| Tile::from_code(d as u8))
                    .ok_or_else(|| LevelError::UnknownTile { name: name.clone(), x, y, found: ch })?;
                if tile == Tile::Player {
                    players += 1;
                }
                cells.push(tile);
            }
            grid.push(cells);
        }

        if players != 1 {
            return Err(LevelError::PlayerCount { name, count: players });
        }
        Ok(LevelDef { name, grid })
    }

    pub fn width(&self) -> usize {
        self.grid.first().map_or(0, |r| r.len())
    }

    pub fn height(&self) -> usize {
        self.grid.len()
    }
}

/// Ordered level sequence.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    levels: Vec<LevelDef>,
}

impl Catalog {
    pub fn new(levels: Vec<LevelDef>) -> Self {
        Catalog { levels }
    }

    /// The seven levels that ship with the game.
    pub fn builtin() -> Result<Self, LevelError> {
        let levels = BUILTIN_LEVELS
            .iter()
            .map(|(name, rows)| LevelDef::parse(name, rows))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Catalog { levels })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Look up a level, failing with `InvalidLevel` outside `0..len()`.
    pub fn get(&self, index: usize) -> Result<&LevelDef, LevelError> {
        self.levels
            .get(index)
            .ok_or(LevelError::InvalidLevel { index, count: self.levels.len() })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.levels.iter().map(|l| l.name.as_str())
    }
}

// ══════════════════════════════════════════════════════════════
// Loading
// ══════════════════════════════════════════════════════════════

/// Load a level into the field, wholly replacing the previous level's
/// state. On `InvalidLevel` the field is left untouched.
pub fn load_level(field: &mut GameField, index: usize) -> Result<(), LevelError> {
    let def = field.catalog.get(index)?;
    let grid = def.grid.clone();
    let name = def.name.clone();

    field.width = def.width();
    field.height = def.height();
    field.entities = Entities::scan(&grid);
    field.tiles = grid.clone();
    field.base_tiles = grid;
    field.coin_count = 0;
    field.current_level = index;
    field.level_name = name;
    field.state = LevelState::InPlay;

    info!(
        level = index,
        name = %field.level_name,
        boxes = field.entities.boxes.len(),
        coins = field.entities.coins.len(),
        "level loaded"
    );
    Ok(())
}

// ══════════════════════════════════════════════════════════════
// Built-in levels
// ══════════════════════════════════════════════════════════════

const BUILTIN_LEVELS: &[(&str, &[&str])] = &[
    ("Beginning", &[
        "000000000000",
        "000000000000",
        "000000000000",
        "000000000000",
        "011111111100",
        "012530004100",
        "011111111100",
        "000000000000",
        "000000000000",
        "000000000000",
        "000000000000",
    ]),
    ("Challenge", &[
        "011111111110",
        "011111111110",
        "011110001110",
        "010423001110",
        "015110341110",
        "010411301110",
        "010010401110",
        "010343334110",
        "010000400110",
        "011110000110",
        "011111111110",
    ]),
    ("Challenge 2", &[
        "000000000000",
        "000011111000",
        "001110001000",
        "001423001000",
        "001110341000",
        "001411301000",
        "001010401100",
        "001343334100",
        "001000400100",
        "001111111100",
        "000000000000",
    ]),
    ("Easy Maze", &[
        "110111111111",
        "112111111111",
        "110110011111",
        "113110000001",
        "115110111001",
        "110100141001",
        "110100001011",
        "110111001011",
        "100111111011",
        "100000000011",
        "111111110011",
        "111111111111",
    ]),
    ("Lava Zone", &[
        "111111111111",
        "120000000001",
        "166666666601",
        "100000000001",
        "106666666661",
        "100000000001",
        "166666666601",
        "166660066601",
        "150003000001",
        "166660666661",
        "166664666661",
        "166666666661",
        "111111111111",
    ]),
    ("Portal Room", &[
        "11111111111111111111111111",
        "12000010000010000010000001",
        "10703010080010080010008001",
        "10000010000710000710000001",
        "10000010000010000010007001",
        "11111111111111111111111111",
        "10000010000010000010000001",
        "10080010000010080010000001",
        "10000010080010700010000001",
        "10007017000010000010000001",
        "11111111111111111111111111",
        "10000010000010000015000051",
        "10800010000010000010008001",
        "10000010000010000010000051",
        "17000010000010000015000041",
        "11111111111111111111111111",
    ]),
    ("The Right Path", &[
        "11111111111111111111",
        "12000000000000000001",
        "10111111111011111101",
        "17111111111711111171",
        "11111111111111111111",
        "16666666666666666661",
        "16666666666666666661",
        "18111111111811111181",
        "10666666666066666601",
        "16666666666666666651",
        "16666666666666666631",
        "16666666666666666641",
        "11111111111111111111",
    ]),
];
