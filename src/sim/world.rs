/// GameField: the complete state of the level being played.
///
/// ## Tile Architecture
///
/// Two tile layers:
///   - `base_tiles`: the level as loaded. **Never mutated** after load.
///   - `tiles`: the live grid (player, boxes, collected coins applied).
///
/// All tile mutations go through `set_tile()` / `restore_tile()`.
/// Resets copy `base_tiles` back into `tiles`.
///
/// ## Level State
///
/// ```text
///   Loading ──► InPlay ──(all boxes on checkpoints)──► Completed
///                 ▲  │                                    │
///                 └──┘ move / push / reset                ├─ next level exists ──► Loading
///                                                         └─ last level ─────────► GameComplete
/// ```
/// `Loading` and `Completed` never outlive a single command, so only
/// `InPlay` and `GameComplete` are observable between commands.
///
/// Callers read the field through accessors; every mutation happens
/// inside `sim::level` and `sim::step`.

use crate::domain::entity::{find_tile, Entities, MoveDir, Pos};
use crate::domain::rules::{self, MapView};
use crate::domain::tile::Tile;

use super::event::GameEvent;
use super::level::{self, Catalog, LevelError};
use super::progress::Progress;
use super::step;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LevelState {
    InPlay,
    GameComplete,
}

#[derive(Clone, Debug)]
pub struct GameField {
    // ── Tile layers ──
    pub(crate) base_tiles: Vec<Vec<Tile>>,
    pub(crate) tiles: Vec<Vec<Tile>>,
    pub(crate) width: usize,
    pub(crate) height: usize,

    // ── Entities ──
    pub(crate) entities: Entities,

    // ── Level tracking ──
    pub(crate) coin_count: u32,
    pub(crate) current_level: usize,
    pub(crate) level_name: String,
    pub(crate) state: LevelState,

    pub(crate) catalog: Catalog,
}

// ── Construction ──

impl GameField {
    /// Load `level_index` from `catalog`. Fails with `InvalidLevel` when the
    /// index is out of range; no field exists in that case.
    pub fn new(catalog: Catalog, level_index: usize) -> Result<Self, LevelError> {
        let mut field = GameField {
            base_tiles: vec![],
            tiles: vec![],
            width: 0,
            height: 0,
            entities: Entities::default(),
            coin_count: 0,
            current_level: 0,
            level_name: String::new(),
            state: LevelState::InPlay,
            catalog,
        };
        level::load_level(&mut field, level_index)?;
        Ok(field)
    }
}

// ── Tile query / mutation API ──

impl GameField {
    /// Live tile at `p`. Out of bounds reads as wall.
    #[inline]
    pub fn tile_at(&self, p: Pos) -> Tile {
        self.map().tile_at(p)
    }

    /// Set a tile in the live layer.
    #[inline]
    pub(crate) fn set_tile(&mut self, p: Pos, tile: Tile) {
        if p.x < self.width && p.y < self.height {
            self.tiles[p.y][p.x] = tile;
        }
    }

    /// Restore a vacated cell to its underlying layout tile.
    #[inline]
    pub(crate) fn restore_tile(&mut self, p: Pos) {
        if p.x < self.width && p.y < self.height {
            self.tiles[p.y][p.x] = self.base_tiles[p.y][p.x].underlying();
        }
    }

    /// Reset all tiles to the initial grid.
    pub(crate) fn reset_tiles(&mut self) {
        self.tiles = self.base_tiles.clone();
    }

    #[inline]
    pub(crate) fn map(&self) -> MapView<'_> {
        MapView { tiles: &self.tiles, width: self.width, height: self.height }
    }
}

// ── Commands ──

impl GameField {
    pub fn move_up(&mut self, progress: &mut Progress) -> Vec<GameEvent> {
        step::move_player(self, MoveDir::Up, progress)
    }

    pub fn move_down(&mut self, progress: &mut Progress) -> Vec<GameEvent> {
        step::move_player(self, MoveDir::Down, progress)
    }

    pub fn move_left(&mut self, progress: &mut Progress) -> Vec<GameEvent> {
        step::move_player(self, MoveDir::Left, progress)
    }

    pub fn move_right(&mut self, progress: &mut Progress) -> Vec<GameEvent> {
        step::move_player(self, MoveDir::Right, progress)
    }

    pub fn move_dir(&mut self, dir: MoveDir, progress: &mut Progress) -> Vec<GameEvent> {
        step::move_player(self, dir, progress)
    }

    /// Full reset: level start, collected coins forfeited.
    pub fn reset_field(&mut self) {
        step::reset_field(self);
    }

    /// Advance to the next level, or raise "all levels complete".
    pub fn load_next_level(&mut self, progress: &mut Progress) -> Vec<GameEvent> {
        let mut events = Vec::new();
        step::load_next_level(self, progress, &mut events);
        events
    }

    /// Move this level's coins into the cross-level total, e.g. when the
    /// player quits to the menu mid-level.
    pub fn bank_coins(&mut self, progress: &mut Progress) {
        progress.add_coins(self.coin_count);
        self.coin_count = 0;
    }
}

// ── Read-only accessors ──

impl GameField {
    /// Live grid, `rows × cols`.
    pub fn field(&self) -> &[Vec<Tile>] {
        &self.tiles
    }

    pub fn find_player(&self) -> Option<Pos> {
        find_tile(&self.tiles, Tile::Player)
    }

    pub fn coin_count(&self) -> u32 {
        self.coin_count
    }

    pub fn row_count(&self) -> usize {
        self.height
    }

    pub fn col_count(&self) -> usize {
        self.width
    }

    pub fn current_level(&self) -> usize {
        self.current_level
    }

    pub fn level_name(&self) -> &str {
        &self.level_name
    }

    pub fn level_count(&self) -> usize {
        self.catalog.len()
    }

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn boxes(&self) -> &[Pos] {
        &self.entities.boxes
    }

    pub fn coins(&self) -> &[Pos] {
        &self.entities.coins
    }

    pub fn checkpoints(&self) -> &[Pos] {
        &self.entities.checkpoints
    }

    /// Closest free cell within `max_dist` steps of `from`.
    pub fn nearest_free_tile(&self, from: Pos, max_dist: usize) -> Option<Pos> {
        rules::find_nearest_free_tile(&self.map(), &self.entities, from, max_dist)
    }
}
