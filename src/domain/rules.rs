/// Movement, push and portal rules.
///
/// Pure functions over a read-only view of the live grid plus the
/// entity lists. They decide "what is legal" and "where things land"
/// without performing the action; `sim::step` applies the result.
///
/// ## Push Truth Table
/// ┌────────────────────────────┬─────────┐
/// │ Box target                 │ Push?   │
/// ├────────────────────────────┼─────────┤
/// │ out of bounds              │ DENY    │
/// │ Wall                       │ DENY    │
/// │ Lava                       │ DENY    │
/// │ another box                │ DENY    │
/// │ portal, exit blocked       │ DENY    │
/// │ portal, exit free          │ ALLOW → box lands on exit │
/// │ otherwise                  │ ALLOW   │
/// └────────────────────────────┴─────────┘
///
/// ## Free Cell
/// A cell is free when it is in bounds, holds no box, and its live tile
/// is exactly Floor. Coins, checkpoints, portals and the player all
/// count as occupied.

use std::collections::{HashSet, VecDeque};

use super::entity::{Entities, MoveDir, Pos};
use super::tile::Tile;

/// Immutable view of the live grid for rule queries.
pub struct MapView<'a> {
    pub tiles: &'a [Vec<Tile>],
    pub width: usize,
    pub height: usize,
}

impl<'a> MapView<'a> {
    pub fn new(tiles: &'a [Vec<Tile>]) -> Self {
        let height = tiles.len();
        let width = tiles.first().map_or(0, |r| r.len());
        MapView { tiles, width, height }
    }

    pub fn in_bounds(&self, p: Pos) -> bool {
        p.x < self.width && p.y < self.height
    }

    pub fn tile_at(&self, p: Pos) -> Tile {
        if !self.in_bounds(p) {
            return Tile::Wall; // out of bounds = wall
        }
        self.tiles[p.y][p.x]
    }

    #[inline]
    pub fn step(&self, p: Pos, dir: MoveDir) -> Option<Pos> {
        p.step(dir, self.width, self.height)
    }

    /// See "Free Cell" above.
    pub fn is_free(&self, entities: &Entities, p: Pos) -> bool {
        self.in_bounds(p) && !entities.has_box(p) && self.tile_at(p) == Tile::Floor
    }
}

// ── Portals ──

/// Why a portal could not deliver its passenger.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortalBlock {
    #[error("portal at ({}, {}) has no paired exit", .portal.x, .portal.y)]
    NoCounterpart { portal: Pos },
    #[error("stuck after portal: the exit lies off the map")]
    ExitOffMap { portal: Pos },
    #[error("stuck after portal: exit ({}, {}) is blocked by {:?}", .exit.x, .exit.y, .occupant)]
    ExitBlocked { exit: Pos, occupant: Tile },
}

/// Result of sending an entity through a portal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortalExit {
    Landed(Pos),
    Blocked(PortalBlock),
}

/// Resolve where an entity entering the portal at `portal` while moving in
/// `dir` comes out.
///
/// The i-th PortalA pairs with the i-th PortalB. The exit is one step past
/// the paired portal in the direction of travel, and must be free. There is
/// no fallback search: a blocked exit is reported, and the caller decides.
pub fn resolve_portal(map: &MapView, entities: &Entities, portal: Pos, dir: MoveDir) -> PortalExit {
    let (own, other) = match map.tile_at(portal) {
        Tile::PortalA => (&entities.portals_a, &entities.portals_b),
        Tile::PortalB => (&entities.portals_b, &entities.portals_a),
        _ => return PortalExit::Blocked(PortalBlock::NoCounterpart { portal }),
    };

    let counterpart = own
        .iter()
        .position(|&p| p == portal)
        .and_then(|idx| other.get(idx).copied());
    let counterpart = match counterpart {
        Some(c) => c,
        None => return PortalExit::Blocked(PortalBlock::NoCounterpart { portal }),
    };

    let exit = match map.step(counterpart, dir) {
        Some(e) => e,
        None => return PortalExit::Blocked(PortalBlock::ExitOffMap { portal }),
    };

    if !map.is_free(entities, exit) {
        let occupant = if entities.has_box(exit) { Tile::Box } else { map.tile_at(exit) };
        return PortalExit::Blocked(PortalBlock::ExitBlocked { exit, occupant });
    }

    PortalExit::Landed(exit)
}

// ── Push ──

/// Outcome of a legal push.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushTarget {
    /// Box slides one cell.
    Slide(Pos),
    /// Box enters a portal and lands on the exit.
    Teleport { portal: Pos, exit: Pos },
}

impl PushTarget {
    pub fn landing(self) -> Pos {
        match self {
            PushTarget::Slide(p) => p,
            PushTarget::Teleport { exit, .. } => exit,
        }
    }
}

/// Can the box at `box_pos` be pushed in `dir`? See the push truth table.
///
/// The pushed box still shows on the live grid while this runs, so its
/// own cell never counts as a free portal exit.
pub fn push_target(map: &MapView, entities: &Entities, box_pos: Pos, dir: MoveDir) -> Option<PushTarget> {
    let target = map.step(box_pos, dir)?;
    let tile = map.tile_at(target);
    if !tile.accepts_box() || entities.has_box(target) {
        return None;
    }
    if tile.is_portal() {
        return match resolve_portal(map, entities, target, dir) {
            PortalExit::Landed(exit) => Some(PushTarget::Teleport { portal: target, exit }),
            PortalExit::Blocked(_) => None,
        };
    }
    Some(PushTarget::Slide(target))
}

// ── Completion ──

/// Every box rests on a checkpoint. Vacuously true for a level without boxes.
pub fn all_boxes_on_checkpoints(entities: &Entities) -> bool {
    entities.boxes.iter().all(|b| entities.checkpoints.contains(b))
}

// ── Nearest free tile ──

/// Breadth-first search over 4-adjacent in-bounds cells for the closest
/// free cell, at most `max_dist` steps from `start`. `start` itself counts
/// at distance 0. Not used by portal resolution.
pub fn find_nearest_free_tile(
    map: &MapView,
    entities: &Entities,
    start: Pos,
    max_dist: usize,
) -> Option<Pos> {
    let mut queue = VecDeque::new();
    let mut visited = HashSet::new();
    queue.push_back((start, 0usize));
    visited.insert(start);

    while let Some((cur, dist)) = queue.pop_front() {
        if map.is_free(entities, cur) {
            return Some(cur);
        }
        if dist == max_dist {
            continue;
        }
        for dir in MoveDir::ALL {
            if let Some(next) = map.step(cur, dir) {
                if visited.insert(next) {
                    queue.push_back((next, dist + 1));
                }
            }
        }
    }
    None
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
