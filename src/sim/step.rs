/// Command resolution: one player move, run to completion.
///
/// Processing order for `move_player`:
///   1. Locate player; target = player + dir
///   2. Bounds / wall check
///   3. Box push (may teleport the box)
///   4. Lava → death reset
///   5. Restore the vacated cell
///   6. Portal resolution (blocked → death reset)
///   7. Place player, collect coin
///   8. Completion check → advance level
///
/// Rule queries live in `domain::rules`; this module applies them.

use tracing::{debug, info, warn};

use crate::domain::entity::{find_tile, MoveDir, Pos};
use crate::domain::rules::{self, PortalExit, PushTarget};
use crate::domain::tile::Tile;
use super::event::{DeathCause, GameEvent};
use super::level;
use super::progress::Progress;
use super::world::{GameField, LevelState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn move_player(field: &mut GameField, dir: MoveDir, progress: &mut Progress) -> Vec<GameEvent> {
    if field.state != LevelState::InPlay { return vec![]; }

    let mut events = Vec::new();

    let player = match field.find_player() {
        Some(p) => p,
        None => return events,
    };
    let target = match field.map().step(player, dir) {
        Some(t) => t,
        None => return events,
    };

    // Read before any push: a box standing here hides nothing else.
    let tile = field.tile_at(target);
    if tile.is_wall() { return events; }

    if field.entities.has_box(target) && !push_box(field, target, dir, &mut events) {
        return events;
    }

    if field.entities.is_lava(target) {
        death_reset(field, DeathCause::Lava, progress, &mut events);
        return events;
    }

    field.restore_tile(player);

    let mut landing = target;
    if tile.is_portal() {
        match rules::resolve_portal(&field.map(), &field.entities, target, dir) {
            PortalExit::Blocked(reason) => {
                warn!(level = field.current_level, %reason, "portal blocked");
                events.push(GameEvent::PortalBlocked(reason));
                death_reset(field, DeathCause::PortalBlocked, progress, &mut events);
                return events;
            }
            PortalExit::Landed(exit) => {
                // Free exits are Floor, so this only trips if that rule loosens.
                if field.entities.is_lava(exit) {
                    death_reset(field, DeathCause::Lava, progress, &mut events);
                    return events;
                }
                events.push(GameEvent::PlayerTeleported { portal: target, exit });
                landing = exit;
            }
        }
    }

    field.set_tile(landing, Tile::Player);
    events.push(GameEvent::Moved { from: player, to: landing });
    debug!(from = ?player, to = ?landing, ?dir, "player moved");

    if let Some(i) = field.entities.coins.iter().position(|&c| c == landing) {
        field.entities.coins.remove(i);
        field.coin_count += 1;
        events.push(GameEvent::CoinCollected { at: landing, level_coins: field.coin_count });
    }

    check_completion(field, progress, &mut events);
    events
}

// ══════════════════════════════════════════════════════════════
// Box push
// ══════════════════════════════════════════════════════════════

/// Push the box at `box_pos` one cell in `dir`. Returns whether it moved;
/// on failure nothing changes.
fn push_box(field: &mut GameField, box_pos: Pos, dir: MoveDir, events: &mut Vec<GameEvent>) -> bool {
    let idx = match field.entities.boxes.iter().position(|&b| b == box_pos) {
        Some(i) => i,
        None => return false,
    };
    field.entities.boxes.remove(idx);

    let target = match rules::push_target(&field.map(), &field.entities, box_pos, dir) {
        Some(t) => t,
        None => {
            field.entities.boxes.insert(idx, box_pos);
            return false;
        }
    };

    let landing = target.landing();
    field.entities.boxes.push(landing);
    field.set_tile(landing, Tile::Box);
    field.restore_tile(box_pos);

    match target {
        PushTarget::Slide(to) => events.push(GameEvent::BoxPushed { from: box_pos, to }),
        PushTarget::Teleport { portal, exit } => {
            events.push(GameEvent::BoxTeleported { portal, exit });
        }
    }
    debug!(from = ?box_pos, to = ?landing, "box pushed");
    true
}

// ══════════════════════════════════════════════════════════════
// Resets
// ══════════════════════════════════════════════════════════════

/// Player and boxes return to level start; collected coins stay collected
/// and the level coin counter is untouched.
fn death_reset(field: &mut GameField, cause: DeathCause, progress: &mut Progress, events: &mut Vec<GameEvent>) {
    let saved_coins = std::mem::take(&mut field.entities.coins);
    let saved_count = field.coin_count;

    field.reset_tiles();

    field.entities.boxes = field.entities.initial_boxes.clone();
    for b in field.entities.boxes.clone() {
        field.set_tile(b, Tile::Box);
    }

    field.entities.coins = saved_coins;
    field.coin_count = saved_count;
    for c in field.entities.initial_coins.clone() {
        if !field.entities.coins.contains(&c) {
            field.set_tile(c, Tile::Floor);
        }
    }

    if let Some(spawn) = find_tile(&field.base_tiles, Tile::Player) {
        field.set_tile(spawn, Tile::Player);
    }

    progress.record_death();
    events.push(GameEvent::Died { cause });
    info!(level = field.current_level, ?cause, deaths = progress.deaths, "player died");
}

/// Full reset: everything back to level start, coin counter zeroed.
pub fn reset_field(field: &mut GameField) {
    if field.state != LevelState::InPlay { return; }
    field.reset_tiles();
    field.entities.boxes = field.entities.initial_boxes.clone();
    field.entities.coins = field.entities.initial_coins.clone();
    field.coin_count = 0;
    debug!(level = field.current_level, "field reset");
}

// ══════════════════════════════════════════════════════════════
// Completion
// ══════════════════════════════════════════════════════════════

fn check_completion(field: &mut GameField, progress: &mut Progress, events: &mut Vec<GameEvent>) {
    if !rules::all_boxes_on_checkpoints(&field.entities) { return; }

    let coins = field.coin_count;
    progress.add_coins(coins);
    field.coin_count = 0;
    events.push(GameEvent::LevelCompleted { index: field.current_level, coins });
    info!(level = field.current_level, coins, total = progress.total_coins, "level complete");

    load_next_level(field, progress, events);
}

/// Load the level after the current one. Past the last level the field
/// becomes `GameComplete` and the progression signal is raised once.
pub fn load_next_level(field: &mut GameField, progress: &mut Progress, events: &mut Vec<GameEvent>) {
    if field.state != LevelState::InPlay { return; }

    let next = field.current_level + 1;
    if next < field.catalog.len() {
        if level::load_level(field, next).is_ok() {
            events.push(GameEvent::LevelLoaded { index: next, name: field.level_name.clone() });
        }
        return;
    }

    field.state = LevelState::GameComplete;
    if progress.signal_game_complete() {
        events.push(GameEvent::GameComplete);
        info!(total_coins = progress.total_coins, deaths = progress.deaths, "all levels complete");
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::PortalBlock;
    use crate::sim::level::{Catalog, LevelDef};

    fn catalog_from(levels: &[&[&str]]) -> Catalog {
        Catalog::new(
            levels
                .iter()
                .enumerate()
                .map(|(i, rows)| LevelDef::parse(&format!("L{i}"), rows).unwrap())
                .collect(),
        )
    }

    fn field_from(rows: &[&str]) -> GameField {
        GameField::new(catalog_from(&[rows]), 0).unwrap()
    }

    fn player_count(f: &GameField) -> usize {
        f.field().iter().flatten().filter(|&&t| t == Tile::Player).count()
    }

    fn codes(f: &GameField) -> Vec<String> {
        f.field()
            .iter()
            .map(|row| row.iter().map(|t| char::from(b'0' + t.code())).collect())
            .collect()
    }

    // ── Movement ──

    #[test]
    fn corridor_stops_at_wall() {
        // Trailing box keeps the level from completing.
        let mut f = field_from(&["201", "003"]);
        let mut p = Progress::new();
        f.move_right(&mut p);
        assert_eq!(f.find_player(), Some(Pos::new(1, 0)));
        let events = f.move_right(&mut p);
        assert!(events.is_empty());
        assert_eq!(f.find_player(), Some(Pos::new(1, 0)));
        assert_eq!(codes(&f), vec!["021", "003"]);
    }

    #[test]
    fn move_off_the_map_is_a_no_op() {
        let mut f = field_from(&["20", "03"]);
        let mut p = Progress::new();
        assert!(f.move_left(&mut p).is_empty());
        assert!(f.move_up(&mut p).is_empty());
        assert_eq!(f.find_player(), Some(Pos::new(0, 0)));
    }

    #[test]
    fn vacating_restores_layout_tiles() {
        // Player walks across a checkpoint and keeps it visible afterwards.
        let mut f = field_from(&["2400", "3000"]);
        let mut p = Progress::new();
        f.move_right(&mut p);
        f.move_right(&mut p);
        assert_eq!(codes(&f)[0], "0420");
    }

    #[test]
    fn exactly_one_player_after_every_command() {
        let mut f = field_from(&[
            "2030070",
            "0006000",
            "0080050",
            "0400000",
        ]);
        let mut p = Progress::new();
        let dirs = [
            MoveDir::Right, MoveDir::Down, MoveDir::Right, MoveDir::Right,
            MoveDir::Up, MoveDir::Right, MoveDir::Right, MoveDir::Down,
            MoveDir::Left, MoveDir::Down, MoveDir::Down, MoveDir::Left,
        ];
        for dir in dirs {
            f.move_dir(dir, &mut p);
            assert_eq!(player_count(&f), 1, "after {dir:?}");
            assert_eq!(f.boxes().len(), 1);
        }
        f.reset_field();
        assert_eq!(player_count(&f), 1);
    }

    // ── Coins ──

    #[test]
    fn stepping_on_a_coin_collects_it() {
        let mut f = field_from(&["2550", "3000"]);
        let mut p = Progress::new();
        let events = f.move_right(&mut p);
        assert!(events.contains(&GameEvent::CoinCollected { at: Pos::new(1, 0), level_coins: 1 }));
        f.move_right(&mut p);
        assert_eq!(f.coin_count(), 2);
        assert!(f.coins().is_empty());
        // Walking back over collected cells finds floor.
        f.move_left(&mut p);
        assert_eq!(f.coin_count(), 2);
        assert_eq!(codes(&f)[0], "0200");
    }

    // ── Box push ──

    #[test]
    fn push_moves_box_and_player() {
        let mut f = field_from(&["23004"]);
        let mut p = Progress::new();
        let events = f.move_right(&mut p);
        assert_eq!(events[0], GameEvent::BoxPushed { from: Pos::new(1, 0), to: Pos::new(2, 0) });
        assert_eq!(codes(&f), vec!["02304"]);
        assert_eq!(f.boxes(), &[Pos::new(2, 0)]);
    }

    #[test]
    fn blocked_pushes_change_nothing() {
        for rows in [["2310", "0004"], ["2360", "0004"], ["2330", "0044"]] {
            let mut f = field_from(&rows);
            let mut p = Progress::new();
            let before = codes(&f);
            let boxes = f.boxes().to_vec();
            for _ in 0..2 {
                assert!(f.move_right(&mut p).is_empty());
                assert_eq!(codes(&f), before);
                assert_eq!(f.boxes(), &boxes[..]);
                assert_eq!(f.find_player(), Some(Pos::new(0, 0)));
            }
        }
    }

    #[test]
    fn box_leaving_checkpoint_restores_it() {
        // Second box sits off target so the level stays in play.
        let mut f = field_from(&["2340", "0034"]);
        let mut p = Progress::new();
        f.move_right(&mut p); // box onto the (2,0) checkpoint
        f.move_right(&mut p); // box off again, player now on the checkpoint
        assert_eq!(codes(&f)[0], "0023");
        f.move_left(&mut p);
        assert_eq!(codes(&f)[0], "0243");
        assert_eq!(f.current_level(), 0);
    }

    #[test]
    fn box_through_portal_lands_past_partner() {
        let mut f = field_from(&[
            "2370800",
            "0000004",
        ]);
        let mut p = Progress::new();
        let events = f.move_right(&mut p);
        assert!(events.contains(&GameEvent::BoxTeleported { portal: Pos::new(2, 0), exit: Pos::new(5, 0) }));
        assert_eq!(codes(&f)[0], "0270830");
        assert_eq!(f.boxes(), &[Pos::new(5, 0)]);
    }

    #[test]
    fn box_push_into_blocked_portal_fails() {
        let mut f = field_from(&[
            "237081",
            "000004",
        ]);
        let mut p = Progress::new();
        let before = codes(&f);
        assert!(f.move_right(&mut p).is_empty());
        assert_eq!(codes(&f), before);
        assert_eq!(f.boxes(), &[Pos::new(1, 0)]);
        assert_eq!(p.deaths, 0);
    }

    // ── Lava ──

    #[test]
    fn lava_reverts_positions_but_keeps_coins() {
        let mut f = field_from(&[
            "25030",
            "00600",
            "00004",
        ]);
        let mut p = Progress::new();
        f.move_right(&mut p); // coin
        f.move_right(&mut p); // floor
        f.move_right(&mut p); // push box to (4,0)
        assert_eq!(f.boxes(), &[Pos::new(4, 0)]);
        assert_eq!(f.coin_count(), 1);

        f.move_left(&mut p);
        let events = f.move_down(&mut p); // (2,1) is lava
        assert_eq!(events, vec![GameEvent::Died { cause: DeathCause::Lava }]);

        assert_eq!(f.find_player(), Some(Pos::new(0, 0)));
        assert_eq!(f.boxes(), &[Pos::new(3, 0)]);
        assert_eq!(f.coin_count(), 1);
        assert!(f.coins().is_empty());
        assert_eq!(codes(&f), vec!["20030", "00600", "00004"]);
        assert_eq!(p.deaths, 1);
    }

    #[test]
    fn lava_leaves_uncollected_coins_in_place() {
        let mut f = field_from(&[
            "2060",
            "5300",
        ]);
        let mut p = Progress::new();
        f.move_right(&mut p);
        f.move_right(&mut p);
        assert_eq!(codes(&f), vec!["2060", "5300"]);
        assert_eq!(f.coins(), &[Pos::new(0, 1)]);
        assert_eq!(f.coin_count(), 0);
    }

    // ── Full reset ──

    #[test]
    fn reset_field_forfeits_coins() {
        let mut f = field_from(&["2503", "0000"]);
        let mut p = Progress::new();
        f.move_right(&mut p);
        f.move_down(&mut p);
        assert_eq!(f.coin_count(), 1);
        f.reset_field();
        assert_eq!(f.coin_count(), 0);
        assert_eq!(f.coins(), &[Pos::new(1, 0)]);
        assert_eq!(codes(&f), vec!["2503", "0000"]);
        assert_eq!(p.deaths, 0);
    }

    // ── Portals ──

    #[test]
    fn player_teleports_past_partner() {
        let mut f = field_from(&[
            "2700",
            "0080",
            "0003",
        ]);
        let mut p = Progress::new();
        let events = f.move_right(&mut p);
        assert!(events.contains(&GameEvent::PlayerTeleported { portal: Pos::new(1, 0), exit: Pos::new(3, 1) }));
        assert_eq!(f.find_player(), Some(Pos::new(3, 1)));
        assert_eq!(codes(&f), vec!["0700", "0082", "0003"]);
    }

    #[test]
    fn blocked_portal_kills_and_reports() {
        let mut f = field_from(&[
            "0270",
            "0081",
            "0003",
        ]);
        let mut p = Progress::new();
        let events = f.move_right(&mut p);
        assert!(events.contains(&GameEvent::PortalBlocked(PortalBlock::ExitBlocked {
            exit: Pos::new(3, 1),
            occupant: Tile::Wall,
        })));
        assert!(events.contains(&GameEvent::Died { cause: DeathCause::PortalBlocked }));
        assert_eq!(f.find_player(), Some(Pos::new(1, 0)));
        assert_eq!(player_count(&f), 1);
        assert_eq!(p.deaths, 1);
    }

    #[test]
    fn unmatched_portal_counts_as_blocked() {
        let mut f = field_from(&["27003"]);
        let mut p = Progress::new();
        let events = f.move_right(&mut p);
        assert_eq!(events, vec![
            GameEvent::PortalBlocked(PortalBlock::NoCounterpart { portal: Pos::new(1, 0) }),
            GameEvent::Died { cause: DeathCause::PortalBlocked },
        ]);
        assert_eq!(codes(&f), vec!["27003"]);
    }

    // ── Completion ──

    #[test]
    fn box_onto_checkpoint_completes_immediately() {
        let mut f = GameField::new(catalog_from(&[&["2534"], &["203", "004"]]), 0).unwrap();
        let mut p = Progress::new();
        f.move_right(&mut p);
        let events = f.move_right(&mut p);
        assert!(events.contains(&GameEvent::LevelCompleted { index: 0, coins: 1 }));
        assert!(events.contains(&GameEvent::LevelLoaded { index: 1, name: "L1".into() }));
        assert_eq!(f.current_level(), 1);
        assert_eq!(f.coin_count(), 0);
        assert_eq!(p.total_coins, 1);
        assert_eq!(codes(&f), vec!["203", "004"]);
    }

    #[test]
    fn completion_fires_once_per_satisfying_move() {
        let mut f = field_from(&["234"]);
        let mut p = Progress::new();
        let events = f.move_right(&mut p);
        let completions = events.iter().filter(|e| matches!(e, GameEvent::LevelCompleted { .. })).count();
        assert_eq!(completions, 1);
        assert!(events.contains(&GameEvent::GameComplete));
        assert_eq!(f.state(), LevelState::GameComplete);

        // Terminal: nothing else happens.
        assert!(f.move_right(&mut p).is_empty());
        assert!(f.move_left(&mut p).is_empty());
        assert!(f.load_next_level(&mut p).is_empty());
        assert!(p.is_game_complete());
    }

    #[test]
    fn no_completion_while_a_box_is_off_target() {
        let mut f = field_from(&["2340", "0304"]);
        let mut p = Progress::new();
        let events = f.move_right(&mut p);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::LevelCompleted { .. })));
        assert_eq!(f.current_level(), 0);
    }

    #[test]
    fn load_next_level_is_callable_directly() {
        let mut f = GameField::new(catalog_from(&[&["253"], &["2503"]]), 0).unwrap();
        let mut p = Progress::new();
        f.move_right(&mut p);
        assert_eq!(f.coin_count(), 1);
        let events = f.load_next_level(&mut p);
        assert_eq!(events, vec![GameEvent::LevelLoaded { index: 1, name: "L1".into() }]);
        assert_eq!(f.coin_count(), 0);
        assert_eq!(f.coins(), &[Pos::new(1, 0)]);
    }

    // ── Built-in levels ──

    #[test]
    fn first_builtin_level_solves_straight_right() {
        let mut f = GameField::new(Catalog::builtin().unwrap(), 0).unwrap();
        let mut p = Progress::new();
        for _ in 0..5 {
            f.move_right(&mut p);
        }
        assert_eq!(f.current_level(), 1);
        assert_eq!(f.level_name(), "Challenge");
        assert_eq!(p.total_coins, 1);
    }

    #[test]
    fn last_builtin_level_solves_through_portal() {
        let mut f = GameField::new(Catalog::builtin().unwrap(), 6).unwrap();
        let mut p = Progress::new();
        for _ in 0..17 {
            f.move_right(&mut p);
        }
        assert_eq!(f.find_player(), Some(Pos::new(18, 1)));
        f.move_down(&mut p);
        let events = f.move_down(&mut p); // portal (18,3) → (18,8)
        assert!(events.contains(&GameEvent::PlayerTeleported { portal: Pos::new(18, 3), exit: Pos::new(18, 8) }));
        f.move_down(&mut p); // coin
        let events = f.move_down(&mut p); // box onto checkpoint
        assert!(events.contains(&GameEvent::GameComplete));
        assert_eq!(p.total_coins, 1);
        assert_eq!(f.state(), LevelState::GameComplete);
    }
}
