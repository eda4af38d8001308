/// Session: screen flow around the engine.
///
/// ## Screen Transitions
///
/// ```text
///   Title ──Start Game──► Playing ◄──Continue── Paused
///     │  ──Select Level─► LevelSelect ──Confirm──► Playing
///     │  ──Help─────────► Help ──Back──► Title       │
///     │                                              ├─Pause──► Paused ──Main Menu──► Title
///     └──Quit                                        └─last level done──► GameComplete ──► Title
/// ```
///
/// The session owns the cross-level `Progress` and at most one live
/// `GameField`. It consumes `Action`s and engine events; it never touches
/// terminal I/O, so the renderer reads it and tests drive it directly.

use tracing::{error, info};

use crate::domain::entity::MoveDir;
use crate::sim::event::{DeathCause, GameEvent};
use crate::sim::level::Catalog;
use crate::sim::progress::Progress;
use crate::sim::world::GameField;

use super::input::Action;

/// Ticks a message stays in the message bar.
pub const MESSAGE_TICKS: u32 = 40;

pub const TITLE_ITEMS: [&str; 4] = ["Start Game", "Select Level", "Help", "Quit"];
pub const PAUSE_ITEMS: [&str; 2] = ["Continue", "Main Menu"];

pub const HELP_LINES: [&str; 7] = [
    "Move with the arrow keys or WASD.",
    "Push every box onto a checkpoint to clear the level.",
    "Lava sends you back to the start. Collected coins stay collected.",
    "Coins count toward your total once the level is cleared.",
    "Portals A and B are linked in pairs. You come out one step past the partner.",
    "A portal whose exit is blocked also sends you back to the start.",
    "R resets the level (forfeits this level's coins). Esc pauses.",
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Screen {
    Title,
    LevelSelect,
    Help,
    Playing,
    Paused,
    GameComplete,
}

pub struct Session {
    pub screen: Screen,
    pub catalog: Catalog,
    pub field: Option<GameField>,
    pub progress: Progress,

    // ── Menu cursors ──
    pub title_cursor: usize,
    pub select_cursor: usize,
    pub pause_cursor: usize,

    // ── Message bar ──
    pub message: String,
    pub message_timer: u32,

    quit: bool,
}

impl Session {
    /// `start_level` is the 0-based level level select opens on.
    pub fn new(catalog: Catalog, start_level: usize) -> Self {
        let select_cursor = start_level.min(catalog.len().saturating_sub(1));
        Session {
            screen: Screen::Title,
            catalog,
            field: None,
            progress: Progress::new(),
            title_cursor: 0,
            select_cursor,
            pause_cursor: 0,
            message: String::new(),
            message_timer: 0,
            quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = msg.into();
        self.message_timer = MESSAGE_TICKS;
    }

    /// Advance timers by one tick.
    pub fn tick(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message.clear();
            }
        }
    }

    /// Apply the actions bound to one key press.
    pub fn handle(&mut self, actions: &[Action]) {
        let has = |a: Action| actions.contains(&a);
        match self.screen {
            Screen::Title => {
                if has(Action::Up) {
                    self.title_cursor = wrap_prev(self.title_cursor, TITLE_ITEMS.len());
                } else if has(Action::Down) {
                    self.title_cursor = wrap_next(self.title_cursor, TITLE_ITEMS.len());
                } else if has(Action::Confirm) {
                    match self.title_cursor {
                        0 => self.start_level(0),
                        1 => self.screen = Screen::LevelSelect,
                        2 => self.screen = Screen::Help,
                        _ => self.quit = true,
                    }
                }
            }

            Screen::LevelSelect => {
                let count = self.catalog.len();
                if has(Action::Up) || has(Action::Left) {
                    self.select_cursor = wrap_prev(self.select_cursor, count);
                } else if has(Action::Down) || has(Action::Right) {
                    self.select_cursor = wrap_next(self.select_cursor, count);
                } else if has(Action::Confirm) {
                    self.start_level(self.select_cursor);
                } else if has(Action::Back) {
                    self.screen = Screen::Title;
                }
            }

            Screen::Help => {
                if has(Action::Back) || has(Action::Confirm) {
                    self.screen = Screen::Title;
                }
            }

            Screen::Playing => {
                if has(Action::Pause) {
                    self.pause_cursor = 0;
                    self.screen = Screen::Paused;
                } else if has(Action::Reset) {
                    if let Some(field) = self.field.as_mut() {
                        field.reset_field();
                        self.set_message("Level reset");
                    }
                } else if let Some(dir) = movement(actions) {
                    self.move_player(dir);
                }
            }

            Screen::Paused => {
                if has(Action::Up) {
                    self.pause_cursor = wrap_prev(self.pause_cursor, PAUSE_ITEMS.len());
                } else if has(Action::Down) {
                    self.pause_cursor = wrap_next(self.pause_cursor, PAUSE_ITEMS.len());
                } else if has(Action::Confirm) {
                    match self.pause_cursor {
                        0 => self.screen = Screen::Playing,
                        _ => self.return_to_title(),
                    }
                } else if has(Action::Pause) || has(Action::Back) {
                    self.screen = Screen::Playing;
                }
            }

            Screen::GameComplete => {
                if has(Action::Confirm) || has(Action::Back) {
                    self.field = None;
                    self.title_cursor = 0;
                    self.screen = Screen::Title;
                }
            }
        }
    }

    // ── Transitions ──

    fn start_level(&mut self, index: usize) {
        // A finished run starts over with fresh totals.
        if self.progress.is_game_complete() {
            self.progress = Progress::new();
        }
        match GameField::new(self.catalog.clone(), index) {
            Ok(field) => {
                self.set_message(format!("Level {}: {}", index + 1, field.level_name()));
                self.select_cursor = index;
                self.field = Some(field);
                self.screen = Screen::Playing;
            }
            Err(e) => {
                error!(%e, "could not start level");
                self.set_message(e.to_string());
            }
        }
    }

    /// Leave the level for the title screen, keeping its coins.
    fn return_to_title(&mut self) {
        if let Some(mut field) = self.field.take() {
            field.bank_coins(&mut self.progress);
            info!(total_coins = self.progress.total_coins, "returned to title");
        }
        self.title_cursor = 0;
        self.screen = Screen::Title;
    }

    fn move_player(&mut self, dir: MoveDir) {
        let events = match self.field.as_mut() {
            Some(field) => field.move_dir(dir, &mut self.progress),
            None => return,
        };
        for event in &events {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::CoinCollected { level_coins, .. } => {
                self.set_message(format!("Coin! ({level_coins} this level)"));
            }
            GameEvent::PortalBlocked(reason) => {
                self.set_message(reason.to_string());
            }
            GameEvent::Died { cause: DeathCause::Lava } => {
                self.set_message("Burned in lava. Back to the start.");
            }
            GameEvent::Died { cause: DeathCause::PortalBlocked } => {
                let msg = format!("{}. Back to the start.", self.message);
                self.set_message(msg);
            }
            GameEvent::LevelCompleted { coins, .. } => {
                self.set_message(format!("Level complete! +{coins} coins"));
            }
            GameEvent::LevelLoaded { index, name } => {
                let msg = format!("{}  Level {}: {}", self.message, index + 1, name);
                self.set_message(msg);
            }
            GameEvent::GameComplete => {
                self.screen = Screen::GameComplete;
            }
            GameEvent::Moved { .. }
            | GameEvent::BoxPushed { .. }
            | GameEvent::BoxTeleported { .. }
            | GameEvent::PlayerTeleported { .. } => {}
        }
    }
}

fn movement(actions: &[Action]) -> Option<MoveDir> {
    actions.iter().find_map(|a| match a {
        Action::Up => Some(MoveDir::Up),
        Action::Down => Some(MoveDir::Down),
        Action::Left => Some(MoveDir::Left),
        Action::Right => Some(MoveDir::Right),
        _ => None,
    })
}

fn wrap_prev(cursor: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (cursor + len - 1) % len }
}

fn wrap_next(cursor: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (cursor + 1) % len }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Pos;

    fn session() -> Session {
        Session::new(Catalog::builtin().unwrap(), 0)
    }

    fn press(s: &mut Session, action: Action, times: usize) {
        for _ in 0..times {
            s.handle(&[action]);
        }
    }

    #[test]
    fn title_menu_wraps() {
        let mut s = session();
        press(&mut s, Action::Up, 1);
        assert_eq!(s.title_cursor, TITLE_ITEMS.len() - 1);
        press(&mut s, Action::Down, 1);
        assert_eq!(s.title_cursor, 0);
    }

    #[test]
    fn quit_item_ends_the_session() {
        let mut s = session();
        press(&mut s, Action::Up, 1);
        press(&mut s, Action::Confirm, 1);
        assert!(s.should_quit());
    }

    #[test]
    fn start_game_opens_first_level() {
        let mut s = session();
        press(&mut s, Action::Confirm, 1);
        assert_eq!(s.screen, Screen::Playing);
        let field = s.field.as_ref().unwrap();
        assert_eq!(field.current_level(), 0);
        assert_eq!(s.message, "Level 1: Beginning");
    }

    #[test]
    fn level_select_starts_chosen_level() {
        let mut s = Session::new(Catalog::builtin().unwrap(), 3);
        press(&mut s, Action::Down, 1);
        press(&mut s, Action::Confirm, 1);
        assert_eq!(s.screen, Screen::LevelSelect);
        assert_eq!(s.select_cursor, 3);
        press(&mut s, Action::Down, 1);
        press(&mut s, Action::Confirm, 1);
        assert_eq!(s.screen, Screen::Playing);
        assert_eq!(s.field.as_ref().unwrap().level_name(), "Lava Zone");
    }

    #[test]
    fn start_level_is_clamped_to_catalog() {
        let s = Session::new(Catalog::builtin().unwrap(), 99);
        assert_eq!(s.select_cursor, 6);
    }

    #[test]
    fn solving_first_level_moves_to_the_next() {
        let mut s = session();
        press(&mut s, Action::Confirm, 1);
        press(&mut s, Action::Right, 5);
        assert_eq!(s.field.as_ref().unwrap().current_level(), 1);
        assert_eq!(s.progress.total_coins, 1);
        assert_eq!(s.message, "Level complete! +1 coins  Level 2: Challenge");
    }

    #[test]
    fn pause_main_menu_banks_coins() {
        let mut s = session();
        press(&mut s, Action::Confirm, 1);
        press(&mut s, Action::Right, 1); // coin
        press(&mut s, Action::Pause, 1);
        assert_eq!(s.screen, Screen::Paused);
        // Moves are ignored while paused.
        let before = s.field.as_ref().unwrap().find_player();
        press(&mut s, Action::Right, 1);
        assert_eq!(s.field.as_ref().unwrap().find_player(), before);

        press(&mut s, Action::Down, 1);
        press(&mut s, Action::Confirm, 1);
        assert_eq!(s.screen, Screen::Title);
        assert!(s.field.is_none());
        assert_eq!(s.progress.total_coins, 1);
    }

    #[test]
    fn back_resumes_from_pause() {
        let mut s = session();
        press(&mut s, Action::Confirm, 1);
        s.handle(&[Action::Pause, Action::Back]);
        assert_eq!(s.screen, Screen::Paused);
        s.handle(&[Action::Pause, Action::Back]);
        assert_eq!(s.screen, Screen::Playing);
    }

    #[test]
    fn reset_forfeits_level_coins() {
        let mut s = session();
        press(&mut s, Action::Confirm, 1);
        press(&mut s, Action::Right, 1);
        assert_eq!(s.field.as_ref().unwrap().coin_count(), 1);
        press(&mut s, Action::Reset, 1);
        let field = s.field.as_ref().unwrap();
        assert_eq!(field.coin_count(), 0);
        assert_eq!(field.find_player(), Some(Pos::new(2, 5)));
        assert_eq!(s.message, "Level reset");
    }

    #[test]
    fn lava_death_is_reported() {
        let mut s = Session::new(Catalog::builtin().unwrap(), 4);
        press(&mut s, Action::Down, 1); // title cursor → Select Level
        press(&mut s, Action::Confirm, 2);
        assert_eq!(s.field.as_ref().unwrap().level_name(), "Lava Zone");
        press(&mut s, Action::Down, 1); // (1,2) is lava
        assert_eq!(s.message, "Burned in lava. Back to the start.");
        assert_eq!(s.progress.deaths, 1);
    }

    #[test]
    fn finishing_the_last_level_shows_game_complete() {
        let mut s = Session::new(Catalog::builtin().unwrap(), 6);
        press(&mut s, Action::Down, 1);
        press(&mut s, Action::Confirm, 2);
        press(&mut s, Action::Right, 17);
        press(&mut s, Action::Down, 4);
        assert_eq!(s.screen, Screen::GameComplete);
        assert_eq!(s.progress.total_coins, 1);

        press(&mut s, Action::Confirm, 1);
        assert_eq!(s.screen, Screen::Title);
        press(&mut s, Action::Confirm, 1);
        assert_eq!(s.progress, Progress::new());
    }

    #[test]
    fn messages_expire() {
        let mut s = session();
        s.set_message("hello");
        for _ in 0..MESSAGE_TICKS {
            s.tick();
        }
        assert!(s.message.is_empty());
    }
}
