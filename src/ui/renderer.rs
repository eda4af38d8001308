/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each grid cell is drawn as two terminal columns so the board looks
/// roughly square.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::Pos;
use crate::domain::tile::Tile;
use crate::sim::world::GameField;

use super::session::{Screen, Session, HELP_LINES, PAUSE_ITEMS, TITLE_ITEMS};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// terminal's own default never shows between rows.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Fill a whole row with `bg`, then write `s` on it.
    fn bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', fg, bg));
        }
        self.put_str(0, y, s, fg, bg);
    }
}

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const ACCENT: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const SELECTED: Color = Color::Rgb { r: 80, g: 255, b: 80 };

/// Two terminal columns per game cell.
fn glyph(tile: Tile, on_checkpoint: bool) -> ([char; 2], Color, Color) {
    match tile {
        Tile::Floor => ([' ', ' '], Color::White, Color::Rgb { r: 40, g: 40, b: 55 }),
        Tile::Wall => (['█', '█'], Color::Rgb { r: 120, g: 110, b: 100 }, Color::Reset),
        Tile::Player => (['@', ' '], Color::Rgb { r: 255, g: 255, b: 255 }, Color::Rgb { r: 40, g: 40, b: 55 }),
        Tile::Box if on_checkpoint => (['[', ']'], Color::Black, Color::Rgb { r: 80, g: 200, b: 80 }),
        Tile::Box => (['[', ']'], Color::Black, Color::Rgb { r: 170, g: 120, b: 60 }),
        Tile::Checkpoint => (['◇', ' '], Color::Rgb { r: 80, g: 220, b: 80 }, Color::Rgb { r: 40, g: 40, b: 55 }),
        Tile::Coin => (['$', ' '], ACCENT, Color::Rgb { r: 40, g: 40, b: 55 }),
        Tile::Lava => (['~', '~'], Color::Rgb { r: 255, g: 220, b: 120 }, Color::Rgb { r: 200, g: 50, b: 20 }),
        Tile::PortalA => (['A', ' '], Color::White, Color::Rgb { r: 40, g: 90, b: 220 }),
        Tile::PortalB => (['B', ' '], Color::White, Color::Rgb { r: 200, g: 60, b: 200 }),
    }
}

// ── Renderer ──

const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MAP_COL: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, session: &Session) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Screen change → clear for clean transition
        if self.last_screen != Some(session.screen) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(session.screen);
        }

        self.front.clear();
        match session.screen {
            Screen::Title => self.compose_title(session),
            Screen::LevelSelect => self.compose_level_select(session),
            Screen::Help => self.compose_help(),
            Screen::Playing => self.compose_game(session),
            Screen::Paused => {
                self.compose_game(session);
                self.compose_pause_overlay(session);
            }
            Screen::GameComplete => self.compose_game_complete(session),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, s: &Session) {
        let field = match s.field.as_ref() {
            Some(f) => f,
            None => return,
        };

        let hud = format!(
            " Level {}/{}  {:<16}  Coins:{:<3}  Total:{:<4}  Deaths:{} ",
            field.current_level() + 1,
            field.level_count(),
            field.level_name(),
            field.coin_count(),
            s.progress.total_coins,
            s.progress.deaths,
        );
        self.front.bar(HUD_ROW, &hud, Color::White, HUD_BG);

        self.compose_board(field);

        let msg_row = MAP_ROW + field.row_count() + 1;
        if !s.message.is_empty() && msg_row < self.front.height {
            self.front.bar(msg_row, &format!(" ◈ {} ", s.message), Color::Black, MSG_BG);
        }

        let help_row = MAP_ROW + field.row_count() + 3;
        if help_row < self.front.height {
            let help = " Arrows/WASD:Move  R:Reset  Esc:Pause";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_board(&mut self, field: &GameField) {
        for (y, row) in field.field().iter().enumerate() {
            let ty = MAP_ROW + y;
            if ty >= self.front.height { break; }
            for (x, &tile) in row.iter().enumerate() {
                let tx = MAP_COL + x * CELL_W;
                if tx + 1 >= self.front.width { break; }
                let on_checkpoint = field.checkpoints().contains(&Pos::new(x, y));
                let (chars, fg, bg) = glyph(tile, on_checkpoint);
                self.front.set(tx, ty, Cell::new(chars[0], fg, bg));
                self.front.set(tx + 1, ty, Cell::new(chars[1], fg, bg));
            }
        }
    }

    fn compose_title(&mut self, s: &Session) {
        let title = [
            r"  ___         _        _ _             ",
            r" | _ \___ _ _| |_ __ _| | |__  __ _ _ _  ",
            r" |  _/ _ \ '_|  _/ _` | | '_ \/ _` | ' \ ",
            r" |_| \___/_|  \__\__,_|_|_.__/\__,_|_||_|",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, ACCENT, Color::Reset);
        }
        self.front.put_str(6, 7, "Push the boxes. Mind the lava. Trust the portals.", Color::DarkGrey, Color::Reset);

        let menu_base = 10;
        for (i, item) in TITLE_ITEMS.iter().enumerate() {
            self.compose_menu_item(8, menu_base + i, item, i == s.title_cursor);
        }

        let stats = format!(
            "Total coins: {}    Deaths: {}",
            s.progress.total_coins, s.progress.deaths,
        );
        self.front.put_str(8, menu_base + TITLE_ITEMS.len() + 2, &stats, Color::White, Color::Reset);

        if !s.message.is_empty() {
            let row = self.front.height.saturating_sub(1);
            self.front.bar(row, &format!(" ◈ {} ", s.message), Color::Black, MSG_BG);
        }
    }

    fn compose_level_select(&mut self, s: &Session) {
        self.front.put_str(4, 2, "Select Level", ACCENT, Color::Reset);
        for (i, name) in s.catalog.names().enumerate() {
            let label = format!("{:>2}. {}", i + 1, name);
            self.compose_menu_item(6, 4 + i, &label, i == s.select_cursor);
        }
        let hint_row = 5 + s.catalog.len() + 1;
        self.front.put_str(4, hint_row, "Enter: play   Esc: back", Color::DarkGrey, Color::Reset);
    }

    fn compose_help(&mut self) {
        self.front.put_str(4, 2, "Help", ACCENT, Color::Reset);
        for (i, line) in HELP_LINES.iter().enumerate() {
            self.front.put_str(6, 4 + i, &format!("{}. {}", i + 1, line), Color::White, Color::Reset);
        }
        self.front.put_str(4, 5 + HELP_LINES.len() + 1, "Esc: back", Color::DarkGrey, Color::Reset);

        let legend: [(Tile, &str); 8] = [
            (Tile::Player, "you"),
            (Tile::Box, "box"),
            (Tile::Checkpoint, "checkpoint"),
            (Tile::Coin, "coin"),
            (Tile::Lava, "lava"),
            (Tile::PortalA, "portal A"),
            (Tile::PortalB, "portal B"),
            (Tile::Wall, "wall"),
        ];
        let base = 5 + HELP_LINES.len() + 3;
        for (i, (tile, label)) in legend.iter().enumerate() {
            let (chars, fg, bg) = glyph(*tile, false);
            self.front.set(6, base + i, Cell::new(chars[0], fg, bg));
            self.front.set(7, base + i, Cell::new(chars[1], fg, bg));
            self.front.put_str(10, base + i, label, Color::White, Color::Reset);
        }
    }

    fn compose_pause_overlay(&mut self, s: &Session) {
        let (w, h) = (24, 6);
        let x0 = self.front.width.saturating_sub(w) / 2;
        let y0 = self.front.height.saturating_sub(h) / 2;
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                self.front.set(x, y, Cell::new(' ', Color::White, HUD_BG));
            }
        }
        self.front.put_str(x0 + 2, y0 + 1, "PAUSED", ACCENT, HUD_BG);
        for (i, item) in PAUSE_ITEMS.iter().enumerate() {
            let selected = i == s.pause_cursor;
            let label = format!("{} {}", if selected { '▶' } else { ' ' }, item);
            let fg = if selected { SELECTED } else { Color::White };
            self.front.put_str(x0 + 2, y0 + 3 + i, &label, fg, HUD_BG);
        }
    }

    fn compose_game_complete(&mut self, s: &Session) {
        self.front.put_str(6, 4, "ALL LEVELS COMPLETE!", SELECTED, Color::Reset);
        let summary = format!(
            "Coins collected: {}    Deaths: {}",
            s.progress.total_coins, s.progress.deaths,
        );
        self.front.put_str(6, 6, &summary, Color::White, Color::Reset);
        self.front.put_str(6, 9, "Press Enter to return to the title screen", Color::DarkGrey, Color::Reset);
    }

    fn compose_menu_item(&mut self, x: usize, y: usize, label: &str, selected: bool) {
        if selected {
            self.front.put_str(x, y, &format!("▶ {label}"), SELECTED, Color::Reset);
        } else {
            self.front.put_str(x, y, &format!("  {label}"), Color::White, Color::Reset);
        }
    }
}
