/// Events emitted by engine commands.
/// The presentation layer consumes these for messages and the HUD.

use crate::domain::entity::Pos;
use crate::domain::rules::PortalBlock;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeathCause {
    Lava,
    PortalBlocked,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Moved { from: Pos, to: Pos },
    BoxPushed { from: Pos, to: Pos },
    BoxTeleported { portal: Pos, exit: Pos },
    PlayerTeleported { portal: Pos, exit: Pos },
    CoinCollected { at: Pos, level_coins: u32 },
    PortalBlocked(PortalBlock),
    Died { cause: DeathCause },
    LevelCompleted { index: usize, coins: u32 },
    LevelLoaded { index: usize, name: String },
    GameComplete,
}
