/// Cross-level progression: what survives from one level to the next.
///
/// Owned by the caller and threaded into every engine command that can
/// complete a level, so no global state is involved.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub total_coins: u32,
    pub deaths: u32,
    game_complete: bool,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_coins(&mut self, coins: u32) {
        self.total_coins += coins;
    }

    pub fn record_death(&mut self) {
        self.deaths += 1;
    }

    /// Raise the "all levels complete" signal. Returns `true` only the
    /// first time it is raised.
    pub fn signal_game_complete(&mut self) -> bool {
        !std::mem::replace(&mut self.game_complete, true)
    }

    pub fn is_game_complete(&self) -> bool {
        self.game_complete
    }
}
