//! Game benchmark port
//!
//! The benchmark engine that runs episodes and scores them lives outside
//! this workspace. The roster builder only needs to know how many player
//! agents a game takes.

/// The slice of a benchmark game the agent harness depends on.
pub trait GameBenchmark {
    fn is_single_player(&self) -> bool;

    /// Number of player agents the game requires (1 or 2).
    fn required_players(&self) -> usize {
        if self.is_single_player() { 1 } else { 2 }
    }
}

/// Stand-in game with a fixed player count, for callers that drive the
/// agents themselves (CLI sessions, tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPlayers {
    single_player: bool,
}

impl FixedPlayers {
    pub fn single() -> Self {
        Self {
            single_player: true,
        }
    }

    pub fn two() -> Self {
        Self {
            single_player: false,
        }
    }
}

impl GameBenchmark for FixedPlayers {
    fn is_single_player(&self) -> bool {
        self.single_player
    }
}
