//! Game state and turn rotation

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::player::PlayerId;

/// Match phase: `Idle -> ArmyBuild -> Battle -> GameOver`.
///
/// `Idle` is the "none" state a battle is created in, before the first
/// `start_game`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// No match started yet
    #[default]
    Idle,
    ArmyBuild,
    Battle,
    GameOver,
}

/// Match result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Winner(PlayerId),
    Draw,
}

impl GameOutcome {
    /// Sentinel id used for a draw
    pub const DRAW_ID: i32 = -1;

    /// Winning player index, or -1 for a draw
    pub fn id(self) -> i32 {
        match self {
            GameOutcome::Winner(player) => player.0 as i32,
            GameOutcome::Draw => Self::DRAW_ID,
        }
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOutcome::Winner(player) => write!(f, "{} wins", player),
            GameOutcome::Draw => write!(f, "Draw"),
        }
    }
}

/// Turn counter and active player
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    current_turn: u32,
    active_player: usize,
    first_player: usize,
    player_count: usize,
    pub(crate) game_state: GameState,
}

impl TurnState {
    pub fn new(player_count: usize, first_player: usize) -> Self {
        Self {
            current_turn: 0,
            active_player: first_player,
            first_player,
            player_count,
            game_state: GameState::Idle,
        }
    }

    pub fn current_turn(&self) -> u32 {
        self.current_turn
    }

    pub fn active_player(&self) -> PlayerId {
        PlayerId(self.active_player)
    }

    pub fn first_player(&self) -> PlayerId {
        PlayerId(self.first_player)
    }

    pub fn player_count(&self) -> usize {
        self.player_count
    }

    pub fn game_state(&self) -> GameState {
        self.game_state
    }

    /// Pass to the next player. The turn counter grows once every player
    /// has moved, that is when play returns to the first player.
    pub fn end_turn(&mut self) {
        self.active_player = (self.active_player + 1) % self.player_count;
        if self.active_player == self.first_player {
            self.current_turn += 1;
        }
    }

    /// Back to turn 0 with the first player active. The game state is kept.
    pub fn reset(&mut self) {
        self.current_turn = 0;
        self.active_player = self.first_player;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_turn_rotation() {
        let mut turn = TurnState::new(2, 1);
        assert_eq!(turn.active_player(), PlayerId(1));
        turn.end_turn();
        assert_eq!(turn.active_player(), PlayerId(0));
        assert_eq!(turn.current_turn(), 0);
        turn.end_turn();
        assert_eq!(turn.active_player(), PlayerId(1));
        assert_eq!(turn.current_turn(), 1);

        turn.reset();
        assert_eq!(turn.current_turn(), 0);
        assert_eq!(turn.active_player(), PlayerId(1));
    }

    #[test]
    fn test_new_turn_state_is_idle() {
        assert_eq!(GameState::default(), GameState::Idle);
        assert_eq!(TurnState::new(2, 0).game_state(), GameState::Idle);
    }

    #[test]
    fn test_outcome_ids() {
        assert_eq!(GameOutcome::Winner(PlayerId(1)).id(), 1);
        assert_eq!(GameOutcome::Draw.id(), -1);
        assert_eq!(GameOutcome::Winner(PlayerId(0)).to_string(), "Player 1 wins");
    }
}
