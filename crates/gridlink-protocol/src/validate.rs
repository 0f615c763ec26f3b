//! Move validation: the game-level checks applied to every inbound move.
//!
//! The data channel already guarantees ordered, reliable delivery, so these
//! checks are not about transport reordering — they catch *application*
//! desync: a peer whose board has diverged from ours, or one actively
//! cheating. With no server to arbitrate, this is the only defense.

use crate::{GameMessage, Mark};

/// Number of cells on the grid.
pub const BOARD_CELLS: usize = 9;

/// A flat snapshot of the grid: `None` is an empty cell.
pub type Board = [Option<Mark>; BOARD_CELLS];

/// Why an inbound move was refused.
///
/// Each variant names the rule that failed; the controller forwards the
/// rendered message to its error callback so the UI can explain what went
/// wrong. Any of these on a live session means the two boards have diverged
/// and the session should be treated as compromised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    /// The message was not a `move` at all.
    #[error("expected a move message")]
    NotAMove,

    /// It is not this player's turn.
    #[error("move by {got}, but it is {expected}'s turn")]
    WrongTurn { got: Mark, expected: Mark },

    /// The sequence number is not exactly one past the last accepted move.
    #[error("move number {got}, expected {expected}")]
    OutOfSequence { got: u32, expected: u32 },

    /// The cell index is not on the grid.
    #[error("cell index {0} out of range")]
    CellOutOfRange(u8),

    /// The target cell already holds a mark.
    #[error("cell {0} is occupied")]
    CellOccupied(u8),
}

/// Accepts a move message only if every rule holds:
///
/// - the message is a [`GameMessage::Move`],
/// - its `player` matches whose turn it is,
/// - its `move_number` is exactly `expected_move_number`,
/// - its `cell_index` is on the grid,
/// - the target cell is empty.
///
/// Returns the first rule that fails, checked in the order above.
pub fn validate_move(
    msg: &GameMessage,
    board: &Board,
    expected_player: Mark,
    expected_move_number: u32,
) -> Result<(), MoveRejection> {
    let (cell_index, player, move_number) = match msg {
        GameMessage::Move {
            cell_index,
            player,
            move_number,
        } => (*cell_index, *player, *move_number),
        _ => return Err(MoveRejection::NotAMove),
    };

    if player != expected_player {
        return Err(MoveRejection::WrongTurn {
            got: player,
            expected: expected_player,
        });
    }
    if move_number != expected_move_number {
        return Err(MoveRejection::OutOfSequence {
            got: move_number,
            expected: expected_move_number,
        });
    }
    if usize::from(cell_index) >= BOARD_CELLS {
        return Err(MoveRejection::CellOutOfRange(cell_index));
    }
    if board[usize::from(cell_index)].is_some() {
        return Err(MoveRejection::CellOccupied(cell_index));
    }

    Ok(())
}

// =========================================================================
// Tests
// =========================================================================
