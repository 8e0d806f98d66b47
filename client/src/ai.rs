//! Local single-player opponent: exhaustive minimax over the remaining cells

use shared::{Board, Mark, Outcome};

const WIN_SCORE: i32 = 10;

/// Picks the move for `ai` on `board`.
///
/// Each candidate is scored by a full search of the game that follows it.
/// A win for `ai` scores `10 - depth`, a loss `depth - 10` and a draw 0,
/// where depth counts the replies played after the candidate. Faster wins and
/// slower losses therefore rank higher. Equal scores go to the lowest cell.
///
/// Returns `None` when the board is full or already decided.
pub fn best_move(board: &Board, ai: Mark) -> Option<usize> {
    if board.evaluate().is_finished() {
        return None;
    }

    let mut best: Option<(usize, i32)> = None;
    for cell in board.empty_cells() {
        let Ok(next) = board.with_mark(cell, ai) else {
            continue;
        };
        let score = minimax(&next, ai, ai.opponent(), 0);

        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((cell, score));
        }
    }

    best.map(|(cell, _)| cell)
}

fn minimax(board: &Board, ai: Mark, to_move: Mark, depth: i32) -> i32 {
    match board.evaluate() {
        Outcome::Won { mark, .. } if mark == ai => return WIN_SCORE - depth,
        Outcome::Won { .. } => return depth - WIN_SCORE,
        Outcome::Draw => return 0,
        Outcome::InProgress => {}
    }

    let scores = board.empty_cells().filter_map(|cell| {
        board
            .with_mark(cell, to_move)
            .ok()
            .map(|next| minimax(&next, ai, to_move.opponent(), depth + 1))
    });

    if to_move == ai {
        scores.max().unwrap_or(0)
    } else {
        scores.min().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_from(moves: &[(usize, Mark)]) -> Board {
        let mut board = Board::new();
        for &(cell, mark) in moves {
            board.apply_mark(cell, mark).unwrap();
        }
        board
    }

    #[test]
    fn test_takes_immediate_win() {
        // O holds 3 and 4; X threatens nothing immediate.
        let board = board_from(&[(0, Mark::X), (3, Mark::O), (1, Mark::X), (4, Mark::O), (8, Mark::X)]);
        assert_eq!(best_move(&board, Mark::O), Some(5));
    }

    #[test]
    fn test_blocks_opponent_win() {
        // X threatens the top row at cell 2.
        let board = board_from(&[(0, Mark::X), (4, Mark::O), (1, Mark::X)]);
        assert_eq!(best_move(&board, Mark::O), Some(2));
    }

    #[test]
    fn test_prefers_win_over_block() {
        // Both X (row 0) and O (row 1) threaten; winning now beats blocking.
        let board = board_from(&[(0, Mark::X), (3, Mark::O), (1, Mark::X), (4, Mark::O), (6, Mark::X)]);
        assert_eq!(best_move(&board, Mark::O), Some(5));
    }

    #[test]
    fn test_answers_corner_opening_with_center() {
        let board = board_from(&[(0, Mark::X)]);
        assert_eq!(best_move(&board, Mark::O), Some(4));
    }

    #[test]
    fn test_empty_board_picks_lowest_optimal_cell() {
        // Every opening draws under perfect play, so the tie goes to cell 0.
        assert_eq!(best_move(&Board::new(), Mark::X), Some(0));
    }

    #[test]
    fn test_none_on_full_board() {
        let board = board_from(&[
            (0, Mark::X),
            (2, Mark::O),
            (1, Mark::X),
            (3, Mark::O),
            (5, Mark::X),
            (4, Mark::O),
            (6, Mark::X),
            (7, Mark::O),
            (8, Mark::X),
        ]);
        assert!(board.is_full());
        assert_eq!(best_move(&board, Mark::O), None);
    }

    #[test]
    fn test_none_on_decided_board() {
        let board = board_from(&[(0, Mark::X), (3, Mark::O), (1, Mark::X), (4, Mark::O), (2, Mark::X)]);
        assert_eq!(best_move(&board, Mark::O), None);
    }

    #[test]
    fn test_ai_never_loses_against_any_reply() {
        fn play_out(board: Board, human: Mark) {
            match board.evaluate() {
                Outcome::Won { mark, .. } => assert_ne!(mark, human, "AI lost on {:?}", board),
                Outcome::Draw => {}
                Outcome::InProgress => {
                    for cell in board.empty_cells() {
                        let after_human = board.with_mark(cell, human).unwrap();
                        if after_human.evaluate().is_finished() {
                            play_out(after_human, human);
                            continue;
                        }
                        let reply = best_move(&after_human, human.opponent()).unwrap();
                        play_out(after_human.with_mark(reply, human.opponent()).unwrap(), human);
                    }
                }
            }
        }

        play_out(Board::new(), Mark::X);
    }
}
