// SPDX-License-Identifier: MIT OR Apache-2.0

//! Move legality and capture resolution

use crate::{
    board::Board,
    delta::{StateDelta, StoneChange},
    hash::StateHasher,
    resolver::Snapshot,
    ruleset::RulesPolicy,
    Color, Coord, IllegalMove,
};
use std::collections::HashSet;

/// Everything about the game so far that a move is judged against
#[derive(Debug, Clone, Copy)]
pub struct MoveContext<'a> {
    /// Resolved state at the node the move is played from
    pub position: &'a Snapshot,
    /// Side to move, when turn order is enforced
    pub to_play: Option<Color>,
    /// Hash of the position two plies before the new move
    pub ko_hash: Option<u64>,
    /// Earlier position hashes, when the rules forbid repeating them
    pub history: Option<&'a HashSet<u64>>,
}

/// An accepted move, ready to be committed as a new node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDecision {
    pub delta: StateDelta,
    /// Hash of the resulting position
    pub hash: u64,
}

/// Validates moves for one rule-set
pub struct RuleValidator<'a> {
    hasher: &'a StateHasher,
    rules: &'a dyn RulesPolicy,
}

impl<'a> RuleValidator<'a> {
    /// Create a new rules validator
    pub fn new(hasher: &'a StateHasher, rules: &'a dyn RulesPolicy) -> Self {
        Self { hasher, rules }
    }

    /// Check a stone placement and compute what it captures.
    ///
    /// Nothing outside the returned decision is modified, whether the move is
    /// accepted or not.
    pub fn check_move(
        &self,
        ctx: &MoveContext<'_>,
        coord: Coord,
        color: Color,
    ) -> Result<MoveDecision, IllegalMove> {
        let board = &ctx.position.board;

        // Basic validation
        if !board.contains(coord) {
            return Err(IllegalMove::OutOfBounds {
                x: coord.x,
                y: coord.y,
            });
        }

        if board.get(coord).is_some() {
            return Err(IllegalMove::NonEmptyIntersection);
        }

        if let Some(expected) = ctx.to_play {
            if expected != color {
                return Err(IllegalMove::WrongColorForTurn { expected });
            }
        }

        // Create a temporary board with the move applied
        let mut scratch = board.clone();
        scratch.set(coord, Some(color))?;

        // Remove opponent groups left without liberties
        let opponent = color.opposite();
        let mut removed = HashSet::new();
        let mut captured = Vec::new();
        for neighbor in scratch.neighbors(coord) {
            if scratch.get(neighbor) != Some(opponent) || removed.contains(&neighbor) {
                continue;
            }

            let group = find_group(&scratch, neighbor);
            if liberties(&scratch, &group) == 0 {
                for stone in group {
                    scratch.set(stone, None)?;
                    removed.insert(stone);
                    captured.push(StoneChange {
                        coord: stone,
                        color: opponent,
                    });
                }
            }
        }
        let opponent_captures = captured.len();

        // Check for suicide
        let own_group = find_group(&scratch, coord);
        let mut self_captured = false;
        if liberties(&scratch, &own_group) == 0 {
            if !self.rules.allows_self_capture() {
                tracing::debug!("Suicide rejected at {:?}", coord);
                return Err(IllegalMove::MoveSuicidal);
            }

            tracing::debug!(
                stones = own_group.len(),
                "Self-capture at {:?}",
                coord
            );
            for stone in &own_group {
                scratch.set(*stone, None)?;
                captured.push(StoneChange {
                    coord: *stone,
                    color,
                });
            }
            self_captured = true;
        }

        let placed = StoneChange { coord, color };
        let mut changes = Vec::with_capacity(captured.len() + 1);
        changes.push(placed);
        changes.extend_from_slice(&captured);
        let hash = self.hasher.incremental_hash(ctx.position.hash, &changes);

        // Ko happens when a lone stone takes a lone stone and restores the
        // position from before the previous move
        if opponent_captures == 1
            && own_group.len() == 1
            && !self_captured
            && ctx.ko_hash == Some(hash)
        {
            tracing::debug!("Ko violation detected at {:?}", coord);
            return Err(IllegalMove::KoRecapture);
        }

        if let Some(history) = ctx.history {
            if history.contains(&hash) {
                tracing::debug!("Positional repetition at {:?}", coord);
                return Err(IllegalMove::PositionRepeat);
            }
        }

        if !captured.is_empty() {
            tracing::trace!(count = captured.len(), "stones captured");
        }
        captured.sort();

        Ok(MoveDecision {
            delta: StateDelta::MovePlayed {
                stone: placed,
                captured,
            },
            hash,
        })
    }
}

/// Calculate the number of distinct liberties of a group of stones
pub fn liberties(board: &Board, group: &[Coord]) -> usize {
    let mut liberties_set = HashSet::new();

    for &coord in group {
        for neighbor in board.neighbors(coord) {
            if board.get(neighbor).is_none() {
                liberties_set.insert(neighbor);
            }
        }
    }

    liberties_set.len()
}

/// Find all stones in a group connected to the stone at coord
pub fn find_group(board: &Board, coord: Coord) -> Vec<Coord> {
    let target_color = match board.get(coord) {
        Some(color) => color,
        None => return Vec::new(),
    };

    let mut group = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = vec![coord];

    while let Some(current) = queue.pop() {
        if !visited.insert(current) {
            continue;
        }
        group.push(current);

        // Add adjacent stones of the same color
        for neighbor in board.neighbors(current) {
            if board.get(neighbor) == Some(target_color) && !visited.contains(&neighbor) {
                queue.push(neighbor);
            }
        }
    }

    group
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Prisoners;
    use crate::ruleset::{ChineseRules, NewZealandRules};

    fn snapshot(hasher: &StateHasher, size: u8, stones: &[(u8, u8, Color)]) -> Snapshot {
        let mut board = Board::new(size, size).unwrap();
        for &(x, y, color) in stones {
            board.set(Coord::new(x, y), Some(color)).unwrap();
        }
        Snapshot {
            hash: hasher.full_hash(&board),
            board,
            prisoners: Prisoners::default(),
            move_number: 0,
            annotations: Vec::new(),
        }
    }

    fn context(position: &Snapshot) -> MoveContext<'_> {
        MoveContext {
            position,
            to_play: None,
            ko_hash: None,
            history: None,
        }
    }

    #[test]
    fn group_and_liberties() {
        let hasher = StateHasher::new(5, 5).unwrap();
        let pos = snapshot(
            &hasher,
            5,
            &[
                (1, 1, Color::Black),
                (2, 1, Color::Black),
                (2, 2, Color::Black),
                (3, 3, Color::Black),
            ],
        );
        let group = find_group(&pos.board, Coord::new(1, 1));
        assert_eq!(group.len(), 3);
        assert_eq!(liberties(&pos.board, &group), 7);
        assert!(find_group(&pos.board, Coord::new(0, 0)).is_empty());
    }

    #[test]
    fn shared_liberty_counted_once() {
        let hasher = StateHasher::new(3, 3).unwrap();
        let pos = snapshot(&hasher, 3, &[(0, 0, Color::White), (1, 0, Color::White)]);
        let group = find_group(&pos.board, Coord::new(0, 0));
        // (0,1), (1,1), (2,0)
        assert_eq!(liberties(&pos.board, &group), 3);
    }

    #[test]
    fn capture_detection() {
        let hasher = StateHasher::new(9, 9).unwrap();
        let rules = ChineseRules;
        let validator = RuleValidator::new(&hasher, &rules);

        let pos = snapshot(
            &hasher,
            9,
            &[
                (3, 3, Color::White),
                (4, 3, Color::White),
                (2, 3, Color::Black),
                (3, 2, Color::Black),
                (4, 2, Color::Black),
                (5, 3, Color::Black),
                (4, 4, Color::Black),
            ],
        );

        let decision = validator
            .check_move(&context(&pos), Coord::new(3, 4), Color::Black)
            .unwrap();
        match decision.delta {
            StateDelta::MovePlayed { captured, .. } => assert_eq!(captured.len(), 2),
            other => panic!("unexpected delta {:?}", other),
        }

        let mut after = pos.board.clone();
        after.set(Coord::new(3, 4), Some(Color::Black)).unwrap();
        after.set(Coord::new(3, 3), None).unwrap();
        after.set(Coord::new(4, 3), None).unwrap();
        assert_eq!(decision.hash, hasher.full_hash(&after));
    }

    #[test]
    fn self_capture() {
        let hasher = StateHasher::new(9, 9).unwrap();
        let pos = snapshot(
            &hasher,
            9,
            &[
                (0, 0, Color::White),
                (1, 0, Color::White),
                (0, 1, Color::White),
                (2, 1, Color::White),
                (1, 2, Color::White),
                (2, 2, Color::White),
            ],
        );

        let strict = ChineseRules;
        let validator = RuleValidator::new(&hasher, &strict);
        assert_eq!(
            validator.check_move(&context(&pos), Coord::new(1, 1), Color::Black),
            Err(IllegalMove::MoveSuicidal)
        );
        assert!(validator
            .check_move(&context(&pos), Coord::new(1, 1), Color::White)
            .is_ok());

        let lenient = NewZealandRules;
        let validator = RuleValidator::new(&hasher, &lenient);
        let decision = validator
            .check_move(&context(&pos), Coord::new(1, 1), Color::Black)
            .unwrap();
        assert_eq!(decision.hash, pos.hash);
    }

    #[test]
    fn capture_wins_over_suicide() {
        // Filling the last liberty of a white stone is legal even with no
        // liberties of its own before the capture
        let hasher = StateHasher::new(3, 3).unwrap();
        let pos = snapshot(
            &hasher,
            3,
            &[
                (1, 0, Color::White),
                (0, 1, Color::White),
                (2, 0, Color::Black),
                (1, 1, Color::Black),
                (0, 2, Color::Black),
            ],
        );
        let rules = ChineseRules;
        let validator = RuleValidator::new(&hasher, &rules);
        let decision = validator
            .check_move(&context(&pos), Coord::new(0, 0), Color::Black)
            .unwrap();
        match decision.delta {
            StateDelta::MovePlayed { captured, .. } => assert_eq!(
                captured,
                vec![
                    StoneChange::new(0, 1, Color::White),
                    StoneChange::new(1, 0, Color::White)
                ]
            ),
            other => panic!("unexpected delta {:?}", other),
        }
    }

    #[test]
    fn strict_turn_order() {
        let hasher = StateHasher::new(3, 3).unwrap();
        let pos = snapshot(&hasher, 3, &[]);
        let rules = ChineseRules;
        let validator = RuleValidator::new(&hasher, &rules);
        let ctx = MoveContext {
            to_play: Some(Color::Black),
            ..context(&pos)
        };
        assert_eq!(
            validator.check_move(&ctx, Coord::new(1, 1), Color::White),
            Err(IllegalMove::WrongColorForTurn {
                expected: Color::Black
            })
        );
    }

    #[test]
    fn bounds_before_occupancy() {
        let hasher = StateHasher::new(3, 3).unwrap();
        let pos = snapshot(&hasher, 3, &[(1, 1, Color::Black)]);
        let rules = ChineseRules;
        let validator = RuleValidator::new(&hasher, &rules);
        assert_eq!(
            validator.check_move(&context(&pos), Coord::new(5, 1), Color::White),
            Err(IllegalMove::OutOfBounds { x: 5, y: 1 })
        );
        assert_eq!(
            validator.check_move(&context(&pos), Coord::new(1, 1), Color::White),
            Err(IllegalMove::NonEmptyIntersection)
        );
    }
}
