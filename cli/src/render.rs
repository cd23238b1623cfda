// SPDX-License-Identifier: MIT OR Apache-2.0

//! ASCII board rendering for the CLI.

use crate::command::column_char;
use kifu_core::{Board, Color, Coord, Snapshot};

/// Render the board as ASCII art, marking the last stone played
pub fn render_board(board: &Board, last: Option<Coord>) -> String {
    let (width, height) = (board.width(), board.height());
    let mut output = String::new();

    output.push_str(&column_labels(width));
    for y in 0..height {
        output.push_str(&format!("{:2} ", y + 1));
        for x in 0..width {
            let coord = Coord::new(x, y);
            let symbol = match board.get(coord) {
                Some(Color::Black) if last == Some(coord) => "◆",
                Some(Color::White) if last == Some(coord) => "◇",
                Some(Color::Black) => "●",
                Some(Color::White) => "○",
                None if is_star_point(coord, width, height) => "+",
                None => ".",
            };
            output.push_str(&format!(" {}", symbol));
        }
        output.push_str(&format!(" {}", y + 1));
        output.push('\n');
    }
    output.push_str(&column_labels(width));
    output
}

/// One line summary of a position
pub fn render_status(snapshot: &Snapshot, to_play: Color) -> String {
    format!(
        "move {} | {:?} to play | captures B:{} W:{} | hash {:016x}",
        snapshot.move_number,
        to_play,
        snapshot.prisoners.black,
        snapshot.prisoners.white,
        snapshot.hash
    )
}

fn column_labels(width: u8) -> String {
    let mut line = String::from("   ");
    for x in 0..width {
        line.push(' ');
        line.push(column_char(x));
    }
    line.push('\n');
    line
}

/// Star points for the usual square sizes
fn is_star_point(coord: Coord, width: u8, height: u8) -> bool {
    if width != height {
        return false;
    }
    let lines: &[u8] = match width {
        9 => &[2, 6],
        13 => &[3, 6, 9],
        19 => &[3, 9, 15],
        _ => return false,
    };
    let center = width / 2;
    if width == 9 && coord.x == center && coord.y == center {
        return true;
    }
    lines.contains(&coord.x) && lines.contains(&coord.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty_9x9_board() {
        let board = Board::new(9, 9).unwrap();
        let output = render_board(&board, None);

        // Column labels skip I
        assert!(output.contains("A B C D E F G H J"));
        assert!(output.contains(" 1 "));
        assert!(output.contains(" 9 "));

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 11); // 2 label rows + 9 board rows
        assert!(!output.contains('●'));
    }

    #[test]
    fn test_render_rectangular_board() {
        let board = Board::new(5, 3).unwrap();
        let output = render_board(&board, None);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].ends_with("A B C D E"));
        assert!(!output.contains('+'));
    }

    #[test]
    fn test_render_board_with_stones() {
        let mut board = Board::new(9, 9).unwrap();
        board.set(Coord::new(4, 4), Some(Color::Black)).unwrap();
        board.set(Coord::new(3, 3), Some(Color::White)).unwrap();

        let output = render_board(&board, Some(Coord::new(3, 3)));
        assert!(output.contains('●'));
        assert!(output.contains('◇'));
        assert!(!output.contains('○'));
    }

    #[test]
    fn test_render_oversized_board_does_not_panic() {
        let board = Board::new(200, 1).unwrap();
        let output = render_board(&board, None);
        assert!(output.lines().next().unwrap().contains('?'));
    }

    #[test]
    fn test_star_points() {
        assert!(is_star_point(Coord::new(4, 4), 9, 9));
        assert!(is_star_point(Coord::new(2, 6), 9, 9));
        assert!(!is_star_point(Coord::new(0, 0), 9, 9));

        assert!(is_star_point(Coord::new(9, 9), 19, 19));
        assert!(is_star_point(Coord::new(3, 15), 19, 19));
        assert!(!is_star_point(Coord::new(4, 4), 19, 19));
        assert!(!is_star_point(Coord::new(3, 3), 19, 13));
    }
}
