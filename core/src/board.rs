// SPDX-License-Identifier: MIT OR Apache-2.0

//! Board representation and manipulation

use crate::{Color, ConfigError, Coord, IllegalMove};

/// A single board configuration: one value per intersection, no history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Number of columns
    width: u8,
    /// Number of rows
    height: u8,
    /// Intersections indexed `x + y * width`
    positions: Vec<Option<Color>>,
}

impl Board {
    /// Create a new empty board with the specified dimensions
    pub fn new(width: u8, height: u8) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidDimensions { width, height });
        }

        let cells = (width as usize) * (height as usize);
        Ok(Self {
            width,
            height,
            positions: vec![None; cells],
        })
    }

    /// Get the stone at the specified coordinate
    pub fn get(&self, coord: Coord) -> Option<Color> {
        if !self.contains(coord) {
            return None;
        }

        self.positions[self.index_of(coord)]
    }

    /// Set an intersection to a stone or to empty
    pub fn set(&mut self, coord: Coord, value: Option<Color>) -> Result<(), IllegalMove> {
        if !self.contains(coord) {
            return Err(IllegalMove::OutOfBounds {
                x: coord.x,
                y: coord.y,
            });
        }

        let idx = self.index_of(coord);
        self.positions[idx] = value;
        Ok(())
    }

    /// Total number of intersections
    pub fn intersection_count(&self) -> usize {
        self.positions.len()
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Whether the coordinate lies on this board
    pub fn contains(&self, coord: Coord) -> bool {
        coord.is_valid(self.width, self.height)
    }

    /// Convert a coordinate to a vector index
    pub fn index_of(&self, coord: Coord) -> usize {
        (coord.y as usize) * (self.width as usize) + (coord.x as usize)
    }

    /// Get adjacent coordinates (up, down, left, right)
    pub fn neighbors(&self, coord: Coord) -> Vec<Coord> {
        let mut result = Vec::with_capacity(4);
        let x = coord.x;
        let y = coord.y;

        // Up
        if y > 0 {
            result.push(Coord::new(x, y - 1));
        }

        // Down
        if y + 1 < self.height {
            result.push(Coord::new(x, y + 1));
        }

        // Left
        if x > 0 {
            result.push(Coord::new(x - 1, y));
        }

        // Right
        if x + 1 < self.width {
            result.push(Coord::new(x + 1, y));
        }

        result
    }

    /// Iterate over every stone on the board
    pub fn stones(&self) -> impl Iterator<Item = (Coord, Color)> + '_ {
        let width = self.width as usize;
        self.positions
            .iter()
            .enumerate()
            .filter_map(move |(idx, value)| {
                value.map(|color| (Coord::new((idx % width) as u8, (idx / width) as u8), color))
            })
    }

    /// Count stones of the specified color
    pub fn count_stones_for(&self, color: Color) -> usize {
        self.positions
            .iter()
            .filter(|stone| **stone == Some(color))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            Board::new(0, 9),
            Err(ConfigError::InvalidDimensions { width: 0, height: 9 })
        ));
        assert!(Board::new(9, 0).is_err());
    }

    #[test]
    fn rectangular_indexing() {
        let mut board = Board::new(5, 3).unwrap();
        assert_eq!(board.intersection_count(), 15);

        board.set(Coord::new(4, 2), Some(Color::White)).unwrap();
        assert_eq!(board.index_of(Coord::new(4, 2)), 14);
        assert_eq!(board.get(Coord::new(4, 2)), Some(Color::White));
        assert_eq!(board.get(Coord::new(2, 4)), None);
    }

    #[test]
    fn set_outside_fails() {
        let mut board = Board::new(3, 3).unwrap();
        assert_eq!(
            board.set(Coord::new(3, 0), Some(Color::Black)),
            Err(IllegalMove::OutOfBounds { x: 3, y: 0 })
        );
    }

    #[test]
    fn corner_has_two_neighbors() {
        let board = Board::new(3, 3).unwrap();
        assert_eq!(board.neighbors(Coord::new(0, 0)).len(), 2);
        assert_eq!(board.neighbors(Coord::new(1, 0)).len(), 3);
        assert_eq!(board.neighbors(Coord::new(1, 1)).len(), 4);
        assert_eq!(board.neighbors(Coord::new(2, 2)).len(), 2);
    }

    #[test]
    fn stones_lists_occupied_points() {
        let mut board = Board::new(4, 2).unwrap();
        board.set(Coord::new(3, 1), Some(Color::Black)).unwrap();
        board.set(Coord::new(1, 0), Some(Color::White)).unwrap();

        let stones: Vec<_> = board.stones().collect();
        assert_eq!(
            stones,
            vec![
                (Coord::new(1, 0), Color::White),
                (Coord::new(3, 1), Color::Black)
            ]
        );
        assert_eq!(board.count_stones_for(Color::Black), 1);
    }
}
