use std::{fmt, iter, str::FromStr};

use memchr::memchr_iter;
use nalgebra::DMatrix;

use crate::error::{Error, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Pos) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Expansion order out of the start cell.
    pub const ALL: [Direction; 4] = [
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::North,
    ];

    pub fn turn_left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::East => Self::North,
            Self::South => Self::East,
            Self::West => Self::South,
        }
    }

    pub fn turn_right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// The neighbour of `pos` in this direction. Only the lower bound is checked here, the upper
    /// bound is the grid's business.
    pub fn step(self, pos: Pos) -> Option<Pos> {
        let Pos { x, y } = pos;
        match self {
            Self::North => y.checked_sub(1).map(|y| Pos { x, y }),
            Self::East => x.checked_add(1).map(|x| Pos { x, y }),
            Self::South => y.checked_add(1).map(|y| Pos { x, y }),
            Self::West => x.checked_sub(1).map(|x| Pos { x, y }),
        }
    }

    /// Direction of a single orthogonal move from `from` to `to`.
    pub fn between(from: Pos, to: Pos) -> Option<Self> {
        Self::ALL.into_iter().find(|dir| dir.step(from) == Some(to))
    }

    pub fn arrow(self) -> char {
        match self {
            Self::North => '^',
            Self::East => '>',
            Self::South => 'v',
            Self::West => '<',
        }
    }
}

/// Rectangular field of movement costs. Entering a cell costs its value; the start cell is free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: DMatrix<u32>,
    min_cost: u32,
}

impl Grid {
    /// Parses one row per line, one decimal digit per cell. Surrounding blank lines are ignored
    /// and `\r\n` line endings are accepted.
    pub fn load(text: &str) -> Result<Self, ParseError> {
        let text = text.trim_matches(|c: char| c == '\n' || c == '\r');
        if text.is_empty() {
            return Err(ParseError::Empty);
        }

        let mut cells = Vec::with_capacity(text.len());
        let mut width = None;
        let mut height = 0;
        let mut start = 0;
        for end in memchr_iter(b'\n', text.as_bytes()).chain(iter::once(text.len())) {
            let line = text[start..end].trim_end_matches('\r');
            start = end + 1;
            height += 1;

            let row_start = cells.len();
            for (column, ch) in line.chars().enumerate() {
                let digit = ch.to_digit(10).ok_or(ParseError::InvalidDigit {
                    line: height,
                    column: column + 1,
                    found: ch,
                })?;
                cells.push(digit);
            }

            let found = cells.len() - row_start;
            match width {
                None => width = Some(found),
                Some(expected) if expected != found => {
                    return Err(ParseError::RaggedRow {
                        line: height,
                        expected,
                        found,
                    })
                }
                Some(_) => {}
            }
        }

        Self::from_flat(width.unwrap_or(0), height, cells)
    }

    /// Builds a grid from already-parsed rows, for costs that do not fit in a single digit.
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self, ParseError> {
        let width = rows.first().map_or(0, |row| row.as_ref().len());
        let mut cells = Vec::with_capacity(width * rows.len());
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(ParseError::RaggedRow {
                    line: i + 1,
                    expected: width,
                    found: row.len(),
                });
            }
            cells.extend_from_slice(row);
        }
        Self::from_flat(width, rows.len(), cells)
    }

    fn from_flat(width: usize, height: usize, cells: Vec<u32>) -> Result<Self, ParseError> {
        if width == 0 || height == 0 {
            return Err(ParseError::Empty);
        }
        let min_cost = cells.iter().copied().min().unwrap_or(0);
        Ok(Self {
            cells: DMatrix::from_row_slice(height, width, &cells),
            min_cost,
        })
    }

    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    /// The bottom-right cell.
    pub fn goal(&self) -> Pos {
        Pos::new(self.width() - 1, self.height() - 1)
    }

    /// Cheapest single cell, the per-step lower bound used by the distance heuristic.
    pub fn min_cost(&self) -> u32 {
        self.min_cost
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x < self.width() && pos.y < self.height()
    }

    pub fn get(&self, pos: Pos) -> Option<u32> {
        self.cells.get((pos.y, pos.x)).copied()
    }

    pub fn cost(&self, pos: Pos) -> Result<u32, Error> {
        self.get(pos).ok_or(Error::OutOfBounds {
            x: pos.x,
            y: pos.y,
            width: self.width(),
            height: self.height(),
        })
    }

    /// Total cost of walking `route`; the first cell is where the walk starts and is not paid for.
    /// Saturates at `u32::MAX`.
    pub fn route_cost(&self, route: &[Pos]) -> Result<u32, Error> {
        route
            .iter()
            .skip(1)
            .try_fold(0u32, |acc, &pos| Ok::<_, Error>(acc.saturating_add(self.cost(pos)?)))
    }

    /// Draws `route` over the grid: every entered cell shows the arrow of the move into it.
    pub fn render_route(&self, route: &[Pos]) -> String {
        let mut canvas: Vec<Vec<char>> = self
            .cells
            .row_iter()
            .map(|row| row.iter().map(|&c| digit_char(c)).collect())
            .collect();
        for pair in route.windows(2) {
            if let (Some(dir), Some(row)) = (
                Direction::between(pair[0], pair[1]),
                canvas.get_mut(pair[1].y),
            ) {
                if let Some(cell) = row.get_mut(pair[1].x) {
                    *cell = dir.arrow();
                }
            }
        }

        let mut out = String::with_capacity(self.height() * (self.width() + 1));
        for row in canvas {
            out.extend(row);
            out.push('\n');
        }
        out
    }
}

fn digit_char(cost: u32) -> char {
    char::from_digit(cost, 10).unwrap_or('#')
}

impl FromStr for Grid {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::load(s)
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.row_iter() {
            for &cost in row.iter() {
                write!(f, "{cost}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
