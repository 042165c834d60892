//! Seed patterns stamped onto the grid before generation 0.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A small binary matrix, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
}

impl Pattern {
    /// Parse rows of `0`/`1` (or `.`/`#`) characters.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self, ConfigError> {
        let cols = lines.first().map(|l| l.as_ref().chars().count()).unwrap_or(0);
        if cols == 0 {
            return Err(ConfigError::EmptyPattern);
        }

        let mut cells = Vec::with_capacity(lines.len() * cols);
        for (row, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != cols {
                return Err(ConfigError::RaggedPattern {
                    row,
                    expected: cols,
                    found,
                });
            }
            for c in line.chars() {
                cells.push(match c {
                    '1' | '#' | 'O' => 1,
                    '0' | '.' => 0,
                    other => return Err(ConfigError::BadPatternCell(other)),
                });
            }
        }

        Ok(Pattern {
            rows: lines.len(),
            cols,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row(&self, r: usize) -> &[u8] {
        &self.cells[r * self.cols..(r + 1) * self.cols]
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c == 1).count()
    }

    /// Coordinates of live cells, relative to the pattern's top-left corner.
    pub fn live_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == 1)
            .map(move |(i, _)| (i / self.cols, i % self.cols))
    }
}

/// The shape half of a placement, as it appears in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Shape {
    Glider,
    Block,
    Blinker,
    Toad,
    Beacon,
    RPentomino,
    Custom { rows: Vec<String> },
}

impl Shape {
    pub fn pattern(&self) -> Result<Pattern, ConfigError> {
        match self {
            Shape::Glider => Pattern::parse(&[".#.", "..#", "###"]),
            Shape::Block => Pattern::parse(&["##", "##"]),
            Shape::Blinker => Pattern::parse(&["###"]),
            Shape::Toad => Pattern::parse(&[".###", "###."]),
            Shape::Beacon => Pattern::parse(&["##..", "##..", "..##", "..##"]),
            Shape::RPentomino => Pattern::parse(&[".##", "##.", ".#."]),
            Shape::Custom { rows } => Pattern::parse(rows.as_slice()),
        }
    }
}
