//! Per-worker double-buffered slab of the grid.
//!
//! Layout of each buffer, row-major, `width` cells per row:
//!
//! ```text
//! row 0            top ghost row (copy of rank - 1's last owned row)
//! rows 1..=rows    owned rows
//! row rows + 1     bottom ghost row (copy of rank + 1's first owned row)
//! ```
//!
//! At the global top and bottom edges the corresponding ghost row is never
//! written and stays zero.

use std::mem;

use crate::error::{LifeError, Result};
use crate::partition::RowSpan;
use crate::pattern::Pattern;

pub const DEAD: u8 = 0;
pub const ALIVE: u8 = 1;

#[derive(Debug)]
pub struct LocalGrid {
    width: usize,
    rows: usize,
    current: Vec<u8>,
    next: Vec<u8>,
}

fn zeroed(len: usize) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).ok()?;
    buf.resize(len, DEAD);
    Some(buf)
}

impl LocalGrid {
    /// Allocate both buffers for `rows` owned rows of `width` cells, all dead.
    pub fn new(rank: usize, rows: usize, width: usize) -> Result<Self> {
        let alloc_err = || LifeError::Allocation { rank, rows, width };
        let len = rows
            .checked_add(2)
            .and_then(|r| r.checked_mul(width))
            .ok_or_else(alloc_err)?;
        let current = zeroed(len).ok_or_else(alloc_err)?;
        let next = zeroed(len).ok_or_else(alloc_err)?;
        Ok(LocalGrid {
            width,
            rows,
            current,
            next,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Owned rows, ghost rows excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// The current buffer, ghost rows included.
    pub fn current(&self) -> &[u8] {
        &self.current
    }

    /// Current buffer to read from, next buffer to write into.
    pub fn buffers_mut(&mut self) -> (&[u8], &mut [u8]) {
        (&self.current, &mut self.next)
    }

    /// Local row `i` of the current buffer (0 is the top ghost row).
    pub fn row(&self, i: usize) -> &[u8] {
        &self.current[i * self.width..(i + 1) * self.width]
    }

    pub fn top_ghost(&self) -> &[u8] {
        self.row(0)
    }

    pub fn bottom_ghost(&self) -> &[u8] {
        self.row(self.rows + 1)
    }

    /// The owned rows of the current buffer as one slice.
    pub fn owned(&self) -> &[u8] {
        &self.current[self.width..(self.rows + 1) * self.width]
    }

    /// First owned row to send upstream, and the top ghost row to receive into.
    pub fn upper_boundary(&mut self) -> (&[u8], &mut [u8]) {
        let w = self.width;
        let (ghost, rest) = self.current.split_at_mut(w);
        (&rest[..w], ghost)
    }

    /// Last owned row to send downstream, and the bottom ghost row to receive into.
    pub fn lower_boundary(&mut self) -> (&[u8], &mut [u8]) {
        let w = self.width;
        let (body, ghost) = self.current.split_at_mut((self.rows + 1) * w);
        (&body[self.rows * w..], ghost)
    }

    /// Make the freshly computed buffer current. Only the buffers swap places,
    /// no cells are copied.
    pub fn swap(&mut self) {
        mem::swap(&mut self.current, &mut self.next);
    }

    /// Set one cell by local row (ghost offset included) and column.
    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        self.current[row * self.width + col] = value;
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.current[row * self.width + col]
    }

    /// Stamp the part of `pattern` that falls inside `span`.
    ///
    /// `row` and `col` are global coordinates of the pattern's top-left cell
    /// and must already be validated against the grid size. Returns the
    /// number of pattern rows written by this worker.
    pub fn place_pattern(&mut self, span: &RowSpan, row: usize, col: usize, pattern: &Pattern) -> usize {
        let first = row.max(span.start);
        let last = (row + pattern.rows()).min(span.end);
        let mut written = 0;
        for global in first..last {
            let local = global - span.start + 1;
            let start = local * self.width + col;
            self.current[start..start + pattern.cols()].copy_from_slice(pattern.row(global - row));
            written += 1;
        }
        written
    }

    /// Alive cells in the owned rows.
    pub fn alive(&self) -> u64 {
        self.owned().iter().map(|&c| u64::from(c)).sum()
    }

    /// Ghost rows on a global edge must never hold anything.
    pub fn edge_ghosts_clear(&self, span: &RowSpan) -> bool {
        let clear = |row: &[u8]| row.iter().all(|&c| c == DEAD);
        (span.up().is_some() || clear(self.top_ghost()))
            && (span.down().is_some() || clear(self.bottom_ghost()))
    }
}
