//! B3/S23 update of a worker's owned rows.

use crate::grid::{LocalGrid, ALIVE, DEAD};

/// Next state of a cell with `neighbors` live neighbours.
#[inline]
pub fn next_state(cell: u8, neighbors: u32) -> u8 {
    match (cell, neighbors) {
        (ALIVE, 2) | (ALIVE, 3) => ALIVE,
        (ALIVE, _) => DEAD,
        (_, 3) => ALIVE,
        _ => cell,
    }
}

/// Sum of `row[col - 1..=col + 1]`, clipped to the row.
#[inline]
fn window(row: &[u8], col: usize) -> u32 {
    let lo = col.saturating_sub(1);
    let hi = (col + 2).min(row.len());
    row[lo..hi].iter().map(|&c| u32::from(c)).sum()
}

/// Live Moore neighbours of `here[col]`, given the rows above and below it.
/// Columns outside the row count as dead.
#[inline]
pub fn live_neighbors(above: &[u8], here: &[u8], below: &[u8], col: usize) -> u32 {
    window(above, col) + window(here, col) + window(below, col) - u32::from(here[col])
}

/// Compute the owned rows of `next` from `current`.
///
/// Both slices hold `rows + 2` rows of `width` cells. `current` is only read,
/// and ghost rows of `next` are left untouched.
pub fn step_rows(current: &[u8], next: &mut [u8], width: usize, rows: usize) {
    debug_assert_eq!(current.len(), (rows + 2) * width);
    debug_assert_eq!(next.len(), current.len());

    for row in 1..=rows {
        let above = &current[(row - 1) * width..row * width];
        let here = &current[row * width..(row + 1) * width];
        let below = &current[(row + 1) * width..(row + 2) * width];
        let out = &mut next[row * width..(row + 1) * width];

        for col in 0..width {
            out[col] = next_state(here[col], live_neighbors(above, here, below, col));
        }
    }
}

/// Advance `grid` by one generation. Ghost rows must already be current.
pub fn advance(grid: &mut LocalGrid) {
    let (width, rows) = (grid.width(), grid.rows());
    let (current, next) = grid.buffers_mut();
    step_rows(current, next, width, rows);
    grid.swap();
}
