//! Row-wise domain decomposition.

use std::ops::Range;

use crate::error::ConfigError;

/// The contiguous block of global rows owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    pub rank: usize,
    pub workers: usize,
    /// First owned global row.
    pub start: usize,
    /// One past the last owned global row.
    pub end: usize,
}

impl RowSpan {
    /// Number of owned rows (ghost rows excluded).
    pub fn rows(&self) -> usize {
        self.end - self.start
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Rank of the worker holding the rows just above this span.
    pub fn up(&self) -> Option<usize> {
        self.rank.checked_sub(1)
    }

    /// Rank of the worker holding the rows just below this span.
    pub fn down(&self) -> Option<usize> {
        if self.rank + 1 < self.workers {
            Some(self.rank + 1)
        } else {
            None
        }
    }
}

/// Split `height` rows across `workers`.
///
/// The first `height % workers` workers own one extra row, so the spans are
/// disjoint and cover `[0, height)` exactly.
pub fn decompose(height: usize, workers: usize) -> Result<Vec<RowSpan>, ConfigError> {
    if workers == 0 {
        return Err(ConfigError::NoWorkers);
    }
    if height < workers {
        return Err(ConfigError::TooManyWorkers { height, workers });
    }

    let base = height / workers;
    let rem = height % workers;
    let mut spans = Vec::with_capacity(workers);
    let mut cursor = 0;
    for rank in 0..workers {
        let rows = base + usize::from(rank < rem);
        spans.push(RowSpan {
            rank,
            workers,
            start: cursor,
            end: cursor + rows,
        });
        cursor += rows;
    }
    debug_assert_eq!(cursor, height);
    Ok(spans)
}

/// The span of a single rank, without building the whole table.
pub fn span_of(height: usize, workers: usize, rank: usize) -> Result<RowSpan, ConfigError> {
    if workers == 0 {
        return Err(ConfigError::NoWorkers);
    }
    if height < workers {
        return Err(ConfigError::TooManyWorkers { height, workers });
    }
    if rank >= workers {
        return Err(ConfigError::RankOutOfRange { rank, workers });
    }

    let base = height / workers;
    let rem = height % workers;
    let start = rank * base + rank.min(rem);
    Ok(RowSpan {
        rank,
        workers,
        start,
        end: start + base + usize::from(rank < rem),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(height: usize, workers: usize) {
        let spans = decompose(height, workers).unwrap();
        assert_eq!(spans.len(), workers);
        let mut next = 0;
        for (rank, span) in spans.iter().enumerate() {
            assert_eq!(span.rank, rank);
            assert_eq!(span.start, next, "gap or overlap before rank {rank}");
            assert!(span.rows() >= 1);
            next = span.end;
        }
        assert_eq!(next, height, "{height} rows over {workers} workers");
    }

    #[test]
    fn spans_cover_grid_exactly() {
        for height in 1..=64 {
            for workers in 1..=height {
                assert_covers(height, workers);
            }
        }
    }

    #[test]
    fn remainder_goes_to_earliest_workers() {
        let rows: Vec<usize> = decompose(40, 7).unwrap().iter().map(RowSpan::rows).collect();
        assert_eq!(rows, vec![6, 6, 6, 6, 6, 5, 5]);
    }

    #[test]
    fn naive_formula_would_drop_rows() {
        // 3000 / 7 * 7 = 2996, the last four rows would never be simulated.
        let spans = decompose(3000, 7).unwrap();
        assert_eq!(spans.last().unwrap().end, 3000);
    }

    #[test]
    fn neighbours_are_absent_at_the_edges() {
        let spans = decompose(10, 3).unwrap();
        assert_eq!((spans[0].up(), spans[0].down()), (None, Some(1)));
        assert_eq!((spans[1].up(), spans[1].down()), (Some(0), Some(2)));
        assert_eq!((spans[2].up(), spans[2].down()), (Some(1), None));

        let single = span_of(10, 1, 0).unwrap();
        assert_eq!((single.up(), single.down()), (None, None));
    }

    #[test]
    fn span_of_matches_the_table() {
        for (height, workers) in [(40, 7), (3000, 7), (9, 9), (17, 4)] {
            let spans = decompose(height, workers).unwrap();
            for (rank, span) in spans.iter().enumerate() {
                assert_eq!(span_of(height, workers, rank).unwrap(), *span);
            }
        }
        assert_eq!(
            span_of(10, 2, 2),
            Err(ConfigError::RankOutOfRange {
                rank: 2,
                workers: 2
            })
        );
    }

    #[test]
    fn invalid_worker_counts_are_rejected() {
        assert_eq!(decompose(10, 0), Err(ConfigError::NoWorkers));
        assert_eq!(
            decompose(3, 4),
            Err(ConfigError::TooManyWorkers {
                height: 3,
                workers: 4
            })
        );
    }
}
