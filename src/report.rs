//! What the coordinator hands to the outside world.

use std::fmt;
use std::io::{self, Write};

use log::info;

/// Final result of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub workers: usize,
    pub iterations: u32,
    /// Alive cells over the whole grid after the last generation.
    pub alive: u64,
    /// Wall time of the slowest worker.
    pub elapsed_secs: f64,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Workers: {}, Total alive cells after {} iterations: {}",
            self.workers, self.iterations, self.alive
        )?;
        write!(
            f,
            "Workers: {}, Total time for {} iterations: {:.6} seconds",
            self.workers, self.iterations, self.elapsed_secs
        )
    }
}

/// The whole grid, assembled on the coordinator for a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalGrid {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<u8>,
}

impl GlobalGrid {
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.width + col]
    }

    pub fn alive(&self) -> u64 {
        self.cells.iter().map(|&c| u64::from(c)).sum()
    }

    /// `(row, col)` of every live cell, in row-major order.
    pub fn live_cells(&self) -> Vec<(usize, usize)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c != 0)
            .map(|(i, _)| (i / self.width, i % self.width))
            .collect()
    }

    /// `Generation N:` followed by one line of `0`/`1` digits per row.
    pub fn write_text<W: Write + ?Sized>(&self, generation: u32, out: &mut W) -> io::Result<()> {
        writeln!(out, "Generation {generation}:")?;
        let mut line = Vec::with_capacity(self.width + 1);
        for row in self.cells.chunks(self.width) {
            line.clear();
            line.extend(row.iter().map(|&c| b'0' + c));
            line.push(b'\n');
            out.write_all(&line)?;
        }
        out.flush()
    }
}

/// Receives results on the coordinator. Other workers never call it.
pub trait ReportSink {
    /// Called once, after the last generation.
    fn report(&mut self, report: &Report) -> io::Result<()>;

    /// Called after every output generation (1-based `generation`).
    fn snapshot(&mut self, _generation: u32, _grid: &GlobalGrid) -> io::Result<()> {
        Ok(())
    }
}

/// Discards everything. Used by workers that are not the coordinator.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn report(&mut self, _report: &Report) -> io::Result<()> {
        Ok(())
    }
}

/// Writes the report as text and, optionally, snapshots to a second writer.
pub struct TextSink {
    out: Box<dyn Write + Send>,
    snapshots: Option<Box<dyn Write + Send>>,
}

impl TextSink {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        TextSink { out, snapshots: None }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn with_snapshots(mut self, snapshots: Box<dyn Write + Send>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }
}

impl ReportSink for TextSink {
    fn report(&mut self, report: &Report) -> io::Result<()> {
        info!(
            "{} alive cells after {} generations on {} workers ({:.3}s)",
            report.alive, report.iterations, report.workers, report.elapsed_secs
        );
        writeln!(self.out, "{report}")?;
        self.out.flush()
    }

    fn snapshot(&mut self, generation: u32, grid: &GlobalGrid) -> io::Result<()> {
        match &mut self.snapshots {
            Some(out) => grid.write_text(generation, out.as_mut()),
            None => Ok(()),
        }
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub report: Option<Report>,
    pub snapshots: Vec<(u32, GlobalGrid)>,
}

impl ReportSink for MemorySink {
    fn report(&mut self, report: &Report) -> io::Result<()> {
        self.report = Some(report.clone());
        Ok(())
    }

    fn snapshot(&mut self, generation: u32, grid: &GlobalGrid) -> io::Result<()> {
        self.snapshots.push((generation, grid.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn report_text_matches_the_classic_output() {
        let report = Report {
            workers: 4,
            iterations: 5000,
            alive: 5,
            elapsed_secs: 1.25,
        };
        assert_eq!(
            report.to_string(),
            "Workers: 4, Total alive cells after 5000 iterations: 5\n\
             Workers: 4, Total time for 5000 iterations: 1.250000 seconds"
        );
    }

    #[test]
    fn snapshot_text_format() {
        let grid = GlobalGrid {
            width: 3,
            height: 2,
            cells: vec![0, 1, 0, 1, 1, 0],
        };
        let mut out = Vec::new();
        grid.write_text(7, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Generation 7:\n010\n110\n");
        assert_eq!(grid.live_cells(), vec![(0, 1), (1, 0), (1, 1)]);
        assert_eq!(grid.alive(), 3);
        assert_eq!((grid.get(0, 0), grid.get(1, 1)), (0, 1));
    }

    #[test]
    fn text_sink_writes_report_and_snapshots() {
        let report_buf = SharedBuf::default();
        let snap_buf = SharedBuf::default();
        let mut sink = TextSink::new(Box::new(report_buf.clone())).with_snapshots(Box::new(snap_buf.clone()));
        let grid = GlobalGrid {
            width: 2,
            height: 1,
            cells: vec![1, 0],
        };
        sink.snapshot(1, &grid).unwrap();
        sink.report(&Report {
            workers: 1,
            iterations: 1,
            alive: 1,
            elapsed_secs: 0.0,
        })
        .unwrap();
        assert_eq!(snap_buf.text(), "Generation 1:\n10\n");
        assert!(report_buf.text().contains("Total alive cells after 1 iterations: 1"));
    }
}
