//! One worker's life: allocate, seed, run the generations, reduce, report.

use std::time::Instant;

use log::{debug, error, info, trace};

use crate::comm::Communicator;
use crate::config::SimulationConfig;
use crate::error::{LifeError, Result, Stage, TransportError};
use crate::grid::LocalGrid;
use crate::halo;
use crate::kernel;
use crate::partition::{span_of, RowSpan};
use crate::report::{GlobalGrid, Report, ReportSink};

/// Run the whole simulation as the worker behind `comm`.
///
/// Every worker of the run must call this with the same `config`. The
/// coordinator returns `Some(report)` after handing it to `sink`; the other
/// workers return `None` and never touch `sink`. On any error the whole run is
/// aborted through `comm` before the error is returned.
pub fn run<C: Communicator + ?Sized>(
    config: &SimulationConfig,
    comm: &C,
    sink: &mut dyn ReportSink,
) -> Result<Option<Report>> {
    let result = simulate(config, comm, sink);
    if let Err(err) = &result {
        if !err.is_secondary() {
            error!("{err}");
        }
        comm.abort();
    }
    result
}

fn simulate<C: Communicator + ?Sized>(
    config: &SimulationConfig,
    comm: &C,
    sink: &mut dyn ReportSink,
) -> Result<Option<Report>> {
    let rank = comm.rank();
    let pattern = config.validate()?;
    let span = span_of(config.height, comm.size(), rank)?;

    let start = Instant::now();
    info!(
        "rank {rank}: rows {}..{} of a {}x{} grid, {} generations",
        span.start, span.end, config.width, config.height, config.iterations
    );

    let mut grid = LocalGrid::new(rank, span.rows(), config.width)?;
    let written = grid.place_pattern(&span, config.pattern.row, config.pattern.col, &pattern);
    if written > 0 {
        debug!(
            "rank {rank}: placed {written} pattern rows at ({}, {})",
            config.pattern.row, config.pattern.col
        );
    }

    for generation in 0..config.iterations {
        // Boundary rows to the neighbours, their rows into our ghost rows.
        halo::exchange(comm, &span, &mut grid)?;
        kernel::advance(&mut grid);
        debug_assert!(grid.edge_ghosts_clear(&span), "rank {rank}: edge ghost row written");

        // Nobody starts the next generation until everyone finished this one.
        comm.barrier()
            .map_err(LifeError::transport(rank, Stage::Barrier))?;
        trace!("rank {rank}: generation {generation} done");

        if config.is_output_generation(generation) {
            snapshot(config, comm, &span, &grid, generation + 1, sink)?;
        }
    }

    // Every worker counts its own rows; only the coordinator gets the total.
    let local_alive = grid.alive();
    let alive = comm
        .reduce_sum(local_alive)
        .map_err(LifeError::transport(rank, Stage::Reduce))?;
    // The run takes as long as its slowest worker.
    let elapsed = comm
        .reduce_max(start.elapsed().as_secs_f64())
        .map_err(LifeError::transport(rank, Stage::Reduce))?;
    debug!("rank {rank}: {local_alive} alive cells in owned rows");

    match (alive, elapsed) {
        (Some(alive), Some(elapsed_secs)) => {
            let report = Report {
                workers: comm.size(),
                iterations: config.iterations,
                alive,
                elapsed_secs,
            };
            sink.report(&report)?;
            Ok(Some(report))
        }
        _ => Ok(None),
    }
}

fn snapshot<C: Communicator + ?Sized>(
    config: &SimulationConfig,
    comm: &C,
    span: &RowSpan,
    grid: &LocalGrid,
    generation: u32,
    sink: &mut dyn ReportSink,
) -> Result<()> {
    let gathered = comm
        .gather(grid.owned())
        .map_err(LifeError::transport(span.rank, Stage::Gather))?;
    let Some(cells) = gathered else {
        return Ok(());
    };

    let expected = config.width * config.height;
    if cells.len() != expected {
        return Err(LifeError::Transport {
            rank: span.rank,
            stage: Stage::Gather,
            source: TransportError::LengthMismatch {
                peer: span.rank,
                expected,
                found: cells.len(),
            },
        });
    }
    debug!("gathered generation {generation}");
    sink.snapshot(
        generation,
        &GlobalGrid {
            width: config.width,
            height: config.height,
            cells,
        },
    )?;
    Ok(())
}
