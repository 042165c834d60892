//! Conway's Game of Life (B3/S23) on a fixed grid split into horizontal slabs,
//! one per worker, advanced in lockstep.
//!
//! Each worker owns a contiguous block of rows plus one ghost row above and
//! below. Every generation it swaps boundary rows with its row neighbours
//! ([`halo::exchange`]), updates its owned rows ([`kernel::advance`]), and waits
//! for every other worker at a barrier. At the end the alive counts are summed
//! on the coordinator (rank 0), which alone reports.
//!
//! Workers talk through the [`comm::Communicator`] trait: [`run_threaded`]
//! runs them as threads of this process, and with the `mpi` feature the binary
//! can run them as MPI ranks instead.
//!
//! ```rust,no_run
//! use game_of_life_rows::{run_threaded, SimulationConfig, Shape, TextSink};
//!
//! let config = SimulationConfig::centered(64, 40, 40, Shape::Glider);
//! let report = run_threaded(&config, 4, &mut TextSink::stdout()).unwrap();
//! println!("{} cells alive", report.alive);
//! ```

pub mod comm;
pub mod config;
pub mod error;
pub mod grid;
pub mod halo;
pub mod kernel;
pub mod partition;
pub mod pattern;
pub mod report;
pub mod worker;

use std::panic;
use std::thread;

use log::debug;

use crate::comm::{Communicator, ThreadComm, COORDINATOR};

pub use crate::config::{Placement, SimulationConfig};
pub use crate::error::{ConfigError, LifeError, Result, Stage, TransportError};
pub use crate::partition::{decompose, RowSpan};
pub use crate::pattern::{Pattern, Shape};
pub use crate::report::{GlobalGrid, MemorySink, NullSink, Report, ReportSink, TextSink};

/// Run the simulation on `workers` threads of this process.
///
/// Configuration problems are reported before any thread is started. If any
/// worker fails, all of them are torn down and the error that caused it is
/// returned.
pub fn run_threaded(
    config: &SimulationConfig,
    workers: usize,
    sink: &mut (dyn ReportSink + Send),
) -> Result<Report> {
    config.validate()?;
    let spans = decompose(config.height, workers)?;
    debug!("row spans: {spans:?}");

    let mut sink = Some(sink);
    let results: Vec<Result<Option<Report>>> = thread::scope(|s| {
        let handles: Vec<_> = ThreadComm::world(workers)
            .into_iter()
            .map(|comm| {
                let own_sink = if comm.rank() == COORDINATOR { sink.take() } else { None };
                s.spawn(move || match own_sink {
                    Some(sink) => worker::run(config, &comm, sink),
                    None => worker::run(config, &comm, &mut NullSink),
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
            .collect()
    });

    let mut report = None;
    let mut failure: Option<LifeError> = None;
    for result in results {
        match result {
            Ok(Some(r)) => report = Some(r),
            Ok(None) => {}
            // Keep the root cause rather than the workers that were aborted by it.
            Err(err) => {
                if failure.as_ref().map_or(true, |f| f.is_secondary() && !err.is_secondary()) {
                    failure = Some(err);
                }
            }
        }
    }
    if let Some(err) = failure {
        return Err(err);
    }
    report.ok_or_else(|| LifeError::transport(COORDINATOR, Stage::Reduce)(TransportError::Aborted))
}
