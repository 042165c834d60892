//! Message passing between workers.
//!
//! The simulation only ever talks to its row neighbours through
//! [`Communicator::send_receive`], meets everyone at [`Communicator::barrier`],
//! and funnels results to the coordinator. Implementations:
//! [`ThreadComm`] (one thread per worker, always available) and `MpiComm`
//! (one MPI rank per worker, behind the `mpi` feature).

mod thread;

#[cfg(feature = "mpi")]
mod mpi_comm;

pub use self::thread::ThreadComm;

#[cfg(feature = "mpi")]
pub use self::mpi_comm::MpiComm;

use crate::error::TransportError;

/// Rank of the worker that collects results and reports.
pub const COORDINATOR: usize = 0;

pub trait Communicator {
    /// This worker's ordinal.
    fn rank(&self) -> usize;

    /// Number of workers in the run.
    fn size(&self) -> usize;

    /// Send `send` to `peer` and fill `recv` with the row `peer` sends back,
    /// as one combined operation. Both sides must call this with each other.
    fn send_receive(&self, peer: usize, send: &[u8], recv: &mut [u8]) -> Result<(), TransportError>;

    /// Block until every worker has reached the barrier.
    fn barrier(&self) -> Result<(), TransportError>;

    /// Sum `local` over all workers. The coordinator gets `Some(total)`,
    /// everyone else `None`.
    fn reduce_sum(&self, local: u64) -> Result<Option<u64>, TransportError>;

    /// Maximum of `local` over all workers, delivered to the coordinator.
    fn reduce_max(&self, local: f64) -> Result<Option<f64>, TransportError>;

    /// Collect every worker's `local` cells on the coordinator, concatenated
    /// in rank order.
    fn gather(&self, local: &[u8]) -> Result<Option<Vec<u8>>, TransportError>;

    /// Tear the whole run down after a fatal error on this worker.
    fn abort(&self);

    fn is_coordinator(&self) -> bool {
        self.rank() == COORDINATOR
    }
}
