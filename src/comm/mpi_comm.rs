//! Workers as MPI ranks. Launch the binary with `mpirun -n N ... --mpi`.
//!
//! MPI's default error handler aborts the job on any failed call, which is
//! exactly the all-or-nothing contract the simulation needs, so the
//! primitives here only report errors they can detect themselves.

use mpi::collective::{CommunicatorCollectives, Root, SystemOperation};
use mpi::environment::Universe;
use mpi::point_to_point::{self as p2p, Destination, Source};
use mpi::topology::{Communicator as _, SystemCommunicator};

use super::{Communicator, COORDINATOR};
use crate::error::TransportError;

/// Tag for snapshot rows sent to the coordinator.
const GATHER_TAG: i32 = 4;

pub struct MpiComm {
    // Finalizes MPI on drop, so it has to live as long as the communicator.
    _universe: Universe,
    world: SystemCommunicator,
}

impl MpiComm {
    /// Initialize MPI. Returns `None` if it was already initialized.
    pub fn init() -> Option<Self> {
        let universe = mpi::initialize()?;
        let world = universe.world();
        Some(MpiComm {
            _universe: universe,
            world,
        })
    }

    fn peer(&self, peer: usize) -> Result<i32, TransportError> {
        if peer >= self.size() || peer == self.rank() {
            return Err(TransportError::NoSuchPeer {
                peer,
                size: self.size(),
            });
        }
        Ok(peer as i32)
    }
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn send_receive(&self, peer: usize, send: &[u8], recv: &mut [u8]) -> Result<(), TransportError> {
        let process = self.world.process_at_rank(self.peer(peer)?);
        // MPI_Sendrecv: the combined call cannot deadlock on ordering.
        p2p::send_receive_into(send, &process, recv, &process);
        Ok(())
    }

    fn barrier(&self) -> Result<(), TransportError> {
        self.world.barrier();
        Ok(())
    }

    fn reduce_sum(&self, local: u64) -> Result<Option<u64>, TransportError> {
        let root = self.world.process_at_rank(COORDINATOR as i32);
        if self.is_coordinator() {
            // The root supplies its own count and receives the sum of all ranks.
            let mut total = 0u64;
            root.reduce_into_root(&local, &mut total, SystemOperation::sum());
            Ok(Some(total))
        } else {
            // Everyone else only contributes; no receive buffer.
            root.reduce_into(&local, SystemOperation::sum());
            Ok(None)
        }
    }

    fn reduce_max(&self, local: f64) -> Result<Option<f64>, TransportError> {
        let root = self.world.process_at_rank(COORDINATOR as i32);
        if self.is_coordinator() {
            // Elapsed times are never negative, so 0 is a safe start.
            let mut max = 0f64;
            root.reduce_into_root(&local, &mut max, SystemOperation::max());
            Ok(Some(max))
        } else {
            root.reduce_into(&local, SystemOperation::max());
            Ok(None)
        }
    }

    fn gather(&self, local: &[u8]) -> Result<Option<Vec<u8>>, TransportError> {
        if !self.is_coordinator() {
            // Blocking send of the owned rows, ghost rows excluded.
            self.world
                .process_at_rank(COORDINATOR as i32)
                .send_with_tag(local, GATHER_TAG);
            return Ok(None);
        }
        // Slabs differ in size when the rows do not divide evenly, so the
        // coordinator receives each one as a vector, in rank order.
        let mut all = local.to_vec();
        // Receive from each rank in turn; the tag keeps these apart from halo rows.
        for peer in 1..self.size() {
            let (cells, _status) = self
                .world
                .process_at_rank(peer as i32)
                .receive_vec_with_tag::<u8>(GATHER_TAG);
            all.extend_from_slice(&cells);
        }
        Ok(Some(all))
    }

    fn abort(&self) {
        // MPI_Abort: takes down every rank, not just this one.
        self.world.abort(1);
    }
}
