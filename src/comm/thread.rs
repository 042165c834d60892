//! Workers as threads of one process, talking over channels.
//!
//! Every ordered pair of workers gets its own FIFO channel. Since all workers
//! run the same sequence of operations, messages between two workers are
//! always consumed in the order they were sent, and no tags are needed.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::warn;

use super::{Communicator, COORDINATOR};
use crate::error::TransportError;

/// How often a blocked receive checks whether the run was aborted.
const ABORT_POLL: Duration = Duration::from_millis(20);

#[derive(Debug)]
enum Packet {
    Cells(Vec<u8>),
    Count(u64),
    Seconds(f64),
}

impl Packet {
    fn kind(&self) -> &'static str {
        match self {
            Packet::Cells(_) => "cells",
            Packet::Count(_) => "count",
            Packet::Seconds(_) => "seconds",
        }
    }
}

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
    aborted: bool,
}

/// State shared by every worker of one run.
#[derive(Debug, Default)]
struct Shared {
    state: Mutex<BarrierState>,
    released: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn aborted(&self) -> bool {
        self.lock().aborted
    }
}

#[derive(Debug)]
pub struct ThreadComm {
    rank: usize,
    size: usize,
    /// `outbox[peer]` carries messages from this worker to `peer`.
    outbox: Vec<Sender<Packet>>,
    /// `inbox[peer]` carries messages from `peer` to this worker.
    inbox: Vec<Receiver<Packet>>,
    shared: Arc<Shared>,
}

impl ThreadComm {
    /// Build the communicators of a `size`-worker run, indexed by rank.
    /// Each one is meant to be moved into its own thread.
    pub fn world(size: usize) -> Vec<ThreadComm> {
        let shared = Arc::new(Shared::default());
        let mut outboxes: Vec<Vec<Sender<Packet>>> = (0..size).map(|_| Vec::with_capacity(size)).collect();
        let mut inboxes: Vec<Vec<Receiver<Packet>>> = (0..size).map(|_| Vec::with_capacity(size)).collect();
        for from in 0..size {
            for to in 0..size {
                let (tx, rx) = mpsc::channel();
                outboxes[from].push(tx);
                inboxes[to].push(rx);
            }
        }

        outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outbox, inbox))| ThreadComm {
                rank,
                size,
                outbox,
                inbox,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    fn check_peer(&self, peer: usize) -> Result<(), TransportError> {
        if peer >= self.size || peer == self.rank {
            return Err(TransportError::NoSuchPeer {
                peer,
                size: self.size,
            });
        }
        Ok(())
    }

    fn post(&self, peer: usize, packet: Packet) -> Result<(), TransportError> {
        self.outbox[peer]
            .send(packet)
            .map_err(|_| TransportError::Disconnected(peer))
    }

    fn take(&self, peer: usize) -> Result<Packet, TransportError> {
        loop {
            match self.inbox[peer].recv_timeout(ABORT_POLL) {
                Ok(packet) => return Ok(packet),
                Err(RecvTimeoutError::Disconnected) => return Err(TransportError::Disconnected(peer)),
                Err(RecvTimeoutError::Timeout) => {
                    if self.shared.aborted() {
                        return Err(TransportError::Aborted);
                    }
                }
            }
        }
    }

    fn take_count(&self, peer: usize) -> Result<u64, TransportError> {
        match self.take(peer)? {
            Packet::Count(n) => Ok(n),
            other => Err(unexpected(peer, "count", &other)),
        }
    }

    fn take_seconds(&self, peer: usize) -> Result<f64, TransportError> {
        match self.take(peer)? {
            Packet::Seconds(s) => Ok(s),
            other => Err(unexpected(peer, "seconds", &other)),
        }
    }

    fn take_cells(&self, peer: usize) -> Result<Vec<u8>, TransportError> {
        match self.take(peer)? {
            Packet::Cells(cells) => Ok(cells),
            other => Err(unexpected(peer, "cells", &other)),
        }
    }
}

fn unexpected(peer: usize, expected: &'static str, found: &Packet) -> TransportError {
    TransportError::UnexpectedMessage {
        peer,
        expected,
        found: found.kind(),
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send_receive(&self, peer: usize, send: &[u8], recv: &mut [u8]) -> Result<(), TransportError> {
        self.check_peer(peer)?;
        // Channels are unbounded, so posting first never blocks and both
        // sides can call this at the same time.
        self.post(peer, Packet::Cells(send.to_vec()))?;
        let cells = self.take_cells(peer)?;
        if cells.len() != recv.len() {
            return Err(TransportError::LengthMismatch {
                peer,
                expected: recv.len(),
                found: cells.len(),
            });
        }
        recv.copy_from_slice(&cells);
        Ok(())
    }

    fn barrier(&self) -> Result<(), TransportError> {
        let mut state = self.shared.lock();
        if state.aborted {
            return Err(TransportError::Aborted);
        }
        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == self.size {
            state.arrived = 0;
            state.generation += 1;
            self.shared.released.notify_all();
            return Ok(());
        }
        while state.generation == generation && !state.aborted {
            state = self
                .shared
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.generation == generation {
            Err(TransportError::Aborted)
        } else {
            Ok(())
        }
    }

    fn reduce_sum(&self, local: u64) -> Result<Option<u64>, TransportError> {
        if !self.is_coordinator() {
            self.post(COORDINATOR, Packet::Count(local))?;
            return Ok(None);
        }
        let mut total = local;
        for peer in 1..self.size {
            total += self.take_count(peer)?;
        }
        Ok(Some(total))
    }

    fn reduce_max(&self, local: f64) -> Result<Option<f64>, TransportError> {
        if !self.is_coordinator() {
            self.post(COORDINATOR, Packet::Seconds(local))?;
            return Ok(None);
        }
        let mut max = local;
        for peer in 1..self.size {
            max = max.max(self.take_seconds(peer)?);
        }
        Ok(Some(max))
    }

    fn gather(&self, local: &[u8]) -> Result<Option<Vec<u8>>, TransportError> {
        if !self.is_coordinator() {
            self.post(COORDINATOR, Packet::Cells(local.to_vec()))?;
            return Ok(None);
        }
        let mut all = local.to_vec();
        for peer in 1..self.size {
            all.extend_from_slice(&self.take_cells(peer)?);
        }
        Ok(Some(all))
    }

    fn abort(&self) {
        warn!("rank {}: aborting the run", self.rank);
        let mut state = self.shared.lock();
        state.aborted = true;
        self.shared.released.notify_all();
    }
}

impl Drop for ThreadComm {
    fn drop(&mut self) {
        // A worker that panics never reaches the barrier again.
        if std::thread::panicking() {
            self.abort();
        }
    }
}
