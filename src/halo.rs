//! Per-generation ghost row refresh.

use log::trace;

use crate::comm::Communicator;
use crate::error::{LifeError, Result, Stage};
use crate::grid::LocalGrid;
use crate::partition::RowSpan;

/// Refresh both ghost rows of `grid` from the row neighbours of `span`.
///
/// With an upstream neighbour, the first owned row goes up and the top ghost
/// row is filled from above. With a downstream neighbour, the last owned row
/// goes down and the bottom ghost row is filled from below. Ghost rows on a
/// global edge are never touched. Returns once both exchanges completed.
pub fn exchange<C: Communicator + ?Sized>(comm: &C, span: &RowSpan, grid: &mut LocalGrid) -> Result<()> {
    if let Some(up) = span.up() {
        let (send, recv) = grid.upper_boundary();
        comm.send_receive(up, send, recv)
            .map_err(LifeError::transport(span.rank, Stage::HaloUp))?;
        trace!("rank {}: exchanged top boundary with rank {up}", span.rank);
    }

    if let Some(down) = span.down() {
        let (send, recv) = grid.lower_boundary();
        comm.send_receive(down, send, recv)
            .map_err(LifeError::transport(span.rank, Stage::HaloDown))?;
        trace!("rank {}: exchanged bottom boundary with rank {down}", span.rank);
    }

    Ok(())
}
