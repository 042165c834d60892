//! Error taxonomy for a run.
//!
//! Nothing here is recovered locally. Any `LifeError` aborts every worker,
//! because the workers only make progress in lockstep.

use std::fmt;

/// Invalid sizing or placement, detected before any buffer is allocated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("the number of workers must be > 0")]
    NoWorkers,
    #[error("grid height {height} is smaller than the number of workers {workers}")]
    TooManyWorkers { height: usize, workers: usize },
    #[error("rank {rank} is outside a world of {workers} workers")]
    RankOutOfRange { rank: usize, workers: usize },
    #[error("grid dimensions must be > 0 (got {width}x{height})")]
    EmptyGrid { width: usize, height: usize },
    #[error("pattern row {row} has {found} cells, expected {expected}")]
    RaggedPattern {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("pattern contains '{0}', only '0' and '1' (or '.' with '#' or 'O') are allowed")]
    BadPatternCell(char),
    #[error("pattern must have at least one row and one column")]
    EmptyPattern,
    #[error(
        "a {rows}x{cols} pattern at ({row}, {col}) does not fit in a {width}x{height} grid"
    )]
    PatternOutOfBounds {
        rows: usize,
        cols: usize,
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    },
    #[error("the output generation value must be > 0")]
    ZeroOutputEvery,
    #[error("--mpi needs a binary built with `--features mpi`")]
    MpiUnavailable,
}

/// The point of the generation loop where a worker failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Paired exchange with the upstream (rank - 1) neighbour.
    HaloUp,
    /// Paired exchange with the downstream (rank + 1) neighbour.
    HaloDown,
    Barrier,
    Gather,
    Reduce,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::HaloUp => "halo exchange (upstream)",
            Stage::HaloDown => "halo exchange (downstream)",
            Stage::Barrier => "generation barrier",
            Stage::Gather => "snapshot gather",
            Stage::Reduce => "reduction",
        };
        f.write_str(name)
    }
}

/// Failure of a single message-passing primitive, before it is tagged with
/// the worker and stage that hit it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("peer {0} is gone")]
    Disconnected(usize),
    #[error("run aborted by another worker")]
    Aborted,
    #[error("expected {expected} cells from peer {peer}, received {found}")]
    LengthMismatch {
        peer: usize,
        expected: usize,
        found: usize,
    },
    #[error("peer {peer} sent a {found} message, expected {expected}")]
    UnexpectedMessage {
        peer: usize,
        expected: &'static str,
        found: &'static str,
    },
    #[error("no such peer {peer} in a world of {size}")]
    NoSuchPeer { peer: usize, size: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum LifeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("rank {rank}: could not allocate {rows} rows of {width} cells")]
    Allocation {
        rank: usize,
        rows: usize,
        width: usize,
    },
    #[error("rank {rank}: {stage} failed: {source}")]
    Transport {
        rank: usize,
        stage: Stage,
        #[source]
        source: TransportError,
    },
    #[error("could not write the report: {0}")]
    Output(#[from] std::io::Error),
}

impl LifeError {
    pub(crate) fn transport(rank: usize, stage: Stage) -> impl FnOnce(TransportError) -> Self {
        move |source| LifeError::Transport {
            rank,
            stage,
            source,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            LifeError::Config(_) => 2,
            _ => 1,
        }
    }

    /// Whether this error is only a consequence of another worker's failure.
    pub fn is_secondary(&self) -> bool {
        matches!(
            self,
            LifeError::Transport {
                source: TransportError::Aborted | TransportError::Disconnected(_),
                ..
            }
        )
    }
}

pub type Result<T, E = LifeError> = std::result::Result<T, E>;
