//! Typed error taxonomy shared by the builder, traversal, chunk DDA, on-disk
//! format and work group. Every fallible public function in this crate
//! returns `Result<T, VkdtError>`; nothing in the public API panics on
//! caller-supplied input.

use thiserror::Error;

/// The five error kinds the acceleration structure, its I/O and the work
/// group can raise, plus an `Io` variant for the on-disk format.
#[derive(Debug, Error)]
pub enum VkdtError {
    /// A build, ray, or traversal stack was requested with out-of-range
    /// parameters (depth above the limit, a zero-length ray direction, a
    /// traversal stack too small for the tree's depth).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The builder failed to grow one of its arrays; the partial tree was
    /// dropped before this error was returned.
    #[error("out of memory while growing to {requested} nodes (cap {cap})")]
    OutOfMemory { requested: usize, cap: usize },

    /// Traversal returned a `possible-chunk-voxel` or `hit-unknown` result
    /// that no follow-up resolver confirmed.
    #[error("ambiguous hit at voxel {voxel:?} could not be resolved")]
    AmbiguousHit { voxel: (i32, i32, i32) },

    /// A feature of the on-disk format or API surface that the source never
    /// implemented either (e.g. non-packed tree loading).
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A caller read a work group output slot that was not `AwaitingPickup`.
    #[error("concurrency violation: slot {slot} was not awaiting pickup")]
    ConcurrencyViolation { slot: usize },

    /// Propagated I/O failure from the on-disk tree reader/writer.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VkdtError>;
