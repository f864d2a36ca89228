//! Error types for Fretwork

use crate::mesh::Topology;
use thiserror::Error;

/// Result type alias using Fretwork's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in kernel operations
///
/// Every failure is reported by the operation that detected it. Inputs are
/// never modified, so a failed call leaves nothing half-built behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid parameter (grid sizes, separations, epsilons, ray directions)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A topology change with no well-defined result
    #[error("Unsupported topology conversion from {from:?} to {to:?}")]
    UnsupportedConversion { from: Topology, to: Topology },

    /// Geometry that cannot be processed numerically
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// A primitive crosses the boundary between two material segments
    #[error("Material segment violation: {0}")]
    MaterialSegmentViolation(String),

    /// Mesh data that breaks the mesh invariants
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Material name missing from the catalog
    #[error("Unknown material: {0}")]
    UnknownMaterial(String),
}
