use thiserror::Error;

use crate::edge::EdgeId;
use crate::vertex::VertexId;

/// Every fallible operation in the crate returns this error type. `InternalInvariant`
/// is the only variant that leaves the `Tin` unusable; all others are ordinary,
/// recoverable rejections of a bad call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("fewer than three non-collinear vertices are available to bootstrap the triangulation")]
    InsufficientGeometry,

    #[error("operation requires a bootstrapped triangulation")]
    NotBootstrapped,

    #[error("triangulation is locked for mutation")]
    LockedForMutation,

    #[error("add_constraints was already called on this triangulation")]
    AlreadyConstrained,

    #[error("constraint capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

impl Error {
    pub(crate) fn invariant(msg: impl Into<String>) -> Error {
        let msg = msg.into();
        log::error!("internal invariant violated: {msg}");
        Error::InternalInvariant(msg)
    }

    pub(crate) fn invariant_edge(msg: &str, e: EdgeId) -> Error {
        Error::invariant(format!("{msg} (edge {e:?})"))
    }

    pub(crate) fn invariant_vertex(msg: &str, v: VertexId) -> Error {
        Error::invariant(format!("{msg} (vertex {v:?})"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
