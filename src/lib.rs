//! A constrained Delaunay triangulation kernel for building and querying 2.5-D
//! triangulated irregular networks (TINs) from scattered terrain and survey
//! points.
//!
//! The crate is organized the way the underlying half-edge mesh is organized:
//! [`vertex`] and [`edge`] define the primitive records, [`store`] is the
//! paged arena that owns them, [`predicates`] is the robust numeric layer
//! everything else is built on, and [`tin`] assembles bootstrap, incremental
//! insertion, constraint processing, iteration, interpolation, and the
//! Voronoi dual into the public [`tin::Tin`] API.

pub mod bootstrap;
pub mod constraints;
pub mod edge;
pub mod error;
pub mod insert;
pub mod interpolate;
pub mod iter;
pub mod locate;
pub mod predicates;
pub mod store;
pub mod thresholds;
pub mod tin;
pub mod vertex;
pub mod voronoi;

pub use edge::EdgeId;
pub use error::{Error, Result};
pub use thresholds::Thresholds;
pub use tin::Tin;
pub use vertex::VertexId;
