pub mod error;
pub mod geometry;
pub mod header;

pub use error::*;
pub use geometry::*;
pub use header::*;
