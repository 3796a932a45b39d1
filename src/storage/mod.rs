// Local storage module
// Path routing for service roots and filesystem primitives for assets

pub mod assets;
pub mod router;

pub use router::{PathRouter, ServiceRoots};
