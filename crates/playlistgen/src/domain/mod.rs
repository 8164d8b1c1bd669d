//! Domain types for parsed specifications and scenario naming.

pub mod errors;
pub mod model;
pub mod naming;
