//! Application layer orchestrating domain logic and infrastructure.

pub mod export;
pub mod parse;
pub mod pipeline;
pub mod scan;
pub mod select;
