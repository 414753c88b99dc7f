//! CLI command implementations.

pub mod cache;
pub mod export;
pub mod fields;
pub mod lookup;
