//! Core business logic modules.

pub mod cache;
pub mod completeness;
pub mod fields;
pub mod processor;
pub mod report;
pub mod resolver;
