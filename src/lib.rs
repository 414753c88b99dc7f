//! Plex Media Export Library
//!
//! Exports Plex movie and TV show libraries to Excel, with per-season
//! completeness for shows computed against the TVMaze catalog.

pub mod cli;
pub mod core;
pub mod error;
pub mod models;
pub mod preflight;
pub mod services;
pub mod utils;

pub use error::{Error, Result};
