//! lockwarden CLI library
//!
//! The binary in `main.rs` is a thin wrapper; argument parsing, configuration
//! loading, rendering and exit-code mapping live here so they can be tested.

pub mod cli;
pub mod error;
pub mod logging;
pub mod output;
pub mod scan;
