//! API module for the sensor server's HTTP interface
//!
//! # Design Principle
//!
//! This module contains ONLY shared wire types and pure conversions.
//! The HTTP client itself lives in `fretcoach-practice`.

pub mod types;

pub use types::{ChordLookupResponse, ChordShape, ChordTable, ProcessedReading};
