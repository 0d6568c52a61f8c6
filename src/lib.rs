//! Core library for the worklink job marketplace engine.

pub mod config;
pub mod error;
pub mod marketplace;
pub mod telemetry;
