//! DAA CLI - command line tools for the DAA decision core.
//!
//! This crate provides:
//! - daa-bands: run one monitoring cycle over a traffic scenario and print
//!   the bands report

pub mod scenario;

pub use scenario::{builtin, Scenario, TrafficRecord, BUILTIN_SCENARIOS};
