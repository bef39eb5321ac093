#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless runner that drives the world and every system at a fixed step.

mod simulation;

pub use simulation::{Simulation, Summary};
