//! Small helpers shared between the md3-rs crates.

pub mod debug;
