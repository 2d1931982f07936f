//! Shared utilities for the md3-rs CLI

pub mod tree;

pub use tree::*;
