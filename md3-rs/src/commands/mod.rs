//! Command implementations for each file type

pub mod anim;
pub mod model;
pub mod scene;
pub mod skin;
