//! sprig engine crate.
//!
//! A batched 2D renderer: a small handle-based GPU layer ([`gpu`]), a batch
//! renderer with an orthographic camera ([`render`]), and the platform pieces
//! needed to put it on screen ([`device`], [`window`], [`core`], [`time`]).

pub mod color;
pub mod core;
pub mod device;
pub mod gpu;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;

pub use color::Color;
