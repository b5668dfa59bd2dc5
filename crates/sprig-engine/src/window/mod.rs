//! Window and event loop.
//!
//! Owns the `winit` event loop and a single window, and wires them to the GPU
//! layer and the application.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
