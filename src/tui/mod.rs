//! TUI (Terminal User Interface) module for fastdial.
//!
//! This module owns the terminal while a test runs: the controller drives
//! the event loop and the renderer draws the dial, readouts and history
//! chart for the current phase.

pub mod controller;
pub mod renderer;

pub use controller::TuiController;
